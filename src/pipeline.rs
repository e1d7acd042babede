use crate::captions::{locate, CaptionChoice};
use crate::config::Config;
use crate::error::{Result, SubfetchError};
use crate::fetch::{list_videos, validate_url, Fetcher, PlaylistRange, VideoArtifact, VIDEO_EXTENSIONS};
use crate::housekeeping::prepare_dirs;
use crate::mux::{ArtifactKind, FinalArtifact, Muxer};
use crate::subtitle::{read_caption, SrtDocument};
use crate::translate::{detect_language, translate_caption_file, translate_parsed, Translator};
use console::style;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Counts from a fetch or process-folder run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Items the fetch tool attempted (videos found, for folder runs).
    pub attempted: usize,
    /// Videos present in the workspace after fetching.
    pub fetched: usize,
    pub muxed: usize,
    pub copied: usize,
    /// Videos that produced no final artifact.
    pub failed: usize,
    /// Errors reported by the fetch tool.
    pub fetch_errors: Vec<String>,
    pub artifacts: Vec<FinalArtifact>,
    pub total_time: Duration,
}

impl RunSummary {
    fn record(&mut self, artifact: FinalArtifact) {
        match artifact.kind {
            ArtifactKind::Muxed => self.muxed += 1,
            ArtifactKind::Copied => self.copied += 1,
        }
        self.artifacts.push(artifact);
    }

    /// Some requested item did not make it to the output directory.
    pub fn is_partial(&self) -> bool {
        self.failed > 0 || self.fetched < self.attempted || !self.fetch_errors.is_empty()
    }
}

/// Counts from a translate-folder run.
#[derive(Debug, Clone, Default)]
pub struct TranslateSummary {
    pub translated: usize,
    /// Already in the target language.
    pub skipped: usize,
    /// Language could not be detected.
    pub undetected: usize,
    pub failed: usize,
    pub outputs: Vec<PathBuf>,
}

/// Runs fetch → locate → translate → mux for each video, one at a time.
pub struct Pipeline<'a> {
    config: &'a Config,
    translator: &'a dyn Translator,
    show_progress: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, translator: &'a dyn Translator) -> Self {
        Self {
            config,
            translator,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Download `url` into the workspace and finalize every fetched video.
    pub async fn run_fetch(&self, url: &str, range: Option<PlaylistRange>) -> Result<RunSummary> {
        let start = Instant::now();
        validate_url(url)?;
        prepare_dirs(self.config)?;
        println!(
            "{} Output directory: {}",
            style("→").cyan(),
            self.config.output_dir.display()
        );

        let fetcher = Fetcher::new(self.config).with_progress(self.show_progress);
        let outcome = fetcher.fetch(url, range.as_ref()).await?;

        if outcome.videos.is_empty() {
            return Err(SubfetchError::FetchFailed(
                "no video was downloaded".to_string(),
            ));
        }

        let mut summary = RunSummary {
            attempted: outcome.attempted(),
            fetched: outcome.videos.len(),
            fetch_errors: outcome.report.errors.clone(),
            ..RunSummary::default()
        };
        info!(
            "Fetched {} of {} item(s)",
            summary.fetched, summary.attempted
        );

        self.finalize_all(&outcome.videos, Some(url), &mut summary).await;
        summary.total_time = start.elapsed();
        Ok(summary)
    }

    /// Finalize every video already sitting in `dir`.
    pub async fn run_folder(&self, dir: &Path) -> Result<RunSummary> {
        let start = Instant::now();
        let videos = list_videos(dir, VIDEO_EXTENSIONS)?;
        fs::create_dir_all(&self.config.output_dir)?;

        if same_dir(dir, &self.config.output_dir) {
            return Err(SubfetchError::Usage(
                "The output directory must differ from the video folder".to_string(),
            ));
        }
        if videos.is_empty() {
            warn!("No videos found in {}", dir.display());
        }

        let mut summary = RunSummary {
            attempted: videos.len(),
            fetched: videos.len(),
            ..RunSummary::default()
        };
        self.finalize_all(&videos, None, &mut summary).await;
        summary.total_time = start.elapsed();
        Ok(summary)
    }

    async fn finalize_all(&self, videos: &[VideoArtifact], url: Option<&str>, summary: &mut RunSummary) {
        let total = videos.len();
        for (i, video) in videos.iter().enumerate() {
            println!(
                "\n{} [{}/{}] {}",
                style("▶").blue(),
                i + 1,
                total,
                style(&video.stem).bold()
            );
            match self.process_video(video, url).await {
                Ok(artifact) => summary.record(artifact),
                Err(e) => {
                    error!("{}: {}", video.file_name(), e);
                    println!("{} {}: {}", style("✘").red(), video.file_name(), e);
                    summary.failed += 1;
                }
            }
        }
    }

    /// Locate or produce a target-language caption, then mux or copy.
    pub async fn process_video(&self, video: &VideoArtifact, url: Option<&str>) -> Result<FinalArtifact> {
        let caption = self.resolve_caption(video, url).await?;
        let artifact = Muxer::new(self.config)
            .finalize(video, caption.as_deref())
            .await?;

        match artifact.kind {
            ArtifactKind::Muxed => println!(
                "{} Final video: {}",
                style("✔").green(),
                artifact.path.display()
            ),
            ArtifactKind::Copied => println!(
                "{} Copied without captions: {}",
                style("⚠").yellow(),
                artifact.path.display()
            ),
        }
        Ok(artifact)
    }

    /// Path of a target-language caption for `video`, if one can be had.
    pub async fn resolve_caption(&self, video: &VideoArtifact, url: Option<&str>) -> Result<Option<PathBuf>> {
        let source = &self.config.source_lang;
        let target = &self.config.target_lang;

        let mut choice = locate(video.dir(), &video.stem, source, target)?;

        if choice == CaptionChoice::Missing {
            if let Some(url) = url {
                println!(
                    "{} No captions found, trying a caption-only download...",
                    style("⚠").yellow()
                );
                let fetcher = Fetcher::new(self.config).with_progress(false);
                match fetcher.fetch_captions(url, video, source).await {
                    Ok(()) => choice = locate(video.dir(), &video.stem, source, target)?,
                    Err(e) => warn!("Caption-only download failed: {}", e),
                }
            }
        }

        match choice {
            CaptionChoice::Ready(caption) => {
                println!(
                    "{} Captions found: {}",
                    style("✔").cyan(),
                    file_name(&caption.path)
                );
                Ok(Some(caption.path))
            }
            CaptionChoice::NeedsTranslation(caption) => {
                println!(
                    "{} Translating {} → {}: {}",
                    style("⚠").yellow(),
                    caption.lang,
                    target,
                    file_name(&caption.path)
                );
                match translate_caption_file(
                    &caption.path,
                    self.translator,
                    self.config,
                    &caption.lang,
                    self.show_progress,
                )
                .await
                {
                    Ok(translated) => Ok(Some(translated.path)),
                    Err(e) => {
                        warn!("Could not translate {}: {}", caption.path.display(), e);
                        Ok(None)
                    }
                }
            }
            CaptionChoice::Missing => {
                println!("{} No captions available", style("✘").red());
                Ok(None)
            }
        }
    }

    /// Translate every caption file in `dir` that is not already in the
    /// target language.
    pub async fn translate_folder(&self, dir: &Path) -> Result<TranslateSummary> {
        if !dir.is_dir() {
            return Err(SubfetchError::NotFound(dir.display().to_string()));
        }

        let mut captions: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                p.is_file()
                    && p.extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|e| e.eq_ignore_ascii_case("srt"))
            })
            .collect();
        captions.sort();

        let mut summary = TranslateSummary::default();
        for caption in captions {
            let name = file_name(&caption);
            let content = match read_caption(&caption) {
                Ok(content) => content,
                Err(e) => {
                    println!("{} {}", style("✘").red(), e);
                    summary.failed += 1;
                    continue;
                }
            };
            let doc = SrtDocument::parse(&content);

            let Some(lang) = detect_language(&doc, self.config.detect_sample_lines) else {
                println!("{} Could not detect language of {}, skipping", style("⚠").yellow(), name);
                summary.undetected += 1;
                continue;
            };
            if lang.eq_ignore_ascii_case(&self.config.target_lang) {
                debug!("{} is already {}", name, lang);
                println!("{} {} is already in {}", style("✔").cyan(), name, lang);
                summary.skipped += 1;
                continue;
            }

            println!("{} Translating {} ({} → {})", style("→").cyan(), name, lang, self.config.target_lang);
            match translate_parsed(&doc, &caption, self.translator, self.config, &lang, self.show_progress).await {
                Ok(translated) => {
                    summary.translated += 1;
                    summary.outputs.push(translated.path);
                }
                Err(e) => {
                    println!("{} {}: {}", style("✘").red(), name, e);
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Print a summary of a fetch or folder run.
pub fn print_summary(summary: &RunSummary) {
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                          Run Complete                          ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!("  Fetched:    {} of {} attempted", summary.fetched, summary.attempted);
    println!("  Muxed:      {}", summary.muxed);
    println!("  Copied:     {} (no captions)", summary.copied);
    if summary.failed > 0 {
        println!("  Failed:     {}", style(summary.failed).red());
    }
    if !summary.fetch_errors.is_empty() {
        println!();
        println!("  Download errors:");
        for e in &summary.fetch_errors {
            println!("    {}", style(e).yellow());
        }
    }
    println!();
    println!("  Total:      {:.2}s", summary.total_time.as_secs_f64());
    if summary.is_partial() {
        println!();
        println!("  {}", style("Some items did not complete").yellow());
    }
    println!();
    println!("═══════════════════════════════════════════════════════════════");
}

/// Print a summary of a translate-folder run.
pub fn print_translate_summary(summary: &TranslateSummary) {
    println!();
    println!("  Translated: {}", summary.translated);
    println!("  Skipped:    {} (already in target language)", summary.skipped);
    if summary.undetected > 0 {
        println!("  Undetected: {}", summary.undetected);
    }
    if summary.failed > 0 {
        println!("  Failed:     {}", style(summary.failed).red());
    }
    for path in &summary.outputs {
        println!("    {}", path.display());
    }
    println!();
}
