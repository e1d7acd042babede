pub mod progress;
pub mod range;

pub use progress::{parse_line, FetchEvent, FetchReport, ProgressTracker};
pub use range::PlaylistRange;

use crate::config::Config;
use crate::error::{Result, SubfetchError};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

/// File extensions treated as videos when scanning a folder.
pub const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "webm", "mov", "avi"];

/// Output filename template: zero-padded playlist ordinal, then the title.
/// Single videos get ordinal 001.
const OUTPUT_TEMPLATE: &str = "%(playlist_index&{:03d}|001)s_%(title)s.%(ext)s";

/// A downloaded media file in the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoArtifact {
    pub path: PathBuf,
    /// File name without extension; the join key with caption files.
    pub stem: String,
    /// Playlist position parsed from the `NNN_` prefix.
    pub ordinal: Option<u32>,
}

impl VideoArtifact {
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let stem = path.file_stem()?.to_string_lossy().into_owned();
        Some(Self {
            ordinal: ordinal_of(&stem),
            stem,
            path,
        })
    }

    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Ordinal encoded in a `NNN_title` stem.
pub fn ordinal_of(stem: &str) -> Option<u32> {
    let (prefix, _) = stem.split_once('_')?;
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok()
}

/// Reject anything that is not an http(s) URL before touching the network.
pub fn validate_url(url: &str) -> Result<()> {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(SubfetchError::Usage(format!("Invalid URL: '{}'", url)))
    }
}

/// Videos in `dir` with one of `extensions`, ordered by file name.
///
/// Partial downloads and unmerged per-format streams (`title.f137.mp4`)
/// are skipped.
pub fn list_videos(dir: &Path, extensions: &[&str]) -> Result<Vec<VideoArtifact>> {
    if !dir.is_dir() {
        return Err(SubfetchError::NotFound(dir.display().to_string()));
    }

    let mut videos = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
            continue;
        }
        if let Some(video) = VideoArtifact::from_path(path) {
            if !is_format_stream(&video.stem) {
                videos.push(video);
            }
        }
    }

    videos.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(videos)
}

fn is_format_stream(stem: &str) -> bool {
    stem.rsplit_once(".f")
        .map(|(_, id)| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}

/// Final videos among the files a fetch run reported, ordered by file name.
///
/// Per-format streams, caption files and anything no longer on disk (merged
/// away or deleted by a post-processor) are dropped.
pub fn reported_videos(files: &[PathBuf]) -> Vec<VideoArtifact> {
    let mut videos: Vec<VideoArtifact> = files
        .iter()
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| VIDEO_EXTENSIONS.iter().any(|v| v.eq_ignore_ascii_case(ext)))
        })
        .filter(|path| path.is_file())
        .filter_map(|path| VideoArtifact::from_path(path.clone()))
        .filter(|video| !is_format_stream(&video.stem))
        .collect();

    videos.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    videos.dedup_by(|a, b| a.path == b.path);
    videos
}

/// Result of one fetch run.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub videos: Vec<VideoArtifact>,
    pub report: FetchReport,
}

impl FetchOutcome {
    /// Items the tool attempted, as far as its output tells.
    pub fn attempted(&self) -> usize {
        self.report.items_seen.max(self.videos.len())
    }
}

/// Wrapper around the external fetch tool.
pub struct Fetcher<'a> {
    config: &'a Config,
    show_progress: bool,
}

impl<'a> Fetcher<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn build_args(&self, url: &str, range: Option<&PlaylistRange>) -> Vec<String> {
        let langs = format!("{},{}", self.config.source_lang, self.config.target_lang);
        let template = self.config.temp_dir.join(OUTPUT_TEMPLATE);

        let mut args: Vec<String> = [
            "-f",
            "bestvideo+bestaudio/best",
            "--merge-output-format",
            self.config.container.as_str(),
            "--write-subs",
            "--write-auto-subs",
            "--sub-langs",
            langs.as_str(),
            "--convert-subs",
            "srt",
            "--ignore-errors",
            "--yes-playlist",
            "--newline",
            "-o",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.push(template.to_string_lossy().into_owned());

        if let Some(range) = range {
            args.extend(range.to_args());
        }
        args.push(url.to_string());
        args
    }

    /// Download `url` (optionally limited to `range`) into the workspace.
    ///
    /// A non-zero exit status from the tool fails the whole run.
    pub async fn fetch(&self, url: &str, range: Option<&PlaylistRange>) -> Result<FetchOutcome> {
        validate_url(url)?;
        let args = self.build_args(url, range);
        let program = &self.config.tools.yt_dlp;
        info!("Fetching {}", url);
        debug!("{} {}", program, args.join(" "));

        let mut tracker = ProgressTracker::new(self.show_progress);
        let status = run_streaming(program, &args, |line| tracker.handle_line(line)).await?;
        let report = tracker.finish();

        if !status.success() {
            let last_error = report
                .errors
                .last()
                .map(|e| format!(": {}", e))
                .unwrap_or_default();
            return Err(SubfetchError::FetchFailed(format!(
                "{} exited with {}{}",
                program, status, last_error
            )));
        }

        // Only what this run reported; leftovers in the workspace are not ours.
        let videos = reported_videos(&report.files);
        debug!(
            "{} file(s) reported, {} final video(s)",
            report.files.len(),
            videos.len()
        );

        Ok(FetchOutcome { videos, report })
    }

    pub fn caption_args(&self, url: &str, video: &VideoArtifact, lang: &str) -> Vec<String> {
        // The stem is literal text inside an output template.
        let template = video
            .dir()
            .join(format!("{}.%(ext)s", video.stem.replace('%', "%%")));

        let mut args: Vec<String> = [
            "--skip-download",
            "--write-subs",
            "--write-auto-subs",
            "--sub-langs",
            lang,
            "--convert-subs",
            "srt",
            "-o",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.push(template.to_string_lossy().into_owned());

        match video.ordinal {
            Some(ordinal) => {
                args.push("--playlist-items".to_string());
                args.push(ordinal.to_string());
            }
            None => args.push("--no-playlist".to_string()),
        }
        args.push(url.to_string());
        args
    }

    /// Caption-only download for one video, written next to it under its stem.
    pub async fn fetch_captions(&self, url: &str, video: &VideoArtifact, lang: &str) -> Result<()> {
        let args = self.caption_args(url, video, lang);
        let program = &self.config.tools.yt_dlp;
        debug!("{} {}", program, args.join(" "));

        let output = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| SubfetchError::FetchFailed(format!("could not start {}: {}", program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SubfetchError::FetchFailed(format!(
                "caption download exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Run `program`, feeding every line of its interleaved stdout and stderr to
/// `on_line` as it arrives.
async fn run_streaming<F>(program: &str, args: &[String], mut on_line: F) -> Result<ExitStatus>
where
    F: FnMut(&str),
{
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| SubfetchError::FetchFailed(format!("could not start {}: {}", program, e)))?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let mut out = LineSource::new(stdout);
    let mut err = LineSource::new(stderr);

    while out.open || err.open {
        tokio::select! {
            line = out.next(), if out.open => {
                if let Some(line) = line { feed(&line, &mut on_line) }
            }
            line = err.next(), if err.open => {
                if let Some(line) = line { feed(&line, &mut on_line) }
            }
        }
    }

    Ok(child.wait().await?)
}

/// Carriage returns redraw the same terminal line; treat each redraw as a line.
fn feed<F: FnMut(&str)>(line: &str, on_line: &mut F) {
    for part in line.split('\r').filter(|p| !p.trim().is_empty()) {
        on_line(part);
    }
}

/// Lossy line reader over a child pipe. Read errors end the stream.
struct LineSource<R> {
    reader: Option<BufReader<R>>,
    buf: Vec<u8>,
    open: bool,
}

impl<R: AsyncRead + Unpin> LineSource<R> {
    fn new(reader: Option<R>) -> Self {
        Self {
            open: reader.is_some(),
            reader: reader.map(BufReader::new),
            buf: Vec::new(),
        }
    }

    /// Next line, or `None` once the stream is closed.
    ///
    /// Cancel safe: a partially read line stays in `buf`.
    async fn next(&mut self) -> Option<String> {
        let reader = self.reader.as_mut()?;
        match reader.read_until(b'\n', &mut self.buf).await {
            Ok(0) | Err(_) => {
                self.open = false;
                if self.buf.is_empty() {
                    None
                } else {
                    Some(self.take_line())
                }
            }
            Ok(_) => Some(self.take_line()),
        }
    }

    fn take_line(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.buf).trim_end().to_string();
        self.buf.clear();
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            temp_dir: PathBuf::from("/tmp/ws"),
            ..Config::default()
        }
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://www.youtube.com/watch?v=abc").is_ok());
        assert!(validate_url("http://example.com/list").is_ok());
        for bad in ["", "www.youtube.com", "ftp://example.com", "youtube https://x"] {
            assert!(validate_url(bad).unwrap_err().is_usage());
        }
    }

    #[test]
    fn test_ordinal_of() {
        assert_eq!(ordinal_of("002_My Talk"), Some(2));
        assert_eq!(ordinal_of("120_a_b"), Some(120));
        assert_eq!(ordinal_of("My_Talk"), None);
        assert_eq!(ordinal_of("_x"), None);
        assert_eq!(ordinal_of("007"), None);
    }

    #[test]
    fn test_build_args() {
        let config = config();
        let fetcher = Fetcher::new(&config);
        let range: PlaylistRange = "2-3".parse().unwrap();
        let args = fetcher.build_args("https://example.com/list", Some(&range));

        let pos = |flag: &str| args.iter().position(|a| a == flag).unwrap();
        assert_eq!(args[pos("--merge-output-format") + 1], "mkv");
        assert_eq!(args[pos("--sub-langs") + 1], "en,es");
        assert_eq!(
            args[pos("-o") + 1],
            "/tmp/ws/%(playlist_index&{:03d}|001)s_%(title)s.%(ext)s"
        );
        assert_eq!(args[pos("--playlist-start") + 1], "2");
        assert_eq!(args[pos("--playlist-end") + 1], "3");
        assert_eq!(args.last().unwrap(), "https://example.com/list");
    }

    #[test]
    fn test_build_args_without_range() {
        let config = config();
        let args = Fetcher::new(&config).build_args("https://example.com/v", None);
        assert!(!args.iter().any(|a| a.starts_with("--playlist-")));
    }

    #[test]
    fn test_caption_args_target_one_item() {
        let config = config();
        let fetcher = Fetcher::new(&config);
        let video = VideoArtifact::from_path("/tmp/ws/003_100% Real.mkv").unwrap();
        let args = fetcher.caption_args("https://example.com/list", &video, "en");

        let pos = |flag: &str| args.iter().position(|a| a == flag).unwrap();
        assert!(args.contains(&"--skip-download".to_string()));
        assert_eq!(args[pos("--sub-langs") + 1], "en");
        assert_eq!(args[pos("-o") + 1], "/tmp/ws/003_100%% Real.%(ext)s");
        assert_eq!(args[pos("--playlist-items") + 1], "3");
    }

    #[test]
    fn test_list_videos_orders_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "010_Ten.mkv",
            "002_Two.mkv",
            "002_Two.en.srt",
            "003_Three.f137.mp4",
            "004_Four.mkv.part",
            "notes.txt",
        ] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        let videos = list_videos(dir.path(), VIDEO_EXTENSIONS).unwrap();
        let names: Vec<_> = videos.iter().map(|v| v.file_name()).collect();
        assert_eq!(names, ["002_Two.mkv", "010_Ten.mkv"]);
        assert_eq!(videos[0].ordinal, Some(2));
        assert_eq!(videos[0].stem, "002_Two");
    }

    #[test]
    fn test_list_videos_missing_dir() {
        let err = list_videos(Path::new("/nonexistent/subfetch"), VIDEO_EXTENSIONS).unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn test_reported_videos_ignore_unreported_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["001_Old.mkv", "001_New.mkv", "001_New.es.srt", "002_Next.webm"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        let reported = [
            "001_New.f137.mp4",
            "001_New.f251.webm",
            "001_New.es.vtt",
            "001_New.mkv",
            "002_Next.webm",
            "002_Next.webm",
        ]
        .map(|name| dir.path().join(name));

        let videos = reported_videos(&reported);
        let names: Vec<_> = videos.iter().map(|v| v.file_name()).collect();
        assert_eq!(names, ["001_New.mkv", "002_Next.webm"]);
    }

    #[tokio::test]
    async fn test_fetch_rejects_bad_url_without_spawning() {
        let mut config = config();
        config.tools.yt_dlp = "/nonexistent/yt-dlp".to_string();
        let err = Fetcher::new(&config)
            .with_progress(false)
            .fetch("not a url", None)
            .await
            .unwrap_err();
        assert!(matches!(err, SubfetchError::Usage(_)));
    }

    #[tokio::test]
    async fn test_fetch_missing_tool_is_fatal() {
        let mut config = config();
        config.tools.yt_dlp = "/nonexistent/yt-dlp".to_string();
        let err = Fetcher::new(&config)
            .with_progress(false)
            .fetch("https://example.com/v", None)
            .await
            .unwrap_err();
        assert!(matches!(err, SubfetchError::FetchFailed(_)));
    }
}
