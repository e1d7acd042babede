use crate::config::{Config, TranslateMode};
use crate::error::Result;
use crate::subtitle::{read_caption, SrtBlock, SrtDocument};
use crate::translate::Translator;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Counters from translating one caption document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslationStats {
    pub requests: usize,
    pub translated: usize,
    /// Requests that came back untranslated.
    pub passthrough: usize,
}

#[derive(Debug)]
pub struct TranslatedCaption {
    pub path: PathBuf,
    pub stats: TranslationStats,
}

/// Translate the text lines of `doc`, keeping every index and timing line.
///
/// In [`TranslateMode::Block`] a cue's text lines are sent as one request and
/// the block count is preserved. In [`TranslateMode::Line`] every text line is
/// sent on its own and the line count is preserved too.
pub async fn translate_document(
    doc: &SrtDocument,
    translator: &dyn Translator,
    source_lang: &str,
    target_lang: &str,
    mode: TranslateMode,
    progress: &ProgressBar,
) -> (SrtDocument, TranslationStats) {
    let mut stats = TranslationStats::default();
    let mut blocks = Vec::with_capacity(doc.blocks.len());

    for block in &doc.blocks {
        if !block.is_cue() {
            blocks.push(block.clone());
            progress.inc(1);
            continue;
        }

        let text = match mode {
            TranslateMode::Block => {
                translate_block(block, translator, source_lang, target_lang, &mut stats).await
            }
            TranslateMode::Line => {
                translate_lines(block, translator, source_lang, target_lang, &mut stats).await
            }
        };

        blocks.push(block.with_text_lines(text));
        progress.inc(1);
    }

    (SrtDocument { blocks }, stats)
}

async fn translate_block(
    block: &SrtBlock,
    translator: &dyn Translator,
    source_lang: &str,
    target_lang: &str,
    stats: &mut TranslationStats,
) -> Vec<String> {
    let text = block.text_lines().join("\n");
    let result = translator.translate(&text, source_lang, target_lang).await;
    record(stats, result.is_translated());

    let lines: Vec<String> = result
        .text
        .lines()
        .map(|l| l.trim_end().to_string())
        .filter(|l| !l.is_empty())
        .collect();

    if lines.is_empty() {
        block.text_lines().to_vec()
    } else {
        lines
    }
}

async fn translate_lines(
    block: &SrtBlock,
    translator: &dyn Translator,
    source_lang: &str,
    target_lang: &str,
    stats: &mut TranslationStats,
) -> Vec<String> {
    let mut lines = Vec::with_capacity(block.text_lines().len());

    for line in block.text_lines() {
        let result = translator.translate(line, source_lang, target_lang).await;
        record(stats, result.is_translated());

        // One line in, one line out.
        let flattened = result.text.lines().map(str::trim).collect::<Vec<_>>().join(" ");
        if flattened.trim().is_empty() {
            lines.push(line.clone());
        } else {
            lines.push(flattened);
        }
    }

    lines
}

fn record(stats: &mut TranslationStats, translated: bool) {
    stats.requests += 1;
    if translated {
        stats.translated += 1;
    } else {
        stats.passthrough += 1;
    }
}

/// Name of the translated copy of `caption`.
///
/// A trailing `.{source}` tag (optionally region-suffixed or followed by
/// `.auto`) is replaced by the target tag; otherwise the target tag is
/// appended: `001_talk.en.srt` becomes `001_talk.es.srt` and `movie.srt`
/// becomes `movie.es.srt`.
pub fn translated_caption_path(caption: &Path, source_lang: &str, target_lang: &str) -> PathBuf {
    let file_name = caption
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut base = file_name
        .strip_suffix(".srt")
        .or_else(|| file_name.strip_suffix(".SRT"))
        .unwrap_or(&file_name)
        .to_string();

    if let Some(stripped) = base.strip_suffix(".auto") {
        base = stripped.to_string();
    }
    if let Some((head, tag)) = base.rsplit_once('.') {
        let tag = tag.to_lowercase();
        let source = source_lang.to_lowercase();
        if tag == source || tag.starts_with(&format!("{source}-")) {
            base = head.to_string();
        }
    }

    caption.with_file_name(format!("{base}.{target_lang}.srt"))
}

/// Decode, translate and write a caption file next to the original.
///
/// The output is always UTF-8. A file that cannot be decoded is an error for
/// this file only.
pub async fn translate_caption_file(
    caption: &Path,
    translator: &dyn Translator,
    config: &Config,
    source_lang: &str,
    show_progress: bool,
) -> Result<TranslatedCaption> {
    let content = read_caption(caption)?;
    let doc = SrtDocument::parse(&content);
    translate_parsed(&doc, caption, translator, config, source_lang, show_progress).await
}

/// Translate an already parsed `caption` and write the result next to it.
pub async fn translate_parsed(
    doc: &SrtDocument,
    caption: &Path,
    translator: &dyn Translator,
    config: &Config,
    source_lang: &str,
    show_progress: bool,
) -> Result<TranslatedCaption> {
    debug!(
        "Parsed {}: {} blocks, {} text lines",
        caption.display(),
        doc.blocks.len(),
        doc.text_line_count()
    );

    let progress = if show_progress {
        let pb = ProgressBar::new(doc.blocks.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{msg} [{bar:40.magenta/blue}] {pos}/{len}")
        {
            pb.set_style(style.progress_chars("█▓░"));
        }
        pb.set_message("Translating captions");
        pb
    } else {
        ProgressBar::hidden()
    };

    let (translated, stats) = translate_document(
        doc,
        translator,
        source_lang,
        &config.target_lang,
        config.translate_mode,
        &progress,
    )
    .await;
    progress.finish_and_clear();

    let output = translated_caption_path(caption, source_lang, &config.target_lang);
    fs::write(&output, translated.render())?;

    info!(
        "Translated {} ({} of {} requests translated) -> {}",
        caption.display(),
        stats.translated,
        stats.requests,
        output.display()
    );

    Ok(TranslatedCaption {
        path: output,
        stats,
    })
}
