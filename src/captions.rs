//! Pairing caption files with videos by filename stem.
//!
//! Captions are named `{stem}.{tag}.srt` where the tag starts with a language
//! code and may carry a region (`en-US`) or an auto-generated marker
//! (`en.auto`, `en-orig`).

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionKind {
    Manual,
    Auto,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionFile {
    pub path: PathBuf,
    pub lang: String,
    pub kind: CaptionKind,
}

/// What the locator found for one video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptionChoice {
    /// Already in the target language.
    Ready(CaptionFile),
    /// Source-language caption that must be translated first.
    NeedsTranslation(CaptionFile),
    Missing,
}

/// Classify `file_name` as a caption of `stem` in `lang`.
pub fn classify(file_name: &str, stem: &str, lang: &str) -> Option<CaptionKind> {
    let rest = file_name.strip_prefix(stem)?.strip_prefix('.')?;
    let tag = rest
        .strip_suffix(".srt")
        .or_else(|| rest.strip_suffix(".SRT"))?;

    let mut parts = tag.split('.');
    let code = parts.next()?.to_lowercase();
    let lang = lang.to_lowercase();

    let region = if code == lang {
        ""
    } else {
        code.strip_prefix(&lang)?.strip_prefix('-')?
    };

    let auto = region == "orig" || parts.any(|p| p.eq_ignore_ascii_case("auto"));
    Some(if auto {
        CaptionKind::Auto
    } else {
        CaptionKind::Manual
    })
}

/// Captions for `stem` in `lang` found in `dir`, in file name order.
pub fn candidates(dir: &Path, stem: &str, lang: &str) -> Result<Vec<CaptionFile>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(kind) = classify(name, stem, lang) {
            found.push(CaptionFile {
                path: path.clone(),
                lang: lang.to_string(),
                kind,
            });
        }
    }
    found.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(found)
}

/// Pick the caption for `stem`, first match wins:
///
/// 1. target-language manual
/// 2. source-language manual (needs translation)
/// 3. target-language auto-generated
/// 4. source-language auto-generated (needs translation)
pub fn locate(dir: &Path, stem: &str, source_lang: &str, target_lang: &str) -> Result<CaptionChoice> {
    let target = candidates(dir, stem, target_lang)?;
    let source = if source_lang.eq_ignore_ascii_case(target_lang) {
        Vec::new()
    } else {
        candidates(dir, stem, source_lang)?
    };

    let pick = |files: &[CaptionFile], kind: CaptionKind| {
        files.iter().find(|c| c.kind == kind).cloned()
    };

    if let Some(c) = pick(&target, CaptionKind::Manual) {
        return Ok(CaptionChoice::Ready(c));
    }
    if let Some(c) = pick(&source, CaptionKind::Manual) {
        return Ok(CaptionChoice::NeedsTranslation(c));
    }
    if let Some(c) = pick(&target, CaptionKind::Auto) {
        return Ok(CaptionChoice::Ready(c));
    }
    if let Some(c) = pick(&source, CaptionKind::Auto) {
        return Ok(CaptionChoice::NeedsTranslation(c));
    }
    Ok(CaptionChoice::Missing)
}
