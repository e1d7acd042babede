use crate::subtitle::SrtDocument;
use whatlang::Lang;

/// Detect the language of a caption document from its first text lines.
///
/// Returns a two-letter code where one is known, the ISO 639-3 code
/// otherwise, and `None` when there is nothing to detect from.
pub fn detect_language(doc: &SrtDocument, sample_lines: usize) -> Option<String> {
    let sample = doc.text().take(sample_lines).collect::<Vec<_>>().join(" ");
    if sample.trim().is_empty() {
        return None;
    }

    let info = whatlang::detect(&sample)?;
    Some(short_code(info.lang()))
}

fn short_code(lang: Lang) -> String {
    let code = match lang {
        Lang::Eng => "en",
        Lang::Spa => "es",
        Lang::Fra => "fr",
        Lang::Deu => "de",
        Lang::Ita => "it",
        Lang::Por => "pt",
        Lang::Rus => "ru",
        Lang::Jpn => "ja",
        Lang::Kor => "ko",
        Lang::Cmn => "zh",
        Lang::Ara => "ar",
        Lang::Hin => "hi",
        Lang::Nld => "nl",
        Lang::Pol => "pl",
        Lang::Tur => "tr",
        Lang::Ukr => "uk",
        Lang::Swe => "sv",
        Lang::Vie => "vi",
        other => other.code(),
    };
    code.to_string()
}
