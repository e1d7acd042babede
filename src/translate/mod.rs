pub mod captions;
pub mod detect;
pub mod google;

pub use captions::{
    translate_caption_file, translate_document, translate_parsed, translated_caption_path,
    TranslatedCaption, TranslationStats,
};
pub use detect::detect_language;
pub use google::GoogleTranslator;

use async_trait::async_trait;

/// Which endpoint produced a translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationSource {
    Primary,
    Fallback,
    /// Nothing answered; the text is the untranslated input.
    Passthrough,
}

/// Result of one translation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    pub source: TranslationSource,
}

impl Translation {
    pub fn passthrough(text: &str) -> Self {
        Self {
            text: text.to_string(),
            source: TranslationSource::Passthrough,
        }
    }

    pub fn is_translated(&self) -> bool {
        self.source != TranslationSource::Passthrough
    }
}

/// Text-to-text translation that never fails: when every backend is
/// unavailable the input comes back unchanged.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Translation;
    fn name(&self) -> &'static str;
}
