//! Translation through the public Google Translate web endpoints.

use crate::config::Config;
use crate::error::{Result, SubfetchError};
use crate::translate::{Translation, TranslationSource, Translator};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

/// Translator with a primary endpoint and a single fallback endpoint.
pub struct GoogleTranslator {
    client: Client,
    primary_url: String,
    fallback_url: String,
}

impl GoogleTranslator {
    /// Create a translator using the endpoints and timeout from `config`.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            primary_url: config.primary_endpoint.clone(),
            fallback_url: config.fallback_endpoint.clone(),
        })
    }

    /// Point the translator at different endpoints.
    pub fn with_endpoints(mut self, primary: impl Into<String>, fallback: impl Into<String>) -> Self {
        self.primary_url = primary.into();
        self.fallback_url = fallback.into();
        self
    }

    async fn request_primary(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let body = self
            .get(
                &self.primary_url,
                &[
                    ("client", "gtx"),
                    ("sl", source),
                    ("tl", target),
                    ("dt", "t"),
                    ("format", "text"),
                    ("q", text),
                ],
            )
            .await?;
        parse_nested_response(&body)
            .ok_or_else(|| SubfetchError::Translation("unexpected primary response shape".to_string()))
    }

    async fn request_fallback(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let body = self
            .get(
                &self.fallback_url,
                &[
                    ("client", "dict-chrome-ex"),
                    ("sl", source),
                    ("tl", target),
                    ("format", "text"),
                    ("q", text),
                ],
            )
            .await?;
        parse_flat_response(&body)
            .ok_or_else(|| SubfetchError::Translation("unexpected fallback response shape".to_string()))
    }

    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<Value> {
        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(SubfetchError::Translation(format!(
                "endpoint returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Translation {
        if text.trim().is_empty() {
            return Translation::passthrough(text);
        }

        match self.request_primary(text, source_lang, target_lang).await {
            Ok(translated) => {
                return Translation {
                    text: translated,
                    source: TranslationSource::Primary,
                }
            }
            Err(e) => debug!("Primary translation endpoint failed: {}", e),
        }

        match self.request_fallback(text, source_lang, target_lang).await {
            Ok(translated) => Translation {
                text: translated,
                source: TranslationSource::Fallback,
            },
            Err(e) => {
                warn!("Translation failed, keeping original text: {}", e);
                Translation::passthrough(text)
            }
        }
    }

    fn name(&self) -> &'static str {
        "google"
    }
}

/// `[[["hola","hello",...],["mundo","world",...]],...]`
///
/// Long inputs come back split into sentences; the pieces are concatenated.
fn parse_nested_response(value: &Value) -> Option<String> {
    let segments = value.get(0)?.as_array()?;
    let text: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// `["hola"]` or `[["hola","en"]]`
fn parse_flat_response(value: &Value) -> Option<String> {
    let first = match value {
        Value::Array(items) => items.first()?,
        other => other,
    };

    match first {
        Value::String(s) => Some(s.clone()),
        Value::Array(inner) => inner.first()?.as_str().map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_nested_single_segment() {
        let value = json!([[["Hola mundo", "Hello world", null, null, 10]], null, "en"]);
        assert_eq!(parse_nested_response(&value).as_deref(), Some("Hola mundo"));
    }

    #[test]
    fn test_parse_nested_joins_sentences() {
        let value = json!([[["Hola. ", "Hello. "], ["Adiós.", "Bye."]], null, "en"]);
        assert_eq!(parse_nested_response(&value).as_deref(), Some("Hola. Adiós."));
    }

    #[test]
    fn test_parse_nested_rejects_other_shapes() {
        assert!(parse_nested_response(&json!({"error": "quota"})).is_none());
        assert!(parse_nested_response(&json!([[]])).is_none());
    }

    #[test]
    fn test_parse_flat_shapes() {
        assert_eq!(parse_flat_response(&json!(["Hola"])).as_deref(), Some("Hola"));
        assert_eq!(parse_flat_response(&json!([["Hola", "en"]])).as_deref(), Some("Hola"));
        assert!(parse_flat_response(&json!([])).is_none());
        assert!(parse_flat_response(&json!([42])).is_none());
    }

    #[test]
    fn test_translator_creation() {
        let translator = GoogleTranslator::new(&Config::default()).unwrap();
        assert_eq!(translator.name(), "google");
        assert!(translator.primary_url.contains("translate_a/single"));

        let translator = translator.with_endpoints("http://a/single", "http://b/t");
        assert_eq!(translator.primary_url, "http://a/single");
        assert_eq!(translator.fallback_url, "http://b/t");
    }

    #[test]
    fn test_blank_text_skips_requests() {
        let translator = GoogleTranslator::new(&Config::default())
            .unwrap()
            .with_endpoints("http://127.0.0.1:9/single", "http://127.0.0.1:9/t");
        let result = tokio_test::block_on(translator.translate("   ", "en", "es"));
        assert_eq!(result, Translation::passthrough("   "));
    }
}
