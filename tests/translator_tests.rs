//! Translator tests against mock HTTP endpoints.
//!
//! No test here reaches the real translation service.

use serde_json::json;
use subfetch::config::Config;
use subfetch::subtitle::SrtDocument;
use subfetch::translate::{translate_caption_file, GoogleTranslator, TranslationSource, Translator};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn translator_for(server: &MockServer) -> GoogleTranslator {
    GoogleTranslator::new(&Config::default())
        .unwrap()
        .with_endpoints(format!("{}/single", server.uri()), format!("{}/t", server.uri()))
}

#[tokio::test]
async fn test_primary_endpoint_answers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/single"))
        .and(query_param("client", "gtx"))
        .and(query_param("sl", "en"))
        .and(query_param("tl", "es"))
        .and(query_param("q", "Good morning"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([[["Buenos días", "Good morning", null, null, 10]], null, "en"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = translator_for(&server).translate("Good morning", "en", "es").await;

    assert_eq!(result.text, "Buenos días");
    assert_eq!(result.source, TranslationSource::Primary);
}

#[tokio::test]
async fn test_fallback_used_when_primary_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/single"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/t"))
        .and(query_param("client", "dict-chrome-ex"))
        .and(query_param("q", "Good night"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([["Buenas noches", "en"]])))
        .expect(1)
        .mount(&server)
        .await;

    let result = translator_for(&server).translate("Good night", "en", "es").await;

    assert_eq!(result.text, "Buenas noches");
    assert_eq!(result.source, TranslationSource::Fallback);
}

#[tokio::test]
async fn test_unexpected_primary_shape_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/single"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "quota"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/t"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["Hola"])))
        .mount(&server)
        .await;

    let result = translator_for(&server).translate("Hello", "en", "es").await;

    assert_eq!(result.text, "Hola");
    assert_eq!(result.source, TranslationSource::Fallback);
}

#[tokio::test]
async fn test_both_endpoints_down_passes_text_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = translator_for(&server).translate("Keep me", "en", "es").await;

    assert_eq!(result.text, "Keep me");
    assert_eq!(result.source, TranslationSource::Passthrough);
    assert!(!result.is_translated());
}

#[tokio::test]
async fn test_caption_file_keeps_structure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/single"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[["HOLA", "x"]]])))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let caption = dir.path().join("004_Lecture.en.srt");
    let original = "1\n00:00:01,000 --> 00:00:03,000\nFirst line\nsecond line\n\n\
                    2\n00:00:03,500 --> 00:00:05,000\n<i>Italic</i>\n\n\
                    3\n00:00:06,000 --> 00:00:07,000\nLast\n";
    std::fs::write(&caption, original).unwrap();

    let translator = translator_for(&server);
    let result = translate_caption_file(&caption, &translator, &Config::default(), "en", false)
        .await
        .unwrap();

    assert_eq!(result.path, dir.path().join("004_Lecture.es.srt"));
    assert_eq!(result.stats.requests, 3);
    assert_eq!(result.stats.translated, 3);

    let before = SrtDocument::parse(original);
    let after = SrtDocument::parse(&std::fs::read_to_string(&result.path).unwrap());
    assert_eq!(after.blocks.len(), before.blocks.len());
    for (a, b) in before.blocks.iter().zip(&after.blocks) {
        assert_eq!(a.header(), b.header());
        assert_eq!(b.text_lines(), ["HOLA"]);
    }
}

#[tokio::test]
async fn test_latin1_caption_is_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let caption = dir.path().join("005_Cafe.en.srt");
    let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode(
        "1\n00:00:01,000 --> 00:00:02,000\nCeci est un café très célèbre, déjà vu à la télé.\n",
    );
    std::fs::write(&caption, &bytes).unwrap();

    let translator = translator_for(&server);
    let result = translate_caption_file(&caption, &translator, &Config::default(), "en", false)
        .await
        .unwrap();

    // Nothing translated, but the copy is valid UTF-8
    let written = std::fs::read_to_string(&result.path).unwrap();
    assert!(written.contains("café"));
    assert_eq!(result.stats.passthrough, 1);
}
