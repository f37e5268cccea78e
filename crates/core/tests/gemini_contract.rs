//! Gemini Contract Tests
//!
//! These tests run the real transport against a mock server and verify:
//! - the request line, query string and JSON body match the generateContent contract
//! - HTTP failures come back as raw responses and are classified by the interpreter
//! - network failures are reported as transport errors
//! - a full session run ends with a rendered verdict

use pretty_assertions::assert_eq;
use serde_json::json;
use smashpass_core::catalog::{LabelSet, Language, Mode};
use smashpass_core::gemini::{GeminiClient, Transport};
use smashpass_core::image_processing::{EncodedImage, ImageSource};
use smashpass_core::interpreter::interpret;
use smashpass_core::presenter::{Presenter, UiState};
use smashpass_core::request::RequestBuilder;
use smashpass_core::{Catalog, Config, FailureKind, Session, TriggerOutcome, Verdict};
use std::io::Write;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "gemini-2.5-flash";
const ENDPOINT: &str = "/v1beta/models/gemini-2.5-flash:generateContent";
const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13, 9, 9];

fn encoded() -> EncodedImage {
    EncodedImage {
        mime_type: "image/png".to_string(),
        bytes_base64: "iVBORw0KGgoAAAANCQk=".to_string(),
    }
}

fn verdict_body(text: &str) -> serde_json::Value {
    json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
}

// ────────────────────────────────────────────────────────────────────────────
// Request Format
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_request_matches_contract() {
    let mock_server = MockServer::start().await;
    let catalog = Catalog::builtin();
    let instruction = catalog
        .lookup_instruction(Mode::Detailed, Language::English)
        .unwrap()
        .to_string();

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(query_param("key", "test-key"))
        .and(body_json(json!({
            "system_instruction": { "parts": [{ "text": instruction }] },
            "contents": [{ "parts": [
                { "text": "Analyze the attached image based on your instructions." },
                { "inline_data": { "mime_type": "image/png", "data": "iVBORw0KGgoAAAANCQk=" } }
            ]}],
            "generation_config": { "response_mime_type": "application/json" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(verdict_body(
            r#"{"verdict":"Pass","score":4,"explanation":"Meh."}"#,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GeminiClient::with_base_url(&mock_server.uri()).unwrap();
    let request = RequestBuilder::new(&catalog)
        .build(encoded(), Mode::Detailed, Language::English, MODEL)
        .unwrap();

    let raw = client.send("test-key", &request).await.unwrap();
    assert_eq!(raw.http_status, 200);

    let result = interpret(&raw).unwrap();
    assert_eq!(result.verdict, Verdict::Pass);
    assert_eq!(result.score, 4);
}

// ────────────────────────────────────────────────────────────────────────────
// Status Handling
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_error_status_is_returned_raw() {
    let mock_server = MockServer::start().await;
    let body = json!({
        "error": {
            "code": 400,
            "message": "API key not valid. Please pass a valid API key.",
            "status": "INVALID_ARGUMENT"
        }
    });

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(400).set_body_json(body.clone()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GeminiClient::with_base_url(&mock_server.uri()).unwrap();
    let request = RequestBuilder::new(&Catalog::builtin())
        .build(encoded(), Mode::Concise, Language::English, MODEL)
        .unwrap();

    let raw = client.send("bad-key", &request).await.unwrap();
    assert_eq!(raw.http_status, 400);
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&raw.body_text).unwrap(),
        body
    );
    assert_eq!(interpret(&raw).unwrap_err().kind, FailureKind::InvalidApiKey);
}

#[tokio::test]
async fn test_non_json_gateway_page() {
    let mock_server = MockServer::start().await;
    let page = "<html><body>upstream connect error</body></html>";

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string(page))
        .mount(&mock_server)
        .await;

    let client = GeminiClient::with_base_url(&mock_server.uri()).unwrap();
    let request = RequestBuilder::new(&Catalog::builtin())
        .build(encoded(), Mode::Concise, Language::English, MODEL)
        .unwrap();

    let failure = interpret(&client.send("k", &request).await.unwrap()).unwrap_err();
    assert_eq!(failure.kind, FailureKind::MalformedEnvelope);
    assert_eq!(failure.diagnostic.as_deref(), Some(page));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Nothing listens once the listener is dropped.
    let uri = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };

    let client = GeminiClient::with_base_url(&uri).unwrap();
    let request = RequestBuilder::new(&Catalog::builtin())
        .build(encoded(), Mode::Concise, Language::English, MODEL)
        .unwrap();

    let failure = client.send("secret-key", &request).await.unwrap_err();
    assert_eq!(failure.kind, FailureKind::TransportError);
    assert!(!failure.message.contains("secret-key"));
}

// ────────────────────────────────────────────────────────────────────────────
// Full Session
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Recorder {
    states: Mutex<Vec<UiState>>,
}

impl Presenter for Recorder {
    fn render(&self, state: &UiState, _labels: &LabelSet) {
        self.states.lock().unwrap().push(state.clone());
    }
}

#[tokio::test]
async fn test_session_end_to_end_from_file() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(query_param("key", "file-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(verdict_body(
            r#"{"verdict":"Smash","rating":9,"explanation":"Great composition."}"#,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    file.write_all(PNG).unwrap();

    let config = Config::builder()
        .with_api_key("file-key")
        .with_model(MODEL)
        .with_base_url(mock_server.uri())
        .build()
        .unwrap();
    let session = Session::from_config(
        &config,
        Arc::new(Catalog::builtin()),
        Recorder::default(),
        Mode::Comprehensive,
        Language::Chinese,
    )
    .unwrap();
    session.select_image(Some(ImageSource::file(file.path())));

    let outcome = session.trigger().await;
    let TriggerOutcome::Completed(Ok(result)) = outcome.clone() else {
        panic!("expected a verdict, got {:?}", outcome);
    };
    assert_eq!(result.verdict, Verdict::Smash);
    assert_eq!(result.score, 9);
    assert_eq!(result.explanation, "Great composition.");

    let states = session.presenter().states.lock().unwrap().clone();
    assert_eq!(states, vec![UiState::Loading, UiState::Result(result)]);
    assert!(!session.is_processing());
}

#[tokio::test]
async fn test_session_reports_empty_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [],
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .mount(&mock_server)
        .await;

    let config = Config::builder()
        .with_api_key("k")
        .with_base_url(mock_server.uri())
        .build()
        .unwrap();
    let catalog = Arc::new(Catalog::builtin());
    let session = Session::from_config(
        &config,
        Arc::clone(&catalog),
        Recorder::default(),
        Mode::Concise,
        Language::English,
    )
    .unwrap();
    session.select_image(Some(ImageSource::bytes(PNG.to_vec())));

    let TriggerOutcome::Completed(Err(failure)) = session.trigger().await else {
        panic!("expected a failure");
    };
    assert_eq!(failure.kind, FailureKind::EmptyResponse);
    assert!(failure.message.contains("SAFETY"));

    let last = session.presenter().states.lock().unwrap().last().cloned();
    assert_eq!(
        last,
        Some(UiState::Error {
            kind: Some(FailureKind::EmptyResponse),
            message: catalog.labels(Language::English).model_error.clone(),
            diagnostic: None,
        })
    );
}
