//! Classification of a `generateContent` response.
//!
//! The response is read in a fixed order, and each stage only runs once the
//! previous one has held:
//!
//! 1. the body is JSON (else `MalformedEnvelope`, raw body kept),
//! 2. the HTTP status is 2xx (else `InvalidApiKey` or `ApiError`),
//! 3. there is a candidate with text (else `EmptyResponse`),
//! 4. that text is itself a JSON object (else `MalformedPayload`, raw text kept),
//! 5. the object has a verdict, a score in 1..=10 and an explanation
//!    (else `MalformedPayload`).
//!
//! [`interpret`] is a pure function; the same response always yields the same
//! outcome.

use crate::error::{AnalysisFailure, FailureKind};
use crate::gemini::RawTransportResponse;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Substring the service uses when it rejects a credential.
pub const INVALID_KEY_MARKER: &str = "API key not valid";

/// Categorical judgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Verdict {
    Smash,
    Pass,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Smash => "Smash",
            Verdict::Pass => "Pass",
        }
    }

    fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        [Verdict::Smash, Verdict::Pass]
            .into_iter()
            .find(|verdict| verdict.as_str().eq_ignore_ascii_case(tag))
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully validated analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    pub verdict: Verdict,
    /// Always within 1..=10.
    pub score: u8,
    pub explanation: String,
}

/// Classifies one raw response.
pub fn interpret(raw: &RawTransportResponse) -> Result<AnalysisResult, AnalysisFailure> {
    let envelope: Value = serde_json::from_str(&raw.body_text).map_err(|e| {
        AnalysisFailure::new(
            FailureKind::MalformedEnvelope,
            format!(
                "Response (status {}) is not valid JSON: {}",
                raw.http_status, e
            ),
        )
        .with_diagnostic(raw.body_text.clone())
    })?;

    if !(200..300).contains(&raw.http_status) {
        return Err(classify_api_error(raw, &envelope));
    }

    let text = candidate_text(&envelope)?;
    let payload: Value = serde_json::from_str(text).map_err(|e| {
        AnalysisFailure::malformed_payload(format!("Model output is not valid JSON: {}", e), text)
    })?;

    let object = payload
        .as_object()
        .ok_or_else(|| AnalysisFailure::malformed_payload("Model output is not a JSON object", text))?;

    read_result(object).map_err(|message| AnalysisFailure::malformed_payload(message, text))
}

fn classify_api_error(raw: &RawTransportResponse, envelope: &Value) -> AnalysisFailure {
    let remote_message = envelope
        .pointer("/error/message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty());

    if let Some(message) = remote_message {
        if message.contains(INVALID_KEY_MARKER) {
            return AnalysisFailure::new(FailureKind::InvalidApiKey, message);
        }
        return AnalysisFailure::new(FailureKind::ApiError, message);
    }

    // The envelope parsed, so the body is non-empty JSON and always usable here.
    AnalysisFailure::new(FailureKind::ApiError, raw.body_text.as_str())
}

fn candidate_text(envelope: &Value) -> Result<&str, AnalysisFailure> {
    let first = envelope
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first());

    let Some(candidate) = first else {
        let reason = envelope
            .pointer("/promptFeedback/blockReason")
            .and_then(Value::as_str);
        let message = match reason {
            Some(reason) => format!("The model returned no candidates (blocked: {})", reason),
            None => "The model returned no candidates".to_string(),
        };
        return Err(AnalysisFailure::new(FailureKind::EmptyResponse, message));
    };

    candidate
        .pointer("/content/parts/0/text")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            let message = match candidate.get("finishReason").and_then(Value::as_str) {
                Some(reason) => format!("The candidate has no text (finish reason: {})", reason),
                None => "The candidate has no text".to_string(),
            };
            AnalysisFailure::new(FailureKind::EmptyResponse, message)
        })
}

fn read_result(object: &Map<String, Value>) -> Result<AnalysisResult, String> {
    let verdict_tag = object
        .get("verdict")
        .and_then(Value::as_str)
        .ok_or("Missing or non-string field: verdict")?;
    let verdict = Verdict::parse(verdict_tag)
        .ok_or_else(|| format!("Unrecognized verdict: {}", verdict_tag))?;

    // `score` is canonical; some instructions make the model answer with `rating`.
    let score_value = object
        .get("score")
        .or_else(|| object.get("rating"))
        .ok_or("Missing field: score")?;
    let score = read_score(score_value)?;

    let explanation = object
        .get("explanation")
        .and_then(Value::as_str)
        .ok_or("Missing or non-string field: explanation")?;

    Ok(AnalysisResult {
        verdict,
        score,
        explanation: explanation.to_string(),
    })
}

fn read_score(value: &Value) -> Result<u8, String> {
    let whole = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        _ => None,
    }
    .ok_or_else(|| format!("Score is not an integer: {}", value))?;

    u8::try_from(whole)
        .ok()
        .filter(|score| (1..=10).contains(score))
        .ok_or_else(|| format!("Score out of range 1-10: {}", whole))
}
