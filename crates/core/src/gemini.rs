//! Gemini REST transport.
//!
//! One POST per run, no retries. A non-2xx status is not an error at this
//! layer: it comes back as a [`RawTransportResponse`] for the interpreter to
//! classify. Only network-level failures (DNS, refused connection, broken body
//! stream) become `TransportError`.

use crate::config::Config;
use crate::error::{AnalysisFailure, AppError, Result};
use crate::request::AnalysisRequest;
use async_trait::async_trait;
use tracing::debug;
use url::Url;

/// Status and body exactly as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTransportResponse {
    pub http_status: u16,
    pub body_text: String,
}

/// Performs the single outbound call of a run.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        api_key: &str,
        request: &AnalysisRequest,
    ) -> std::result::Result<RawTransportResponse, AnalysisFailure>;
}

pub struct GeminiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(&config.base_url)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("Invalid base URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::config(format!(
                "Invalid base URL: {} cannot be a base",
                base_url
            )));
        }

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http, base_url })
    }

    /// `{base}/v1beta/models/{model}:generateContent?key={key}`
    pub fn endpoint(&self, model_id: &str, api_key: &str) -> Url {
        let model = model_id.strip_prefix("models/").unwrap_or(model_id);

        let method = format!("{}:generateContent", model);

        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["v1beta", "models", method.as_str()]);
        }
        url.query_pairs_mut().clear().append_pair("key", api_key);
        url
    }
}

#[async_trait]
impl Transport for GeminiClient {
    async fn send(
        &self,
        api_key: &str,
        request: &AnalysisRequest,
    ) -> std::result::Result<RawTransportResponse, AnalysisFailure> {
        let url = self.endpoint(&request.model_id, api_key);
        debug!(model = %request.model_id, "sending generateContent request");

        let response = self
            .http
            .post(url)
            .json(&request.body())
            .send()
            .await
            .map_err(|e| AnalysisFailure::transport(describe(e)))?;

        let http_status = response.status().as_u16();
        let body_text = response
            .text()
            .await
            .map_err(|e| AnalysisFailure::transport(describe(e)))?;

        debug!(status = http_status, bytes = body_text.len(), "response received");
        Ok(RawTransportResponse {
            http_status,
            body_text,
        })
    }
}

// reqwest errors carry the request URL, which holds the key.
fn describe(err: reqwest::Error) -> String {
    let kind = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connection failed"
    } else if err.is_body() || err.is_decode() {
        "response body could not be read"
    } else {
        "request failed"
    };
    format!("Network error: {} ({})", kind, err.without_url())
}
