//! Error types for the smashpass-core library.
//!
//! Two families live here. [`AppError`] covers ambient failures (configuration,
//! settings and catalog files, serialization) that happen outside an analysis run.
//! [`AnalysisFailure`] is the classified, terminal outcome of a single run and is
//! what the presenter ends up showing.

use crate::catalog::{LabelSet, Mode};
use std::fmt;
use thiserror::Error;

/// Errors that can occur outside of an analysis run.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (missing keys, invalid values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required environment variable was not found.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// The instruction/label catalog is incomplete or unreadable.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// A value could not be parsed into one of the selectable axes.
    #[error("Unknown {axis}: {value}")]
    UnknownChoice { axis: &'static str, value: String },

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a catalog error with the given message.
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }
}

/// A convenient alias for Result with [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;

/// Classification of a failed analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The remote service rejected the credential.
    InvalidApiKey,
    /// Any other error reported by the remote service.
    ApiError,
    /// The call succeeded but the model returned nothing to read.
    EmptyResponse,
    /// The transport body was not JSON.
    MalformedEnvelope,
    /// The model's text was not the expected JSON object.
    MalformedPayload,
    /// The network call itself failed.
    TransportError,
    /// No instruction text exists for the selected (mode, language).
    ConfigurationMissing,
    /// The image could not be read.
    ImageRead,
    /// The input is readable but is not a recognized image.
    UnsupportedImage,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidApiKey => "invalid API key",
            Self::ApiError => "API error",
            Self::EmptyResponse => "empty response",
            Self::MalformedEnvelope => "malformed response envelope",
            Self::MalformedPayload => "malformed model payload",
            Self::TransportError => "transport error",
            Self::ConfigurationMissing => "configuration missing",
            Self::ImageRead => "image read error",
            Self::UnsupportedImage => "unsupported image",
        };
        f.write_str(name)
    }
}

/// Terminal failure of one analysis run.
///
/// `diagnostic` keeps the raw text that failed to parse, when there was any.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct AnalysisFailure {
    pub kind: FailureKind,
    pub message: String,
    pub diagnostic: Option<String>,
}

impl AnalysisFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            diagnostic: None,
        }
    }

    /// Attaches the raw text that could not be interpreted.
    pub fn with_diagnostic(mut self, raw: impl Into<String>) -> Self {
        self.diagnostic = Some(raw.into());
        self
    }

    pub fn configuration_missing(mode: Mode) -> Self {
        Self::new(
            FailureKind::ConfigurationMissing,
            format!("System prompt for mode \"{}\" not found.", mode.title()),
        )
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::new(FailureKind::TransportError, msg)
    }

    pub fn malformed_payload(msg: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::new(FailureKind::MalformedPayload, msg).with_diagnostic(raw)
    }

    /// Message to show the user, localized where the label set has wording
    /// for this kind.
    pub fn user_message(&self, labels: &LabelSet, mode: Mode) -> String {
        match self.kind {
            FailureKind::InvalidApiKey => labels.api_key_invalid_error.clone(),
            FailureKind::EmptyResponse => labels.model_error.clone(),
            FailureKind::ConfigurationMissing => labels.prompt_error(mode),
            _ => self.message.clone(),
        }
    }
}
