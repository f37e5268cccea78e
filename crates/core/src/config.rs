use crate::error::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::fmt;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub model_name: String,
    pub base_url: String,
}

// Keep the credential out of debug logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("gemini_api_key", &"<redacted>")
            .field("model_name", &self.model_name)
            .field("base_url", &self.base_url)
            .finish()
    }
}

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const MODEL_VAR: &str = "GEMINI_MODEL";
pub const BASE_URL_VAR: &str = "GEMINI_BASE_URL";

impl Config {
    /// Starts a builder from the environment, after loading `.env` if present.
    ///
    /// Callers layer their own overrides (CLI flags, saved settings) on top
    /// before calling [`ConfigBuilder::build`].
    pub fn from_env() -> ConfigBuilder {
        // Load .env file if it exists, ignore if it doesn't
        let _ = dotenv();
        ConfigBuilder::from_lookup(|name| env::var(name).ok())
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

#[derive(Default)]
pub struct ConfigBuilder {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
}

impl ConfigBuilder {
    /// Fills the builder from named variables. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        Self {
            api_key: read(API_KEY_VAR),
            model: read(MODEL_VAR),
            base_url: read(BASE_URL_VAR),
        }
    }

    /// Uses `model` only if nothing set one yet.
    pub fn or_model(mut self, model: impl Into<String>) -> Self {
        if self.model.is_none() {
            self.model = Some(model.into());
        }
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// The credential only has to be non-empty; blank model or base URL fall
    /// back to the defaults.
    pub fn build(self) -> Result<Config> {
        let api_key = self
            .api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::MissingEnvVar(API_KEY_VAR.to_string()))?;

        let model_name = self
            .model
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let base_url = self
            .base_url
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Config {
            gemini_api_key: api_key,
            model_name,
            base_url,
        })
    }
}
