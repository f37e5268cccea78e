//! SmashPass Core Library
//!
//! This library submits one image to Google's Gemini API and turns the reply
//! into a structured verdict: a categorical judgement, a score from 1 to 10 and
//! a free-text explanation, in the selected UI language and analysis mode.
//!
//! # Overview
//!
//! A run flows through these pieces, leaf-first:
//!
//! - **Catalog**: instruction text per (mode, language) and UI labels, via [`catalog`]
//! - **Image Encoding**: reading and base64-encoding the image, via [`image_processing`]
//! - **Request Building**: the exact `generateContent` body, via [`request`]
//! - **Transport**: the single HTTP call, via [`gemini`]
//! - **Interpretation**: classifying the two-layer JSON reply, via [`interpreter`]
//! - **Session**: at most one run at a time, driving a [`presenter::Presenter`], via [`session`]
//!
//! # Quick Start
//!
//! ```ignore
//! use smashpass_core::{Catalog, Config, ImageSource, Session};
//! use smashpass_core::catalog::{Language, Mode};
//! use smashpass_core::presenter::NullPresenter;
//! use std::sync::Arc;
//!
//! let config = Config::from_env().build()?;
//! let session = Session::from_config(
//!     &config,
//!     Arc::new(Catalog::builtin()),
//!     NullPresenter,
//!     Mode::Concise,
//!     Language::English,
//! )?;
//! session.select_image(Some(ImageSource::file("photo.jpg")));
//! let outcome = session.trigger().await;
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod gemini;
pub mod image_processing;
pub mod interpreter;
pub mod presenter;
pub mod request;
pub mod session;
pub mod settings;

// Re-export primary types for convenience
pub use catalog::Catalog;
pub use config::Config;
pub use error::{AnalysisFailure, AppError, FailureKind, Result};
pub use gemini::{GeminiClient, Transport};
pub use image_processing::ImageSource;
pub use interpreter::{AnalysisResult, Verdict};
pub use session::{Rejection, Session, TriggerOutcome};
