//! The session controller.
//!
//! A [`Session`] owns the run state and drives one analysis at a time:
//! `Idle -> Running -> Idle`. Triggers that arrive while a run is in flight are
//! dropped, not queued. The in-flight flag is cleared by a guard, so a run that
//! panics or whose future is dropped still leaves the session idle.

use crate::catalog::{Catalog, LabelSet, Language, Mode};
use crate::config::{Config, DEFAULT_MODEL};
use crate::error::{AnalysisFailure, Result};
use crate::gemini::{GeminiClient, Transport};
use crate::image_processing::{ImageProcessor, ImageSource};
use crate::interpreter::{AnalysisResult, interpret};
use crate::presenter::{Presenter, UiState};
use crate::request::RequestBuilder;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// The three user-selectable axes of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub mode: Mode,
    pub language: Language,
    pub model_id: String,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            language: Language::default(),
            model_id: DEFAULT_MODEL.to_string(),
        }
    }
}

/// Mutable state of a session. Only the session writes it.
#[derive(Clone, Default)]
pub struct RunState {
    pub is_processing: bool,
    pub selection: Selection,
    pub image: Option<ImageSource>,
    // Held in memory only.
    api_key: Option<String>,
}

impl RunState {
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Why a trigger did not start a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Another run is in flight.
    Busy,
    NoImage,
    MissingApiKey,
    /// No instruction for the selected (mode, language).
    ConfigurationMissing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    Rejected(Rejection),
    Completed(std::result::Result<AnalysisResult, AnalysisFailure>),
}

impl TriggerOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Clears the in-flight flag when the run ends, however it ends.
struct InFlight<'a> {
    state: &'a Mutex<RunState>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock(self.state).is_processing = false;
    }
}

fn lock(state: &Mutex<RunState>) -> MutexGuard<'_, RunState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Inputs captured at trigger time, so selection changes cannot race a run.
struct RunInputs {
    image: ImageSource,
    selection: Selection,
    api_key: String,
}

pub struct Session<T: Transport, P: Presenter> {
    catalog: Arc<Catalog>,
    transport: T,
    presenter: P,
    state: Mutex<RunState>,
}

impl<P: Presenter> Session<GeminiClient, P> {
    /// Creates a session talking to the Gemini API described by `config`.
    pub fn from_config(
        config: &Config,
        catalog: Arc<Catalog>,
        presenter: P,
        mode: Mode,
        language: Language,
    ) -> Result<Self> {
        let transport = GeminiClient::new(config)?;
        let selection = Selection {
            mode,
            language,
            model_id: config.model_name.clone(),
        };
        let session = Self::new(catalog, transport, presenter, selection);
        session.set_api_key(Some(config.gemini_api_key.clone()));
        Ok(session)
    }
}

impl<T: Transport, P: Presenter> Session<T, P> {
    pub fn new(catalog: Arc<Catalog>, transport: T, presenter: P, selection: Selection) -> Self {
        Self {
            catalog,
            transport,
            presenter,
            state: Mutex::new(RunState {
                selection,
                ..RunState::default()
            }),
        }
    }

    pub fn is_processing(&self) -> bool {
        lock(&self.state).is_processing
    }

    pub fn state(&self) -> RunState {
        lock(&self.state).clone()
    }

    pub fn selection(&self) -> Selection {
        lock(&self.state).selection.clone()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Labels for the currently selected language.
    pub fn labels(&self) -> &LabelSet {
        self.catalog.labels(self.selection().language)
    }

    /// Whether the trigger should be offered to the user right now.
    pub fn can_trigger(&self) -> bool {
        let state = lock(&self.state);
        !state.is_processing && state.image.is_some() && state.api_key.is_some()
    }

    /// Changes the mode. Refused while a run is in flight.
    pub fn set_mode(&self, mode: Mode) -> bool {
        self.update(|state| state.selection.mode = mode)
    }

    /// Changes the language. Refused while a run is in flight.
    pub fn set_language(&self, language: Language) -> bool {
        self.update(|state| state.selection.language = language)
    }

    /// Changes the model. Refused while a run is in flight.
    pub fn set_model(&self, model_id: impl Into<String>) -> bool {
        let model_id = model_id.into();
        self.update(|state| state.selection.model_id = model_id)
    }

    /// Holds a new image, or clears it. Refused while a run is in flight.
    pub fn select_image(&self, image: Option<ImageSource>) -> bool {
        self.update(|state| state.image = image)
    }

    /// Sets the credential. Blank keys count as absent.
    pub fn set_api_key(&self, key: Option<String>) {
        let key = key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        lock(&self.state).api_key = key;
    }

    fn update(&self, change: impl FnOnce(&mut RunState)) -> bool {
        let mut state = lock(&self.state);
        if state.is_processing {
            debug!("selection change ignored while processing");
            return false;
        }
        change(&mut state);
        true
    }

    /// Starts one analysis run if the session allows it and waits for it.
    ///
    /// A run that starts always ends with the presenter showing a result or a
    /// failure, and with the session idle again.
    pub async fn trigger(&self) -> TriggerOutcome {
        let inputs = match self.begin() {
            Ok(inputs) => inputs,
            Err(rejection) => return TriggerOutcome::Rejected(rejection),
        };
        let in_flight = InFlight { state: &self.state };

        let labels = self.catalog.labels(inputs.selection.language);
        self.presenter.render(&UiState::Loading, labels);

        info!(
            image = %inputs.image.describe(),
            mode = %inputs.selection.mode,
            language = %inputs.selection.language,
            model = %inputs.selection.model_id,
            "analysis started"
        );
        let outcome = self.run(&inputs).await;

        let view = match &outcome {
            Ok(result) => {
                info!(verdict = %result.verdict, score = result.score, "analysis finished");
                UiState::Result(result.clone())
            }
            Err(failure) => {
                warn!(kind = %failure.kind, message = %failure.message, "analysis failed");
                UiState::Error {
                    kind: Some(failure.kind),
                    message: failure.user_message(labels, inputs.selection.mode),
                    diagnostic: failure.diagnostic.clone(),
                }
            }
        };
        self.presenter.render(&view, labels);

        drop(in_flight);
        TriggerOutcome::Completed(outcome)
    }

    /// Checks the preconditions and marks the session busy.
    fn begin(&self) -> std::result::Result<RunInputs, Rejection> {
        let mut state = lock(&self.state);

        if state.is_processing {
            debug!("trigger dropped: analysis already in flight");
            return Err(Rejection::Busy);
        }
        let Some(image) = state.image.clone() else {
            debug!("trigger ignored: no image selected");
            return Err(Rejection::NoImage);
        };
        let selection = state.selection.clone();
        if self
            .catalog
            .lookup_instruction(selection.mode, selection.language)
            .is_none()
        {
            warn!(mode = %selection.mode, language = %selection.language, "no instruction configured");
            return Err(Rejection::ConfigurationMissing);
        }
        let Some(api_key) = state.api_key.clone() else {
            let labels = self.catalog.labels(selection.language);
            drop(state);
            self.presenter.render(
                &UiState::Error {
                    kind: None,
                    message: labels.api_key_missing_error.clone(),
                    diagnostic: None,
                },
                labels,
            );
            return Err(Rejection::MissingApiKey);
        };

        state.is_processing = true;
        Ok(RunInputs {
            image,
            selection,
            api_key,
        })
    }

    async fn run(&self, inputs: &RunInputs) -> std::result::Result<AnalysisResult, AnalysisFailure> {
        let encoded = ImageProcessor::encode(&inputs.image).await?;
        let request = RequestBuilder::new(&self.catalog).build(
            encoded,
            inputs.selection.mode,
            inputs.selection.language,
            &inputs.selection.model_id,
        )?;
        let raw = self.transport.send(&inputs.api_key, &request).await?;
        interpret(&raw)
    }
}
