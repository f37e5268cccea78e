//! Seam between the session and whatever renders it.
//!
//! The presenter only consumes state. A run produces exactly this sequence:
//! `Loading`, then either `Result` or `Error`.

use crate::catalog::LabelSet;
use crate::error::FailureKind;
use crate::interpreter::AnalysisResult;

/// What the UI should currently show.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UiState {
    /// Nothing to show yet.
    Idle,
    /// A run is in flight.
    Loading,
    /// The run produced a verdict.
    Result(AnalysisResult),
    /// The run failed, or the trigger was refused with a message for the user.
    Error {
        kind: Option<FailureKind>,
        /// Localized message for the user.
        message: String,
        /// Raw text kept for debugging malformed responses.
        diagnostic: Option<String>,
    },
}

pub trait Presenter: Send + Sync {
    /// Renders `state` using the labels of the currently selected language.
    fn render(&self, state: &UiState, labels: &LabelSet);
}

/// Discards everything. Useful for headless runs.
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn render(&self, _state: &UiState, _labels: &LabelSet) {}
}
