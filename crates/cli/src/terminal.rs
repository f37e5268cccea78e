//! Terminal rendering of session states.

use indicatif::{ProgressBar, ProgressStyle};
use smashpass_core::catalog::LabelSet;
use smashpass_core::presenter::{Presenter, UiState};
use smashpass_core::AnalysisResult;
use std::sync::Mutex;
use std::time::Duration;

pub struct TerminalPresenter {
    spinner: Mutex<Option<ProgressBar>>,
    /// Print only through the JSON path in `main`.
    quiet: bool,
    show_diagnostics: bool,
}

impl TerminalPresenter {
    pub fn new(quiet: bool, show_diagnostics: bool) -> Self {
        Self {
            spinner: Mutex::new(None),
            quiet,
            show_diagnostics,
        }
    }

    fn start_spinner(&self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.green} {msg}")
        {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.replace_spinner(Some(spinner));
    }

    fn replace_spinner(&self, next: Option<ProgressBar>) {
        let mut slot = self
            .spinner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(old) = slot.take() {
            old.finish_and_clear();
        }
        *slot = next;
    }
}

impl Presenter for TerminalPresenter {
    fn render(&self, state: &UiState, labels: &LabelSet) {
        if self.quiet {
            return;
        }
        match state {
            UiState::Idle => self.replace_spinner(None),
            UiState::Loading => self.start_spinner(&labels.loading_text),
            UiState::Result(result) => {
                self.replace_spinner(None);
                print_result(result, labels);
            }
            UiState::Error {
                message,
                diagnostic,
                ..
            } => {
                self.replace_spinner(None);
                eprintln!("{}\n{}", labels.error_prefix, message);
                if let (true, Some(raw)) = (self.show_diagnostics, diagnostic) {
                    eprintln!("\n--- raw response ---\n{}", raw);
                }
            }
        }
    }
}

fn print_result(result: &AnalysisResult, labels: &LabelSet) {
    println!("{} {}", labels.verdict_label, result.verdict);
    println!(
        "{} {}/10 ({})",
        labels.score_label,
        result.score,
        labels.rating_label(result.score)
    );
    println!("{}\n{}", labels.explanation_label, result.explanation);
}
