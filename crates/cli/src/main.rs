mod terminal;

use anyhow::{Context, Result};
use arboard::Clipboard;
use clap::Parser;
use serde_json::json;
use smashpass_core::catalog::{Language, Mode};
use smashpass_core::config::DEFAULT_MODEL;
use smashpass_core::session::Selection;
use smashpass_core::settings::{AVAILABLE_MODELS, Settings};
use smashpass_core::{AppError, Catalog, Config, ImageSource, Rejection, Session, TriggerOutcome};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use terminal::TerminalPresenter;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "smashpass", author, version, about, long_about = None)]
struct Args {
    /// Image to analyze
    #[arg(required_unless_present = "list_models")]
    image: Option<PathBuf>,

    /// Analysis mode: concise, detailed or comprehensive
    #[arg(short, long)]
    mode: Option<Mode>,

    /// UI and answer language: en or zh
    #[arg(short, long)]
    language: Option<Language>,

    /// Override GEMINI_MODEL and the saved model
    #[arg(long)]
    model: Option<String>,

    /// Gemini API key, overrides GEMINI_API_KEY (never saved)
    #[arg(long)]
    api_key: Option<String>,

    /// Alternative API host, e.g. a proxy; overrides GEMINI_BASE_URL
    #[arg(long)]
    base_url: Option<String>,

    /// JSON file replacing the built-in instructions and labels
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Print the outcome as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Copy the explanation to clipboard
    #[arg(short, long, default_value_t = false)]
    copy: bool,

    /// Remember mode, language and model as defaults
    #[arg(long, default_value_t = false)]
    save: bool,

    /// Print raw response text when the reply cannot be parsed
    #[arg(long, default_value_t = false)]
    diagnostics: bool,

    /// List selectable models and exit
    #[arg(long)]
    list_models: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.list_models {
        for model in AVAILABLE_MODELS {
            println!("{}", model);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let catalog = match &args.catalog {
        Some(path) => Catalog::from_json_file(path)
            .with_context(|| format!("Failed to load catalog {}", path.display()))?,
        None => Catalog::builtin(),
    };

    // Precedence: flags, then environment (.env included), then saved settings
    let settings = Settings::load(DEFAULT_MODEL);
    let mode = args.mode.unwrap_or(settings.mode);
    let language = args.language.unwrap_or(settings.language);

    let mut builder = Config::from_env().or_model(settings.model.clone());
    if let Some(key) = &args.api_key {
        builder = builder.with_api_key(key);
    }
    if let Some(model) = &args.model {
        builder = builder.with_model(model);
    }
    if let Some(url) = &args.base_url {
        builder = builder.with_base_url(url);
    }

    let config = match builder.build() {
        Ok(config) => config,
        Err(AppError::MissingEnvVar(var)) => {
            debug!(%var, "no API key configured");
            let labels = catalog.labels(language);
            if args.json {
                let out = json!({ "error": labels.api_key_missing_error });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                eprintln!("{}\n{}", labels.error_prefix, labels.api_key_missing_error);
            }
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e).context("Invalid configuration"),
    };

    if args.save {
        let selection = Selection {
            mode,
            language,
            model_id: config.model_name.clone(),
        };
        if let Some(path) = Settings::from(&selection)
            .save()
            .context("Failed to save settings")?
        {
            debug!(path = %path.display(), "settings saved");
        }
    }

    let session = Session::from_config(
        &config,
        Arc::new(catalog),
        TerminalPresenter::new(args.json, args.diagnostics),
        mode,
        language,
    )
    .context("Invalid --base-url")?;

    let Some(image) = args.image.clone() else {
        return Ok(ExitCode::FAILURE);
    };
    session.select_image(Some(ImageSource::file(image)));

    let outcome = session.trigger().await;
    let labels = session.labels();

    match outcome {
        TriggerOutcome::Completed(Ok(result)) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            if args.copy {
                match Clipboard::new() {
                    Ok(mut clipboard) => {
                        if let Err(e) = clipboard.set_text(result.explanation.clone()) {
                            eprintln!("Warning: Failed to copy to clipboard: {}", e);
                        } else if !args.json {
                            println!("(Copied to clipboard)");
                        }
                    }
                    Err(e) => eprintln!("Warning: Could not access clipboard: {}", e),
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        TriggerOutcome::Completed(Err(failure)) => {
            if args.json {
                let mode = session.selection().mode;
                let out = json!({
                    "error": failure.kind.to_string(),
                    "message": failure.user_message(labels, mode),
                    "detail": failure.message,
                    "diagnostic": failure.diagnostic,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            }
            Ok(ExitCode::FAILURE)
        }
        TriggerOutcome::Rejected(rejection) => {
            let message = match rejection {
                Rejection::MissingApiKey => labels.api_key_missing_error.clone(),
                Rejection::ConfigurationMissing => labels.prompt_error(session.selection().mode),
                Rejection::NoImage | Rejection::Busy => format!("{:?}", rejection),
            };
            if args.json {
                println!("{}", serde_json::to_string_pretty(&json!({ "error": message }))?);
            } else if rejection != Rejection::MissingApiKey {
                // The presenter already showed the missing-key message.
                eprintln!("{}\n{}", labels.error_prefix, message);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
