//! Diagnose command handler.

use std::io::{IsTerminal, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::cursor::MoveToColumn;
use crossterm::execute;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use floraguard_core::config::{self, Config};
use floraguard_core::history::HistoryStore;
use floraguard_core::images::{SourceImage, normalize_input_path};
use floraguard_core::interrupt::{self, InterruptedError};
use floraguard_core::locale::{Language, UiStrings};
use floraguard_core::pipeline::{self, DiagnosisRun};
use floraguard_core::providers::{GeminiClient, GeminiConfig};
use tokio::task::JoinHandle;

use crate::view::View;

const LOADING_INTERVAL: Duration = Duration::from_millis(2500);

pub struct DiagnoseOptions<'a> {
    pub image: &'a str,
    pub config: &'a Config,
    pub language: Language,
    pub model_override: Option<&'a str>,
    pub no_history: bool,
}

pub async fn run(opts: DiagnoseOptions<'_>) -> Result<()> {
    let ui = &opts.language.table().ui;

    let image = SourceImage::load(&normalize_input_path(opts.image))?;

    let mut gemini = GeminiConfig::from_config(opts.config)?;
    if let Some(model) = opts.model_override {
        gemini.model = model.to_string();
    }
    let client = GeminiClient::new(gemini);

    interrupt::init()?;
    let loading = start_loading(ui);
    let run = tokio::select! {
        run = pipeline::diagnose_image(&client, &image, opts.language, &opts.config.thumbnail) => run,
        () = interrupt::wait_for_interrupt() => Err(InterruptedError.into()),
    };
    stop_loading(loading);
    let run = run.context(ui.error_diagnosis)?;

    if opts.config.history.enabled && !opts.no_history {
        record_history(opts.config, &run);
    }

    let mut stdout = std::io::stdout().lock();
    View::stdout(opts.language).outcome(&mut stdout, &run.outcome, &run.raw_response)?;
    stdout.flush()?;
    Ok(())
}

/// History is best-effort: a failed save is logged, the diagnosis is still shown.
fn record_history(config: &Config, run: &DiagnosisRun) {
    let path = config::paths::history_path();
    let saved = HistoryStore::load(&path, config.history.max_bytes)
        .and_then(|mut store| store.push(run.history_item.clone()));
    match saved {
        Ok(Some(id)) => tracing::debug!(id, path = %path.display(), "saved diagnosis to history"),
        Ok(None) => tracing::warn!(
            max_bytes = config.history.max_bytes,
            "Diagnosis is larger than the history size limit; not saved"
        ),
        Err(e) => tracing::warn!(error = %format!("{e:#}"), "Failed to save diagnosis to history"),
    }
}

/// Rotates the localized loading messages on stderr while waiting.
///
/// Does nothing when stderr is not a terminal.
fn start_loading(ui: &'static UiStrings) -> Option<JoinHandle<()>> {
    if !std::io::stderr().is_terminal() || ui.loading_messages.is_empty() {
        return None;
    }

    interrupt::set_restore_hook(clear_loading_line);
    Some(tokio::spawn(async move {
        let mut stderr = std::io::stderr();
        let mut ticker = tokio::time::interval(LOADING_INTERVAL);
        for message in ui.loading_messages.iter().cycle() {
            ticker.tick().await;
            let _ = execute!(
                stderr,
                MoveToColumn(0),
                Clear(ClearType::CurrentLine),
                Print(format!("{} {message}", ui.loading_title))
            );
        }
    }))
}

fn stop_loading(loading: Option<JoinHandle<()>>) {
    if let Some(handle) = loading {
        handle.abort();
        clear_loading_line();
    }
}

/// Also runs on a second Ctrl+C, so the exit never leaves half a message.
fn clear_loading_line() {
    let _ = execute!(
        std::io::stderr(),
        MoveToColumn(0),
        Clear(ClearType::CurrentLine)
    );
}
