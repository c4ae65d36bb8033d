//! History command handlers.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use floraguard_core::config::{self, Config};
use floraguard_core::history::{HistoryItem, HistoryStore};
use floraguard_core::locale::Language;

use crate::view::View;

const TITLE_WIDTH: usize = 60;

fn open(config: &Config) -> Result<HistoryStore> {
    let path = config::paths::history_path();
    HistoryStore::load(&path, config.history.max_bytes)
        .with_context(|| format!("load history from {}", path.display()))
}

pub fn list(config: &Config, language: Language) -> Result<()> {
    let store = open(config)?;
    let ui = &language.table().ui;

    if store.items().is_empty() {
        println!("{}", ui.no_history);
        println!("{}", ui.no_history_subtitle);
        return Ok(());
    }

    println!("{}", ui.history_title);
    for item in store.items() {
        println!(
            "{}  {}  {}",
            item.id,
            format_timestamp(&item.timestamp),
            short_title(item, language)
        );
    }
    Ok(())
}

pub fn show(config: &Config, id: i64, language: Language) -> Result<()> {
    let store = open(config)?;
    let item = store
        .get(id)
        .with_context(|| format!("No history entry with id {id}"))?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}\n", format_timestamp(&item.timestamp))?;
    View::stdout(language).outcome(
        &mut stdout,
        &item.parse_outcome(),
        item.raw_response.as_deref().unwrap_or_default(),
    )?;
    Ok(())
}

pub fn clear(config: &Config) -> Result<()> {
    let mut store = open(config)?;
    let count = store.items().len();
    store.clear().context("clear history")?;
    println!("Removed {count} history entries.");
    Ok(())
}

/// First line of the display name, cut to the list width.
fn short_title(item: &HistoryItem, language: Language) -> String {
    let name = item.display_name(language);
    let first_line = name.lines().next().unwrap_or_default();
    if first_line.chars().count() > TITLE_WIDTH || name.contains('\n') {
        let cut: String = first_line.chars().take(TITLE_WIDTH).collect();
        format!("{cut}…")
    } else {
        first_line.to_string()
    }
}

fn format_timestamp(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp).map_or_else(
        |_| timestamp.to_string(),
        |dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
    )
}
