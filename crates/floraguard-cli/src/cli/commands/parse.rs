//! Offline handlers: parse a saved response, render markdown.

use std::io::{IsTerminal, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use floraguard_core::diagnosis::parse_diagnosis;
use floraguard_core::locale::Language;

use crate::view::View;

pub fn run(file: Option<&Path>, json: bool, language: Language) -> Result<()> {
    let text = read_input(file)?;
    let outcome = parse_diagnosis(&text);

    let mut stdout = std::io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut stdout, &outcome).context("write parse outcome")?;
        writeln!(stdout)?;
    } else {
        View::stdout(language).outcome(&mut stdout, &outcome, &text)?;
    }
    Ok(())
}

pub fn render(file: Option<&Path>, language: Language) -> Result<()> {
    let text = read_input(file)?;
    let mut stdout = std::io::stdout().lock();
    View::stdout(language).markdown(&mut stdout, &text)?;
    Ok(())
}

/// Reads `file`, or stdin when no file (or `-`) is given.
fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display())),
        _ => {
            let stdin = std::io::stdin();
            if stdin.is_terminal() {
                anyhow::bail!("No input provided. Pass a FILE or pipe text via stdin.");
            }
            let mut text = String::new();
            stdin.lock().read_to_string(&mut text).context("read stdin")?;
            Ok(text)
        }
    }
}
