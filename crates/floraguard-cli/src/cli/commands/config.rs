//! Config command handlers.

use anyhow::{Context, Result};
use floraguard_core::config;
use floraguard_core::locale::Language;

pub fn path() {
    println!("{}", config::paths::config_path().display());
}

pub fn init() -> Result<()> {
    let config_path = config::paths::config_path();
    config::Config::init(&config_path)
        .with_context(|| format!("init config at {}", config_path.display()))?;
    println!("Created config at {}", config_path.display());
    Ok(())
}

pub fn generate() -> Result<()> {
    let toml = config::Config::generate()?;
    print!("{toml}");
    Ok(())
}

pub fn language(language: Language) -> Result<()> {
    let config_path = config::paths::config_path();
    config::Config::save_language(language)
        .with_context(|| format!("save language to {}", config_path.display()))?;
    println!(
        "Language set to {} ({})",
        language.display_name(),
        language.tag()
    );
    Ok(())
}
