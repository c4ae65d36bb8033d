//! Configuration management for FloraGuard.
//!
//! Loads configuration from ${FLORAGUARD_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::locale::Language;

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
/// To update, run `cargo xtask update-default-config`.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Merges user config values into the default template.
///
/// This ensures new comments/sections from the template are always present,
/// while preserving user's customized values.
fn merge_with_template(user_config: &str) -> Result<String> {
    use toml_edit::DocumentMut;

    let mut doc: DocumentMut = default_config_template()
        .parse()
        .context("Failed to parse default config template")?;

    let user_doc: DocumentMut = user_config.parse().context("Failed to parse user config")?;

    merge_items(doc.as_table_mut(), user_doc.as_table());

    Ok(doc.to_string())
}

/// Recursively merges items from source table into target table.
fn merge_items(target: &mut toml_edit::Table, source: &toml_edit::Table) {
    use toml_edit::Item;

    for (key, value) in source {
        match value {
            Item::Value(v) => {
                target[key] = Item::Value(v.clone());
            }
            Item::Table(src_table) => {
                if let Some(Item::Table(target_table)) = target.get_mut(key) {
                    merge_items(target_table, src_table);
                } else {
                    target[key] = Item::Table(src_table.clone());
                }
            }
            Item::ArrayOfTables(src_arr) => {
                target[key] = Item::ArrayOfTables(src_arr.clone());
            }
            Item::None => {}
        }
    }
}

pub mod paths {
    //! Path resolution for FloraGuard configuration and data files.
    //!
    //! FLORAGUARD_HOME resolution order:
    //! 1. FLORAGUARD_HOME environment variable (if set)
    //! 2. ~/.config/floraguard (default)

    use std::path::PathBuf;

    /// Returns the FloraGuard home directory.
    pub fn floraguard_home() -> PathBuf {
        if let Ok(home) = std::env::var("FLORAGUARD_HOME")
            && !home.trim().is_empty()
        {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".floraguard"),
            |h| h.join(".config").join("floraguard"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        floraguard_home().join("config.toml")
    }

    /// Returns the path to the diagnosis history file.
    pub fn history_path() -> PathBuf {
        floraguard_home().join("history.json")
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Language for requests and display
    pub language: Language,

    /// The Gemini model used for diagnosis
    pub model: String,

    /// Maximum output tokens for the diagnosis response (optional)
    pub max_output_tokens: Option<u32>,

    /// Provider configuration (API key, base URL).
    pub providers: ProvidersConfig,

    /// History persistence.
    pub history: HistoryConfig,

    /// Thumbnail generation for history entries.
    pub thumbnail: ThumbnailConfig,
}

impl Config {
    pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Saves only the language field to the config file.
    ///
    /// # Errors
    /// Returns an error if the config cannot be read, merged or written.
    pub fn save_language(language: Language) -> Result<()> {
        Self::save_language_to(&paths::config_path(), language)
    }

    /// Saves only the language field to a specific config file path.
    ///
    /// Creates the file with default template if it doesn't exist.
    /// If file exists, merges user values into the latest template.
    ///
    /// # Errors
    /// Returns an error if the config cannot be read, merged or written.
    pub fn save_language_to(path: &Path, language: Language) -> Result<()> {
        use toml_edit::{DocumentMut, value};

        let contents = if path.exists() {
            let user_config = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            merge_with_template(&user_config)?
        } else {
            default_config_template().to_string()
        };

        let mut doc: DocumentMut = contents
            .parse()
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        doc["language"] = value(language.tag());

        Self::write_config(path, &doc.to_string())
    }

    /// Creates a default config file at the given path.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Generates a fresh config TOML from Rust defaults.
    ///
    /// Used by `xtask update-default-config` to keep `default_config.toml`
    /// in sync with [`Config::default`]. Comments come from the embedded
    /// template; values come from the defaults.
    ///
    /// # Errors
    /// Returns an error if serialization or template parsing fails.
    pub fn generate() -> Result<String> {
        use toml_edit::DocumentMut;

        let generated_toml = toml::to_string(&Config::default())
            .context("Failed to serialize default config to TOML")?;

        let mut doc: DocumentMut = default_config_template()
            .parse()
            .context("Failed to parse default config template")?;

        let generated_doc: DocumentMut = generated_toml
            .parse()
            .context("Failed to parse generated config")?;

        merge_items(doc.as_table_mut(), generated_doc.as_table());

        Ok(doc.to_string())
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: Language::default(),
            model: Self::DEFAULT_MODEL.to_string(),
            max_output_tokens: None,
            providers: ProvidersConfig::default(),
            history: HistoryConfig::default(),
            thumbnail: ThumbnailConfig::default(),
        }
    }
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub gemini: ProviderConfig,
}

/// Connection settings for one provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Optional API key (overrides environment variable).
    pub api_key: Option<String>,
    /// Optional API base URL (for proxies).
    pub base_url: Option<String>,
}

impl ProviderConfig {
    /// Returns the effective API key if set and non-empty.
    pub fn effective_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Returns the effective base URL if set and non-empty.
    pub fn effective_base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// History persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Record each diagnosis in history.json
    pub enabled: bool,
    /// Size cap for history.json; oldest entries are pruned to fit
    pub max_bytes: u64,
}

impl HistoryConfig {
    /// Same order of magnitude as a browser's per-origin storage quota.
    pub const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_bytes: Self::DEFAULT_MAX_BYTES,
        }
    }
}

/// Thumbnail settings for history entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality, 1-100
    pub quality: u8,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_width: 200,
            max_height: 200,
            quality: 70,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.language, Language::En);
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.max_output_tokens, None);
        assert!(config.history.enabled);
        assert_eq!(config.thumbnail, ThumbnailConfig::default());
    }

    #[test]
    fn test_load_partial_config_merges_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "language = \"si\"\n[thumbnail]\nquality = 50\n").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.language, Language::Si);
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.thumbnail.quality, 50);
        assert_eq!(config.thumbnail.max_width, 200);
    }

    #[test]
    fn test_load_rejects_unknown_language() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "language = \"fr\"\n").unwrap();

        let err = Config::load_from(&config_path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config"));
    }

    #[test]
    fn test_init_creates_config_with_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("subdir").join("config.toml");

        Config::init(&config_path).unwrap();

        assert!(config_path.exists());
        let contents = fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains("gemini-2.5-flash"));
        assert!(contents.contains("# max_output_tokens ="));

        let loaded = Config::load_from(&config_path).unwrap();
        assert_eq!(loaded.model, Config::DEFAULT_MODEL);
    }

    #[test]
    fn test_init_fails_if_exists() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "").unwrap();

        assert!(Config::init(&config_path).is_err());
    }

    #[test]
    fn test_save_language_preserves_other_values() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "model = \"gemini-2.5-pro\"\n").unwrap();

        Config::save_language_to(&config_path, Language::Si).unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.language, Language::Si);
        assert_eq!(config.model, "gemini-2.5-pro");
        let contents = fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains("# max_output_tokens ="));
    }

    #[test]
    fn test_save_language_creates_missing_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nested").join("config.toml");

        Config::save_language_to(&config_path, Language::Si).unwrap();

        assert_eq!(
            Config::load_from(&config_path).unwrap().language,
            Language::Si
        );
    }

    #[test]
    fn test_generate_matches_defaults() {
        let generated = Config::generate().unwrap();
        let parsed: Config = toml::from_str(&generated).unwrap();
        assert_eq!(parsed.model, Config::DEFAULT_MODEL);
        assert_eq!(parsed.history.max_bytes, HistoryConfig::DEFAULT_MAX_BYTES);
    }

    #[test]
    fn test_gemini_base_url_loaded_from_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(
            &config_path,
            "[providers.gemini]\nbase_url = \"https://my-proxy.example.com\"\n",
        )
        .unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(
            config.providers.gemini.effective_base_url(),
            Some("https://my-proxy.example.com")
        );
    }

    #[test]
    fn test_blank_api_key_is_none() {
        let provider = ProviderConfig {
            api_key: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(provider.effective_api_key(), None);
    }
}
