//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use floraguard_core::config;
use floraguard_core::locale::Language;

mod commands;

#[derive(Parser)]
#[command(name = "floraguard")]
#[command(version)]
#[command(about = "FloraGuard: your personal AI plant doctor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Language for the request and the output (en, si); overrides config
    #[arg(long, global = true, value_name = "TAG", env = "FLORAGUARD_LANG")]
    lang: Option<Language>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Diagnose a plant from a photo of its leaves
    Diagnose {
        /// Path to the photo (png, jpg, webp, gif)
        #[arg(value_name = "IMAGE")]
        image: String,

        /// Override the model from config
        #[arg(short, long)]
        model: Option<String>,

        /// Do not record this diagnosis in history
        #[arg(long = "no-history")]
        no_history: bool,
    },

    /// Parse a saved model response and show the result
    Parse {
        /// File with the response text (reads stdin when omitted or "-")
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Print the parse outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render markdown text for the terminal
    Render {
        /// File with the markdown (reads stdin when omitted or "-")
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Browse past diagnoses
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum HistoryCommands {
    /// Lists past diagnoses, newest first
    List,
    /// Shows one past diagnosis
    Show {
        /// The ID of the entry to show
        #[arg(value_name = "ID")]
        id: i64,
    },
    /// Deletes all history
    Clear,
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Generate a fresh config from Rust defaults (for xtask)
    Generate,
    /// Set the default language (en, si)
    Language {
        #[arg(value_name = "TAG")]
        tag: Language,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let Cli { command, lang } = cli;

    // Config commands must work even when config.toml fails to parse.
    let load = || -> Result<(config::Config, Language)> {
        let config = config::Config::load().context("load config")?;
        let language = lang.unwrap_or(config.language);
        Ok((config, language))
    };

    match command {
        Commands::Diagnose {
            image,
            model,
            no_history,
        } => {
            let (config, language) = load()?;
            commands::diagnose::run(commands::diagnose::DiagnoseOptions {
                image: &image,
                config: &config,
                language,
                model_override: model.as_deref(),
                no_history,
            })
            .await
        }
        Commands::Parse { file, json } => {
            let (_, language) = load()?;
            commands::parse::run(file.as_deref(), json, language)
        }
        Commands::Render { file } => {
            let (_, language) = load()?;
            commands::parse::render(file.as_deref(), language)
        }
        Commands::History { command } => {
            let (config, language) = load()?;
            match command {
                HistoryCommands::List => commands::history::list(&config, language),
                HistoryCommands::Show { id } => commands::history::show(&config, id, language),
                HistoryCommands::Clear => commands::history::clear(&config),
            }
        }
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::Generate => commands::config::generate(),
            ConfigCommands::Language { tag } => commands::config::language(tag),
        },
    }
}
