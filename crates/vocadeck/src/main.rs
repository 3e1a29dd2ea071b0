//! vocadeck CLI - builds Anki vocabulary decks from YAML, JSONL or CSV data.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "vocadeck")]
#[command(about = "Builds Anki vocabulary decks from YAML, JSONL or CSV data")]
#[command(version)]
pub struct Cli {
    /// Defaults to `build`
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to vocadeck.toml config file
    #[arg(short, long, default_value = "vocadeck.toml", global = true)]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a config file, card templates and sample data
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },

    /// Build one .apkg package per language
    Build {
        /// Output directory (defaults to config or "output")
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only build these languages
        #[arg(short, long = "lang")]
        languages: Vec<String>,

        /// Skip CSS minification
        #[arg(long)]
        no_minify: bool,
    },

    /// Merge CSV vocabulary with translations into merged_<lang>.csv
    Merge {
        /// Only merge these languages
        #[arg(short, long = "lang")]
        languages: Vec<String>,
    },

    /// Render every card into preview_<lang>.html
    Preview {
        /// Output directory (defaults to config or "output")
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only preview these languages
        #[arg(short, long = "lang")]
        languages: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    let command = cli.command.unwrap_or(Commands::Build {
        output: None,
        languages: Vec::new(),
        no_minify: false,
    });

    match command {
        Commands::Init { yes } => {
            commands::init::run(&cli.config, yes)?;
        }
        Commands::Build {
            output,
            languages,
            no_minify,
        } => {
            let minify = if no_minify { Some(false) } else { None };
            commands::build::run(&cli.config, output, languages, minify)?;
        }
        Commands::Merge { languages } => {
            commands::merge::run(&cli.config, languages)?;
        }
        Commands::Preview { output, languages } => {
            commands::preview::run(&cli.config, output, languages)?;
        }
    }

    Ok(())
}
