//! CLI command implementations.

pub mod build;
pub mod init;
pub mod merge;
pub mod preview;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use vocadeck_anki::BuildConfig;
use vocadeck_data::{load_dataset, Dataset};

use crate::config::{config_root, load_config};

/// Load the config file and dataset, applying command-line overrides.
fn prepare(
    config_path: &Path,
    output: Option<PathBuf>,
    languages: Vec<String>,
) -> Result<(BuildConfig, Dataset)> {
    let file_config = load_config(config_path)?;
    let root = config_root(config_path);
    let source = file_config.data_source(&root);

    let mut config = file_config.build_config(&root, &source);
    if let Some(output) = output {
        config.output_dir = output;
    }
    if !languages.is_empty() {
        config.languages = languages;
    }

    let dataset = load_dataset(&source, &config.languages)
        .with_context(|| format!("Failed to load {}", source.vocab.display()))?;
    tracing::info!(
        "Loaded {} vocabulary entries from {}",
        dataset.len(),
        source.vocab.display()
    );

    Ok((config, dataset))
}
