//! Card preview command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use vocadeck_anki::DeckBuilder;

/// Run the preview command.
pub fn run(config_path: &Path, output: Option<PathBuf>, languages: Vec<String>) -> Result<()> {
    tracing::info!("Rendering card previews...");

    let (config, dataset) = super::prepare(config_path, output, languages)?;
    let result = DeckBuilder::new(config).preview(&dataset)?;

    if result.pages.is_empty() {
        tracing::warn!("No preview pages written");
        return Ok(());
    }

    tracing::info!(
        "Rendered {} cards into {} pages in {}ms",
        result.cards,
        result.pages.len(),
        result.duration_ms
    );
    for page in &result.pages {
        tracing::info!("Preview: {}", page.display());
    }

    Ok(())
}
