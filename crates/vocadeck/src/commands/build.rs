//! Deck build command.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use vocadeck_anki::DeckBuilder;

/// Run the build command.
pub fn run(
    config_path: &Path,
    output: Option<PathBuf>,
    languages: Vec<String>,
    minify: Option<bool>,
) -> Result<()> {
    tracing::info!("Building decks...");

    let (mut config, dataset) = super::prepare(config_path, output, languages)?;
    if let Some(minify) = minify {
        config.minify = minify;
    }

    let result = DeckBuilder::new(config).build(&dataset)?;

    for deck in &result.decks {
        tracing::info!(
            "{}: {} reading, {} listening, {} translation cards, {} media files",
            deck.deck_name,
            deck.reading_notes,
            deck.listening_notes,
            deck.translation_notes,
            deck.media
        );
        if !deck.missing_media.is_empty() {
            tracing::warn!(
                "{}: {} media files missing",
                deck.deck_name,
                deck.missing_media.len()
            );
        }
    }

    if result.decks.is_empty() {
        bail!(
            "No decks built: none of the languages [{}] has data",
            result.skipped.join(", ")
        );
    }

    tracing::info!(
        "Built {} decks in {}ms",
        result.decks.len(),
        result.duration_ms
    );

    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const VOCAB: &str = r#"
- word: 猫
  tags: [animals]
  readings:
    - reading: ねこ
      meaning:
        en: cat
      sentences:
        - sentence: 猫が好きです。
          translations:
            en: I like cats.
"#;

    #[test]
    fn builds_decks_from_config() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("data")).unwrap();
        fs::write(temp.path().join("data").join("vocab.yaml"), VOCAB).unwrap();
        let config = temp.path().join("vocadeck.toml");
        fs::write(&config, "[deck]\nlanguages = [\"en\"]\n").unwrap();

        run(&config, None, Vec::new(), Some(false)).unwrap();

        assert!(temp
            .path()
            .join("output")
            .join("japanese_coredeck_en.apkg")
            .exists());
    }

    #[test]
    fn fails_when_no_language_has_data() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("data")).unwrap();
        fs::write(
            temp.path().join("data").join("vocab.csv"),
            "expression,reading\n猫,ねこ\n",
        )
        .unwrap();
        let config = temp.path().join("vocadeck.toml");
        fs::write(&config, "[data]\nvocab = \"data/vocab.csv\"\n").unwrap();

        let err = run(&config, None, Vec::new(), None).unwrap_err();

        assert!(err.to_string().contains("No decks built"));
    }

    #[test]
    fn missing_vocab_is_an_error() {
        let temp = tempdir().unwrap();
        let config = temp.path().join("vocadeck.toml");

        assert!(run(&config, None, Vec::new(), None).is_err());
    }
}
