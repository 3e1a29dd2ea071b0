//! Initialize a deck project.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use vocadeck_anki::TemplateSet;

use crate::config::config_root;

/// Run the init command.
pub fn run(config_path: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing vocadeck...");

    let root = config_root(config_path);

    // Create default config
    if !config_path.exists() || yes {
        fs::write(config_path, DEFAULT_CONFIG)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        tracing::info!("Created {}", config_path.display());
    } else {
        tracing::warn!(
            "{} already exists. Use --yes to overwrite.",
            config_path.display()
        );
    }

    // Card templates
    let templates_dir = root.join("templates");
    let written = TemplateSet::write_builtin(&templates_dir, yes)?;
    for path in &written {
        tracing::info!("Created {}", path.display());
    }

    // Sample vocabulary
    let data_dir = root.join("data");
    fs::create_dir_all(data_dir.join("audio")).context("Failed to create data/audio")?;
    fs::create_dir_all(data_dir.join("images")).context("Failed to create data/images")?;

    let vocab_path = data_dir.join("vocab.yaml");
    if !vocab_path.exists() || yes {
        fs::write(&vocab_path, SAMPLE_VOCAB).context("Failed to write data/vocab.yaml")?;
        tracing::info!("Created {}", vocab_path.display());
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'vocadeck build' to build the decks.");

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# vocadeck configuration

[deck]
# One deck is built per language
languages = ["de", "en"]

# Output directory for .apkg files
output = "output"

# Package file and deck name, {lang} is replaced by the language code
file_name = "japanese_coredeck_{lang}.apkg"
name = "Japanese Vocab Deck ({lang})"

# Fixed deck id (derived from the deck name when unset)
# deck_id = 2059400110

[data]
# Nested vocabulary (.yaml, .jsonl, .json) or flat vocabulary (.csv)
vocab = "data/vocab.yaml"

# Per-language translation tables for CSV vocabulary
translations = "translations_{lang}.csv"

# Directory containing audio/ and images/ (defaults to the vocab directory)
# media_dir = "data"

[templates]
# front_<kind>.html, back_<kind>.html and style.css; missing files use the
# built-in versions
dir = "templates"

[models]
# Fixed note type ids (derived from the note type name when unset)
# reading_id = 1607392319
# listening_id = 1607392321
# translation_id = 1607392320

[build]
# Minify the card stylesheet
minify = true

# "joined": one note per reading with all sentences
# "split": one note per reading and sentence
sentence_mode = "joined"
"#;

const SAMPLE_VOCAB: &str = r#"- word: ああ
  tags: [Tonari no Totoro]
  readings:
    - reading: ああ
      expression_audio: ああ.mp3
      meaning:
        en: oh; ah
        de: oh; ach
      explanation:
        en: An *interjection* of surprise or realization.
      sentences:
        - sentence: ああ、そうですか。
          sentence_kana: ああ、そうですか。
          translations:
            en: Oh, is that so?
            de: Ach, ist das so?

- word: 猫
  tags: [animals]
  readings:
    - reading: ねこ
      furigana: 猫[ねこ]
      image: neko.png
      meaning:
        en: cat
        de: Katze
      sentences:
        - sentence: 猫が好きです。
          sentence_furigana: 猫[ねこ]が 好[す]きです。
          translations:
            en: I like cats.
            de: Ich mag Katzen.
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_project_files() {
        let temp = tempdir().unwrap();
        let config = temp.path().join("vocadeck.toml");

        run(&config, false).unwrap();

        assert!(config.exists());
        assert!(temp.path().join("templates").join("front_reading.html").exists());
        assert!(temp.path().join("data").join("vocab.yaml").exists());
        assert!(temp.path().join("data").join("audio").is_dir());

        let parsed = crate::config::load_config(&config).unwrap();
        assert_eq!(parsed.deck.languages, vec!["de", "en"]);
    }

    #[test]
    fn keeps_existing_files_without_yes() {
        let temp = tempdir().unwrap();
        let config = temp.path().join("vocadeck.toml");
        fs::write(&config, "[deck]\nlanguages = [\"en\"]\n").unwrap();

        run(&config, false).unwrap();

        assert_eq!(
            fs::read_to_string(&config).unwrap(),
            "[deck]\nlanguages = [\"en\"]\n"
        );
    }

    #[test]
    fn sample_vocab_parses() {
        let words = vocadeck_data::yaml::parse_words(SAMPLE_VOCAB).unwrap();

        assert_eq!(words.len(), 2);
        assert_eq!(words[1].readings[0].image(), Some("neko.png"));
    }
}
