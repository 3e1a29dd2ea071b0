//! Configuration file (vocadeck.toml).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use vocadeck_anki::{BuildConfig, ModelIds, SentenceMode};
use vocadeck_data::{DataSource, Format};

/// Configuration file structure.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub deck: DeckConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub templates: TemplatesConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub build: BuildSettings,
}

#[derive(Debug, Deserialize)]
pub struct DeckConfig {
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    #[serde(default = "default_output")]
    pub output: String,
    #[serde(default = "default_file_name")]
    pub file_name: String,
    #[serde(default = "default_deck_name")]
    pub name: String,
    pub deck_id: Option<i64>,
    #[serde(default)]
    pub description: String,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            output: default_output(),
            file_name: default_file_name(),
            name: default_deck_name(),
            deck_id: None,
            description: String::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_vocab")]
    pub vocab: String,
    /// Detected from the vocab file extension when unset
    pub format: Option<Format>,
    #[serde(default = "default_translations")]
    pub translations: String,
    /// Defaults to the directory of the vocab file
    pub media_dir: Option<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            vocab: default_vocab(),
            format: None,
            translations: default_translations(),
            media_dir: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TemplatesConfig {
    #[serde(default = "default_templates_dir")]
    pub dir: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: default_templates_dir(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct ModelsConfig {
    pub reading_id: Option<i64>,
    pub listening_id: Option<i64>,
    pub translation_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct BuildSettings {
    #[serde(default = "default_minify")]
    pub minify: bool,
    #[serde(default)]
    pub sentence_mode: SentenceMode,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            minify: default_minify(),
            sentence_mode: SentenceMode::default(),
        }
    }
}

fn default_languages() -> Vec<String> {
    vec!["de".to_string(), "en".to_string()]
}
fn default_output() -> String {
    "output".to_string()
}
fn default_file_name() -> String {
    "japanese_coredeck_{lang}.apkg".to_string()
}
fn default_deck_name() -> String {
    "Japanese Vocab Deck ({lang})".to_string()
}
fn default_vocab() -> String {
    "data/vocab.yaml".to_string()
}
fn default_translations() -> String {
    "translations_{lang}.csv".to_string()
}
fn default_templates_dir() -> String {
    "templates".to_string()
}
fn default_minify() -> bool {
    true
}

impl ConfigFile {
    /// Vocabulary source, with relative paths resolved against `root`.
    pub fn data_source(&self, root: &Path) -> DataSource {
        DataSource {
            vocab: root.join(&self.data.vocab),
            format: self.data.format,
            translations: self.data.translations.clone(),
        }
    }

    /// Builder configuration, with relative paths resolved against `root`.
    pub fn build_config(&self, root: &Path, source: &DataSource) -> BuildConfig {
        let media_dir = match &self.data.media_dir {
            Some(dir) => root.join(dir),
            None => source.base_dir(),
        };

        BuildConfig {
            languages: self.deck.languages.clone(),
            output_dir: root.join(&self.deck.output),
            file_name: self.deck.file_name.clone(),
            deck_name: self.deck.name.clone(),
            deck_id: self.deck.deck_id,
            description: self.deck.description.clone(),
            model_ids: ModelIds {
                reading: self.models.reading_id,
                listening: self.models.listening_id,
                translation: self.models.translation_id,
            },
            templates_dir: root.join(&self.templates.dir),
            media_dir,
            minify: self.build.minify,
            sentence_mode: self.build.sentence_mode,
        }
    }
}

/// Directory relative paths in the config file are resolved against.
pub fn config_root(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Load configuration from `path` if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::info!("Loaded config from {}", path.display());
        return Ok(config);
    }
    tracing::debug!("{} not found, using defaults", path.display());
    Ok(ConfigFile::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_uses_defaults() {
        let config = load_config(Path::new("/nonexistent/vocadeck.toml")).unwrap();

        assert_eq!(config.deck.languages, vec!["de", "en"]);
        assert_eq!(config.deck.file_name, "japanese_coredeck_{lang}.apkg");
        assert_eq!(config.data.vocab, "data/vocab.yaml");
        assert!(config.build.minify);
    }

    #[test]
    fn parses_partial_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("vocadeck.toml");
        fs::write(
            &path,
            r#"
[deck]
languages = ["en"]
deck_id = 1607392319

[data]
vocab = "data/vocab_jp.csv"
format = "csv"

[models]
reading_id = 1607392319

[build]
sentence_mode = "split"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();

        assert_eq!(config.deck.languages, vec!["en"]);
        assert_eq!(config.deck.output, "output");
        assert_eq!(config.deck.deck_id, Some(1607392319));
        assert_eq!(config.data.format, Some(Format::Csv));
        assert_eq!(config.models.reading_id, Some(1607392319));
        assert_eq!(config.build.sentence_mode, SentenceMode::Split);
        assert!(config.build.minify);
    }

    #[test]
    fn rejects_malformed_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("vocadeck.toml");
        fs::write(&path, "[deck\nlanguages = ").unwrap();

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn resolves_paths_against_root() {
        let root = Path::new("/project");
        let config = ConfigFile::default();

        let source = config.data_source(root);
        let build = config.build_config(root, &source);

        assert_eq!(source.vocab, PathBuf::from("/project/data/vocab.yaml"));
        assert_eq!(build.media_dir, PathBuf::from("/project/data"));
        assert_eq!(build.output_dir, PathBuf::from("/project/output"));
        assert_eq!(build.templates_dir, PathBuf::from("/project/templates"));
    }

    #[test]
    fn config_root_of_bare_file_name_is_cwd() {
        assert_eq!(config_root(Path::new("vocadeck.toml")), PathBuf::from("."));
        assert_eq!(
            config_root(Path::new("decks/vocadeck.toml")),
            PathBuf::from("decks")
        );
    }
}
