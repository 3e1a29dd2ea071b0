//! Format detection and dataset loading.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::csv::{read_translations, read_vocab, CsvError, TranslationRow, VocabRow};
use crate::jsonl::{parse_array, parse_lines, JsonError};
use crate::merge::{merge_translations, MergeReport};
use crate::model::Word;
use crate::yaml::{parse_words, YamlError};

/// Supported vocabulary file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Yaml,
    Jsonl,
    Json,
    Csv,
}

impl Format {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "jsonl" | "ndjson" => Some(Self::Jsonl),
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// Where to read vocabulary data from.
#[derive(Debug, Clone)]
pub struct DataSource {
    /// Vocabulary file
    pub vocab: PathBuf,

    /// Explicit format (detected from the extension when `None`)
    pub format: Option<Format>,

    /// Translation file name pattern for CSV data, `{lang}` is replaced by
    /// the language code. Relative patterns resolve next to the vocab file.
    pub translations: String,
}

impl DataSource {
    /// A source with the default translation pattern.
    pub fn new(vocab: impl Into<PathBuf>) -> Self {
        Self {
            vocab: vocab.into(),
            format: None,
            translations: "translations_{lang}.csv".to_string(),
        }
    }

    /// Path of the translation table for `lang`.
    pub fn translation_path(&self, lang: &str) -> PathBuf {
        let name = self.translations.replace("{lang}", lang);
        let path = PathBuf::from(&name);
        if path.is_absolute() {
            path
        } else {
            self.base_dir().join(name)
        }
    }

    /// Directory containing the vocabulary file.
    pub fn base_dir(&self) -> PathBuf {
        self.vocab
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }
}

/// Errors that can occur when loading a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Vocabulary file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot detect data format of {0} (expected .yaml, .jsonl, .json or .csv)")]
    UnknownFormat(PathBuf),

    #[error("{path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: YamlError,
    },

    #[error("{path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: JsonError,
    },

    #[error("{path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: CsvError,
    },
}

/// Loaded vocabulary data.
#[derive(Debug, Clone)]
pub enum Dataset {
    /// Words with translations for every language inline
    Nested(Vec<Word>),

    /// Flat vocabulary with one translation table per language
    Tabular {
        vocab: Vec<VocabRow>,
        translations: Vec<(String, Vec<TranslationRow>)>,
    },
}

/// Words for a single language.
#[derive(Debug, Clone)]
pub struct LanguageData {
    pub words: Vec<Word>,
    /// Present when the words came from a CSV merge
    pub merge: Option<MergeReport>,
}

impl Dataset {
    /// Words for `lang`, or `None` if there is no data for that language.
    pub fn words_for(&self, lang: &str) -> Option<LanguageData> {
        match self {
            Self::Nested(words) => Some(LanguageData {
                words: words.clone(),
                merge: None,
            }),
            Self::Tabular {
                vocab,
                translations,
            } => {
                let (_, rows) = translations.iter().find(|(l, _)| l == lang)?;
                let report = merge_translations(vocab, rows);
                Some(LanguageData {
                    words: report.to_words(lang),
                    merge: Some(report),
                })
            }
        }
    }

    /// Merge report for `lang` (tabular data only).
    pub fn merge_report(&self, lang: &str) -> Option<MergeReport> {
        match self {
            Self::Nested(_) => None,
            Self::Tabular {
                vocab,
                translations,
            } => translations
                .iter()
                .find(|(l, _)| l == lang)
                .map(|(_, rows)| merge_translations(vocab, rows)),
        }
    }

    /// Number of top-level vocabulary entries.
    pub fn len(&self) -> usize {
        match self {
            Self::Nested(words) => words.len(),
            Self::Tabular { vocab, .. } => vocab.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Load the vocabulary described by `source`.
///
/// For CSV data, translation tables are read for each of `languages`; a
/// missing table leaves that language without data rather than failing.
pub fn load_dataset(source: &DataSource, languages: &[String]) -> Result<Dataset, DataError> {
    let path = &source.vocab;
    if !path.exists() {
        return Err(DataError::NotFound(path.clone()));
    }

    let format = source
        .format
        .or_else(|| Format::from_path(path))
        .ok_or_else(|| DataError::UnknownFormat(path.clone()))?;

    match format {
        Format::Yaml => {
            let content = read_to_string(path)?;
            let words = parse_words(&content).map_err(|source| DataError::Yaml {
                path: path.clone(),
                source,
            })?;
            Ok(Dataset::Nested(words))
        }
        Format::Jsonl | Format::Json => {
            let content = read_to_string(path)?;
            let parsed = if format == Format::Jsonl {
                parse_lines(&content)
            } else {
                parse_array(&content)
            };
            let words = parsed.map_err(|source| DataError::Json {
                path: path.clone(),
                source,
            })?;
            Ok(Dataset::Nested(words))
        }
        Format::Csv => {
            let vocab = read_vocab(open(path)?).map_err(|source| DataError::Csv {
                path: path.clone(),
                source,
            })?;

            let mut translations = Vec::new();
            for lang in languages {
                let t_path = source.translation_path(lang);
                if !t_path.exists() {
                    continue;
                }
                let rows = read_translations(open(&t_path)?).map_err(|source| {
                    DataError::Csv {
                        path: t_path.clone(),
                        source,
                    }
                })?;
                translations.push((lang.clone(), rows));
            }

            Ok(Dataset::Tabular {
                vocab,
                translations,
            })
        }
    }
}

fn read_to_string(path: &Path) -> Result<String, DataError> {
    fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn open(path: &Path) -> Result<File, DataError> {
    File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })
}
