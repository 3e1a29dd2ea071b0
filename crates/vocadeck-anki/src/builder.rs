//! Deck builder.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;

use vocadeck_data::{Dataset, MergeReport};

use crate::collection::Deck;
use crate::guid::id_for;
use crate::media::{MediaCollector, MediaIndex};
use crate::models::{CardKind, NoteType};
use crate::notes::{NoteFactory, SentenceMode};
use crate::package::{Package, PackageError};
use crate::render::{strip_html, CardRenderer};
use crate::templates::{PreviewCard, PreviewContext, TemplateEngine, TemplateError, TemplateSet};

/// Fixed note type ids. Unset ids are derived from the note type name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelIds {
    pub reading: Option<i64>,
    pub listening: Option<i64>,
    pub translation: Option<i64>,
}

impl ModelIds {
    pub fn get(&self, kind: CardKind) -> Option<i64> {
        match kind {
            CardKind::Reading => self.reading,
            CardKind::Listening => self.listening,
            CardKind::Translation => self.translation,
        }
    }
}

/// Configuration for building decks.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Target language codes, one deck each
    pub languages: Vec<String>,

    /// Output directory
    pub output_dir: PathBuf,

    /// Package file name, `{lang}` is replaced by the language code
    pub file_name: String,

    /// Deck name, `{lang}` is replaced by the language code
    pub deck_name: String,

    /// Fixed deck id (derived from the deck name when `None`)
    pub deck_id: Option<i64>,

    /// Deck description
    pub description: String,

    pub model_ids: ModelIds,

    /// Directory with card template overrides
    pub templates_dir: PathBuf,

    /// Directory containing `audio/` and `images/`
    pub media_dir: PathBuf,

    /// Minify the card stylesheet
    pub minify: bool,

    pub sentence_mode: SentenceMode,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            languages: vec!["de".to_string(), "en".to_string()],
            output_dir: PathBuf::from("output"),
            file_name: "japanese_coredeck_{lang}.apkg".to_string(),
            deck_name: "Japanese Vocab Deck ({lang})".to_string(),
            deck_id: None,
            description: String::new(),
            model_ids: ModelIds::default(),
            templates_dir: PathBuf::from("templates"),
            media_dir: PathBuf::from("data"),
            minify: true,
            sentence_mode: SentenceMode::default(),
        }
    }
}

/// Summary of one written package.
#[derive(Debug, Clone, PartialEq)]
pub struct DeckSummary {
    pub lang: String,
    pub deck_name: String,
    pub path: PathBuf,
    pub reading_notes: usize,
    pub listening_notes: usize,
    pub translation_notes: usize,
    /// Media files stored in the package
    pub media: usize,
    /// Referenced media files that were not found
    pub missing_media: Vec<String>,
}

impl DeckSummary {
    /// Total notes (and cards, one per note).
    pub fn notes(&self) -> usize {
        self.reading_notes + self.listening_notes + self.translation_notes
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Written decks in configured language order
    pub decks: Vec<DeckSummary>,

    /// Languages skipped for lack of data
    pub skipped: Vec<String>,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Result of a preview operation.
#[derive(Debug)]
pub struct PreviewResult {
    /// Written preview pages
    pub pages: Vec<PathBuf>,

    /// Cards rendered across all pages
    pub cards: usize,

    /// Total time in milliseconds
    pub duration_ms: u64,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Failed to render preview: {0}")]
    RenderError(String),

    #[error("Failed to write output: {0}")]
    WriteError(String),

    #[error("Languages {first} and {second} would both write {path}; add {{lang}} to the file name")]
    OutputCollision {
        path: PathBuf,
        first: String,
        second: String,
    },

    #[error("Failed to write package {path}: {source}")]
    Package {
        path: PathBuf,
        #[source]
        source: PackageError,
    },
}

/// Everything needed to write (or preview) one language's deck.
struct LanguageDeck {
    lang: String,
    package: Package,
    missing_media: Vec<String>,
}

impl LanguageDeck {
    fn count(&self, kind: CardKind) -> usize {
        self.package.notes.iter().filter(|n| n.kind == kind).count()
    }

    fn summary(&self, path: PathBuf) -> DeckSummary {
        DeckSummary {
            lang: self.lang.clone(),
            deck_name: self.package.deck.name.clone(),
            path,
            reading_notes: self.count(CardKind::Reading),
            listening_notes: self.count(CardKind::Listening),
            translation_notes: self.count(CardKind::Translation),
            media: self.package.media.len(),
            missing_media: self.missing_media.clone(),
        }
    }
}

/// Builds one Anki package per language.
pub struct DeckBuilder {
    config: BuildConfig,
}

impl DeckBuilder {
    /// Create a new deck builder.
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Write a package for every configured language that has data.
    pub fn build(&self, dataset: &Dataset) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        let jobs = self.package_paths()?;

        self.ensure_output_dir()?;
        let templates = self.load_templates()?;
        let media = MediaIndex::scan(&self.config.media_dir);

        // Languages are independent of each other
        let results: Vec<Result<Option<DeckSummary>, BuildError>> = jobs
            .par_iter()
            .map(|(lang, path)| self.build_language(lang, path, dataset, &templates, &media))
            .collect();

        let mut decks = Vec::new();
        let mut skipped = Vec::new();
        for ((lang, _), result) in jobs.iter().zip(results) {
            match result? {
                Some(summary) => decks.push(summary),
                None => skipped.push(lang.clone()),
            }
        }

        Ok(BuildResult {
            decks,
            skipped,
            duration_ms: start.elapsed().as_millis() as u64,
            output_dir: self.config.output_dir.clone(),
        })
    }

    /// Render every card into a `preview_<lang>.html` page per language.
    pub fn preview(&self, dataset: &Dataset) -> Result<PreviewResult, BuildError> {
        let start = Instant::now();

        self.ensure_output_dir()?;
        let templates = self.load_templates()?;
        let media = MediaIndex::scan(&self.config.media_dir);
        let engine = TemplateEngine::new();
        let renderer = CardRenderer::new(
            file_url(&self.config.media_dir.join("audio")),
            file_url(&self.config.media_dir.join("images")),
        );

        let results: Vec<Result<Option<(PathBuf, usize)>, BuildError>> = self
            .languages()
            .par_iter()
            .map(|lang| {
                let Some(deck) = self.prepare(lang, dataset, &templates, &media) else {
                    return Ok(None);
                };
                let path = self.config.output_dir.join(format!("preview_{}.html", lang));
                let cards = write_preview(&deck, &templates, &engine, &renderer, &path)?;
                tracing::info!("Wrote {} ({} cards)", path.display(), cards);
                Ok(Some((path, cards)))
            })
            .collect();

        let mut pages = Vec::new();
        let mut cards = 0;
        for result in results {
            if let Some((path, count)) = result? {
                pages.push(path);
                cards += count;
            }
        }

        Ok(PreviewResult {
            pages,
            cards,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn ensure_output_dir(&self) -> Result<(), BuildError> {
        fs::create_dir_all(&self.config.output_dir).map_err(|e| {
            BuildError::WriteError(format!("{}: {}", self.config.output_dir.display(), e))
        })
    }

    fn load_templates(&self) -> Result<TemplateSet, BuildError> {
        let mut templates = TemplateSet::load(&self.config.templates_dir)?;
        if self.config.minify {
            templates.minify_css();
        }
        Ok(templates)
    }

    /// Configured languages in order, each once.
    fn languages(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.config
            .languages
            .iter()
            .filter(|lang| seen.insert(lang.as_str()))
            .cloned()
            .collect()
    }

    /// Package path per language. Two languages may not share a path.
    fn package_paths(&self) -> Result<Vec<(String, PathBuf)>, BuildError> {
        let mut owners: HashMap<PathBuf, String> = HashMap::new();
        let mut jobs = Vec::new();

        for lang in self.languages() {
            let path = self
                .config
                .output_dir
                .join(self.config.file_name.replace("{lang}", &lang));
            if let Some(first) = owners.insert(path.clone(), lang.clone()) {
                return Err(BuildError::OutputCollision {
                    path,
                    first,
                    second: lang,
                });
            }
            jobs.push((lang, path));
        }

        Ok(jobs)
    }

    fn build_language(
        &self,
        lang: &str,
        path: &Path,
        dataset: &Dataset,
        templates: &TemplateSet,
        media: &MediaIndex,
    ) -> Result<Option<DeckSummary>, BuildError> {
        let Some(deck) = self.prepare(lang, dataset, templates, media) else {
            return Ok(None);
        };

        deck.package
            .write_to_file(path)
            .map_err(|source| BuildError::Package {
                path: path.to_path_buf(),
                source,
            })?;

        let summary = deck.summary(path.to_path_buf());
        tracing::info!(
            "Wrote {} ({} notes, {} media files)",
            summary.path.display(),
            summary.notes(),
            summary.media
        );

        Ok(Some(summary))
    }

    /// Notes, note types and media for `lang`, or `None` when the language
    /// has no data.
    fn prepare(
        &self,
        lang: &str,
        dataset: &Dataset,
        templates: &TemplateSet,
        media: &MediaIndex,
    ) -> Option<LanguageDeck> {
        let Some(data) = dataset.words_for(lang) else {
            tracing::warn!("No data for language '{}', skipping", lang);
            return None;
        };

        if let Some(report) = &data.merge {
            log_merge_report(lang, report);
        }

        if data.words.is_empty() {
            tracing::warn!("No vocabulary for language '{}', skipping", lang);
            return None;
        }

        let notes = NoteFactory::new(lang, self.config.sentence_mode).notes_for_words(&data.words);

        let mut collector = MediaCollector::new();
        for reading in data.words.iter().flat_map(|w| &w.readings) {
            collector.add_reading(media, reading);
        }
        let missing_media = collector.missing().to_vec();

        let deck_name = self.config.deck_name.replace("{lang}", lang);
        let deck = Deck {
            id: self.config.deck_id.unwrap_or_else(|| id_for(&deck_name)),
            name: deck_name,
            description: self.config.description.clone(),
        };

        let note_types = CardKind::ALL
            .into_iter()
            .map(|kind| {
                let name = NoteType::default_name(kind, lang);
                NoteType {
                    id: self
                        .config
                        .model_ids
                        .get(kind)
                        .unwrap_or_else(|| id_for(&name)),
                    name,
                    kind,
                    template: templates.get(kind).clone(),
                    css: templates.css.clone(),
                }
            })
            .collect();

        Some(LanguageDeck {
            lang: lang.to_string(),
            package: Package {
                deck,
                note_types,
                notes,
                media: collector.into_files(),
            },
            missing_media,
        })
    }
}

/// `file://` URL of a directory, with a trailing slash.
fn file_url(dir: &Path) -> String {
    let dir = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
    let path = dir.to_string_lossy().replace('\\', "/");
    // Windows verbatim prefix from canonicalize
    let path = path.strip_prefix("//?/").unwrap_or(&path);
    let path = path.replace(' ', "%20");
    if path.starts_with('/') {
        format!("file://{}/", path.trim_end_matches('/'))
    } else {
        format!("file:///{}/", path.trim_end_matches('/'))
    }
}

fn log_merge_report(lang: &str, report: &MergeReport) {
    for warning in report.warnings() {
        tracing::warn!("[{}] {}", lang, warning);
    }
}

fn write_preview(
    deck: &LanguageDeck,
    templates: &TemplateSet,
    engine: &TemplateEngine,
    renderer: &CardRenderer,
    path: &Path,
) -> Result<usize, BuildError> {
    let cards: Vec<PreviewCard> = deck
        .package
        .notes
        .iter()
        .map(|note| {
            let template = templates.get(note.kind);
            let fields = note.field_map();
            let front = renderer.render_front(&template.front, &fields);
            let back = renderer.render_back(&template.back, &fields, &front);
            PreviewCard {
                kind: note.kind.label().to_string(),
                title: strip_html(note.sort_field()),
                front,
                back,
                tags: note.tags.clone(),
            }
        })
        .collect();

    let count = cards.len();
    let context = PreviewContext {
        deck: deck.package.deck.name.clone(),
        lang: deck.lang.clone(),
        css: templates.css.clone(),
        cards,
    };

    let html = engine
        .render_page("preview.html", &context)
        .map_err(|e| BuildError::RenderError(e.to_string()))?;

    fs::write(path, html)
        .map_err(|e| BuildError::WriteError(format!("{}: {}", path.display(), e)))?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;
    use vocadeck_data::csv::{TranslationRow, VocabRow};
    use vocadeck_data::{Localized, Reading, Sentence, Word};

    fn localized(pairs: &[(&str, &str)]) -> Localized {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn nested() -> Dataset {
        Dataset::Nested(vec![
            Word {
                word: "猫".to_string(),
                tags: vec!["animals".to_string()],
                readings: vec![Reading {
                    reading: "ねこ".to_string(),
                    furigana: Some("猫[ねこ]".to_string()),
                    expression_audio: Some("neko.mp3".to_string()),
                    meaning: localized(&[("en", "cat"), ("de", "Katze")]),
                    sentences: vec![Sentence {
                        sentence: "猫が好きです。".to_string(),
                        translations: localized(&[("en", "I like cats.")]),
                        ..Default::default()
                    }],
                    ..Default::default()
                }],
            },
            Word {
                word: "犬".to_string(),
                readings: vec![Reading {
                    reading: "いぬ".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            },
        ])
    }

    fn config(root: &Path) -> BuildConfig {
        BuildConfig {
            output_dir: root.join("output"),
            templates_dir: root.join("templates"),
            media_dir: root.join("data"),
            ..Default::default()
        }
    }

    #[test]
    fn builds_one_deck_per_language() {
        let temp = tempdir().unwrap();
        let audio = temp.path().join("data").join("audio");
        fs::create_dir_all(&audio).unwrap();
        fs::write(audio.join("neko.mp3"), b"id3").unwrap();

        let builder = DeckBuilder::new(config(temp.path()));
        let result = builder.build(&nested()).unwrap();

        assert_eq!(result.decks.len(), 2);
        assert!(result.skipped.is_empty());

        let de = &result.decks[0];
        assert_eq!(de.lang, "de");
        assert_eq!(de.deck_name, "Japanese Vocab Deck (de)");
        assert_eq!(
            de.path,
            temp.path().join("output").join("japanese_coredeck_de.apkg")
        );
        assert_eq!(de.reading_notes, 2);
        assert_eq!(de.listening_notes, 1);
        // No German sentence translation.
        assert_eq!(de.translation_notes, 0);
        assert_eq!(de.media, 1);

        let en = &result.decks[1];
        assert_eq!(en.translation_notes, 1);
        assert_eq!(en.notes(), 4);
        assert!(en.path.exists());
    }

    #[test]
    fn reports_missing_media_without_failing() {
        let temp = tempdir().unwrap();

        let builder = DeckBuilder::new(BuildConfig {
            languages: vec!["en".to_string()],
            ..config(temp.path())
        });
        let result = builder.build(&nested()).unwrap();

        assert_eq!(result.decks[0].media, 0);
        assert_eq!(result.decks[0].missing_media, vec!["neko.mp3".to_string()]);
        assert!(result.decks[0].path.exists());
    }

    #[test]
    fn skips_languages_without_translations() {
        let temp = tempdir().unwrap();
        let dataset = Dataset::Tabular {
            vocab: vec![VocabRow {
                expression: "猫".to_string(),
                reading: "ねこ".to_string(),
                ..Default::default()
            }],
            translations: vec![(
                "en".to_string(),
                vec![TranslationRow {
                    expression: "猫".to_string(),
                    meaning: "cat".to_string(),
                    ..Default::default()
                }],
            )],
        };

        let builder = DeckBuilder::new(config(temp.path()));
        let result = builder.build(&dataset).unwrap();

        assert_eq!(result.skipped, vec!["de".to_string()]);
        assert_eq!(result.decks.len(), 1);
        assert_eq!(result.decks[0].reading_notes, 1);
        assert!(!temp
            .path()
            .join("output")
            .join("japanese_coredeck_de.apkg")
            .exists());
    }

    #[test]
    fn uses_configured_ids_and_names() {
        let temp = tempdir().unwrap();
        let builder = DeckBuilder::new(BuildConfig {
            languages: vec!["en".to_string()],
            file_name: "core_{lang}.apkg".to_string(),
            deck_name: "Core ({lang})".to_string(),
            deck_id: Some(2059400110),
            model_ids: ModelIds {
                reading: Some(1607392319),
                ..Default::default()
            },
            ..config(temp.path())
        });
        let templates = TemplateSet::builtin();
        let deck = builder
            .prepare("en", &nested(), &templates, &MediaIndex::default())
            .unwrap();

        assert_eq!(deck.package.deck.id, 2059400110);
        assert_eq!(deck.package.deck.name, "Core (en)");
        assert_eq!(deck.package.note_types[0].id, 1607392319);
        assert_eq!(
            deck.package.note_types[1].id,
            id_for("Japanese Vocab (en) - Listening")
        );

        let result = builder.build(&nested()).unwrap();
        assert!(temp.path().join("output").join("core_en.apkg").exists());
        assert_eq!(result.decks[0].deck_name, "Core (en)");
    }

    #[test]
    fn writes_preview_pages() {
        let temp = tempdir().unwrap();
        let builder = DeckBuilder::new(BuildConfig {
            languages: vec!["en".to_string()],
            ..config(temp.path())
        });

        let result = builder.preview(&nested()).unwrap();

        assert_eq!(result.cards, 4);
        assert_eq!(
            result.pages,
            vec![temp.path().join("output").join("preview_en.html")]
        );
        let html = fs::read_to_string(&result.pages[0]).unwrap();
        assert!(html.contains("Japanese Vocab Deck (en)"));
        assert!(html.contains("<ruby><rb>猫</rb><rt>ねこ</rt></ruby>"));
        assert!(html.contains("I like cats."));
    }

    #[test]
    fn rejects_languages_sharing_an_output_file() {
        let temp = tempdir().unwrap();
        let builder = DeckBuilder::new(BuildConfig {
            file_name: "deck.apkg".to_string(),
            ..config(temp.path())
        });

        let result = builder.build(&nested());

        match result {
            Err(BuildError::OutputCollision {
                path,
                first,
                second,
            }) => {
                assert_eq!(path, temp.path().join("output").join("deck.apkg"));
                assert_eq!(first, "de");
                assert_eq!(second, "en");
            }
            other => panic!("expected output collision, got {other:?}"),
        }
        assert!(!temp.path().join("output").join("deck.apkg").exists());
    }

    #[test]
    fn builds_repeated_language_once() {
        let temp = tempdir().unwrap();
        let builder = DeckBuilder::new(BuildConfig {
            languages: vec!["en".to_string(), "en".to_string()],
            ..config(temp.path())
        });

        let result = builder.build(&nested()).unwrap();

        assert_eq!(result.decks.len(), 1);
        assert_eq!(result.decks[0].lang, "en");
    }

    #[test]
    fn preview_links_media_by_file_url() {
        let temp = tempdir().unwrap();
        let images = temp.path().join("data").join("images");
        fs::create_dir_all(&images).unwrap();
        fs::write(images.join("neko.png"), b"png").unwrap();

        let dataset = Dataset::Nested(vec![Word {
            word: "猫".to_string(),
            readings: vec![Reading {
                reading: "ねこ".to_string(),
                image: Some("neko.png".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        }]);
        let builder = DeckBuilder::new(BuildConfig {
            languages: vec!["en".to_string()],
            ..config(temp.path())
        });

        let result = builder.preview(&dataset).unwrap();

        let html = fs::read_to_string(&result.pages[0]).unwrap();
        let expected = format!("{}neko.png", file_url(&images));
        assert!(expected.starts_with("file://"));
        assert!(html.contains(&format!(r#"<img src="{}">"#, expected)));
    }

    #[test]
    #[cfg(unix)]
    fn file_urls_end_with_slash() {
        let url = file_url(Path::new("/nonexistent/media dir/audio"));
        assert_eq!(url, "file:///nonexistent/media%20dir/audio/");
    }
}
