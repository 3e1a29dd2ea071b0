//! Builds notes from words, one set per reading (or per sentence).

use std::collections::HashMap;

use serde::Deserialize;
use vocadeck_data::{sanitize_tags, Reading, Sentence, Word};

use crate::guid::guid_for;
use crate::models::{CardKind, Field};
use crate::render::FieldMap;

/// How the sentences of a reading map onto notes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentenceMode {
    /// All sentences of a reading go into one note, one per line
    #[default]
    Joined,
    /// One note per sentence
    Split,
}

/// Separator between joined sentences. Fields are rendered as HTML, where a
/// bare newline would collapse into a space.
const LINE_BREAK: &str = "<br>";

/// A note ready to be written into a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub kind: CardKind,
    pub guid: String,
    pub tags: Vec<String>,
    values: HashMap<Field, String>,
}

impl Note {
    /// Value of `field` (empty when unset).
    pub fn get(&self, field: Field) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    /// Field values in the order of this note's type.
    pub fn ordered_fields(&self) -> Vec<&str> {
        self.kind.fields().iter().map(|f| self.get(*f)).collect()
    }

    /// The sort field (first field of the note type).
    pub fn sort_field(&self) -> &str {
        self.get(self.kind.fields()[0])
    }

    /// Fields keyed by template name, for rendering.
    pub fn field_map(&self) -> FieldMap<'_> {
        self.kind
            .fields()
            .iter()
            .map(|f| (f.name(), self.get(*f)))
            .collect()
    }
}

/// Field values shared by the notes of one reading.
#[derive(Debug, Default)]
struct Fields {
    values: HashMap<Field, String>,
}

impl Fields {
    fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() {
            self.values.insert(field, value);
        }
    }

    fn get(&self, field: Field) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }
}

/// Creates reading, listening and translation notes for one language.
#[derive(Debug, Clone)]
pub struct NoteFactory {
    lang: String,
    mode: SentenceMode,
}

impl NoteFactory {
    pub fn new(lang: impl Into<String>, mode: SentenceMode) -> Self {
        Self {
            lang: lang.into(),
            mode,
        }
    }

    /// Notes for every reading of every word, in input order.
    pub fn notes_for_words(&self, words: &[Word]) -> Vec<Note> {
        words.iter().flat_map(|w| self.notes_for_word(w)).collect()
    }

    /// Notes for every reading of `word`.
    pub fn notes_for_word(&self, word: &Word) -> Vec<Note> {
        let tags = sanitize_tags(&word.tags);
        word.readings
            .iter()
            .flat_map(|reading| self.notes_for_reading(&word.word, reading, &tags))
            .collect()
    }

    /// Notes for one reading.
    ///
    /// A reading note is always created. A listening note needs expression
    /// audio; a translation note needs both a meaning and a sentence
    /// translation in this language.
    pub fn notes_for_reading(&self, word: &str, reading: &Reading, tags: &[String]) -> Vec<Note> {
        match self.mode {
            SentenceMode::Joined => {
                let fields = self.fields(word, reading, &reading.sentences);
                self.notes_from_fields(word, reading, fields, tags, None)
            }
            SentenceMode::Split if reading.sentences.is_empty() => {
                let fields = self.fields(word, reading, &[]);
                self.notes_from_fields(word, reading, fields, tags, None)
            }
            SentenceMode::Split => reading
                .sentences
                .iter()
                .enumerate()
                .flat_map(|(i, sentence)| {
                    let fields = self.fields(word, reading, std::slice::from_ref(sentence));
                    self.notes_from_fields(word, reading, fields, tags, Some(i))
                })
                .collect(),
        }
    }

    fn fields(&self, word: &str, reading: &Reading, sentences: &[Sentence]) -> Fields {
        let lang = self.lang.as_str();
        let mut fields = Fields::default();

        fields.set(Field::Expression, word);
        fields.set(Field::Reading, reading.reading.as_str());
        fields.set(Field::Furigana, reading.furigana().unwrap_or_default());
        fields.set(Field::Meaning, reading.meaning_for(lang).unwrap_or_default());
        fields.set(Field::ImageUri, reading.image().unwrap_or_default());
        if let Some(audio) = reading.expression_audio() {
            fields.set(Field::ExpressionAudio, sound(audio));
        }
        if let Some(explanation) = reading.explanation_for(lang) {
            fields.set(Field::Note, markdown_to_html(explanation));
        }

        fields.set(
            Field::Sentence,
            join_sentences(sentences, |s| Some(s.sentence.trim())),
        );
        fields.set(Field::SentenceKana, join_sentences(sentences, Sentence::kana));
        fields.set(
            Field::SentenceFurigana,
            join_sentences(sentences, Sentence::furigana),
        );
        fields.set(
            Field::SentenceTranslation,
            join_sentences(sentences, |s| s.translation_for(lang)),
        );
        if let Some(audio) = sentences.iter().find_map(Sentence::audio) {
            fields.set(Field::SentenceAudio, sound(audio));
        }

        fields
    }

    fn notes_from_fields(
        &self,
        word: &str,
        reading: &Reading,
        fields: Fields,
        tags: &[String],
        sentence_index: Option<usize>,
    ) -> Vec<Note> {
        let mut kinds = vec![CardKind::Reading];
        if !fields.get(Field::ExpressionAudio).is_empty() {
            kinds.push(CardKind::Listening);
        }
        if !fields.get(Field::Meaning).is_empty()
            && !fields.get(Field::SentenceTranslation).is_empty()
        {
            kinds.push(CardKind::Translation);
        }

        kinds
            .into_iter()
            .map(|kind| {
                let mut key = format!("{}{}{}{}", word, reading.reading, self.lang, kind.slug());
                if let Some(i) = sentence_index {
                    key.push_str(&format!("#{i}"));
                }
                Note {
                    kind,
                    guid: guid_for(&[&key]),
                    tags: tags.to_vec(),
                    values: fields.values.clone(),
                }
            })
            .collect()
    }
}

/// Join the non-empty values `f` picks from each sentence.
fn join_sentences<'a, F>(sentences: &'a [Sentence], f: F) -> String
where
    F: Fn(&'a Sentence) -> Option<&'a str>,
{
    sentences
        .iter()
        .filter_map(f)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(LINE_BREAK)
}

fn sound(file: &str) -> String {
    format!("[sound:{}]", file)
}

/// Render explanation Markdown to HTML.
fn markdown_to_html(source: &str) -> String {
    use pulldown_cmark::{html, Options, Parser};

    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let parser = Parser::new_ext(source, options);

    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);

    html_output.trim_end().to_string()
}
