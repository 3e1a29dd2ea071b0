//! Nested vocabulary records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Text keyed by language code (`"en"`, `"de"`, ...).
pub type Localized = BTreeMap<String, String>;

/// A vocabulary entry with one or more readings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Word {
    /// The written form, e.g. `ああ`
    #[serde(default, alias = "expression")]
    pub word: String,

    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Readings of this word
    #[serde(default)]
    pub readings: Vec<Reading>,
}

/// One pronunciation of a word with its meaning and example sentences.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Reading {
    /// Kana reading
    #[serde(default)]
    pub reading: String,

    /// Furigana markup (`漢字[かんじ]`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub furigana: Option<String>,

    /// Audio file name for the expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression_audio: Option<String>,

    /// Image file name
    #[serde(default, alias = "image_uri", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Meaning per language
    #[serde(default)]
    pub meaning: Localized,

    /// Markdown explanation per language
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub explanation: Localized,

    /// Example sentences
    #[serde(default)]
    pub sentences: Vec<Sentence>,
}

/// An example sentence.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Sentence {
    #[serde(default)]
    pub sentence: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentence_kana: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentence_furigana: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentence_audio: Option<String>,

    /// Translation per language
    #[serde(default)]
    pub translations: Localized,
}

impl Reading {
    /// Meaning in `lang`, if present and non-empty.
    pub fn meaning_for(&self, lang: &str) -> Option<&str> {
        localized(&self.meaning, lang)
    }

    /// Explanation in `lang`, if present and non-empty.
    pub fn explanation_for(&self, lang: &str) -> Option<&str> {
        localized(&self.explanation, lang)
    }

    pub fn furigana(&self) -> Option<&str> {
        non_empty(&self.furigana)
    }

    pub fn expression_audio(&self) -> Option<&str> {
        non_empty(&self.expression_audio)
    }

    pub fn image(&self) -> Option<&str> {
        non_empty(&self.image)
    }
}

impl Sentence {
    /// Translation in `lang`, if present and non-empty.
    pub fn translation_for(&self, lang: &str) -> Option<&str> {
        localized(&self.translations, lang)
    }

    pub fn kana(&self) -> Option<&str> {
        non_empty(&self.sentence_kana)
    }

    pub fn furigana(&self) -> Option<&str> {
        non_empty(&self.sentence_furigana)
    }

    pub fn audio(&self) -> Option<&str> {
        non_empty(&self.sentence_audio)
    }
}

fn localized<'a>(map: &'a Localized, lang: &str) -> Option<&'a str> {
    map.get(lang)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Normalize tags for Anki: trim, replace inner spaces with `_`, drop empties.
pub fn sanitize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().replace(' ', "_"))
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_tags() {
        let tags = sanitize_tags(["Tonari no Totoro", "  jlpt5 ", ""]);
        assert_eq!(tags, vec!["Tonari_no_Totoro", "jlpt5"]);
    }

    #[test]
    fn empty_optional_fields_are_absent() {
        let reading = Reading {
            expression_audio: Some("  ".to_string()),
            meaning: [("en".to_string(), String::new())].into_iter().collect(),
            ..Default::default()
        };

        assert_eq!(reading.expression_audio(), None);
        assert_eq!(reading.meaning_for("en"), None);
        assert_eq!(reading.meaning_for("de"), None);
    }

    #[test]
    fn accepts_expression_alias() {
        let word: Word = serde_json::from_str(r#"{"expression": "猫"}"#).unwrap();
        assert_eq!(word.word, "猫");
        assert!(word.readings.is_empty());
    }
}
