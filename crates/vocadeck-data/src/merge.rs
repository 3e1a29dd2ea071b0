//! Merge the flat vocabulary table with one language's translations.

use std::collections::{HashMap, HashSet};
use std::io::Write;

use serde::Serialize;

use crate::csv::{write_rows, CsvError, TranslationRow, VocabRow};
use crate::model::{Reading, Sentence, Word};

/// A vocabulary row joined with its translation.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub vocab: VocabRow,
    pub meaning: String,
    pub sentence_translation: String,
    pub explanation: String,
}

/// Outcome of a merge, including everything that did not line up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    /// Merged rows in translation-file order
    pub rows: Vec<MergedRow>,
    /// Expressions present in translations but not in the vocabulary
    pub unknown_expressions: Vec<String>,
    /// Vocabulary expressions without a translation, in vocabulary order
    pub untranslated: Vec<String>,
    /// Vocabulary expressions that appeared more than once
    pub duplicates: Vec<String>,
}

impl MergeReport {
    /// Convert the merged rows into nested words for `lang`.
    pub fn to_words(&self, lang: &str) -> Vec<Word> {
        self.rows.iter().map(|row| row.to_word(lang)).collect()
    }

    /// Human-readable warnings for everything that did not line up.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if !self.unknown_expressions.is_empty() {
            warnings.push(format!(
                "Expressions in translations but not in vocabulary: {}",
                self.unknown_expressions.join(", ")
            ));
        }
        if !self.untranslated.is_empty() {
            warnings.push(format!(
                "Expressions in vocabulary but not in translations: {}",
                self.untranslated.join(", ")
            ));
        }
        if !self.duplicates.is_empty() {
            warnings.push(format!(
                "Duplicate vocabulary expressions (last one wins): {}",
                self.duplicates.join(", ")
            ));
        }
        warnings
    }
}

impl MergedRow {
    /// One word with one reading and at most one sentence.
    pub fn to_word(&self, lang: &str) -> Word {
        let v = &self.vocab;
        let mut reading = Reading {
            reading: v.reading.clone(),
            furigana: some(&v.furigana),
            expression_audio: some(&v.expression_audio),
            image: some(&v.image_uri),
            ..Default::default()
        };
        insert(&mut reading.meaning, lang, &self.meaning);
        insert(&mut reading.explanation, lang, &self.explanation);

        if !v.sentence.is_empty() || !self.sentence_translation.is_empty() {
            let mut sentence = Sentence {
                sentence: v.sentence.clone(),
                sentence_kana: some(&v.sentence_kana),
                sentence_furigana: some(&v.sentence_furigana),
                sentence_audio: some(&v.sentence_audio),
                ..Default::default()
            };
            insert(&mut sentence.translations, lang, &self.sentence_translation);
            reading.sentences.push(sentence);
        }

        Word {
            word: v.expression.clone(),
            tags: v.tags.split(';').map(str::to_string).collect(),
            readings: vec![reading],
        }
    }
}

fn some(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn insert(map: &mut crate::model::Localized, lang: &str, value: &str) {
    if !value.is_empty() {
        map.insert(lang.to_string(), value.to_string());
    }
}

/// Flat record layout of `merged_<lang>.csv`.
#[derive(Serialize)]
struct MergedRecord<'a> {
    expression: &'a str,
    reading: &'a str,
    furigana: &'a str,
    sentence: &'a str,
    sentence_kana: &'a str,
    sentence_furigana: &'a str,
    sentence_audio: &'a str,
    expression_audio: &'a str,
    image_uri: &'a str,
    tags: &'a str,
    meaning: &'a str,
    sentence_translation: &'a str,
    explanation: &'a str,
}

impl<'a> From<&'a MergedRow> for MergedRecord<'a> {
    fn from(row: &'a MergedRow) -> Self {
        let v = &row.vocab;
        Self {
            expression: &v.expression,
            reading: &v.reading,
            furigana: &v.furigana,
            sentence: &v.sentence,
            sentence_kana: &v.sentence_kana,
            sentence_furigana: &v.sentence_furigana,
            sentence_audio: &v.sentence_audio,
            expression_audio: &v.expression_audio,
            image_uri: &v.image_uri,
            tags: &v.tags,
            meaning: &row.meaning,
            sentence_translation: &row.sentence_translation,
            explanation: &row.explanation,
        }
    }
}

/// Write merged rows as a flat CSV table with a header line.
pub fn write_merged<W: Write>(writer: W, rows: &[MergedRow]) -> Result<(), CsvError> {
    let records: Vec<MergedRecord<'_>> = rows.iter().map(MergedRecord::from).collect();
    write_rows(writer, &records)
}

/// Join vocabulary rows with translation rows by `expression`.
///
/// A later vocabulary row with the same expression replaces an earlier one.
pub fn merge_translations(vocab: &[VocabRow], translations: &[TranslationRow]) -> MergeReport {
    let mut report = MergeReport::default();
    let mut index: HashMap<&str, &VocabRow> = HashMap::new();

    for row in vocab {
        if index.insert(row.expression.as_str(), row).is_some()
            && !report.duplicates.contains(&row.expression)
        {
            report.duplicates.push(row.expression.clone());
        }
    }

    let mut used: HashSet<&str> = HashSet::new();
    for t in translations {
        match index.get(t.expression.as_str()) {
            Some(v) => {
                used.insert(t.expression.as_str());
                report.rows.push(MergedRow {
                    vocab: (*v).clone(),
                    meaning: t.meaning.clone(),
                    sentence_translation: t.sentence_translation.clone(),
                    explanation: t.explanation.clone(),
                });
            }
            None => report.unknown_expressions.push(t.expression.clone()),
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for row in vocab {
        let expr = row.expression.as_str();
        if !used.contains(expr) && seen.insert(expr) {
            report.untranslated.push(row.expression.clone());
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn vocab(expression: &str, sentence: &str) -> VocabRow {
        VocabRow {
            expression: expression.to_string(),
            reading: format!("{expression}-reading"),
            sentence: sentence.to_string(),
            tags: "core;jlpt 5".to_string(),
            ..Default::default()
        }
    }

    fn translation(expression: &str, meaning: &str, sentence: &str) -> TranslationRow {
        TranslationRow {
            expression: expression.to_string(),
            meaning: meaning.to_string(),
            sentence_translation: sentence.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn merges_in_translation_order() {
        let vocab = vec![vocab("猫", "猫がいる。"), vocab("犬", "犬がいる。")];
        let translations = vec![
            translation("犬", "dog", "There is a dog."),
            translation("猫", "cat", "There is a cat."),
        ];

        let report = merge_translations(&vocab, &translations);

        let expressions: Vec<_> = report
            .rows
            .iter()
            .map(|r| r.vocab.expression.as_str())
            .collect();
        assert_eq!(expressions, vec!["犬", "猫"]);
        assert!(report.unknown_expressions.is_empty());
        assert!(report.untranslated.is_empty());
    }

    #[test]
    fn reports_unmatched_expressions() {
        let vocab = vec![vocab("猫", ""), vocab("犬", "")];
        let translations = vec![translation("猫", "cat", ""), translation("鳥", "bird", "")];

        let report = merge_translations(&vocab, &translations);

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.unknown_expressions, vec!["鳥"]);
        assert_eq!(report.untranslated, vec!["犬"]);
    }

    #[test]
    fn warns_about_every_mismatch() {
        let vocab = vec![vocab("猫", ""), vocab("犬", ""), vocab("猫", "")];
        let translations = vec![translation("猫", "cat", ""), translation("鳥", "bird", "")];

        let report = merge_translations(&vocab, &translations);

        assert_eq!(
            report.warnings(),
            vec![
                "Expressions in translations but not in vocabulary: 鳥".to_string(),
                "Expressions in vocabulary but not in translations: 犬".to_string(),
                "Duplicate vocabulary expressions (last one wins): 猫".to_string(),
            ]
        );
        assert!(MergeReport::default().warnings().is_empty());
    }

    #[test]
    fn later_duplicate_wins() {
        let mut second = vocab("猫", "二番目");
        second.reading = "びょう".to_string();
        let vocab = vec![vocab("猫", "一番目"), second];

        let report = merge_translations(&vocab, &[translation("猫", "cat", "")]);

        assert_eq!(report.duplicates, vec!["猫"]);
        assert_eq!(report.rows[0].vocab.reading, "びょう");
    }

    #[test]
    fn converts_row_to_nested_word() {
        let report = merge_translations(
            &[vocab("猫", "猫がいる。")],
            &[translation("猫", "cat", "There is a cat.")],
        );

        let words = report.to_words("en");

        assert_eq!(words.len(), 1);
        assert_eq!(words[0].tags, vec!["core", "jlpt 5"]);
        let reading = &words[0].readings[0];
        assert_eq!(reading.meaning_for("en"), Some("cat"));
        assert_eq!(reading.expression_audio(), None);
        assert_eq!(reading.sentences.len(), 1);
        assert_eq!(
            reading.sentences[0].translation_for("en"),
            Some("There is a cat.")
        );
    }

    #[test]
    fn writes_flat_merged_table() {
        let report = merge_translations(
            &[vocab("猫", "猫がいる。")],
            &[translation("猫", "cat", "There is a cat.")],
        );

        let mut out = Vec::new();
        write_merged(&mut out, &report.rows).unwrap();
        let text = String::from_utf8(out).unwrap();

        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("expression,reading,furigana,sentence"));
        assert!(lines.next().unwrap().contains("cat,There is a cat."));
    }

    #[test]
    fn row_without_sentence_has_no_sentences() {
        let report = merge_translations(&[vocab("猫", "")], &[translation("猫", "cat", "")]);
        assert!(report.to_words("en")[0].readings[0].sentences.is_empty());
    }
}
