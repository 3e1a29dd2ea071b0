//! Nested YAML vocabulary files.
//!
//! ```yaml
//! - word: ああ
//!   tags: [Tonari_no_Totoro]
//!   readings:
//!     - reading: ああ
//!       expression_audio: ああ.mp3
//!       meaning:
//!         en: "oh"
//!       sentences:
//!         - sentence: "ああうるさい人は苦手です。"
//!           translations:
//!             en: "Oh, I can't stand noisy people."
//! ```

use serde_yaml::Value;

use crate::model::Word;

/// Errors that can occur when parsing a YAML vocabulary file.
#[derive(Debug, thiserror::Error)]
pub enum YamlError {
    #[error("YAML must be a list of items")]
    NotAList,

    #[error("Invalid YAML: {0}")]
    Invalid(String),
}

/// Parse a YAML document into words.
///
/// An empty document yields no words.
pub fn parse_words(source: &str) -> Result<Vec<Word>, YamlError> {
    let value: Value =
        serde_yaml::from_str(source).map_err(|e| YamlError::Invalid(e.to_string()))?;

    match value {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(_) => {
            serde_yaml::from_value(value).map_err(|e| YamlError::Invalid(e.to_string()))
        }
        _ => Err(YamlError::NotAList),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_words() {
        let source = r#"
- word: ああ
  tags: [Tonari_no_Totoro]
  readings:
    - reading: ああ
      expression_audio: ああ.mp3
      meaning:
        en: "oh"
        de: "oh"
      sentences:
        - sentence: "ああうるさい人は苦手です。"
          sentence_kana: "ああ うるさい ひと は にがて です"
          sentence_audio: "ああ_sentence.mp3"
          translations:
            en: "Oh, I can't stand noisy people."
            de: "Oh, ich kann laute Menschen nicht ausstehen."
"#;

        let words = parse_words(source).unwrap();

        assert_eq!(words.len(), 1);
        let reading = &words[0].readings[0];
        assert_eq!(reading.expression_audio(), Some("ああ.mp3"));
        assert_eq!(reading.meaning_for("de"), Some("oh"));
        assert_eq!(
            reading.sentences[0].translation_for("en"),
            Some("Oh, I can't stand noisy people.")
        );
    }

    #[test]
    fn tolerates_missing_fields() {
        let words = parse_words("- word: 猫\n- readings:\n  - reading: ねこ\n").unwrap();

        assert_eq!(words.len(), 2);
        assert!(words[0].readings.is_empty());
        assert_eq!(words[1].word, "");
        assert_eq!(words[1].readings[0].reading, "ねこ");
    }

    #[test]
    fn rejects_mapping_at_top_level() {
        let result = parse_words("word: 猫\n");
        assert!(matches!(result, Err(YamlError::NotAList)));
    }

    #[test]
    fn empty_document_is_empty_list() {
        assert!(parse_words("").unwrap().is_empty());
    }
}
