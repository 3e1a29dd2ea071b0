//! JSON Lines and JSON array vocabulary files.

use crate::model::Word;

/// Errors that can occur when parsing JSON vocabulary data.
#[derive(Debug, thiserror::Error)]
pub enum JsonError {
    #[error("Invalid JSON at line {line}: {message}")]
    Line { line: usize, message: String },

    #[error("Invalid JSON: {0}")]
    Document(String),
}

/// Parse JSON Lines: one word object per non-blank line.
pub fn parse_lines(source: &str) -> Result<Vec<Word>, JsonError> {
    source
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| JsonError::Line {
                line: i + 1,
                message: e.to_string(),
            })
        })
        .collect()
}

/// Parse a JSON document whose top level is an array of words.
pub fn parse_array(source: &str) -> Result<Vec<Word>, JsonError> {
    serde_json::from_str(source).map_err(|e| JsonError::Document(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lines_and_skips_blanks() {
        let source = concat!(
            r#"{"word": "猫", "readings": [{"reading": "ねこ", "meaning": {"en": "cat"}}]}"#,
            "\n\n",
            r#"{"word": "犬", "tags": ["animals"]}"#,
            "\n"
        );

        let words = parse_lines(source).unwrap();

        assert_eq!(words.len(), 2);
        assert_eq!(words[0].readings[0].meaning_for("en"), Some("cat"));
        assert_eq!(words[1].tags, vec!["animals"]);
    }

    #[test]
    fn reports_line_number() {
        let source = "{\"word\": \"猫\"}\n\n{broken\n";

        let err = parse_lines(source).unwrap_err();

        assert!(matches!(err, JsonError::Line { line: 3, .. }));
    }

    #[test]
    fn parses_array_document() {
        let words = parse_array(r#"[{"word": "猫"}, {"word": "犬"}]"#).unwrap();
        assert_eq!(words.len(), 2);
    }
}
