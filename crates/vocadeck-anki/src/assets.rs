//! Built-in card templates and CSS processing.

use crate::models::CardKind;

/// Asset pipeline utilities.
pub struct AssetPipeline;

impl AssetPipeline {
    /// The built-in card stylesheet.
    pub fn default_css() -> &'static str {
        DEFAULT_CSS
    }

    /// The built-in (front, back) templates for `kind`.
    pub fn default_templates(kind: CardKind) -> (&'static str, &'static str) {
        match kind {
            CardKind::Reading => (FRONT_READING, BACK_READING),
            CardKind::Listening => (FRONT_LISTENING, BACK_LISTENING),
            CardKind::Translation => (FRONT_TRANSLATION, BACK_TRANSLATION),
        }
    }

    /// Minify CSS using lightningcss.
    pub fn minify_css(css: &str) -> Result<String, String> {
        use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

        let stylesheet = StyleSheet::parse(css, ParserOptions::default())
            .map_err(|e| format!("CSS parse error: {}", e))?;

        let minified = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                ..Default::default()
            })
            .map_err(|e| format!("CSS minify error: {}", e))?;

        Ok(minified.code)
    }
}

const DEFAULT_CSS: &str = r#".card {
  font-family: "Hiragino Kaku Gothic Pro", "Noto Sans JP", "Yu Gothic", sans-serif;
  font-size: 22px;
  text-align: center;
  color: #1f2328;
  background-color: #fdfcf9;
  line-height: 1.5;
}

.night_mode .card {
  color: #e6edf3;
  background-color: #1c1f24;
}

.expression {
  font-size: 56px;
  margin: 0.5em 0 0.25em;
}

.reading {
  font-size: 28px;
  color: #57606a;
}

.meaning {
  font-size: 30px;
  font-weight: 600;
  margin: 0.5em 0;
}

.sentence {
  font-size: 26px;
  margin-top: 1em;
}

.sentence-kana,
.translation {
  font-size: 20px;
  color: #57606a;
}

.note {
  font-size: 16px;
  text-align: left;
  max-width: 36em;
  margin: 1.5em auto 0;
}

.image img {
  max-width: 80%;
  max-height: 240px;
  margin-top: 1em;
}

ruby rt {
  font-size: 0.5em;
}
"#;

const FRONT_READING: &str = r#"<div class="expression">{{Expression}}</div>
"#;

const BACK_READING: &str = r#"{{FrontSide}}
<hr id="answer">
<div class="reading">{{#Furigana}}{{furigana:Furigana}}{{/Furigana}}{{^Furigana}}{{Reading}}{{/Furigana}}</div>
<div class="meaning">{{Meaning}}</div>
{{ExpressionAudio}}
{{#Sentence}}
<div class="sentence">{{#SentenceFurigana}}{{furigana:SentenceFurigana}}{{/SentenceFurigana}}{{^SentenceFurigana}}{{Sentence}}{{/SentenceFurigana}}</div>
<div class="sentence-kana">{{SentenceKana}}</div>
<div class="translation">{{SentenceTranslation}}</div>
{{SentenceAudio}}
{{/Sentence}}
{{#ImageURI}}<div class="image"><img src="{{ImageURI}}"></div>{{/ImageURI}}
{{#Note}}<div class="note">{{Note}}</div>{{/Note}}
"#;

const FRONT_LISTENING: &str = r#"<div class="listening">{{ExpressionAudio}}</div>
"#;

const BACK_LISTENING: &str = r#"{{FrontSide}}
<hr id="answer">
<div class="expression">{{Expression}}</div>
<div class="reading">{{Reading}}</div>
<div class="meaning">{{Meaning}}</div>
{{#Sentence}}
<div class="sentence">{{Sentence}}</div>
<div class="translation">{{SentenceTranslation}}</div>
{{SentenceAudio}}
{{/Sentence}}
{{#ImageURI}}<div class="image"><img src="{{ImageURI}}"></div>{{/ImageURI}}
{{#Note}}<div class="note">{{Note}}</div>{{/Note}}
"#;

const FRONT_TRANSLATION: &str = r#"<div class="meaning">{{Meaning}}</div>
<div class="translation">{{SentenceTranslation}}</div>
"#;

const BACK_TRANSLATION: &str = r#"{{FrontSide}}
<hr id="answer">
<div class="expression">{{Expression}}</div>
<div class="reading">{{Reading}}</div>
<div class="sentence">{{Sentence}}</div>
<div class="sentence-kana">{{SentenceKana}}</div>
{{ExpressionAudio}}
{{SentenceAudio}}
{{#Note}}<div class="note">{{Note}}</div>{{/Note}}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minifies_default_css() {
        let css = AssetPipeline::minify_css(AssetPipeline::default_css()).unwrap();

        assert!(css.len() < DEFAULT_CSS.len());
        assert!(css.contains(".card{"));
    }

    #[test]
    fn every_kind_has_templates() {
        for kind in CardKind::ALL {
            let (front, back) = AssetPipeline::default_templates(kind);
            assert!(!front.is_empty());
            assert!(back.contains("{{FrontSide}}"));
        }
    }
}
