//! Substitutes note fields into Anki card templates.
//!
//! Supports field references (`{{Field}}`), sections (`{{#Field}}...{{/Field}}`
//! and `{{^Field}}...{{/Field}}`), `{{FrontSide}}`, the `furigana`, `kana`,
//! `kanji` and `text` filters, and `[sound:file]` tags.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

fn section_open_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{([#^])\s*([^{}]+?)\s*\}\}").expect("valid section regex"))
}

fn field_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{([^#^/{}][^{}]*)\}\}").expect("valid field regex"))
}

fn furigana_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r" ?([^ >\[]+?)\[(.+?)\]").expect("valid furigana regex"))
}

fn sound_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[sound:([^\]]+)\]").expect("valid sound regex"))
}

fn img_src_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(<img\b[^>]*?\bsrc=")([^"]*)(")"#).expect("valid img regex"))
}

fn html_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid html regex"))
}

/// Remove HTML tags.
pub fn strip_html(text: &str) -> String {
    html_tag_regex().replace_all(text, "").to_string()
}

/// Field name to value.
pub type FieldMap<'a> = HashMap<&'a str, &'a str>;

/// Renders card sides the way a review screen would show them.
#[derive(Debug, Clone, Default)]
pub struct CardRenderer {
    /// Prefix for audio URLs (`[sound:x]` becomes `<audio src="{prefix}x">`)
    pub audio_prefix: String,
    /// Prefix for relative `<img src>` values
    pub image_prefix: String,
}

impl CardRenderer {
    pub fn new(audio_prefix: impl Into<String>, image_prefix: impl Into<String>) -> Self {
        Self {
            audio_prefix: audio_prefix.into(),
            image_prefix: image_prefix.into(),
        }
    }

    /// Render the question side.
    pub fn render_front(&self, template: &str, fields: &FieldMap<'_>) -> String {
        self.render(template, fields, "")
    }

    /// Render the answer side; `{{FrontSide}}` expands to `front`.
    pub fn render_back(&self, template: &str, fields: &FieldMap<'_>, front: &str) -> String {
        self.render(template, fields, front)
    }

    fn render(&self, template: &str, fields: &FieldMap<'_>, front: &str) -> String {
        let expanded = render_sections(template, fields);

        let substituted = field_regex().replace_all(&expanded, |cap: &Captures<'_>| {
            let mut parts: Vec<&str> = cap[1].split(':').map(str::trim).collect();
            let name = parts.pop().unwrap_or_default();
            if name == "FrontSide" {
                return front.to_string();
            }

            let mut value = fields.get(name).copied().unwrap_or_default().to_string();
            for filter in parts.iter().rev() {
                value = apply_filter(filter, &value);
            }
            value
        });

        let with_audio = sound_regex().replace_all(&substituted, |cap: &Captures<'_>| {
            format!(
                r#"<audio controls src="{}{}"></audio>"#,
                self.audio_prefix, &cap[1]
            )
        });

        img_src_regex()
            .replace_all(&with_audio, |cap: &Captures<'_>| {
                let src = &cap[2];
                if src.is_empty() || src.starts_with('/') || src.contains(':') {
                    cap[0].to_string()
                } else {
                    format!("{}{}{}{}", &cap[1], self.image_prefix, src, &cap[3])
                }
            })
            .to_string()
    }
}

fn render_sections(template: &str, fields: &FieldMap<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(cap) = section_open_regex().captures(rest) {
        let Some(open) = cap.get(0) else { break };
        let negated = &cap[1] == "^";
        let name = cap[2].to_string();

        out.push_str(&rest[..open.start()]);
        let after = &rest[open.end()..];
        let close = format!("{{{{/{}}}}}", name);

        match after.find(&close) {
            Some(pos) => {
                let present = fields
                    .get(name.as_str())
                    .is_some_and(|v| !v.trim().is_empty());
                if present != negated {
                    out.push_str(&render_sections(&after[..pos], fields));
                }
                rest = &after[pos + close.len()..];
            }
            // An unclosed section marker is dropped.
            None => rest = after,
        }
    }

    out.push_str(rest);
    out
}

fn apply_filter(filter: &str, value: &str) -> String {
    match filter {
        "furigana" => furigana_regex()
            .replace_all(value, "<ruby><rb>$1</rb><rt>$2</rt></ruby>")
            .to_string(),
        "kana" => furigana_regex().replace_all(value, "$2").to_string(),
        "kanji" => furigana_regex().replace_all(value, "$1").to_string(),
        "text" => strip_html(value),
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields<'a>(pairs: &[(&'a str, &'a str)]) -> FieldMap<'a> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn substitutes_fields() {
        let r = CardRenderer::default();
        let f = fields(&[("Expression", "猫"), ("Meaning", "cat")]);

        let html = r.render_front("<b>{{Expression}}</b> {{ Meaning }} {{Missing}}", &f);

        assert_eq!(html, "<b>猫</b> cat ");
    }

    #[test]
    fn handles_sections() {
        let r = CardRenderer::default();
        let f = fields(&[("Furigana", ""), ("Reading", "ねこ"), ("Note", "hi")]);
        let template = "{{#Furigana}}F{{/Furigana}}{{^Furigana}}{{Reading}}{{/Furigana}}{{#Note}}[{{Note}}]{{/Note}}";

        assert_eq!(r.render_front(template, &f), "ねこ[hi]");
    }

    #[test]
    fn nested_sections() {
        let r = CardRenderer::default();
        let f = fields(&[("Sentence", "s"), ("SentenceAudio", "")]);
        let template = "{{#Sentence}}<{{Sentence}}{{#SentenceAudio}}!{{/SentenceAudio}}>{{/Sentence}}";

        assert_eq!(r.render_front(template, &f), "<s>");
    }

    #[test]
    fn expands_front_side_and_sound() {
        let r = CardRenderer::new("media/", "images/");
        let f = fields(&[("ExpressionAudio", "[sound:neko.mp3]")]);

        let html = r.render_back("{{FrontSide}}<hr>{{ExpressionAudio}}", &f, "Q");

        assert_eq!(html, r#"Q<hr><audio controls src="media/neko.mp3"></audio>"#);
    }

    #[test]
    fn prefixes_relative_image_sources() {
        let r = CardRenderer::new("", "file:///deck/images/");
        let f = fields(&[("ImageURI", "neko.png")]);

        let html = r.render_front(
            r#"<img src="{{ImageURI}}"><img class="x" src="https://example.org/a.png">"#,
            &f,
        );

        assert_eq!(
            html,
            r#"<img src="file:///deck/images/neko.png"><img class="x" src="https://example.org/a.png">"#
        );
    }

    #[test]
    fn applies_furigana_filters() {
        let r = CardRenderer::default();
        let f = fields(&[("Furigana", "猫[ねこ]が 好[す]き")]);

        assert_eq!(
            r.render_front("{{furigana:Furigana}}", &f),
            "<ruby><rb>猫</rb><rt>ねこ</rt></ruby>が<ruby><rb>好</rb><rt>す</rt></ruby>き"
        );
        assert_eq!(r.render_front("{{kana:Furigana}}", &f), "ねこがすき");
        assert_eq!(r.render_front("{{kanji:Furigana}}", &f), "猫が好き");
    }

    #[test]
    fn text_filter_strips_html() {
        let r = CardRenderer::default();
        let f = fields(&[("Note", "<p>a <b>b</b></p>")]);
        assert_eq!(r.render_front("{{text:Note}}", &f), "a b");
    }
}
