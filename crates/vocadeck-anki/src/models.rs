//! Note types (Anki "models") for the three card kinds.

use serde_json::{json, Value};

use crate::templates::CardTemplate;

/// A note field. Every note type carries all of them, in different orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Expression,
    Furigana,
    Meaning,
    Reading,
    Sentence,
    SentenceKana,
    SentenceFurigana,
    SentenceTranslation,
    SentenceAudio,
    ExpressionAudio,
    ImageUri,
    Note,
}

impl Field {
    /// Field name as it appears in templates.
    pub fn name(self) -> &'static str {
        match self {
            Self::Expression => "Expression",
            Self::Furigana => "Furigana",
            Self::Meaning => "Meaning",
            Self::Reading => "Reading",
            Self::Sentence => "Sentence",
            Self::SentenceKana => "SentenceKana",
            Self::SentenceFurigana => "SentenceFurigana",
            Self::SentenceTranslation => "SentenceTranslation",
            Self::SentenceAudio => "SentenceAudio",
            Self::ExpressionAudio => "ExpressionAudio",
            Self::ImageUri => "ImageURI",
            Self::Note => "Note",
        }
    }

    /// Look up a field by its template name.
    pub fn from_name(name: &str) -> Option<Self> {
        READING_ORDER.iter().copied().find(|f| f.name() == name)
    }
}

const READING_ORDER: [Field; 12] = [
    Field::Expression,
    Field::Furigana,
    Field::Meaning,
    Field::Reading,
    Field::Sentence,
    Field::SentenceKana,
    Field::SentenceFurigana,
    Field::SentenceTranslation,
    Field::SentenceAudio,
    Field::ExpressionAudio,
    Field::ImageUri,
    Field::Note,
];

const TRANSLATION_ORDER: [Field; 12] = [
    Field::Meaning,
    Field::SentenceTranslation,
    Field::Expression,
    Field::Furigana,
    Field::Reading,
    Field::Sentence,
    Field::SentenceKana,
    Field::SentenceFurigana,
    Field::SentenceAudio,
    Field::ExpressionAudio,
    Field::ImageUri,
    Field::Note,
];

/// The kind of card a note type produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CardKind {
    Reading,
    Listening,
    Translation,
}

impl CardKind {
    pub const ALL: [CardKind; 3] = [Self::Reading, Self::Listening, Self::Translation];

    /// Lowercase identifier used in file names and GUIDs.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Reading => "reading",
            Self::Listening => "listening",
            Self::Translation => "translation",
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Reading => "Reading",
            Self::Listening => "Listening",
            Self::Translation => "Translation",
        }
    }

    /// Field order of this kind's note type. The first field sorts notes.
    pub fn fields(self) -> &'static [Field] {
        match self {
            Self::Reading | Self::Listening => &READING_ORDER,
            Self::Translation => &TRANSLATION_ORDER,
        }
    }
}

/// A note type with its single card template.
#[derive(Debug, Clone)]
pub struct NoteType {
    pub id: i64,
    pub name: String,
    pub kind: CardKind,
    pub template: CardTemplate,
    pub css: String,
}

impl NoteType {
    /// Default note type name for `kind` in `lang`.
    pub fn default_name(kind: CardKind, lang: &str) -> String {
        format!("Japanese Vocab ({}) - {}", lang, kind.label())
    }

    pub fn fields(&self) -> &'static [Field] {
        self.kind.fields()
    }

    /// Indices of fields the front template needs; the card is generated
    /// when any of them is non-empty.
    pub fn required_fields(&self) -> Vec<usize> {
        let referenced = self.template.front_fields();
        let required: Vec<usize> = self
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, f)| referenced.contains(*f))
            .map(|(i, _)| i)
            .collect();

        if required.is_empty() {
            vec![0]
        } else {
            required
        }
    }

    /// Model JSON as stored in the collection's `col.models`.
    pub fn to_json(&self, deck_id: i64, modified: i64) -> Value {
        let fields: Vec<Value> = self
            .fields()
            .iter()
            .enumerate()
            .map(|(ord, f)| {
                json!({
                    "name": f.name(),
                    "ord": ord,
                    "font": "Liberation Sans",
                    "media": [],
                    "rtl": false,
                    "size": 20,
                    "sticky": false,
                })
            })
            .collect();

        json!({
            "id": self.id.to_string(),
            "name": self.name,
            "type": 0,
            "mod": modified,
            "usn": -1,
            "sortf": 0,
            "did": deck_id,
            "tmpls": [{
                "name": format!("{} Card", self.kind.label()),
                "ord": 0,
                "qfmt": self.template.front,
                "afmt": self.template.back,
                "bqfmt": "",
                "bafmt": "",
                "did": null,
                "bfont": "",
                "bsize": 0,
            }],
            "flds": fields,
            "css": self.css,
            "latexPre": LATEX_PRE,
            "latexPost": "\\end{document}",
            "latexsvg": false,
            "req": [[0, "any", self.required_fields()]],
            "tags": [],
            "vers": [],
        })
    }
}

const LATEX_PRE: &str = "\\documentclass[12pt]{article}\n\\special{papersize=3in,5in}\n\\usepackage[utf8]{inputenc}\n\\usepackage{amssymb,amsmath}\n\\pagestyle{empty}\n\\setlength{\\parindent}{0in}\n\\begin{document}\n";

#[cfg(test)]
mod tests {
    use super::*;

    fn note_type(kind: CardKind, front: &str) -> NoteType {
        NoteType {
            id: 1607392319,
            name: NoteType::default_name(kind, "en"),
            kind,
            template: CardTemplate {
                front: front.to_string(),
                back: "{{FrontSide}}<hr id=answer>{{Meaning}}".to_string(),
            },
            css: ".card {}".to_string(),
        }
    }

    #[test]
    fn translation_sorts_by_meaning() {
        assert_eq!(CardKind::Translation.fields()[0], Field::Meaning);
        assert_eq!(CardKind::Reading.fields()[0], Field::Expression);
        assert_eq!(CardKind::Translation.fields().len(), 12);
    }

    #[test]
    fn field_names_round_trip() {
        for field in READING_ORDER {
            assert_eq!(Field::from_name(field.name()), Some(field));
        }
        assert_eq!(Field::from_name("ImageURI"), Some(Field::ImageUri));
        assert_eq!(Field::from_name("Bogus"), None);
    }

    #[test]
    fn requirements_follow_front_template() {
        let nt = note_type(CardKind::Translation, "{{Meaning}}<br>{{SentenceTranslation}}");
        assert_eq!(nt.required_fields(), vec![0, 1]);

        let nt = note_type(CardKind::Listening, "{{ExpressionAudio}}");
        assert_eq!(nt.required_fields(), vec![9]);

        let nt = note_type(CardKind::Reading, "static text");
        assert_eq!(nt.required_fields(), vec![0]);
    }

    #[test]
    fn model_json_has_fields_and_template() {
        let nt = note_type(CardKind::Reading, "{{Expression}}");
        let json = nt.to_json(42, 1_700_000_000);

        assert_eq!(json["id"], "1607392319");
        assert_eq!(json["name"], "Japanese Vocab (en) - Reading");
        assert_eq!(json["did"], 42);
        assert_eq!(json["flds"].as_array().unwrap().len(), 12);
        assert_eq!(json["flds"][10]["name"], "ImageURI");
        assert_eq!(json["tmpls"][0]["name"], "Reading Card");
        assert_eq!(json["tmpls"][0]["qfmt"], "{{Expression}}");
    }
}
