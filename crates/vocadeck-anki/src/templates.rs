//! Card templates and the preview page template engine.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use minijinja::{context, Environment};
use regex::Regex;

use crate::assets::AssetPipeline;
use crate::models::{CardKind, Field};

/// Front and back HTML of a card, in Anki template syntax.
#[derive(Debug, Clone, PartialEq)]
pub struct CardTemplate {
    pub front: String,
    pub back: String,
}

impl CardTemplate {
    /// Fields referenced by the front template.
    pub fn front_fields(&self) -> Vec<Field> {
        referenced_names(&self.front)
            .iter()
            .filter_map(|name| Field::from_name(name))
            .collect()
    }

    /// Referenced names on either side that are not note fields.
    pub fn unknown_fields(&self) -> Vec<String> {
        let mut names = referenced_names(&self.front);
        for name in referenced_names(&self.back) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
            .into_iter()
            .filter(|n| n != "FrontSide" && Field::from_name(n).is_none())
            .collect()
    }
}

fn field_ref_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{([^{}]+)\}\}").expect("valid field reference regex"))
}

/// Field names referenced with `{{...}}`, without section markers or
/// filters, in first-seen order.
fn referenced_names(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for cap in field_ref_regex().captures_iter(template) {
        let inner = cap[1].trim();
        let inner = inner.trim_start_matches(['#', '^', '/']).trim();
        let name = inner.rsplit(':').next().unwrap_or(inner).trim().to_string();
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Errors that can occur when loading templates.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Template file {path}: {message}")]
    Io { path: PathBuf, message: String },
}

/// The card templates for all kinds plus the shared stylesheet.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    pub css: String,
    templates: BTreeMap<CardKind, CardTemplate>,
}

impl TemplateSet {
    /// The built-in templates.
    pub fn builtin() -> Self {
        let templates = CardKind::ALL
            .into_iter()
            .map(|kind| {
                let (front, back) = AssetPipeline::default_templates(kind);
                (
                    kind,
                    CardTemplate {
                        front: front.to_string(),
                        back: back.to_string(),
                    },
                )
            })
            .collect();

        Self {
            css: AssetPipeline::default_css().to_string(),
            templates,
        }
    }

    /// Load `front_<kind>.html`, `back_<kind>.html` and `style.css` from
    /// `dir`. Files that do not exist fall back to the built-in versions.
    pub fn load(dir: &Path) -> Result<Self, TemplateError> {
        let mut set = Self::builtin();

        if !dir.exists() {
            tracing::debug!(
                "Template directory {} not found, using built-in templates",
                dir.display()
            );
            return Ok(set);
        }

        if let Some(css) = read_optional(&dir.join("style.css"))? {
            set.css = css;
        }

        for kind in CardKind::ALL {
            let slug = kind.slug();
            let front = read_optional(&dir.join(format!("front_{slug}.html")))?;
            let back = read_optional(&dir.join(format!("back_{slug}.html")))?;

            if let Some(template) = set.templates.get_mut(&kind) {
                if let Some(front) = front {
                    template.front = front;
                }
                if let Some(back) = back {
                    template.back = back;
                }
            }
        }

        for kind in CardKind::ALL {
            let unknown = set.get(kind).unknown_fields();
            if !unknown.is_empty() {
                tracing::warn!(
                    "{} template references unknown fields: {}",
                    kind.label(),
                    unknown.join(", ")
                );
            }
        }

        Ok(set)
    }

    /// Template for `kind`.
    pub fn get(&self, kind: CardKind) -> &CardTemplate {
        // Every kind is inserted by `builtin`.
        &self.templates[&kind]
    }

    /// Minify the stylesheet in place, keeping the original on failure.
    pub fn minify_css(&mut self) {
        match AssetPipeline::minify_css(&self.css) {
            Ok(css) => self.css = css,
            Err(e) => tracing::warn!("Keeping unminified CSS: {}", e),
        }
    }

    /// Write the built-in templates into `dir` (used by `init`).
    pub fn write_builtin(dir: &Path, overwrite: bool) -> Result<Vec<PathBuf>, TemplateError> {
        let builtin = Self::builtin();
        let mut files = vec![(dir.join("style.css"), builtin.css.clone())];
        for kind in CardKind::ALL {
            let t = builtin.get(kind);
            files.push((dir.join(format!("front_{}.html", kind.slug())), t.front.clone()));
            files.push((dir.join(format!("back_{}.html", kind.slug())), t.back.clone()));
        }

        fs::create_dir_all(dir).map_err(|e| TemplateError::Io {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut written = Vec::new();
        for (path, content) in files {
            if path.exists() && !overwrite {
                continue;
            }
            fs::write(&path, content).map_err(|e| TemplateError::Io {
                path: path.clone(),
                message: e.to_string(),
            })?;
            written.push(path);
        }
        Ok(written)
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, TemplateError> {
    if !path.exists() {
        return Ok(None);
    }
    fs::read_to_string(path)
        .map(Some)
        .map_err(|e| TemplateError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// One rendered card for the preview page.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PreviewCard {
    /// Card kind label
    pub kind: String,
    /// Sort field value
    pub title: String,
    /// Rendered question HTML
    pub front: String,
    /// Rendered answer HTML
    pub back: String,
    /// Note tags
    pub tags: Vec<String>,
}

/// Context for rendering the preview page.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PreviewContext {
    /// Deck name
    pub deck: String,
    /// Language code
    pub lang: String,
    /// Card stylesheet
    pub css: String,
    /// Cards in deck order
    pub cards: Vec<PreviewCard>,
}

/// Template engine using minijinja.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create a new template engine with the preview templates.
    pub fn new() -> Self {
        let mut env = Environment::new();

        env.add_template_owned("base.html".to_string(), BASE_TEMPLATE.to_string())
            .expect("Failed to add base template");

        env.add_template_owned("preview.html".to_string(), PREVIEW_TEMPLATE.to_string())
            .expect("Failed to add preview template");

        Self { env }
    }

    /// Render a page using the specified template.
    pub fn render_page(
        &self,
        template: &str,
        context: &PreviewContext,
    ) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template(template)?;

        tmpl.render(context! {
            deck => &context.deck,
            lang => &context.lang,
            css => &context.css,
            cards => &context.cards,
        })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

const BASE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="{{ lang }}">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{ deck }} - Preview</title>
  <style>
    body { margin: 0; padding: 2rem; background: #eaeef2; font-family: system-ui, sans-serif; }
    .preview-card { display: grid; grid-template-columns: 1fr 1fr; gap: 1rem; margin-bottom: 2rem; }
    .preview-meta { grid-column: 1 / -1; font-size: 0.875rem; color: #57606a; }
    .preview-side { border: 1px solid #d0d7de; border-radius: 0.5rem; overflow: hidden; }
  </style>
  <style>{{ css | safe }}</style>
</head>
<body>
  {% block content %}{% endblock %}
</body>
</html>"##;

const PREVIEW_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block content %}
<h1>{{ deck }}</h1>
<p>{{ cards | length }} cards</p>
{% for card in cards %}
<section class="preview-card">
  <div class="preview-meta">{{ card.kind }} &middot; {{ card.title }}{% if card.tags %} &middot; {{ card.tags | join(" ") }}{% endif %}</div>
  <div class="preview-side card">{{ card.front | safe }}</div>
  <div class="preview-side card">{{ card.back | safe }}</div>
</section>
{% endfor %}
{% endblock %}"##;
