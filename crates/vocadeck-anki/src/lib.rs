//! Anki deck generation for vocadeck.
//!
//! Turns vocabulary words into reading, listening and translation notes,
//! renders them into Anki note types and writes `.apkg` packages, one per
//! target language.

pub mod assets;
pub mod builder;
pub mod collection;
pub mod guid;
pub mod media;
pub mod models;
pub mod notes;
pub mod package;
pub mod render;
pub mod templates;

pub use builder::{
    BuildConfig, BuildError, BuildResult, DeckBuilder, DeckSummary, ModelIds, PreviewResult,
};
pub use models::{CardKind, Field, NoteType};
pub use notes::{Note, NoteFactory, SentenceMode};
pub use package::{Package, PackageError};
pub use templates::{TemplateError, TemplateSet};
