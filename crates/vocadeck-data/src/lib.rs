//! Vocabulary data model and loaders.
//!
//! This crate reads vocabulary files in the nested YAML/JSONL/JSON layout or
//! the flat CSV layout with per-language translation files, and merges the
//! flat layout into the same nested `Word -> Reading -> Sentence` records.

pub mod csv;
pub mod jsonl;
pub mod loader;
pub mod merge;
pub mod model;
pub mod yaml;

pub use loader::{load_dataset, DataError, DataSource, Dataset, Format, LanguageData};
pub use merge::{merge_translations, write_merged, MergeReport, MergedRow};
pub use model::{sanitize_tags, Localized, Reading, Sentence, Word};
