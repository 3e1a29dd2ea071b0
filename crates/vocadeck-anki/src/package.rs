//! `.apkg` package writer.
//!
//! A package is a zip archive holding `collection.anki2`, a `media` JSON map
//! (`{"0": "file.mp3", ...}`) and the media files stored as `0`, `1`, ...

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use rusqlite::Connection;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::collection::{CollectionWriter, Deck};
use crate::media::MediaFile;
use crate::models::{CardKind, NoteType};
use crate::notes::Note;

/// Errors that can occur while writing a package.
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("No note type registered for {0:?} notes")]
    MissingNoteType(CardKind),

    #[error("Collection database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode media map: {0}")]
    Json(#[from] serde_json::Error),
}

/// A deck with its note types, notes and media, ready to be written.
#[derive(Debug, Clone)]
pub struct Package {
    pub deck: Deck,
    pub note_types: Vec<NoteType>,
    pub notes: Vec<Note>,
    pub media: Vec<MediaFile>,
}

impl Package {
    fn note_type_id(&self, kind: CardKind) -> Option<i64> {
        self.note_types
            .iter()
            .find(|nt| nt.kind == kind)
            .map(|nt| nt.id)
    }

    /// Write the package to `path` using the current time for ids.
    pub fn write_to_file(&self, path: &Path) -> Result<(), PackageError> {
        self.write_to_file_at(path, chrono::Utc::now().timestamp_millis())
    }

    /// Write the package to `path`; `now_ms` seeds note/card ids and
    /// modification times.
    pub fn write_to_file_at(&self, path: &Path, now_ms: i64) -> Result<(), PackageError> {
        for note in &self.notes {
            if self.note_type_id(note.kind).is_none() {
                return Err(PackageError::MissingNoteType(note.kind));
            }
        }

        let collection = self.build_collection(now_ms)?;

        let file = File::create(path)?;
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("collection.anki2", options)?;
        zip.write_all(&collection)?;

        let media_map: BTreeMap<String, &str> = self
            .media
            .iter()
            .enumerate()
            .map(|(i, m)| (i.to_string(), m.name.as_str()))
            .collect();
        zip.start_file("media", options)?;
        zip.write_all(serde_json::to_string(&media_map)?.as_bytes())?;

        for (i, media) in self.media.iter().enumerate() {
            let content = fs::read(&media.path)?;
            zip.start_file(i.to_string(), options)?;
            zip.write_all(&content)?;
        }

        zip.finish()?;
        Ok(())
    }

    /// Build `collection.anki2` in a scratch directory and return its bytes.
    fn build_collection(&self, now_ms: i64) -> Result<Vec<u8>, PackageError> {
        let scratch = tempfile::tempdir()?;
        let db_path = scratch.path().join("collection.anki2");

        {
            let mut conn = Connection::open(&db_path)?;
            let mut writer = CollectionWriter::new(&mut conn, now_ms);
            writer.init(&self.deck, &self.note_types)?;
            writer.insert_notes(self.deck.id, &self.notes, |note| {
                self.note_type_id(note.kind).unwrap_or_default()
            })?;
        }

        Ok(fs::read(&db_path)?)
    }
}
