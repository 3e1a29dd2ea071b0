//! Flat CSV vocabulary and translation tables.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

/// A row of the vocabulary table (`vocab_jp.csv`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct VocabRow {
    pub expression: String,
    pub reading: String,
    pub furigana: String,
    pub sentence: String,
    pub sentence_kana: String,
    pub sentence_furigana: String,
    pub sentence_audio: String,
    pub expression_audio: String,
    pub image_uri: String,
    /// `;`-separated tags
    pub tags: String,
}

/// A row of a per-language translation table (`translations_<lang>.csv`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslationRow {
    pub expression: String,
    pub meaning: String,
    pub sentence_translation: String,
    pub explanation: String,
}

/// Errors that can occur when reading or writing CSV tables.
#[derive(Debug, thiserror::Error)]
pub enum CsvError {
    #[error("CSV is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("Invalid CSV at record {record}: {message}")]
    Record { record: usize, message: String },

    #[error("CSV error: {0}")]
    Other(String),
}

/// Read vocabulary rows. The `expression` column is required.
pub fn read_vocab<R: Read>(reader: R) -> Result<Vec<VocabRow>, CsvError> {
    read_rows(reader)
}

/// Read translation rows. The `expression` column is required.
pub fn read_translations<R: Read>(reader: R) -> Result<Vec<TranslationRow>, CsvError> {
    read_rows(reader)
}

fn read_rows<R, T>(reader: R) -> Result<Vec<T>, CsvError>
where
    R: Read,
    T: for<'de> Deserialize<'de>,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| CsvError::Other(e.to_string()))?;
    if !headers.iter().any(|h| h == "expression") {
        return Err(CsvError::MissingColumn("expression"));
    }

    csv_reader
        .deserialize()
        .enumerate()
        .map(|(i, row)| {
            row.map_err(|e| CsvError::Record {
                record: i + 1,
                message: e.to_string(),
            })
        })
        .collect()
}

/// Write rows with a header line.
pub fn write_rows<W, T>(writer: W, rows: &[T]) -> Result<(), CsvError>
where
    W: Write,
    T: Serialize,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer
            .serialize(row)
            .map_err(|e| CsvError::Other(e.to_string()))?;
    }
    csv_writer
        .flush()
        .map_err(|e| CsvError::Other(e.to_string()))?;
    Ok(())
}
