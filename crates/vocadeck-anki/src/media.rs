//! Media lookup and collection for a package.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use vocadeck_data::Reading;

/// Resolves audio and image file names referenced by the data.
///
/// Audio lives under `<media_dir>/audio`, images under `<media_dir>/images`.
/// Files in nested directories are found by file name.
#[derive(Debug, Default)]
pub struct MediaIndex {
    audio_dir: PathBuf,
    image_dir: PathBuf,
    by_name: HashMap<String, PathBuf>,
}

impl MediaIndex {
    /// Scan the media directories under `media_dir`.
    pub fn scan(media_dir: &Path) -> Self {
        let audio_dir = media_dir.join("audio");
        let image_dir = media_dir.join("images");
        let mut by_name = HashMap::new();

        for dir in [&audio_dir, &image_dir] {
            if !dir.exists() {
                continue;
            }
            for entry in WalkDir::new(dir)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    by_name
                        .entry(name.to_string())
                        .or_insert_with(|| path.to_path_buf());
                }
            }
        }

        tracing::debug!(
            "Indexed {} media files under {}",
            by_name.len(),
            media_dir.display()
        );

        Self {
            audio_dir,
            image_dir,
            by_name,
        }
    }

    /// Path of an audio file, if it exists.
    pub fn audio(&self, name: &str) -> Option<PathBuf> {
        self.resolve(&self.audio_dir, name)
    }

    /// Path of an image file, if it exists.
    pub fn image(&self, name: &str) -> Option<PathBuf> {
        self.resolve(&self.image_dir, name)
    }

    fn resolve(&self, dir: &Path, name: &str) -> Option<PathBuf> {
        let direct = dir.join(name);
        if direct.is_file() {
            return Some(direct);
        }
        let file_name = Path::new(name).file_name()?.to_str()?;
        self.by_name.get(file_name).cloned()
    }
}

/// A media file stored in a package under the name the notes reference.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFile {
    pub name: String,
    pub path: PathBuf,
}

/// Media files for one package, each added once.
#[derive(Debug, Default)]
pub struct MediaCollector {
    files: Vec<MediaFile>,
    seen: HashSet<String>,
    missing: Vec<String>,
}

impl MediaCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the expression audio, image and every sentence audio of `reading`.
    pub fn add_reading(&mut self, index: &MediaIndex, reading: &Reading) {
        if let Some(audio) = reading.expression_audio() {
            self.add(audio, index.audio(audio));
        }
        if let Some(image) = reading.image() {
            self.add(image, index.image(image));
        }
        for sentence in &reading.sentences {
            if let Some(audio) = sentence.audio() {
                self.add(audio, index.audio(audio));
            }
        }
    }

    fn add(&mut self, name: &str, path: Option<PathBuf>) {
        if !self.seen.insert(name.to_string()) {
            return;
        }
        match path {
            Some(path) => self.files.push(MediaFile {
                name: name.to_string(),
                path,
            }),
            None => {
                tracing::warn!("Media file not found: {}", name);
                self.missing.push(name.to_string());
            }
        }
    }

    /// Names that could not be found.
    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    pub fn into_files(self) -> Vec<MediaFile> {
        self.files
    }
}
