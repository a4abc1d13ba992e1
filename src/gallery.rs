//! Persisted gallery of generated images.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ImageError;

/// One saved generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryEntry {
    /// Unique id.
    pub id: Uuid,
    /// When the image was saved.
    pub created_at: DateTime<Utc>,
    /// Provider short name.
    pub provider: String,
    /// Resolved model identifier.
    pub model: String,
    /// Prompt sent to the provider.
    pub prompt: String,
    /// Source photo.
    pub source: PathBuf,
    /// Saved output file.
    pub output: PathBuf,
    /// Provider-hosted copy of the result, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
}

impl GalleryEntry {
    /// Create an entry stamped with a fresh id and the current time.
    #[must_use]
    pub fn new(
        provider: &str,
        model: &str,
        prompt: &str,
        source: PathBuf,
        output: PathBuf,
        remote_url: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            provider: provider.to_string(),
            model: model.to_string(),
            prompt: prompt.to_string(),
            source,
            output,
            remote_url,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct GalleryFile {
    #[serde(default)]
    entries: Vec<GalleryEntry>,
}

/// JSON-file gallery, newest entries last.
#[derive(Debug)]
pub struct Gallery {
    path: PathBuf,
    file: GalleryFile,
}

impl Gallery {
    /// Load the gallery at `path`; a missing file is an empty gallery.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ImageError> {
        let file = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            serde_json::from_str(&contents).map_err(|e| {
                ImageError::Gallery(format!("Failed to parse {}: {e}", path.display()))
            })?
        } else {
            GalleryFile::default()
        };
        Ok(Self { path: path.to_path_buf(), file })
    }

    /// Append an entry.
    pub fn add(&mut self, entry: GalleryEntry) {
        self.file.entries.push(entry);
    }

    /// All entries, oldest first.
    #[must_use]
    pub fn list(&self) -> &[GalleryEntry] {
        &self.file.entries
    }

    /// Remove the entry whose id starts with `id_prefix`.
    ///
    /// The saved image file is left on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if no entry or more than one entry matches.
    pub fn remove(&mut self, id_prefix: &str) -> Result<GalleryEntry, ImageError> {
        let matches: Vec<usize> = self
            .file
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.id.to_string().starts_with(id_prefix))
            .map(|(i, _)| i)
            .collect();

        match matches.as_slice() {
            [index] => Ok(self.file.entries.remove(*index)),
            [] => Err(ImageError::Gallery(format!("No gallery entry matches '{id_prefix}'"))),
            _ => Err(ImageError::Gallery(format!(
                "'{id_prefix}' matches {} entries; use a longer id",
                matches.len()
            ))),
        }
    }

    /// Remove every entry; returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let count = self.file.entries.len();
        self.file.entries.clear();
        count
    }

    /// Write the gallery to disk, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<(), ImageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.file)
            .map_err(|e| ImageError::Gallery(format!("Failed to serialize gallery: {e}")))?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}
