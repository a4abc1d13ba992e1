//! Local working set of photos being processed in one session.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ImageError;
use crate::ports::InputImage;

/// Processing state of one photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStatus {
    /// Added, not yet sent.
    Idle,
    /// Request in flight.
    Generating,
    /// Result saved.
    Completed,
    /// Generation failed.
    Error,
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Generating => "generating",
            Self::Completed => "completed",
            Self::Error => "error",
        })
    }
}

/// A photo in the working set.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    /// Position-independent id, unique within the set.
    pub id: usize,
    /// Path of the source photo.
    pub source: PathBuf,
    /// Loaded photo bytes.
    pub image: InputImage,
    /// Current state.
    pub status: ProcessingStatus,
    /// Whether the next batch run includes this photo.
    pub selected: bool,
    /// Where the generated image was saved.
    pub result_path: Option<PathBuf>,
    /// Failure message from the last attempt.
    pub error: Option<String>,
}

/// Counts per status.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Items still idle.
    pub idle: usize,
    /// Items in flight.
    pub generating: usize,
    /// Items completed.
    pub completed: usize,
    /// Items that failed.
    pub failed: usize,
}

/// Photos uploaded for this session. Removing one never touches the gallery.
#[derive(Debug, Default)]
pub struct WorkingSet {
    items: Vec<ProcessedImage>,
    next_id: usize,
}

impl WorkingSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a photo as idle and selected; returns its id.
    pub fn add(&mut self, source: PathBuf, image: InputImage) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.items.push(ProcessedImage {
            id,
            source,
            image,
            status: ProcessingStatus::Idle,
            selected: true,
            result_path: None,
            error: None,
        });
        id
    }

    /// Remove a photo from the set; returns whether it existed.
    pub fn remove(&mut self, id: usize) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    /// Look up a photo by id.
    #[must_use]
    pub fn get(&self, id: usize) -> Option<&ProcessedImage> {
        self.items.iter().find(|item| item.id == id)
    }

    fn get_mut(&mut self, id: usize) -> Option<&mut ProcessedImage> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    /// Include or exclude a photo from the next batch run.
    pub fn set_selected(&mut self, id: usize, selected: bool) {
        if let Some(item) = self.get_mut(id) {
            item.selected = selected;
        }
    }

    /// Ids of selected photos that are not already completed, in upload order.
    #[must_use]
    pub fn pending_selection(&self) -> Vec<usize> {
        self.items
            .iter()
            .filter(|item| item.selected && item.status != ProcessingStatus::Completed)
            .map(|item| item.id)
            .collect()
    }

    /// Mark a photo as in flight, clearing any previous error.
    pub fn mark_generating(&mut self, id: usize) {
        if let Some(item) = self.get_mut(id) {
            item.status = ProcessingStatus::Generating;
            item.error = None;
        }
    }

    /// Mark a photo as done with its saved result.
    pub fn mark_completed(&mut self, id: usize, result_path: PathBuf) {
        if let Some(item) = self.get_mut(id) {
            item.status = ProcessingStatus::Completed;
            item.result_path = Some(result_path);
        }
    }

    /// Mark a photo as failed.
    pub fn mark_error(&mut self, id: usize, message: String) {
        if let Some(item) = self.get_mut(id) {
            item.status = ProcessingStatus::Error;
            item.error = Some(message);
        }
    }

    /// Iterate over all photos in upload order.
    pub fn iter(&self) -> impl Iterator<Item = &ProcessedImage> {
        self.items.iter()
    }

    /// Count photos per status.
    #[must_use]
    pub fn summary(&self) -> Summary {
        self.items.iter().fold(Summary::default(), |mut s, item| {
            match item.status {
                ProcessingStatus::Idle => s.idle += 1,
                ProcessingStatus::Generating => s.generating += 1,
                ProcessingStatus::Completed => s.completed += 1,
                ProcessingStatus::Error => s.failed += 1,
            }
            s
        })
    }
}

/// Read a photo from disk and determine its MIME type.
///
/// The extension decides; unknown extensions fall back to sniffing the bytes.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a supported image.
pub fn load_input(path: &Path) -> Result<InputImage, ImageError> {
    let data = std::fs::read(path)?;
    let by_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .and_then(|ext| match ext.as_str() {
            "jpg" | "jpeg" => Some("image/jpeg"),
            "png" => Some("image/png"),
            "webp" => Some("image/webp"),
            _ => None,
        });

    let mime_type = match by_extension {
        Some(mime) => mime.to_string(),
        None => match image::guess_format(&data) {
            Ok(
                format @ (image::ImageFormat::Jpeg
                | image::ImageFormat::Png
                | image::ImageFormat::WebP),
            ) => format.to_mime_type().to_string(),
            _ => {
                return Err(ImageError::InvalidArgument(format!(
                    "Unsupported input image {}. Use jpeg, png or webp.",
                    path.display()
                )))
            }
        },
    };

    Ok(InputImage { data, mime_type })
}
