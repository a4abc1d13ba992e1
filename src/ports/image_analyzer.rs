//! Image analyzer port: describe a photo in text.

use std::future::Future;
use std::pin::Pin;

use super::image_generator::InputImage;
use crate::error::ImageError;

/// Boxed future type returned by [`ImageAnalyzer::analyze`].
pub type AnalyzeFuture<'a> = Pin<Box<dyn Future<Output = Result<String, ImageError>> + Send + 'a>>;

/// Produces a text description of an image.
pub trait ImageAnalyzer: Send + Sync {
    /// Analyze `image` following `instruction`.
    fn analyze(&self, image: &InputImage, instruction: &str) -> AnalyzeFuture<'_>;
}
