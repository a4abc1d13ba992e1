//! Recording adapter for the `ImageGenerator` port.

use super::{record_outcome, request_summary};
use crate::cassette::recorder::CassetteRecorder;
use crate::cassette::IMAGE_GENERATOR_PORT;
use crate::ports::image_generator::{GenerateFuture, ImageGenerator, ImageRequest};

/// Records image generation interactions while delegating to an inner implementation.
pub struct RecordingImageGenerator {
    inner: Box<dyn ImageGenerator>,
    recorder: CassetteRecorder,
}

impl RecordingImageGenerator {
    /// Creates a new recording generator wrapping the given implementation.
    pub fn new(inner: Box<dyn ImageGenerator>, recorder: CassetteRecorder) -> Self {
        Self { inner, recorder }
    }
}

impl ImageGenerator for RecordingImageGenerator {
    fn generate(&self, request: &ImageRequest) -> GenerateFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let result = self.inner.generate(&request).await;
            let input = request_summary(&request);
            record_outcome(&self.recorder, IMAGE_GENERATOR_PORT, "generate", input, &result);
            result
        })
    }
}
