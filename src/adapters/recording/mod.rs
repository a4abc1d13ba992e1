//! Recording adapters that capture interactions to cassettes.

pub mod image_generator;
pub mod job_backend;

use serde::Serialize;
use serde_json::{json, Value};

use crate::cassette::format::encode_outcome;
use crate::cassette::recorder::CassetteRecorder;
use crate::error::ImageError;
use crate::ports::ImageRequest;

/// Store one call and its outcome.
///
/// A value that cannot be serialized is logged and skipped rather than
/// failing the live call it shadows.
pub(crate) fn record_outcome<T: Serialize>(
    recorder: &CassetteRecorder,
    port: &str,
    method: &str,
    input: Value,
    result: &Result<T, ImageError>,
) {
    match encode_outcome(result) {
        Ok(output) => recorder.record(port, method, input, output),
        Err(e) => tracing::warn!(port, method, error = %e, "could not record interaction"),
    }
}

/// Cassette input for a request; source photo bytes are summarized, not stored.
pub(crate) fn request_summary(request: &ImageRequest) -> Value {
    json!({
        "model": request.model,
        "prompt": request.prompt,
        "aspect_ratio": request.aspect_ratio,
        "format": request.format,
        "input_bytes": request.input.as_ref().map(|i| i.data.len()),
    })
}
