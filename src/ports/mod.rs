//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the application core and an
//! external system. Implementations live in `src/adapters/`.

pub mod image_analyzer;
pub mod image_generator;
pub mod job_backend;

pub use image_analyzer::ImageAnalyzer;
pub use image_generator::{GeneratedImage, ImageGenerator, ImageRequest, ImageResponse, InputImage};
pub use job_backend::{JobBackend, JobHandle, JobState, JobStatus};

/// Serde helper for `Vec<u8>` fields stored as base64 strings.
mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(data);
        serializer.serialize_str(&encoded)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}
