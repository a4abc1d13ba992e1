//! Record/replay infrastructure for deterministic testing.

pub mod format;
pub mod recorder;
pub mod replayer;

/// Cassette port name for [`crate::ports::ImageGenerator`].
pub const IMAGE_GENERATOR_PORT: &str = "image_generator";

/// Cassette port name for [`crate::ports::JobBackend`].
pub const JOB_BACKEND_PORT: &str = "job_backend";
