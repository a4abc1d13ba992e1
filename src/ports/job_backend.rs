//! Job backend port for providers that generate images asynchronously.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::image_generator::{GeneratedImage, ImageRequest};
use crate::error::ImageError;

/// Handle issued by the provider when a job is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    /// Opaque job identifier.
    pub job_id: String,
}

/// Provider-reported state of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    /// Still queued or running; carries the raw status string.
    Pending(String),
    /// Finished successfully.
    Success,
    /// Finished with an error; carries the raw status string.
    Failed(String),
}

impl JobState {
    /// Parse a provider status string. Unrecognized values count as pending.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SUCCESS" => Self::Success,
            "ERROR" | "FAILED" => Self::Failed(raw.to_string()),
            _ => Self::Pending(raw.to_string()),
        }
    }

    /// Whether the job has stopped changing.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending(_))
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending(raw) | Self::Failed(raw) => f.write_str(raw),
            Self::Success => f.write_str("SUCCESS"),
        }
    }
}

impl Serialize for JobState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for JobState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// One status read of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    /// Current state.
    pub status: JobState,
    /// Result URL, present once the job succeeded.
    #[serde(default)]
    pub url: Option<String>,
}

/// Boxed future type returned by [`JobBackend`] methods.
pub type JobFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ImageError>> + Send + 'a>>;

/// Submits generation jobs and reads their status.
pub trait JobBackend: Send + Sync {
    /// Submit a generation job.
    fn submit(&self, request: &ImageRequest) -> JobFuture<'_, JobHandle>;

    /// Read the current status of a job.
    fn check_status(&self, job_id: &str) -> JobFuture<'_, JobStatus>;

    /// Download the finished image.
    fn fetch_result(&self, url: &str) -> JobFuture<'_, GeneratedImage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_states() {
        assert_eq!(JobState::parse("SUCCESS"), JobState::Success);
        assert_eq!(JobState::parse("success"), JobState::Success);
        assert_eq!(JobState::parse("ERROR"), JobState::Failed("ERROR".into()));
        assert_eq!(JobState::parse("failed"), JobState::Failed("failed".into()));
    }

    #[test]
    fn unknown_states_are_pending() {
        assert_eq!(JobState::parse("PENDING"), JobState::Pending("PENDING".into()));
        assert_eq!(JobState::parse("PROCESSING"), JobState::Pending("PROCESSING".into()));
        assert!(!JobState::parse("").is_terminal());
        assert!(JobState::parse("ERROR").is_terminal());
    }

    #[test]
    fn status_from_provider_json() {
        let status: JobStatus =
            serde_json::from_str(r#"{"status":"SUCCESS","url":"https://cdn/x.png"}"#).unwrap();
        assert_eq!(status.status, JobState::Success);
        assert_eq!(status.url.as_deref(), Some("https://cdn/x.png"));

        let status: JobStatus = serde_json::from_str(r#"{"status":"PENDING"}"#).unwrap();
        assert!(status.url.is_none());
        assert_eq!(serde_json::to_value(&status).unwrap()["status"], "PENDING");
    }
}
