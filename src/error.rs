//! Unified error type and provider error classification.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category of a provider failure.
///
/// Classification happens once, where an HTTP response is turned into an
/// [`ImageError::Api`]. Callers match on the kind instead of the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApiErrorKind {
    /// Rate limit or quota exhausted for the credential.
    Quota,
    /// Provider temporarily overloaded.
    Overloaded,
    /// Credential rejected or lacking permission.
    Auth,
    /// Request rejected as malformed.
    InvalidInput,
    /// Model or resource does not exist.
    NotFound,
    /// Anything else.
    Unknown,
}

impl ApiErrorKind {
    /// Classify an HTTP status and response body.
    #[must_use]
    pub fn classify(status: u16, body: &str) -> Self {
        let body = body.to_lowercase();
        if status == 429 || body.contains("resource_exhausted") || body.contains("quota") {
            Self::Quota
        } else if status == 503 || body.contains("unavailable") || body.contains("overloaded") {
            Self::Overloaded
        } else if matches!(status, 401 | 403)
            || body.contains("permission_denied")
            || body.contains("api_key_invalid")
        {
            Self::Auth
        } else if status == 404 {
            Self::NotFound
        } else if matches!(status, 400 | 422) {
            Self::InvalidInput
        } else {
            Self::Unknown
        }
    }

    /// Whether another credential may succeed where this one failed.
    #[must_use]
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Quota | Self::Overloaded)
    }

    /// Whether repeating the same request can never succeed.
    #[must_use]
    pub fn is_permanent(self) -> bool {
        matches!(self, Self::Auth | Self::InvalidInput | Self::NotFound)
    }

    /// Human-readable message shown to the user for this category.
    #[must_use]
    pub fn user_message(self) -> &'static str {
        match self {
            Self::Auth => "Permission denied: the API key is invalid or lacks access",
            Self::Quota => "Quota exhausted on every API key; try again later or add another key",
            Self::Overloaded => "The model is overloaded on every API key; try again in a moment",
            Self::InvalidInput => "The request was rejected as invalid; check the image and options",
            Self::NotFound => "The requested model is unavailable",
            Self::Unknown => "Image generation failed",
        }
    }
}

/// Errors that can occur during image generation.
#[derive(Debug, Error)]
pub enum ImageError {
    /// An API returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code (0 when replayed from a cassette).
        status: u16,
        /// Classified failure category.
        kind: ApiErrorKind,
        /// Error message from the API.
        message: String,
    },

    /// A network error occurred.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Image format conversion error.
    #[error("Image conversion error: {0}")]
    ImageConversion(String),

    /// No API key configured for the provider.
    #[error("No API key for {provider}. Set {env_var} or add it to config file.")]
    MissingApiKey {
        /// The provider name.
        provider: String,
        /// The environment variable name.
        env_var: String,
    },

    /// Terminal outcome of a key-rotated call.
    #[error("{}: {detail}", kind.user_message())]
    Rejected {
        /// Category of the last failure.
        kind: ApiErrorKind,
        /// Number of credentials tried.
        attempts: usize,
        /// Underlying error text.
        detail: String,
    },

    /// The provider reported the job as failed.
    #[error("Generation job {job_id} failed with status {status}")]
    JobFailed {
        /// Provider job handle.
        job_id: String,
        /// Raw status string reported by the provider.
        status: String,
    },

    /// The provider reported success but returned no result URL.
    #[error("Generation job {job_id} succeeded without a result URL")]
    JobMissingResult {
        /// Provider job handle.
        job_id: String,
    },

    /// The job did not reach a terminal state within the attempt budget.
    #[error("Timed out waiting for job {job_id} after {attempts} status checks")]
    PollTimeout {
        /// Provider job handle.
        job_id: String,
        /// Number of status checks performed.
        attempts: u32,
    },

    /// Some photos in a batch failed; each failure was reported as it happened.
    #[error("{failed} of {total} images failed")]
    BatchFailed {
        /// Number of failed photos.
        failed: usize,
        /// Number of photos attempted.
        total: usize,
    },

    /// Gallery persistence error.
    #[error("Gallery error: {0}")]
    Gallery(String),
}

impl ImageError {
    /// Build an [`ImageError::Api`] from a failed HTTP response.
    #[must_use]
    pub fn api(status: u16, body: String) -> Self {
        Self::Api { status, kind: ApiErrorKind::classify(status, &body), message: body }
    }

    /// Failure category of this error.
    ///
    /// Argument and configuration errors count as invalid input, since
    /// repeating the call cannot fix them. Network and I/O errors are
    /// [`ApiErrorKind::Unknown`].
    #[must_use]
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            Self::Api { kind, .. } | Self::Rejected { kind, .. } => *kind,
            Self::InvalidArgument(_) | Self::Config(_) => ApiErrorKind::InvalidInput,
            Self::MissingApiKey { .. } => ApiErrorKind::Auth,
            _ => ApiErrorKind::Unknown,
        }
    }
}
