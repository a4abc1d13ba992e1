//! Cassette file layout and the `Ok`/`Err` outcome encoding.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ApiErrorKind, ImageError};

/// A recorded session: every port call made during one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cassette {
    /// Session name.
    pub name: String,
    /// When recording finished.
    pub recorded_at: DateTime<Utc>,
    /// Git commit the recording was made from.
    pub commit: String,
    /// Calls in the order they were made.
    pub interactions: Vec<Interaction>,
}

/// One call through a port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    /// Global sequence number within the cassette.
    pub seq: u64,
    /// Port name, e.g. `job_backend`.
    pub port: String,
    /// Method name, e.g. `check_status`.
    pub method: String,
    /// Summary of the call arguments.
    #[serde(default)]
    pub input: Value,
    /// `{Ok: value}` or `{Err: {kind, message}}`.
    pub output: Value,
}

/// Error as stored in a cassette, keeping its classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RecordedError {
    kind: ApiErrorKind,
    message: String,
    /// Keys tried, present only for errors that ended a key rotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attempts: Option<usize>,
}

impl From<&ImageError> for RecordedError {
    fn from(err: &ImageError) -> Self {
        match err {
            ImageError::Rejected { kind, attempts, detail } => {
                Self { kind: *kind, message: detail.clone(), attempts: Some(*attempts) }
            }
            other => Self { kind: other.kind(), message: other.to_string(), attempts: None },
        }
    }
}

impl From<RecordedError> for ImageError {
    fn from(recorded: RecordedError) -> Self {
        match recorded.attempts {
            Some(attempts) => {
                Self::Rejected { kind: recorded.kind, attempts, detail: recorded.message }
            }
            None => Self::Api { status: 0, kind: recorded.kind, message: recorded.message },
        }
    }
}

/// Encode a call result for storage.
///
/// # Errors
///
/// Returns an error if the `Ok` value cannot be serialized.
pub fn encode_outcome<T: Serialize>(
    result: &Result<T, ImageError>,
) -> Result<Value, serde_json::Error> {
    Ok(match result {
        Ok(value) => json!({ "Ok": serde_json::to_value(value)? }),
        Err(err) => json!({ "Err": RecordedError::from(err) }),
    })
}

/// Decode a stored call result.
///
/// Recorded errors come back as [`ImageError::Api`] with status 0 and their
/// original kind, so retry and polling decisions replay faithfully. Errors
/// that ended a key rotation come back as [`ImageError::Rejected`].
///
/// # Errors
///
/// Returns the recorded error, or [`ImageError::Config`] if the output is
/// malformed.
pub fn decode_outcome<T: DeserializeOwned>(output: Value) -> Result<T, ImageError> {
    let malformed = |e: serde_json::Error| ImageError::Config(format!("Malformed cassette output: {e}"));

    if let Some(err) = output.get("Err") {
        let recorded = match err {
            Value::String(message) => RecordedError {
                kind: ApiErrorKind::Unknown,
                message: message.clone(),
                attempts: None,
            },
            other => serde_json::from_value(other.clone()).map_err(malformed)?,
        };
        return Err(recorded.into());
    }

    let value = match output {
        Value::Object(mut map) if map.contains_key("Ok") => map.remove("Ok").unwrap_or_default(),
        other => other,
    };
    serde_json::from_value(value).map_err(malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{JobState, JobStatus};

    #[test]
    fn ok_outcome_round_trips() {
        let status = JobStatus { status: JobState::Success, url: Some("https://x/y.png".into()) };
        let encoded = encode_outcome(&Ok(status.clone())).unwrap();
        assert_eq!(encoded["Ok"]["status"], "SUCCESS");
        let decoded: JobStatus = decode_outcome(encoded).unwrap();
        assert_eq!(decoded, status);
    }

    #[test]
    fn err_outcome_keeps_kind() {
        let encoded = encode_outcome::<JobStatus>(&Err(ImageError::api(503, "busy".into()))).unwrap();
        assert_eq!(encoded["Err"]["kind"], "overloaded");
        let err = decode_outcome::<JobStatus>(encoded).unwrap_err();
        assert_eq!(err.kind(), ApiErrorKind::Overloaded);
        assert!(err.to_string().contains("busy"));
    }

    #[test]
    fn rejected_outcome_replays_without_doubled_prefix() {
        let rejected = ImageError::Rejected {
            kind: ApiErrorKind::Quota,
            attempts: 2,
            detail: "API error (429): RESOURCE_EXHAUSTED".into(),
        };
        let original = rejected.to_string();
        let encoded = encode_outcome::<JobStatus>(&Err(rejected)).unwrap();
        assert_eq!(encoded["Err"]["message"], "API error (429): RESOURCE_EXHAUSTED");
        assert_eq!(encoded["Err"]["attempts"], 2);

        let err = decode_outcome::<JobStatus>(encoded).unwrap_err();
        assert!(matches!(err, ImageError::Rejected { attempts: 2, .. }));
        assert_eq!(err.to_string(), original);
        assert!(!err.to_string().contains("API error (0)"));
    }

    #[test]
    fn plain_string_err_is_unknown() {
        let err = decode_outcome::<JobStatus>(json!({"Err": "boom"})).unwrap_err();
        assert_eq!(err.kind(), ApiErrorKind::Unknown);
    }

    #[test]
    fn bare_value_without_wrapper() {
        let status: JobStatus = decode_outcome(json!({"status": "PENDING"})).unwrap();
        assert_eq!(status.status, JobState::Pending("PENDING".into()));
    }

    #[test]
    fn malformed_output_is_config_error() {
        let err = decode_outcome::<JobStatus>(json!({"Ok": 17})).unwrap_err();
        assert!(matches!(err, ImageError::Config(_)));
    }
}
