//! Polling loop that waits for an asynchronous generation job to finish.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::ImageError;
use crate::ports::{JobState, JobStatus};

/// Wait between two status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Status checks before giving up (one hour at the default interval).
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 720;

/// Polling cadence and budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between consecutive status checks.
    pub interval: Duration,
    /// Maximum number of status checks.
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval: DEFAULT_POLL_INTERVAL, max_attempts: DEFAULT_MAX_POLL_ATTEMPTS }
    }
}

/// Turns a submitted job plus a status endpoint into a single awaited result.
#[derive(Debug, Clone, Copy, Default)]
pub struct JobPoller {
    config: PollConfig,
}

impl JobPoller {
    /// Create a poller with the given cadence.
    #[must_use]
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    /// Poll `check` until the job reaches a terminal state and return the
    /// result URL.
    ///
    /// One status check is outstanding at a time. Dropping the returned
    /// future stops polling.
    ///
    /// # Errors
    ///
    /// - [`ImageError::JobFailed`] when the provider reports `ERROR`/`FAILED`.
    /// - [`ImageError::JobMissingResult`] on `SUCCESS` without a URL.
    /// - The check's own error when it can never succeed (auth, invalid
    ///   input, not found).
    /// - [`ImageError::PollTimeout`] once `max_attempts` checks are spent.
    pub async fn wait<F, Fut>(&self, job_id: &str, mut check: F) -> Result<String, ImageError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<JobStatus, ImageError>>,
    {
        for attempt in 1..=self.config.max_attempts {
            if attempt > 1 {
                tokio::time::sleep(self.config.interval).await;
            }

            match check(job_id.to_string()).await {
                Ok(JobStatus { status: JobState::Success, url: Some(url) }) => {
                    debug!(job_id, attempt, "job finished");
                    return Ok(url);
                }
                Ok(JobStatus { status: JobState::Success, url: None }) => {
                    return Err(ImageError::JobMissingResult { job_id: job_id.to_string() });
                }
                Ok(JobStatus { status: JobState::Failed(raw), .. }) => {
                    return Err(ImageError::JobFailed { job_id: job_id.to_string(), status: raw });
                }
                Ok(JobStatus { status: JobState::Pending(raw), .. }) => {
                    debug!(job_id, attempt, status = %raw, "job still running");
                }
                Err(err) if err.kind().is_permanent() => return Err(err),
                Err(err) => {
                    warn!(job_id, attempt, error = %err, "status check failed, will retry");
                }
            }
        }

        Err(ImageError::PollTimeout { job_id: job_id.to_string(), attempts: self.config.max_attempts })
    }
}
