//! Replaying adapter for the `JobBackend` port.

use std::sync::Arc;

use super::replay;
use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::JOB_BACKEND_PORT;
use crate::ports::job_backend::JobFuture;
use crate::ports::{GeneratedImage, ImageRequest, JobBackend, JobHandle, JobStatus};

/// Serves recorded job submissions, status reads and downloads.
pub struct ReplayingJobBackend {
    replayer: Arc<CassetteReplayer>,
}

impl ReplayingJobBackend {
    /// Create a replaying backend over `replayer`.
    #[must_use]
    pub fn new(replayer: Arc<CassetteReplayer>) -> Self {
        Self { replayer }
    }
}

impl JobBackend for ReplayingJobBackend {
    fn submit(&self, _request: &ImageRequest) -> JobFuture<'_, JobHandle> {
        let result = replay::<JobHandle>(&self.replayer, JOB_BACKEND_PORT, "submit");
        Box::pin(async move { result })
    }

    fn check_status(&self, _job_id: &str) -> JobFuture<'_, JobStatus> {
        let result = replay::<JobStatus>(&self.replayer, JOB_BACKEND_PORT, "check_status");
        Box::pin(async move { result })
    }

    fn fetch_result(&self, _url: &str) -> JobFuture<'_, GeneratedImage> {
        let result = replay::<GeneratedImage>(&self.replayer, JOB_BACKEND_PORT, "fetch_result");
        Box::pin(async move { result })
    }
}
