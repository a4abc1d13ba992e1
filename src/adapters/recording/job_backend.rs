//! Recording adapter for the `JobBackend` port.

use serde_json::json;

use super::{record_outcome, request_summary};
use crate::cassette::recorder::CassetteRecorder;
use crate::cassette::JOB_BACKEND_PORT;
use crate::ports::job_backend::JobFuture;
use crate::ports::{GeneratedImage, ImageRequest, JobBackend, JobHandle, JobStatus};

/// Records every submit, status check and download of a wrapped backend.
pub struct RecordingJobBackend {
    inner: Box<dyn JobBackend>,
    recorder: CassetteRecorder,
}

impl RecordingJobBackend {
    /// Wrap `inner`, writing interactions to `recorder`.
    pub fn new(inner: Box<dyn JobBackend>, recorder: CassetteRecorder) -> Self {
        Self { inner, recorder }
    }
}

impl JobBackend for RecordingJobBackend {
    fn submit(&self, request: &ImageRequest) -> JobFuture<'_, JobHandle> {
        let request = request.clone();
        Box::pin(async move {
            let result = self.inner.submit(&request).await;
            let input = request_summary(&request);
            record_outcome(&self.recorder, JOB_BACKEND_PORT, "submit", input, &result);
            result
        })
    }

    fn check_status(&self, job_id: &str) -> JobFuture<'_, JobStatus> {
        let job_id = job_id.to_string();
        Box::pin(async move {
            let result = self.inner.check_status(&job_id).await;
            let input = json!({ "job_id": job_id });
            record_outcome(&self.recorder, JOB_BACKEND_PORT, "check_status", input, &result);
            result
        })
    }

    fn fetch_result(&self, url: &str) -> JobFuture<'_, GeneratedImage> {
        let url = url.to_string();
        Box::pin(async move {
            let result = self.inner.fetch_result(&url).await;
            let input = json!({ "url": url });
            record_outcome(&self.recorder, JOB_BACKEND_PORT, "fetch_result", input, &result);
            result
        })
    }
}
