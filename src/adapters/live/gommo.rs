//! Live adapter for Gommo-compatible asynchronous image jobs.

use base64::Engine;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ApiErrorKind, ImageError};
use crate::model::GOMMO_PREFIX;
use crate::poller::JobPoller;
use crate::ports::image_generator::GenerateFuture;
use crate::ports::job_backend::JobFuture;
use crate::ports::{
    GeneratedImage, ImageGenerator, ImageRequest, ImageResponse, JobBackend, JobHandle, JobState,
    JobStatus,
};

/// HTTP client for the Gommo job endpoints.
pub struct GommoBackend {
    client: Client,
    base_url: String,
    access_token: String,
    domain: String,
}

impl GommoBackend {
    /// Create a backend for `base_url` authenticated with `access_token`.
    #[must_use]
    pub fn new(base_url: &str, access_token: String, domain: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
            domain,
        }
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        fields: &[(&str, String)],
    ) -> Result<T, ImageError> {
        let url = format!("{}/{endpoint}", self.base_url);
        let mut form: Vec<(&str, &str)> =
            vec![("access_token", self.access_token.as_str()), ("domain", self.domain.as_str())];
        form.extend(fields.iter().map(|(k, v)| (*k, v.as_str())));

        let response = self.client.post(&url).form(&form).send().await?;
        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(ImageError::api(status.as_u16(), response_text));
        }

        serde_json::from_str(&response_text).map_err(|e| ImageError::Api {
            status: status.as_u16(),
            kind: ApiErrorKind::Unknown,
            message: format!("Failed to parse {endpoint} response: {e}"),
        })
    }
}

/// Error body Gommo returns with a 2xx status when it refuses a request.
fn refused(message: Option<String>) -> ImageError {
    let message = message.unwrap_or_else(|| "Gommo returned no job information".to_string());
    let kind = match ApiErrorKind::classify(200, &message) {
        ApiErrorKind::Unknown => ApiErrorKind::InvalidInput,
        kind => kind,
    };
    ImageError::Api { status: 200, kind, message }
}

impl JobBackend for GommoBackend {
    fn submit(&self, request: &ImageRequest) -> JobFuture<'_, JobHandle> {
        let model = request.model.strip_prefix(GOMMO_PREFIX).unwrap_or(&request.model).to_string();
        let mut fields = vec![
            ("action_type", "create".to_string()),
            ("model", model),
            ("prompt", request.prompt.clone()),
            ("ratio", request.aspect_ratio.clone()),
        ];
        if let Some(ref input) = request.input {
            let data = base64::engine::general_purpose::STANDARD.encode(&input.data);
            let data_uri = format!("data:{};base64,{data}", input.mime_type);
            let subjects = serde_json::json!([{ "data": data_uri }]);
            fields.push(("subjects", subjects.to_string()));
        }

        Box::pin(async move {
            let parsed: SubmitResponse = self.post_form("ai/generateImage", &fields).await?;
            let info = parsed.image_info.ok_or_else(|| refused(parsed.message))?;
            tracing::info!(job_id = %info.id_base, status = %info.status, "gommo job accepted");
            Ok(JobHandle { job_id: info.id_base })
        })
    }

    fn check_status(&self, job_id: &str) -> JobFuture<'_, JobStatus> {
        let fields = [("id_base", job_id.to_string())];
        Box::pin(async move {
            let parsed: StatusResponse = self.post_form("ai/image", &fields).await?;
            let info = parsed.data.ok_or_else(|| refused(parsed.message))?;
            if info.status.is_terminal() {
                tracing::debug!(job_id = %fields[0].1, status = %info.status, "gommo job finished");
            }
            Ok(JobStatus { status: info.status, url: info.url.filter(|u| !u.is_empty()) })
        })
    }

    fn fetch_result(&self, url: &str) -> JobFuture<'_, GeneratedImage> {
        let url = url.to_string();
        Box::pin(async move {
            let response = self.client.get(&url).send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ImageError::api(status.as_u16(), body));
            }

            let header_mime = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .filter(|v| v.starts_with("image/"))
                .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());
            let data = response.bytes().await?.to_vec();

            let mime_type = match header_mime {
                Some(mime) => mime,
                None => image::guess_format(&data)
                    .map(|f| f.to_mime_type().to_string())
                    .map_err(|e| {
                        ImageError::ImageConversion(format!("Unrecognized result image: {e}"))
                    })?,
            };
            Ok(GeneratedImage { data, mime_type })
        })
    }
}

/// Generator that submits a job, waits for it, and downloads the result.
pub struct GommoGenerator {
    backend: Box<dyn JobBackend>,
    poller: JobPoller,
}

impl GommoGenerator {
    /// Create a generator over any job backend.
    #[must_use]
    pub fn new(backend: Box<dyn JobBackend>, poller: JobPoller) -> Self {
        Self { backend, poller }
    }
}

impl ImageGenerator for GommoGenerator {
    fn generate(&self, request: &ImageRequest) -> GenerateFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let handle = self.backend.submit(&request).await?;
            let backend = &self.backend;
            let url = self.poller.wait(&handle.job_id, |id| backend.check_status(&id)).await?;
            let image = self.backend.fetch_result(&url).await?;
            Ok(ImageResponse { images: vec![image], source_url: Some(url) })
        })
    }
}

// --- Gommo API response types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    image_info: Option<GommoImageInfo>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct StatusResponse {
    data: Option<GommoImageInfo>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct GommoImageInfo {
    id_base: String,
    status: JobState,
    url: Option<String>,
}
