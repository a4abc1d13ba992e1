//! Live adapter for the Gemini `generateContent` API.
//!
//! Every call runs through the [`KeyRotator`], one credential at a time.

use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::credentials::{redact, CredentialSet};
use crate::error::{ApiErrorKind, ImageError};
use crate::ports::image_analyzer::AnalyzeFuture;
use crate::ports::image_generator::GenerateFuture;
use crate::ports::{
    GeneratedImage, ImageAnalyzer, ImageGenerator, ImageRequest, ImageResponse, InputImage,
};
use crate::rotation::KeyRotator;

/// Finish reasons Gemini reports when output was withheld.
const BLOCKED_FINISH_REASONS: &[&str] =
    &["SAFETY", "IMAGE_SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST", "RECITATION"];

/// Thin HTTP client for Gemini model endpoints, one key per call.
#[derive(Debug, Clone)]
pub struct GeminiApi {
    client: Client,
    base_url: String,
}

impl GeminiApi {
    /// Create a client for the given `models` base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: Client::new(), base_url: base_url.into().trim_end_matches('/').to_string() }
    }

    /// Call `{model}:generateContent` with `key`.
    ///
    /// # Errors
    ///
    /// Returns a classified [`ImageError::Api`] on non-2xx responses or
    /// unparseable bodies, and [`ImageError::Network`] on transport failure.
    pub async fn generate_content(
        &self,
        key: &str,
        model: &str,
        body: &Value,
    ) -> Result<GeminiResponse, ImageError> {
        let url = format!("{}/{model}:generateContent", self.base_url);
        tracing::debug!(%url, key = %redact(key), "gemini request");

        let response =
            self.client.post(&url).header("x-goog-api-key", key).json(body).send().await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(ImageError::api(status.as_u16(), response_text));
        }

        serde_json::from_str(&response_text)
            .map_err(|e| malformed(format!("Failed to parse response: {e}")))
    }

    /// List models visible to `key`; succeeds only for a usable key.
    ///
    /// # Errors
    ///
    /// Same as [`GeminiApi::generate_content`].
    pub async fn list_models(&self, key: &str) -> Result<usize, ImageError> {
        let response = self.client.get(&self.base_url).header("x-goog-api-key", key).send().await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(ImageError::api(status.as_u16(), response_text));
        }

        let parsed: ModelList = serde_json::from_str(&response_text)
            .map_err(|e| malformed(format!("Failed to parse model list: {e}")))?;
        Ok(parsed.models.len())
    }
}

fn malformed(message: String) -> ImageError {
    ImageError::Api { status: 200, kind: ApiErrorKind::Unknown, message }
}

/// Gemini-backed generator and analyzer.
pub struct GeminiGenerator {
    api: GeminiApi,
    rotator: KeyRotator,
}

impl GeminiGenerator {
    /// Create a generator calling `api` with the rotator's credentials.
    #[must_use]
    pub fn new(api: GeminiApi, rotator: KeyRotator) -> Self {
        Self { api, rotator }
    }

    /// Credentials the rotator will try, in order.
    #[must_use]
    pub fn credentials(&self) -> &CredentialSet {
        self.rotator.credentials()
    }

    /// Find the first credential that can list models.
    ///
    /// Returns the redacted working key and the number of visible models.
    ///
    /// # Errors
    ///
    /// Returns the rotator's terminal error when no key works.
    pub async fn validate(&self) -> Result<(String, usize), ImageError> {
        let api = &self.api;
        self.rotator
            .call("validate-key", |key| async move {
                let count = api.list_models(&key).await?;
                Ok((redact(&key), count))
            })
            .await
    }
}

impl ImageGenerator for GeminiGenerator {
    fn generate(&self, request: &ImageRequest) -> GenerateFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let body = generation_body(&request);
            let api = &self.api;
            let model = request.model.as_str();

            let images = self
                .rotator
                .call("generate", |key| {
                    let body = &body;
                    async move {
                        let parsed = api.generate_content(&key, model, body).await?;
                        extract_images(parsed)
                    }
                })
                .await?;

            Ok(ImageResponse { images, source_url: None })
        })
    }
}

impl ImageAnalyzer for GeminiGenerator {
    fn analyze(&self, image: &InputImage, instruction: &str) -> AnalyzeFuture<'_> {
        let body = json!({
            "contents": [{
                "parts": [inline_part(image), {"text": instruction}]
            }]
        });
        Box::pin(async move {
            let api = &self.api;
            let body = &body;
            self.rotator
                .call("analyze", |key| async move {
                    let parsed = api.generate_content(&key, ANALYZE_MODEL, body).await?;
                    extract_text(parsed)
                })
                .await
        })
    }
}

/// Text model used for photo analysis.
const ANALYZE_MODEL: &str = "gemini-2.5-flash";

fn inline_part(image: &InputImage) -> Value {
    json!({
        "inlineData": {
            "mimeType": image.mime_type,
            "data": base64::engine::general_purpose::STANDARD.encode(&image.data),
        }
    })
}

fn generation_body(request: &ImageRequest) -> Value {
    let mut parts = Vec::new();
    if let Some(ref input) = request.input {
        parts.push(inline_part(input));
    }
    parts.push(json!({"text": request.prompt}));

    json!({
        "contents": [{"parts": parts}],
        "generationConfig": {
            "responseModalities": ["TEXT", "IMAGE"],
            "imageConfig": {"aspectRatio": request.aspect_ratio}
        }
    })
}

fn blocked_reason(response: &GeminiResponse) -> Option<&str> {
    response
        .candidates
        .iter()
        .filter_map(|c| c.finish_reason.as_deref())
        .find(|r| BLOCKED_FINISH_REASONS.contains(r))
        .or_else(|| response.prompt_feedback.as_ref().and_then(|f| f.block_reason.as_deref()))
}

fn extract_images(response: GeminiResponse) -> Result<Vec<GeneratedImage>, ImageError> {
    if let Some(reason) = blocked_reason(&response) {
        return Err(ImageError::Api {
            status: 200,
            kind: ApiErrorKind::InvalidInput,
            message: format!("Output blocked by provider ({reason})"),
        });
    }

    let mut images = Vec::new();
    for candidate in response.candidates {
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if let Some(inline) = part.inline_data {
                let data = base64::engine::general_purpose::STANDARD
                    .decode(&inline.data)
                    .map_err(|e| malformed(format!("Failed to decode base64: {e}")))?;
                images.push(GeneratedImage { data, mime_type: inline.mime_type });
            }
        }
    }

    if images.is_empty() {
        return Err(malformed("No images in response".to_string()));
    }
    Ok(images)
}

fn extract_text(response: GeminiResponse) -> Result<String, ImageError> {
    if let Some(reason) = blocked_reason(&response) {
        return Err(ImageError::Api {
            status: 200,
            kind: ApiErrorKind::InvalidInput,
            message: format!("Output blocked by provider ({reason})"),
        });
    }

    let text: Vec<String> = response
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .filter_map(|p| p.text)
        .collect();

    if text.is_empty() {
        Err(malformed("No text in response".to_string()))
    } else {
        Ok(text.join("\n").trim().to_string())
    }
}

// --- Gemini API response types ---

/// Parsed `generateContent` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    inline_data: Option<GeminiInlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<Value>,
}
