//! Image generator port for AI image generation APIs.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::ImageError;

/// A source photo sent along with the prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputImage {
    /// Raw image bytes.
    #[serde(with = "super::base64_bytes")]
    pub data: Vec<u8>,
    /// MIME type of the image (e.g., `"image/png"`).
    pub mime_type: String,
}

/// A request to generate one styled image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    /// The resolved model identifier (e.g., `"gemini-2.5-flash-image"`).
    pub model: String,
    /// Fully composed prompt (style, framing and user text).
    pub prompt: String,
    /// Aspect ratio (e.g., `"1:1"`, `"16:9"`).
    pub aspect_ratio: String,
    /// Output format (`"jpeg"`, `"png"`, `"webp"`).
    pub format: String,
    /// Source photo, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<InputImage>,
}

/// A single generated image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Raw image bytes (decoded from base64).
    #[serde(with = "super::base64_bytes")]
    pub data: Vec<u8>,
    /// MIME type of the image (e.g., `"image/jpeg"`).
    pub mime_type: String,
}

/// Response containing generated images.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResponse {
    /// The generated images.
    pub images: Vec<GeneratedImage>,
    /// Remote URL of the result, when the provider hosts it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

/// Boxed future type returned by [`ImageGenerator::generate`].
pub type GenerateFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ImageResponse, ImageError>> + Send + 'a>>;

/// Generates images from a prompt and source photo via an external API.
pub trait ImageGenerator: Send + Sync {
    /// Generate images for the given request.
    fn generate(&self, request: &ImageRequest) -> GenerateFuture<'_>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(input: Option<InputImage>) -> ImageRequest {
        ImageRequest {
            model: "gemini-2.5-flash-image".into(),
            prompt: "a cat in watercolor".into(),
            aspect_ratio: "1:1".into(),
            format: "jpeg".into(),
            input,
        }
    }

    #[test]
    fn request_without_input_omits_field() {
        let json = serde_json::to_value(request(None)).unwrap();
        assert!(json.get("input").is_none());
        let back: ImageRequest = serde_json::from_value(json).unwrap();
        assert!(back.input.is_none());
    }

    #[test]
    fn input_image_is_base64_in_json() {
        let input = InputImage { data: vec![0xFF, 0xD8, 0xFF], mime_type: "image/jpeg".into() };
        let json = serde_json::to_value(request(Some(input))).unwrap();
        assert_eq!(json["input"]["data"], "/9j/");
        let back: ImageRequest = serde_json::from_value(json).unwrap();
        assert_eq!(back.input.unwrap().data, vec![0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn response_source_url_defaults_to_none() {
        let json = serde_json::json!({"images": [{"data": "AQID", "mime_type": "image/png"}]});
        let response: ImageResponse = serde_json::from_value(json).unwrap();
        assert_eq!(response.images[0].data, vec![1, 2, 3]);
        assert!(response.source_url.is_none());
    }
}
