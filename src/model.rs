//! Model name resolution and provider detection.

/// Supported API providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Google Gemini API (synchronous, key-rotated).
    Gemini,
    /// Gommo-compatible job API (asynchronous, polled).
    Gommo,
}

impl Provider {
    /// Short lowercase name, used in the gallery.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Gommo => "gommo",
        }
    }
}

/// Prefix that routes a model to the Gommo backend.
pub const GOMMO_PREFIX: &str = "gommo/";

/// Short name aliases for popular models.
const ALIASES: &[(&str, &str)] = &[
    ("nano-banana", "gemini-2.5-flash-image"),
    ("nano-banana-pro", "gemini-3-pro-image-preview"),
    ("imagen-4", "gommo/google_image_gen_4"),
    ("seedream", "gommo/seedream_4"),
];

/// Resolve a model name (alias or exact) to the full model identifier.
#[must_use]
pub fn resolve_model(name: &str) -> String {
    ALIASES
        .iter()
        .find(|&&(alias, _)| alias == name)
        .map_or_else(|| name.to_string(), |&(_, full)| full.to_string())
}

/// Detect the provider from a resolved model name.
///
/// # Errors
///
/// Returns an error if the model name doesn't match a known provider prefix.
pub fn detect_provider(model: &str) -> Result<Provider, String> {
    if model.starts_with("gemini") {
        Ok(Provider::Gemini)
    } else if model.starts_with(GOMMO_PREFIX) && model.len() > GOMMO_PREFIX.len() {
        Ok(Provider::Gommo)
    } else {
        Err(format!(
            "Unknown provider for model '{model}'. Expected 'gemini-*' or '{GOMMO_PREFIX}<model>'."
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_gemini_aliases() {
        assert_eq!(resolve_model("nano-banana"), "gemini-2.5-flash-image");
        assert_eq!(resolve_model("nano-banana-pro"), "gemini-3-pro-image-preview");
    }

    #[test]
    fn resolve_gommo_aliases() {
        assert_eq!(resolve_model("imagen-4"), "gommo/google_image_gen_4");
        assert_eq!(resolve_model("seedream"), "gommo/seedream_4");
    }

    #[test]
    fn resolve_exact_name_passthrough() {
        assert_eq!(resolve_model("gemini-3-pro-image-preview"), "gemini-3-pro-image-preview");
        assert_eq!(resolve_model("gommo/flux_dev"), "gommo/flux_dev");
    }

    #[test]
    fn detect_providers() {
        assert_eq!(detect_provider("gemini-2.5-flash-image").unwrap(), Provider::Gemini);
        assert_eq!(detect_provider("gommo/seedream_4").unwrap(), Provider::Gommo);
    }

    #[test]
    fn detect_unknown_provider() {
        assert!(detect_provider("dall-e-3").is_err());
        assert!(detect_provider("gommo/").is_err());
    }
}
