//! Configuration file loading with environment variable overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::poller::{PollConfig, DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL};

/// Default Gemini REST endpoint for model calls.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Default Gommo API endpoint.
pub const DEFAULT_GOMMO_BASE_URL: &str = "https://api.gommo.net";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// API key configuration.
    #[serde(default)]
    pub keys: KeysConfig,

    /// Gemini endpoint settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Gommo endpoint and credentials.
    #[serde(default)]
    pub gommo: GommoConfig,

    /// Job polling cadence.
    #[serde(default)]
    pub polling: PollingConfig,

    /// Gallery storage.
    #[serde(default)]
    pub gallery: GalleryConfig,
}

/// API key configuration.
#[derive(Debug, Default, Deserialize)]
pub struct KeysConfig {
    /// Gemini API keys, separated by commas, semicolons, or newlines.
    pub gemini: Option<String>,
    /// Process-wide fallback key tried after every user key.
    pub fallback: Option<String>,
}

/// Gemini endpoint settings.
#[derive(Debug, Deserialize)]
pub struct GeminiConfig {
    /// Base URL for `models` calls.
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self { base_url: default_gemini_base_url() }
    }
}

fn default_gemini_base_url() -> String {
    DEFAULT_GEMINI_BASE_URL.to_string()
}

/// Gommo endpoint and credentials.
#[derive(Debug, Deserialize)]
pub struct GommoConfig {
    /// API base URL.
    #[serde(default = "default_gommo_base_url")]
    pub base_url: String,
    /// Access token issued by Gommo.
    pub access_token: Option<String>,
    /// Domain the token is registered for.
    #[serde(default)]
    pub domain: String,
}

impl Default for GommoConfig {
    fn default() -> Self {
        Self { base_url: default_gommo_base_url(), access_token: None, domain: String::new() }
    }
}

fn default_gommo_base_url() -> String {
    DEFAULT_GOMMO_BASE_URL.to_string()
}

/// Job polling cadence.
#[derive(Debug, Default, Deserialize)]
pub struct PollingConfig {
    /// Milliseconds between status checks.
    pub interval_ms: Option<u64>,
    /// Maximum number of status checks.
    pub max_attempts: Option<u32>,
}

/// Gallery storage.
#[derive(Debug, Default, Deserialize)]
pub struct GalleryConfig {
    /// Path of the gallery JSON file.
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the given path, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
        if config.polling.max_attempts == Some(0) {
            return Err(format!(
                "Invalid config {}: [polling] max_attempts must be at least 1",
                path.display()
            ));
        }
        Ok(config)
    }

    /// Gemini keys, preferring the environment variable.
    #[must_use]
    pub fn gemini_keys(&self) -> Option<String> {
        env_nonempty("GEMINI_API_KEY").or_else(|| self.keys.gemini.clone())
    }

    /// Fallback key, preferring the environment variable.
    #[must_use]
    pub fn fallback_key(&self) -> Option<String> {
        env_nonempty("GENSTUDIO_FALLBACK_KEY").or_else(|| self.keys.fallback.clone())
    }

    /// Gommo access token, preferring the environment variable.
    #[must_use]
    pub fn gommo_token(&self) -> Option<String> {
        env_nonempty("GOMMO_ACCESS_TOKEN").or_else(|| self.gommo.access_token.clone())
    }

    /// Polling cadence with defaults and the interval override applied.
    ///
    /// The attempt budget is never below one status check.
    #[must_use]
    pub fn poll_config(&self) -> PollConfig {
        let interval_ms = interval_override(env_nonempty("GENSTUDIO_POLL_INTERVAL_MS").as_deref())
            .or(self.polling.interval_ms);
        PollConfig {
            interval: interval_ms.map_or(DEFAULT_POLL_INTERVAL, Duration::from_millis),
            max_attempts: self.polling.max_attempts.unwrap_or(DEFAULT_MAX_POLL_ATTEMPTS).max(1),
        }
    }

    /// Gallery file path: configured value or `~/.local/share/genstudio/gallery.json`.
    #[must_use]
    pub fn gallery_path(&self) -> PathBuf {
        self.gallery.path.clone().unwrap_or_else(|| {
            std::env::var("HOME").map_or_else(
                |_| PathBuf::from("genstudio-gallery.json"),
                |home| PathBuf::from(home).join(".local/share/genstudio/gallery.json"),
            )
        })
    }
}

fn interval_override(raw: Option<&str>) -> Option<u64> {
    let raw = raw?;
    match raw.trim().parse() {
        Ok(ms) => Some(ms),
        Err(e) => {
            tracing::warn!(value = %raw, error = %e, "ignoring invalid GENSTUDIO_POLL_INTERVAL_MS");
            None
        }
    }
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Discover the config file path using the resolution order:
/// 1. Explicit path (from `--config` flag)
/// 2. `GENSTUDIO_CONFIG` environment variable
/// 3. `~/.config/genstudio/config.toml`
#[must_use]
pub fn discover_config_path(explicit: Option<&str>) -> PathBuf {
    if let Some(p) = explicit {
        return PathBuf::from(p);
    }

    if let Ok(p) = std::env::var("GENSTUDIO_CONFIG") {
        return PathBuf::from(p);
    }

    default_config_path()
}

/// Default config path: `~/.config/genstudio/config.toml`.
fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config/genstudio/config.toml")
    } else {
        PathBuf::from("genstudio.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.keys.gemini.is_none());
        assert!(config.keys.fallback.is_none());
        assert_eq!(config.gemini.base_url, DEFAULT_GEMINI_BASE_URL);
        assert_eq!(config.gommo.base_url, DEFAULT_GOMMO_BASE_URL);
        assert!(config.gommo.domain.is_empty());
    }

    #[test]
    fn load_nonexistent_returns_defaults() {
        let config = Config::load(Path::new("/nonexistent/path/config.toml")).unwrap();
        assert!(config.gallery.path.is_none());
    }

    #[test]
    fn load_valid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[keys]
gemini = "key-one-aaaaaaa, key-two-bbbbbbb"
fallback = "fallback-key-ccccc"

[gommo]
base_url = "http://localhost:9999"
access_token = "tok"
domain = "studio.example"

[polling]
interval_ms = 250
max_attempts = 12

[gallery]
path = "/tmp/gallery.json"
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.keys.gemini.as_deref(), Some("key-one-aaaaaaa, key-two-bbbbbbb"));
        assert_eq!(config.keys.fallback.as_deref(), Some("fallback-key-ccccc"));
        assert_eq!(config.gommo.base_url, "http://localhost:9999");
        assert_eq!(config.gommo.access_token.as_deref(), Some("tok"));
        assert_eq!(config.gommo.domain, "studio.example");
        assert_eq!(config.polling.max_attempts, Some(12));
        assert_eq!(config.gallery_path(), PathBuf::from("/tmp/gallery.json"));
        assert_eq!(config.gemini.base_url, DEFAULT_GEMINI_BASE_URL);
    }

    #[test]
    fn load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn poll_config_defaults_and_overrides() {
        let config = Config {
            polling: PollingConfig { interval_ms: None, max_attempts: Some(3) },
            ..Config::default()
        };
        let poll = config.poll_config();
        assert_eq!(poll.max_attempts, 3);
        if std::env::var("GENSTUDIO_POLL_INTERVAL_MS").is_err() {
            assert_eq!(poll.interval, DEFAULT_POLL_INTERVAL);
        }
    }

    #[test]
    fn zero_attempt_budget_still_checks_once() {
        let config = Config {
            polling: PollingConfig { interval_ms: Some(0), max_attempts: Some(0) },
            ..Config::default()
        };
        assert_eq!(config.poll_config().max_attempts, 1);
    }

    #[test]
    fn zero_attempt_budget_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[polling]\nmax_attempts = 0\n").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(err.contains("max_attempts"), "{err}");
    }

    #[test]
    fn interval_override_parsing() {
        assert_eq!(interval_override(Some("250")), Some(250));
        assert_eq!(interval_override(Some(" 0 ")), Some(0));
        assert_eq!(interval_override(Some("fast")), None);
        assert_eq!(interval_override(None), None);
    }

    #[test]
    fn fallback_key_from_file() {
        let config = Config {
            keys: KeysConfig { gemini: None, fallback: Some("from-file-fallback".into()) },
            ..Config::default()
        };
        if std::env::var("GENSTUDIO_FALLBACK_KEY").is_err() {
            assert_eq!(config.fallback_key().as_deref(), Some("from-file-fallback"));
        }
    }

    #[test]
    fn discover_explicit_path() {
        let path = discover_config_path(Some("/tmp/my-config.toml"));
        assert_eq!(path, PathBuf::from("/tmp/my-config.toml"));
    }
}
