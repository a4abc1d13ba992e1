//! Service context that wires providers to port trait objects.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapters::live::gemini::{GeminiApi, GeminiGenerator};
use crate::adapters::live::gommo::{GommoBackend, GommoGenerator};
use crate::adapters::recording::image_generator::RecordingImageGenerator;
use crate::adapters::recording::job_backend::RecordingJobBackend;
use crate::adapters::replaying::image_generator::ReplayingImageGenerator;
use crate::adapters::replaying::job_backend::ReplayingJobBackend;
use crate::cassette::recorder::CassetteRecorder;
use crate::cassette::replayer::CassetteReplayer;
use crate::config::Config;
use crate::credentials::CredentialSet;
use crate::error::ImageError;
use crate::model::Provider;
use crate::poller::JobPoller;
use crate::ports::{ImageGenerator, JobBackend};
use crate::rotation::KeyRotator;

/// Bundles the generator used for one run.
pub struct ServiceContext {
    /// Image generator port.
    pub generator: Box<dyn ImageGenerator>,
}

/// Handle to a recording session that must be finished after use.
pub struct RecordingSession {
    recorder: CassetteRecorder,
}

impl RecordingSession {
    /// Write the cassette; returns its path and interaction count.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be written.
    pub fn finish(self) -> Result<(PathBuf, usize), String> {
        let count = self.recorder.interaction_count();
        let path = self.recorder.finish().map_err(|e| format!("Failed to write cassette: {e}"))?;
        Ok((path, count))
    }
}

/// Build the Gemini client with the merged credential set.
///
/// `user_keys` from the command line take precedence over configured keys;
/// the configured fallback key is always tried last.
#[must_use]
pub fn gemini_generator(config: &Config, user_keys: Option<&str>) -> GeminiGenerator {
    let user = user_keys.map(str::to_string).or_else(|| config.gemini_keys());
    let fallback = config.fallback_key();
    let credentials = CredentialSet::merge(user.as_deref(), fallback.as_deref());
    tracing::debug!(keys = credentials.len(), "gemini credential set");

    let rotator = KeyRotator::new("Gemini", "GEMINI_API_KEY", credentials);
    GeminiGenerator::new(GeminiApi::new(config.gemini.base_url.as_str()), rotator)
}

fn gommo_backend(config: &Config) -> Result<GommoBackend, ImageError> {
    let token = config.gommo_token().ok_or(ImageError::MissingApiKey {
        provider: "Gommo".into(),
        env_var: "GOMMO_ACCESS_TOKEN".into(),
    })?;
    Ok(GommoBackend::new(&config.gommo.base_url, token, config.gommo.domain.clone()))
}

fn gommo_generator(backend: Box<dyn JobBackend>, config: &Config) -> GommoGenerator {
    GommoGenerator::new(backend, JobPoller::new(config.poll_config()))
}

impl ServiceContext {
    /// Create a live context for the given provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider's credentials are not configured.
    pub fn live(
        provider: Provider,
        config: &Config,
        user_keys: Option<&str>,
    ) -> Result<Self, ImageError> {
        let generator: Box<dyn ImageGenerator> = match provider {
            Provider::Gemini => Box::new(gemini_generator(config, user_keys)),
            Provider::Gommo => Box::new(gommo_generator(Box::new(gommo_backend(config)?), config)),
        };
        Ok(Self { generator })
    }

    /// Create a recording context that wraps the live adapter with a recorder.
    ///
    /// Gemini is recorded per generation; Gommo per job call, so replays run
    /// the real polling loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider's credentials are not configured.
    pub fn recording(
        provider: Provider,
        config: &Config,
        user_keys: Option<&str>,
    ) -> Result<(Self, RecordingSession), ImageError> {
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let path = PathBuf::from(".genstudio/cassettes")
            .join(&timestamp)
            .join(format!("{}.cassette.yaml", provider.as_str()));
        let recorder = CassetteRecorder::new(
            path,
            format!("{timestamp}-{}", provider.as_str()),
            get_commit_hash(),
        );

        let generator: Box<dyn ImageGenerator> = match provider {
            Provider::Gemini => Box::new(RecordingImageGenerator::new(
                Box::new(gemini_generator(config, user_keys)),
                recorder.clone(),
            )),
            Provider::Gommo => {
                let backend =
                    RecordingJobBackend::new(Box::new(gommo_backend(config)?), recorder.clone());
                Box::new(gommo_generator(Box::new(backend), config))
            }
        };

        Ok((Self { generator }, RecordingSession { recorder }))
    }

    /// Create a replaying context from a cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be loaded.
    pub fn replaying(provider: Provider, path: &Path, config: &Config) -> Result<Self, ImageError> {
        let replayer = CassetteReplayer::load(path)
            .map_err(|e| ImageError::Config(format!("Failed to load cassette: {e}")))?;
        let replayer = Arc::new(replayer);

        let generator: Box<dyn ImageGenerator> = match provider {
            Provider::Gemini => Box::new(ReplayingImageGenerator::new(replayer)),
            Provider::Gommo => {
                Box::new(gommo_generator(Box::new(ReplayingJobBackend::new(replayer)), config))
            }
        };
        Ok(Self { generator })
    }
}

/// Get the current git commit hash, or "unknown" if unavailable.
fn get_commit_hash() -> String {
    std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map_or_else(|| "unknown".to_string(), |s| s.trim().to_string())
}
