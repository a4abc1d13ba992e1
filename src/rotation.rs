//! Key rotation: run one logical API operation across a credential set.

use std::future::Future;

use tracing::{debug, warn};

use crate::credentials::{redact, CredentialSet};
use crate::error::ImageError;

/// Executes operations against one credential at a time, advancing to the
/// next credential only on quota or overload failures.
#[derive(Debug, Clone)]
pub struct KeyRotator {
    provider: String,
    env_var: String,
    credentials: CredentialSet,
}

impl KeyRotator {
    /// Create a rotator for the given provider.
    ///
    /// `env_var` names where the user can configure a key; it is only used
    /// for the error raised when the set is empty.
    pub fn new(
        provider: impl Into<String>,
        env_var: impl Into<String>,
        credentials: CredentialSet,
    ) -> Self {
        Self { provider: provider.into(), env_var: env_var.into(), credentials }
    }

    /// The credentials this rotator walks through.
    #[must_use]
    pub fn credentials(&self) -> &CredentialSet {
        &self.credentials
    }

    /// Run `op` with each credential in order until one succeeds.
    ///
    /// Attempts are strictly sequential. A failure that is not transient
    /// stops the rotation immediately, even if credentials remain.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::MissingApiKey`] if the set is empty, otherwise
    /// [`ImageError::Rejected`] carrying the category of the last failure.
    pub async fn call<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, ImageError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T, ImageError>>,
    {
        if self.credentials.is_empty() {
            return Err(ImageError::MissingApiKey {
                provider: self.provider.clone(),
                env_var: self.env_var.clone(),
            });
        }

        let total = self.credentials.len();
        let mut attempts = 0;
        let mut last_error = None;

        for key in self.credentials.iter() {
            attempts += 1;
            debug!(operation, key = %redact(key), attempt = attempts, total, "calling provider");

            match op(key.to_string()).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let kind = err.kind();
                    if kind.is_transient() && attempts < total {
                        warn!(
                            operation,
                            key = %redact(key),
                            ?kind,
                            "credential failed, rotating to next key"
                        );
                        last_error = Some(err);
                        continue;
                    }
                    last_error = Some(err);
                    break;
                }
            }
        }

        let err = last_error.unwrap_or_else(|| ImageError::Config("no credential attempted".into()));
        let kind = err.kind();
        warn!(operation, ?kind, attempts, "giving up");
        Err(ImageError::Rejected { kind, attempts, detail: err.to_string() })
    }
}
