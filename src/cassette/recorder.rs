//! Records port interactions into a cassette file.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use serde_json::Value;

use super::format::{Cassette, Interaction};

#[derive(Debug, Default)]
struct Tape {
    interactions: Vec<Interaction>,
    next_seq: u64,
}

/// Shared handle that collects interactions and writes them as YAML.
///
/// Clones record into the same tape, so one recorder can back several
/// recording adapters at once.
#[derive(Debug, Clone)]
pub struct CassetteRecorder {
    path: PathBuf,
    name: String,
    commit: String,
    tape: Arc<Mutex<Tape>>,
}

impl CassetteRecorder {
    /// Create a new recorder that will write to the given path.
    pub fn new(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        commit: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            commit: commit.into(),
            tape: Arc::default(),
        }
    }

    /// Append an interaction, assigning the next sequence number.
    pub fn record(&self, port: &str, method: &str, input: Value, output: Value) {
        let mut tape = self.tape.lock().unwrap_or_else(PoisonError::into_inner);
        let seq = tape.next_seq;
        tape.next_seq += 1;
        tape.interactions.push(Interaction {
            seq,
            port: port.to_string(),
            method: method.to_string(),
            input,
            output,
        });
    }

    /// Number of interactions recorded so far.
    #[must_use]
    pub fn interaction_count(&self) -> usize {
        self.tape.lock().unwrap_or_else(PoisonError::into_inner).interactions.len()
    }

    /// Write everything recorded so far to the cassette path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn finish(&self) -> Result<PathBuf, std::io::Error> {
        let interactions =
            self.tape.lock().unwrap_or_else(PoisonError::into_inner).interactions.clone();
        let cassette = Cassette {
            name: self.name.clone(),
            recorded_at: Utc::now(),
            commit: self.commit.clone(),
            interactions,
        };
        let yaml = serde_yaml::to_string(&cassette).map_err(std::io::Error::other)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, yaml)?;
        Ok(self.path.clone())
    }
}
