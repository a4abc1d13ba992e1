//! Replays recorded interactions from a cassette.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use serde_json::Value;

use super::format::Cassette;

/// Serves recorded outputs in order, one queue per `port::method` pair.
#[derive(Debug)]
pub struct CassetteReplayer {
    queues: Mutex<HashMap<(String, String), VecDeque<Value>>>,
}

impl CassetteReplayer {
    /// Create a replayer from a loaded cassette.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut interactions: Vec<_> = cassette.interactions.iter().collect();
        interactions.sort_by_key(|i| i.seq);

        let mut queues: HashMap<(String, String), VecDeque<Value>> = HashMap::new();
        for interaction in interactions {
            queues
                .entry((interaction.port.clone(), interaction.method.clone()))
                .or_default()
                .push_back(interaction.output.clone());
        }
        Self { queues: Mutex::new(queues) }
    }

    /// Read and parse a cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
        let cassette: Cassette = serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))?;
        Ok(Self::new(&cassette))
    }

    /// Take the next recorded output for `port::method`.
    ///
    /// # Errors
    ///
    /// Returns an error naming the pair if nothing (more) was recorded for it.
    pub fn next_output(&self, port: &str, method: &str) -> Result<Value, String> {
        let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
        let key = (port.to_string(), method.to_string());

        match queues.get_mut(&key) {
            Some(queue) => queue.pop_front().ok_or_else(|| {
                format!("Cassette exhausted: all interactions for {port}::{method} consumed")
            }),
            None => {
                let mut available: Vec<String> =
                    queues.keys().map(|(p, m)| format!("{p}::{m}")).collect();
                available.sort();
                Err(format!(
                    "Cassette has no interactions for {port}::{method}. Available: [{}]",
                    available.join(", ")
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::Interaction;
    use chrono::Utc;
    use serde_json::json;

    fn interaction(seq: u64, method: &str, output: Value) -> Interaction {
        Interaction { seq, port: "job_backend".into(), method: method.into(), input: json!({}), output }
    }

    fn cassette(interactions: Vec<Interaction>) -> Cassette {
        Cassette { name: "test".into(), recorded_at: Utc::now(), commit: "abc".into(), interactions }
    }

    #[test]
    fn replays_per_method_in_seq_order() {
        let replayer = CassetteReplayer::new(&cassette(vec![
            interaction(2, "check_status", json!("second")),
            interaction(0, "submit", json!("job")),
            interaction(1, "check_status", json!("first")),
        ]));

        assert_eq!(replayer.next_output("job_backend", "check_status").unwrap(), json!("first"));
        assert_eq!(replayer.next_output("job_backend", "submit").unwrap(), json!("job"));
        assert_eq!(replayer.next_output("job_backend", "check_status").unwrap(), json!("second"));
    }

    #[test]
    fn exhausted_pair_is_an_error() {
        let replayer = CassetteReplayer::new(&cassette(vec![interaction(0, "submit", json!(1))]));
        replayer.next_output("job_backend", "submit").unwrap();
        let err = replayer.next_output("job_backend", "submit").unwrap_err();
        assert!(err.contains("Cassette exhausted"));
    }

    #[test]
    fn unknown_pair_lists_available() {
        let replayer = CassetteReplayer::new(&cassette(vec![interaction(0, "submit", json!(1))]));
        let err = replayer.next_output("image_generator", "generate").unwrap_err();
        assert!(err.contains("job_backend::submit"));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.cassette.yaml");
        let yaml =
            serde_yaml::to_string(&cassette(vec![interaction(0, "submit", json!({"Ok": 1}))]))
                .unwrap();
        std::fs::write(&path, yaml).unwrap();

        let replayer = CassetteReplayer::load(&path).unwrap();
        assert_eq!(replayer.next_output("job_backend", "submit").unwrap(), json!({"Ok": 1}));
    }

    #[test]
    fn load_nonexistent_fails() {
        assert!(CassetteReplayer::load(Path::new("/nonexistent/cassette.yaml")).is_err());
    }
}
