//! Credential sets: ordered, deduplicated API keys.

/// Keys this short or shorter are treated as typos and dropped.
const MAX_INVALID_KEY_LEN: usize = 10;

/// An ordered list of API keys tried by the key rotator.
///
/// User-supplied keys come first, followed by the configured fallback key.
/// Order is first-seen and duplicates are removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialSet {
    keys: Vec<String>,
}

impl CredentialSet {
    /// Parse keys from free text separated by commas, semicolons, or newlines.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut set = Self::default();
        set.extend_from(text);
        set
    }

    /// Merge user-supplied keys with a process-wide fallback key.
    #[must_use]
    pub fn merge(user: Option<&str>, fallback: Option<&str>) -> Self {
        let mut set = Self::default();
        for text in [user, fallback].into_iter().flatten() {
            set.extend_from(text);
        }
        set
    }

    fn extend_from(&mut self, text: &str) {
        for token in text.split([',', ';', '\n', '\r']) {
            let key = token.trim();
            if key.len() > MAX_INVALID_KEY_LEN && !self.keys.iter().any(|k| k == key) {
                self.keys.push(key.to_string());
            }
        }
    }

    /// Whether the set holds no usable key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of keys in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Iterate over keys in rotation order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}

/// Render a key for logs, keeping only the last four characters.
#[must_use]
pub fn redact(key: &str) -> String {
    let tail: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    format!("…{tail}")
}
