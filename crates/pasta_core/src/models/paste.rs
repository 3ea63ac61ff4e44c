//! Paste data models.

use serde::Serialize;

/// A stored paste: identifier plus immutable content bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paste {
    pub id: String,
    pub content: Vec<u8>,
}

impl Paste {
    /// Pair an identifier with its content.
    pub fn new(id: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }
}

/// Reference handed back to callers after a create or update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasteRef {
    pub id: String,
    /// `true` when the content already existed under this identifier.
    pub deduplicated: bool,
}

impl PasteRef {
    pub(crate) fn new(id: String, deduplicated: bool) -> Self {
        Self { id, deduplicated }
    }

    /// Public URL of the paste under `base_url`.
    ///
    /// # Returns
    /// `{base_url}/data/{id}` with any trailing slash on `base_url` ignored.
    pub fn url(&self, base_url: &str) -> String {
        format!("{}/data/{}", base_url.trim_end_matches('/'), self.id)
    }
}
