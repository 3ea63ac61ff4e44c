//! Paste identifier generation.
//!
//! A deployment runs in exactly one [`IdentifierMode`]:
//! - [`IdentifierMode::Random`]: 4 random bytes, hex-encoded (8 chars). Short
//!   URLs, no dedup, and a 32-bit space with real birthday-bound collision risk.
//! - [`IdentifierMode::Content`]: hex SHA-256 of the content (64 chars).
//!   Identical payloads share one identifier, which doubles as dedup.

use crate::constants::RANDOM_ID_BYTES;
use rand::RngCore;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Hex length of a random-mode identifier.
pub const RANDOM_ID_LEN: usize = RANDOM_ID_BYTES * 2;
/// Hex length of a content-mode identifier.
pub const CONTENT_ID_LEN: usize = 64;

/// How identifiers are assigned to new pastes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierMode {
    #[default]
    Random,
    Content,
}

impl IdentifierMode {
    /// Assign an identifier for `content` according to this mode.
    pub fn assign(self, content: &[u8]) -> String {
        match self {
            Self::Random => new_random_id(),
            Self::Content => content_id(content),
        }
    }
}

impl FromStr for IdentifierMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "content" | "hash" | "sha256" => Ok(Self::Content),
            other => Err(format!("unknown identifier mode '{}'", other)),
        }
    }
}

impl fmt::Display for IdentifierMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Random => f.write_str("random"),
            Self::Content => f.write_str("content"),
        }
    }
}

/// Generate an opaque random identifier (8 lowercase hex chars).
///
/// Uses the thread-local CSPRNG. Existing keys are not consulted.
pub fn new_random_id() -> String {
    let mut bytes = [0u8; RANDOM_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Content address of `content`: lowercase hex SHA-256 digest.
pub fn content_id(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

/// Whether `id` has the shape of an identifier either mode could produce.
///
/// Anything else (path separators, dots, uppercase, other lengths) is never
/// looked up in a store.
pub fn is_well_formed(id: &str) -> bool {
    (id.len() == RANDOM_ID_LEN || id.len() == CONTENT_ID_LEN)
        && id
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
