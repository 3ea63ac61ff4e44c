//! Data models for persistence and API responses.

/// Paste rows and create/update references.
pub mod paste;
