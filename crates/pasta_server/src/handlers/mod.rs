//! HTTP request handlers.

/// Paste create/read/update/delete endpoints.
pub mod paste;
/// Usage page and robots.txt.
pub mod site;
