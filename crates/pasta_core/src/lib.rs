//! Core domain library for Pasta (config, identifiers, storage, rate limiting).

/// Configuration loading and defaults.
pub mod config;
/// Shared defaults and storage names.
pub mod constants;
/// Application error types (validation/storage/domain).
pub mod error;
/// Paste identifier generation.
pub mod ident;
/// Data models for persistence and API responses.
pub mod models;
/// Per-client create throttling.
pub mod rate_limit;
/// Paste orchestration (validate, throttle, identify, store).
pub mod service;
/// Paste storage backends.
pub mod store;
/// Payload validation rules.
pub mod validate;

pub use config::{Config, StorageBackend};
pub use constants::{DEFAULT_MAX_PASTE_SIZE, DEFAULT_PORT};
pub use error::{AppError, ValidationError};
pub use ident::IdentifierMode;
pub use models::paste::{Paste, PasteRef};
pub use rate_limit::RateLimiter;
pub use service::PasteService;
pub use store::{open_store, CreateOutcome, FsPasteStore, PasteStore, RedbPasteStore};
