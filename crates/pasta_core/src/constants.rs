//! Shared constants used across Pasta crates.

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default maximum paste size accepted by the service (1 MiB).
pub const DEFAULT_MAX_PASTE_SIZE: usize = 1024 * 1024;

/// Default number of creates allowed per client within one window.
pub const DEFAULT_RATE_LIMIT: u32 = 30;
/// Default rate-limit window length in seconds.
pub const DEFAULT_RATE_WINDOW_SECS: u64 = 60;
/// Default cap on the number of clients tracked by the rate limiter.
pub const DEFAULT_MAX_TRACKED_CLIENTS: usize = 10_000;

/// Default data directory for pastes.
pub const DEFAULT_DATA_DIR: &str = "data";
/// Default CORS origin allowed to call the API from a browser.
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

/// Number of random bytes in a random-mode identifier (8 hex chars).
pub const RANDOM_ID_BYTES: usize = 4;

/// Staging directory name (inside the data dir) for in-flight writes.
pub const STAGING_DIR_NAME: &str = ".tmp";
/// File name for the redb database within the data directory.
pub const REDB_FILE_NAME: &str = "pastes.redb";
