//! HTTP server wiring for Pasta (routes, handlers, and shared state).

/// HTTP error mapping for API handlers.
pub mod error;
/// HTTP handlers for paste and site endpoints.
pub mod handlers;
/// Per-request facts derived from headers (client key, base URL, secret).
pub mod request_info;
/// Content-type sniffing for served pastes.
pub mod sniff;

pub use pasta_core::{
    config, open_store, AppError, Config, IdentifierMode, PasteService, PasteStore, RateLimiter,
    ValidationError, DEFAULT_PORT,
};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

/// Slack above the paste limit so multipart framing does not trip the body limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Bounds for the rate-limit sweep interval.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(100);
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Header carrying the shared secret for update/delete.
pub const SECRET_HEADER: HeaderName = HeaderName::from_static("x-pasta-secret");

/// Shared state passed to HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PasteService>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Construct shared application state around an opened store.
    ///
    /// # Arguments
    /// - `config`: Loaded configuration.
    /// - `store`: Opened paste store.
    ///
    /// # Returns
    /// A new [`AppState`] whose service uses the limits from `config`.
    pub fn new(config: Config, store: Arc<dyn PasteStore>) -> Self {
        let service = Arc::new(PasteService::from_config(&config, store));
        Self::with_service(config, service)
    }

    /// Construct shared application state with a pre-built service.
    pub fn with_service(config: Config, service: Arc<PasteService>) -> Self {
        Self {
            service,
            config: Arc::new(config),
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!("Ignoring invalid CORS origin '{}': {}", origin, err);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            SECRET_HEADER,
        ])
        .allow_credentials(true)
}

/// Create the application router with all routes and middleware.
///
/// # Arguments
/// - `state`: Shared application state.
///
/// # Returns
/// Configured `axum::Router`.
pub fn create_app(state: AppState) -> Router {
    let body_limit = state
        .service
        .max_paste_bytes()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let cors = cors_layer(&state.config);

    Router::new()
        .route(
            "/",
            get(handlers::site::usage).post(handlers::paste::create_paste),
        )
        .route("/robots.txt", get(handlers::site::robots_txt))
        .route(
            "/data/:id",
            get(handlers::paste::get_paste)
                .put(handlers::paste::update_paste)
                .delete(handlers::paste::delete_paste),
        )
        .route("/update/:id", post(handlers::paste::update_paste))
        .route("/delete/:id", post(handlers::paste::delete_paste))
        .with_state(state)
        .layer(
            tower::ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors)
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                )),
        )
}

/// Periodically drop expired rate-limiter entries.
///
/// # Arguments
/// - `limiter`: Limiter shared with the paste service.
/// - `every`: Sweep interval (clamped to between 100ms and one hour).
///
/// # Returns
/// Handle of the background task; abort it to stop sweeping.
pub fn spawn_rate_limit_sweeper(
    limiter: Arc<RateLimiter>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    let every = every.clamp(MIN_SWEEP_INTERVAL, MAX_SWEEP_INTERVAL);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let removed = limiter.sweep();
            if removed > 0 {
                tracing::debug!("Swept {} expired rate-limit entries", removed);
            }
        }
    })
}

/// Run the Axum server with graceful shutdown support.
///
/// Peer addresses are exposed to handlers for per-client rate limiting.
///
/// # Errors
/// Returns any I/O error produced by `axum::serve`.
pub async fn serve_router(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let app = create_app(state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal)
    .await
}
