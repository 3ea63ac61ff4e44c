//! Pasta HTTP server entrypoint.

use pasta_core::{open_store, DEFAULT_MAX_PASTE_SIZE, DEFAULT_PORT};
use pasta_server::{serve_router, spawn_rate_limit_sweeper, AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct CliFlags {
    help: bool,
    version: bool,
}

fn parse_cli_flags(args: &[String]) -> anyhow::Result<CliFlags> {
    let mut flags = CliFlags::default();
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => flags.help = true,
            "--version" | "-V" => flags.version = true,
            value if value.starts_with('-') => {
                anyhow::bail!(
                    "Unknown option: '{}'. Use --help to see supported options.",
                    value
                );
            }
            value => {
                anyhow::bail!(
                    "Unexpected positional argument: '{}'. Use --help to see supported options.",
                    value
                );
            }
        }
    }
    Ok(flags)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pasta_server=info,pasta_core=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let cli_flags = parse_cli_flags(&args)?;

    if cli_flags.help {
        print_help();
        return Ok(());
    }
    if cli_flags.version {
        println!("pasta {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = Config::from_env();
    let store = open_store(&config)?;
    let state = AppState::new(config.clone(), store);

    if config.shared_secret.is_none() {
        tracing::info!("PASTA_SECRET not set; update and delete are disabled");
    }
    if config.trust_forwarded_for {
        tracing::warn!("Trusting X-Forwarded-For for client identity; run behind a proxy");
    }

    let sweeper = spawn_rate_limit_sweeper(state.service.limiter().clone(), config.rate_window());

    let bind_addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let actual_addr = listener.local_addr().unwrap_or(bind_addr);
    tracing::info!(
        "Pasta running at http://{} ({} storage, {} identifiers)",
        actual_addr,
        config.storage,
        config.identifier_mode
    );

    let serve_result = serve_router(listener, state, shutdown_signal()).await;
    sweeper.abort();
    tracing::info!("Pasta stopped");

    serve_result?;
    Ok(())
}

fn print_help() {
    println!("Pasta paste server\n");
    println!("Usage: pasta [OPTIONS]\n");
    println!("Options:");
    println!("  --help            Show this help message");
    println!("  --version         Print the version");
    println!("\nEnvironment variables:");
    println!("  DATA_DIR          Storage directory (default: data)");
    println!("  STORAGE           Storage backend: fs or redb (default: fs)");
    println!(
        "  PORT              Server port, SERVER_PORT also accepted (default: {})",
        DEFAULT_PORT
    );
    println!(
        "  BIND              Override bind address (e.g. 127.0.0.1:{})",
        DEFAULT_PORT
    );
    println!("  BASE_URL          Public URL used in paste links (default: from Host header)");
    println!("  PASTA_SECRET      Shared secret enabling update and delete");
    println!(
        "  MAX_PASTE_SIZE    Maximum paste size in bytes (default: {})",
        DEFAULT_MAX_PASTE_SIZE
    );
    println!("  RATE_LIMIT        Pastes per client per window, 0 disables (default: 30)");
    println!("  RATE_WINDOW_SECS  Rate-limit window in seconds (default: 60)");
    println!("  RATE_MAX_CLIENTS  Clients tracked by the rate limiter (default: 10000)");
    println!("  ID_MODE           Identifier mode: random or content (default: random)");
    println!("  CORS_ORIGINS      Comma-separated allowed origins");
    println!("  TRUST_FORWARDED_FOR  Use X-Forwarded-For as the client key");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
