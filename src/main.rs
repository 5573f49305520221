//! Streaming Chat Demo Server
//!
//! Entry point: load configuration, set up tracing, serve.

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::unused_async)]

use std::sync::Arc;

use dotenvy::dotenv;
use mimalloc::MiMalloc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use streaming_chat_demo::config::{AppConfig, LoggingConfig};
use streaming_chat_demo::server;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenv();

    let config = Arc::new(AppConfig::load()?);
    init_tracing(&config.logging);

    info!(
        name: "config.loaded",
        host = %config.server.host,
        port = config.server.port,
        word_delay_ms = config.generator.word_delay_ms,
        "Configuration loaded"
    );

    server::start_server(config).await
}

/// Initialize tracing (M-LOG-STRUCTURED).
///
/// `RUST_LOG` wins over the configured filter.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));

    let (json, plain) = if logging.json {
        (Some(fmt::layer().json().with_target(true)), None)
    } else {
        (None, Some(fmt::layer().with_target(true)))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(plain)
        .init();
}
