//! RAG Portal server
//!
//! Entry point: loads configuration, sets up logging and serves the portal.

use std::sync::Arc;

use dotenvy::dotenv;
use mimalloc::MiMalloc;
use tracing::{error, info};

use rag_portal::config::AppConfig;
use rag_portal::{server, telemetry};

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() {
    // Load .env (if present)
    let _ = dotenv();

    telemetry::init();

    let config = match AppConfig::load() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    info!(
        name: "config.loaded",
        port = config.server.port,
        identity = %config.identity.provider,
        chat_endpoint = %config.chat.endpoint,
        "Configuration loaded"
    );

    if let Err(e) = server::start_server(config).await {
        error!(name: "server.failed", error = %e, "Server exited with an error");
        std::process::exit(1);
    }
}
