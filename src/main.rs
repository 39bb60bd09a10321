//! MCP Link - Convert OpenAPI to MCP compatible endpoints.
//!
//! This binary starts the HTTP server and configures all components.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mcp_link::{
    config::{Cli, Command, ServeConfig},
    shutdown_signal, Lifecycle, RouterConfig, SseTransport,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    let addr = config.bind_address();
    let router_config = RouterConfig::new()
        .with_docs_page(&config.docs_page)
        .with_tracing(!config.no_tracing);

    let transport = Arc::new(SseTransport::new());

    info!("Starting server on {}", addr);
    let mut lifecycle = match Lifecycle::bind(&addr, transport, router_config).await {
        Ok(lifecycle) => lifecycle,
        Err(e) => {
            error!(address = %addr, "Error starting server: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("  SSE endpoint:      http://{}/sse", addr);
    info!("  Message endpoint:  http://{}/message", addr);
    info!("  Connect guide:     http://{}/connect-api", addr);

    if let Err(e) = lifecycle.run(shutdown_signal()).await {
        error!(address = %addr, state = ?lifecycle.state(), "{}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "mcp_link=debug,tower_http=debug"
    } else {
        "mcp_link=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
