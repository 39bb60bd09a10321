//! Configuration management for MCP Link.
//!
//! Configuration comes from the command line via clap, with one environment
//! override:
//!
//! - `PORT` - Listen port. Takes precedence over `--port` when it parses as
//!   a valid port number and is ignored otherwise.
//!
//! # Example
//!
//! ```text
//! mcp-link serve --host 127.0.0.1 --port 9000
//! PORT=3000 mcp-link serve            # listens on 0.0.0.0:3000
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default location of the connection documentation page.
pub const DEFAULT_DOCS_PAGE: &str = "static/connect-api.html";

/// Environment variable that overrides the listen port.
pub const PORT_ENV_VAR: &str = "PORT";

// =============================================================================
// CLI Arguments
// =============================================================================

/// MCP Link - Convert OpenAPI to MCP compatible endpoints.
#[derive(Parser, Debug, Clone)]
#[command(name = "mcp-link")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    /// Consume the parsed arguments and return the selected command.
    pub fn into_command(self) -> Command {
        self.command
    }
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the MCP Link server
    Serve(ServeConfig),
}

/// Options for the `serve` command.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    /// Host to listen on.
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on. Overridden by the PORT environment variable.
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Path of the static page served at /connect-api.
    #[arg(long, default_value = DEFAULT_DOCS_PAGE)]
    pub docs_page: PathBuf,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Port after applying the `PORT` environment override.
    pub fn resolved_port(&self) -> u16 {
        resolve_port(self.port, std::env::var(PORT_ENV_VAR).ok().as_deref())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.resolved_port())
    }
}

/// Pick the listen port: a parsable environment value wins over the CLI value.
///
/// Malformed or out-of-range values, including ones with surrounding
/// whitespace, are ignored without a warning.
pub fn resolve_port(cli_port: u16, env_value: Option<&str>) -> u16 {
    env_value
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(cli_port)
}

// =============================================================================
// Tests
// =============================================================================
