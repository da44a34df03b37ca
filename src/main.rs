//! Ownership gateway.
//!
//! ```text
//!                          ┌──────────────────────────────────────────────┐
//!   Client Request         │                  GATEWAY                     │
//!   ───────────────────────┼─▶ identity ──▶ ownership ──▶ forwarder ──────┼──▶ owning
//!                          │   (email)     (primary,      (method, path,  │    environment
//!                          │               then secondary) body, headers) │
//!   Client Response        │                                    │         │
//!   ◀──────────────────────┼── relay / error envelope ◀─────────┘         │
//!                          └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use ownership_gateway::config::load_config;
use ownership_gateway::lifecycle::startup;
use ownership_gateway::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "ownership-gateway")]
#[command(about = "Routes requests to the environment that owns the user", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ownership-gateway: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("ownership-gateway: failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        check_timeout_ms = config.timeouts.check_ms,
        forward_timeout_ms = config.timeouts.forward_ms,
        "ownership-gateway starting"
    );

    match startup::run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Gateway terminated");
            ExitCode::FAILURE
        }
    }
}
