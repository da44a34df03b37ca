use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::json;

use ownership_gateway::config::{load_config, GatewayConfig};
use ownership_gateway::gateway::Gateway;
use ownership_gateway::routing::Identity;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Operator CLI for the ownership gateway", long_about = None)]
struct Cli {
    /// Path to the gateway TOML configuration.
    #[arg(short, long, env = "GATEWAY_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate the configuration, then print the environments
    Validate,
    /// Ask the environments which one owns an email, as the gateway would
    Resolve {
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Validate => validate(&config),
        Commands::Resolve { email } => resolve(&config, email).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn validate(config: &GatewayConfig) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let summary = json!({
        "valid": true,
        "bind_address": config.listener.bind_address,
        "environments": [
            { "priority": "primary", "name": config.environments.primary.name, "base_url": config.environments.primary.base_url },
            { "priority": "secondary", "name": config.environments.secondary.name, "base_url": config.environments.secondary.base_url },
        ],
        "timeouts_ms": {
            "check": config.timeouts.check_ms,
            "forward": config.timeouts.forward_ms,
            "request": config.timeouts.request_ms,
        },
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(ExitCode::SUCCESS)
}

async fn resolve(
    config: &GatewayConfig,
    email: String,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let gateway = Gateway::from_config(config)?;
    let identity = Identity::new(email);

    match gateway.resolver().resolve(&identity).await {
        Ok(environment) => {
            let out = json!({
                "email": identity.as_str(),
                "environment": environment.name(),
                "priority": environment.priority().to_string(),
                "base_url": environment.base_url().as_str(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("{}", err);
            println!("{}", serde_json::to_string_pretty(&err.envelope())?);
            Ok(ExitCode::FAILURE)
        }
    }
}
