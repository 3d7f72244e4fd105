//! alphadesk - alpha tagging triage and rule tuning from the terminal.

use std::path::Path;

use alphadesk_app::{AppConfig, Application, Command};
use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

/// Alpha tagging dashboard client
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via ALPHADESK_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    alphadesk_telemetry::init_logging()?;

    // Config path: CLI arg > ALPHADESK_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("ALPHADESK_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    let mut config = if Path::new(&config_path).exists() {
        info!(config_path = %config_path, "Loading configuration");
        AppConfig::from_file(&config_path)?
    } else {
        warn!(config_path = %config_path, "Config file not found, using defaults");
        AppConfig::default()
    };
    if let Ok(token) = std::env::var("ALPHADESK_TOKEN") {
        config.api.token = Some(token);
    }
    info!(base_url = %config.api.base_url, "Configuration loaded");

    let app = Application::new(config)?;
    let mut notifications = app.notifier().subscribe();

    let result = app.execute(args.command).await;

    while let Ok(n) = notifications.try_recv() {
        eprintln!("[{}] {}: {}", n.level.as_str(), n.title, n.message);
    }

    print!("{}", result?);
    Ok(())
}
