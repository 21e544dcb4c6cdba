use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kiwi_drive_runtime::config::RuntimeConfig;

/// Simulated kiwi-drive base driven over Zenoh
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// JSON config file (defaults are used for anything missing)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the control loop rate
    #[arg(long)]
    hz: Option<u64>,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init(); // installs the subscriber globally

    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(1);
        }
    };
    info!("Using config: {:?}", config);

    if let Err(e) = kiwi_drive_runtime::runtime::run(config).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> kiwi_drive_runtime::config::Result<RuntimeConfig> {
    let mut config = match &args.config {
        Some(path) => RuntimeConfig::load(path)?,
        None => RuntimeConfig::default(),
    };
    if let Some(hz) = args.hz {
        config.loop_hz = hz;
    }
    config.validate()?;
    Ok(config)
}
