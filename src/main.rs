mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use converge::config::Config;
use tracing_subscriber::EnvFilter;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            // A missing .env file is fine
            let _ = dotenvy::dotenv();
            Config::load_from_path(path.clone())?
        }
        None => Config::load()?,
    };
    init_tracing(&config.telemetry.log_filter);

    commands::run(cli, config).await
}

/// `RUST_LOG` wins over the configured filter
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
