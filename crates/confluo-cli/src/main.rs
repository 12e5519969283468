// Confluo CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use confluo_cli::{logging, stdio, Cli};
use confluo_core::{ConfigLoader, EngineConfig};
use tokio::io::BufReader;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level);

    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_path(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    info!(
        "confluo starting, default filter: {}, extra filters: {:?}",
        config.default_filter, config.extra_filters
    );

    let (engine, prelude) = stdio::build_engine(config);
    stdio::serve(
        engine,
        prelude,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;

    Ok(())
}
