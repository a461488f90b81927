//! flaky-tests CLI entry point.

use anyhow::{bail, Context, Result};
use clap::Parser;

use flaky_tests::cli::{commands, Cli, Commands};
use flaky_tests::domain::models::Config;
use flaky_tests::infrastructure::config::ConfigLoader;
use flaky_tests::infrastructure::logging::{LogConfig, LoggerImpl};

fn load_config(cli: &Cli) -> Result<Config> {
    match cli.config {
        Some(ref path) => {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            ConfigLoader::load_from_file(path)
        }
        None => ConfigLoader::load(),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let log_config = LogConfig::try_from(&config.logging).context("Invalid logging configuration")?;
    let _logger = LoggerImpl::init(&log_config)?;

    match cli.command {
        Commands::Ingest(args) => commands::ingest::execute(args, &config, cli.json).await,
        Commands::Analyze(args) => commands::analyze::execute(args, &config, cli.json).await,
        Commands::Test(args) => commands::test::execute(args, &config, cli.json).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli).await {
        flaky_tests::cli::handle_error(err, json);
    }
}
