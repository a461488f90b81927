//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::commands::{analyze::AnalyzeArgs, ingest::IngestArgs, test::TestArgs};

#[derive(Parser, Debug)]
#[command(name = "flaky-tests")]
#[command(about = "Flaky, suspicious and always-failing test detection", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .flaky/config.yaml + .flaky/local.yaml)
    #[arg(short, long, global = true, env = "FLAKY_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load projects and test executions from a JSON file
    Ingest(IngestArgs),

    /// Analyze a project and list flagged tests
    Analyze(AnalyzeArgs),

    /// Show the analysis of a single test
    Test(TestArgs),
}
