//! fortkit - Epic Games client toolkit
//!
//! Main entry point for the fortkit CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{config, fetch, manifest, user_agent};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// fortkit - Epic Games client toolkit
#[derive(Parser)]
#[command(name = "fortkit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// User config directory (default: platform config dir)
    #[arg(long, global = true, env = "FORTKIT_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the installed game's launcher manifest
    Manifest(manifest::ManifestArgs),

    /// Print the user-agent sent with API requests
    UserAgent(user_agent::UserAgentArgs),

    /// Send one request through the authenticated client
    Fetch(fetch::FetchArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console (human-readable, stderr) + rotating JSON file
    let filter = if cli.verbose {
        "fortkit=debug,fortkit_client=debug,fortkit_manifest=debug,fortkit_config=debug,info"
    } else {
        "fortkit=info,fortkit_client=info,fortkit_manifest=info,warn"
    };

    let log_dir = cli
        .config_dir
        .clone()
        .or_else(fortkit_config::user_config_dir)
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "fortkit.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "fortkit=trace,fortkit_client=trace,fortkit_manifest=trace,fortkit_config=trace,info",
                )),
        )
        .init();

    let ctx = commands::Context {
        json_output: cli.json,
        verbose: cli.verbose,
        config_dir: cli.config_dir,
    };

    match cli.command {
        Commands::Manifest(args) => manifest::run(args, &ctx).await,
        Commands::UserAgent(args) => user_agent::run(args, &ctx).await,
        Commands::Fetch(args) => fetch::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
