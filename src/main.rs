use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use podium::commands::{flush, resolve, stats, watch};
use podium::config::Config;

#[derive(Parser)]
#[command(
    name = "podium",
    version,
    about = "Leaderboard resolver with fuzzy title matching and bounded caching",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    /// Configuration file (TOML); environment variables otherwise
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the server base URL list (comma-separated)
    #[arg(long, global = true)]
    base: Option<String>,

    /// Override the cache directory
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve an application name once and print its current board
    Resolve {
        /// Application name as a device would report it
        name: String,

        /// Give up after this many seconds
        #[arg(short, long, default_value = "30")]
        timeout: u64,

        /// Log the match diagnostics afterwards
        #[arg(long, default_value = "false")]
        diagnostics: bool,
    },

    /// Run the engine loop and print boards as they rotate
    Watch {
        /// Application name as a device would report it
        name: String,
    },

    /// Cache maintenance
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Remove every cached entry
    Flush,

    /// Print cache occupancy
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging
    setup_tracing(&cli.log_format, cli.verbose)?;

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    if let Some(base) = &cli.base {
        config.server.base_csv = base.clone();
    }
    if let Some(dir) = &cli.cache_dir {
        config.cache.dir = dir.clone();
    }

    match cli.command {
        Commands::Resolve {
            name,
            timeout,
            diagnostics,
        } => {
            tracing::info!(
                name = %name,
                timeout = %timeout,
                "Starting resolve command"
            );
            resolve(config, name, timeout, diagnostics).await?;
        }

        Commands::Watch { name } => {
            tracing::info!(name = %name, "Starting watch command");
            watch(config, name).await?;
        }

        Commands::Cache { action } => match action {
            CacheAction::Flush => flush(config)?,
            CacheAction::Stats => stats(config)?,
        },
    }

    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("podium=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("podium=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
