use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use wms2parquet_config::RuntimeConfig;
use wms2parquet_runner::{archive, commit, init, pipeline};

/// Warehouse snapshot collector writing Parquet files
#[derive(Parser)]
#[command(name = "wms2parquet")]
#[command(version)]
#[command(about = "Collects warehouse entity snapshots into Parquet files", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output directory for snapshot files (overrides config)
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Snapshot id used in filenames (overrides config)
    #[arg(long, value_name = "ID")]
    snapshot_id: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch all entity snapshots and write them to the data directory
    Collect,
    /// Read snapshots back and log per-file row counts
    Verify,
    /// Stage the data directory, commit when changed, push upstream
    Commit,
    /// Copy snapshots into the archive directory and prune expired archives
    Archive,
    /// Full pipeline: collect, verify, commit, archive
    Run,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Build tokio runtime and run the async pipeline
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    // Step 1: Load base configuration
    let mut config = if let Some(config_path) = &cli.config {
        RuntimeConfig::load_from_path(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        RuntimeConfig::load().context("Failed to load configuration")?
    };

    // Step 2: Apply CLI overrides (highest priority)
    apply_cli_overrides(&mut config, &cli);

    // Step 3: Initialize logging
    init::init_tracing(&config);

    // Step 4: Validate the data directory early (creates it, tests writes)
    init::validate_data_dir(&config)?;

    let repo_root = Path::new(".");
    match cli.command {
        Command::Collect => pipeline::collect(&config).await,
        Command::Verify => {
            pipeline::verify(&config).await?;
            Ok(())
        }
        Command::Commit => {
            commit::commit_and_push(repo_root, &config.storage.data_dir, &config.git)?;
            Ok(())
        }
        Command::Archive => {
            archive::archive_snapshots(
                Path::new(&config.storage.data_dir),
                &config.archive,
                chrono::Utc::now(),
            )?;
            Ok(())
        }
        Command::Run => pipeline::run(&config, repo_root).await,
    }
}

fn apply_cli_overrides(config: &mut RuntimeConfig, cli: &Cli) {
    if let Some(data_dir) = &cli.data_dir {
        config.storage.data_dir = data_dir.to_string_lossy().to_string();
    }

    if let Some(id) = &cli.snapshot_id {
        config.run.snapshot_id = Some(id.clone());
    }

    if let Some(level) = &cli.log_level {
        config.run.log_level = level.clone();
    }
}
