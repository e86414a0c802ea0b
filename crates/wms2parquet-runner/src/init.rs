// Initialization utilities for the runner
//
// Logging/tracing setup and data directory validation

use anyhow::{Context, Result};
use std::path::PathBuf;
use wms2parquet_config::{LogFormat, RuntimeConfig};

/// Initialize tracing/logging from RuntimeConfig
pub fn init_tracing(config: &RuntimeConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter =
        EnvFilter::try_new(&config.run.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.run.log_format {
        LogFormat::Json => {
            registry.with(fmt::layer().json()).init();
        }
        LogFormat::Text => {
            registry.with(fmt::layer()).init();
        }
    }
}

/// Validate the data directory early: create it if missing, test writability.
pub fn validate_data_dir(config: &RuntimeConfig) -> Result<()> {
    use std::fs;

    let output_path = PathBuf::from(&config.storage.data_dir);

    if !output_path.exists() {
        fs::create_dir_all(&output_path).with_context(|| {
            format!(
                "Failed to create data directory: {}",
                config.storage.data_dir
            )
        })?;
    }

    let test_file = output_path.join(".wms2parquet-write-test");
    fs::write(&test_file, b"test").with_context(|| {
        format!(
            "Data directory '{}' is not writable. Check permissions.",
            config.storage.data_dir
        )
    })?;
    fs::remove_file(&test_file).context("Failed to remove test file")?;

    Ok(())
}
