// Configuration validation
//
// Validates that required fields are present and values are sensible

use crate::{ApiConfig, ArchiveConfig, CollectorConfig, RunConfig, RuntimeConfig, StorageConfig};
use anyhow::{bail, Result};
use tracing::warn;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_collector_config(&config.collector)?;
    validate_storage_config(&config.storage)?;
    validate_archive_config(&config.archive)?;
    validate_run_config(&config.run)?;

    if config.git.enabled && config.git.remote.is_empty() {
        bail!("git.remote must not be empty when the commit gate is enabled");
    }

    Ok(())
}

/// Collect-step contract: credentials and endpoint must be present.
pub fn validate_api_config(config: &ApiConfig) -> Result<()> {
    if config.base_url.is_empty() {
        bail!("api.base_url is required (set API_BASE_URL)");
    }
    if config.token.is_empty() {
        bail!("api.token is required (set API_TOKEN)");
    }
    if config.base_url.ends_with('/') {
        warn!(
            base_url = %config.base_url,
            "api.base_url has a trailing slash; endpoint paths already start with one"
        );
    }
    Ok(())
}

fn validate_collector_config(config: &CollectorConfig) -> Result<()> {
    if config.take == 0 {
        bail!("collector.take must be greater than 0");
    }
    if config.lookback_days == 0 {
        bail!("collector.lookback_days must be greater than 0");
    }
    if config.request_timeout_secs == 0 {
        bail!("collector.request_timeout_secs must be greater than 0");
    }

    if config.max_retries > 10 {
        warn!(
            max_retries = config.max_retries,
            "collector.max_retries is very large; a failing query will stall the run"
        );
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<()> {
    if config.data_dir.is_empty() {
        bail!("storage.data_dir must not be empty");
    }
    if config.parquet_row_group_size == 0 {
        bail!("storage.parquet_row_group_size must be greater than 0");
    }
    Ok(())
}

fn validate_archive_config(config: &ArchiveConfig) -> Result<()> {
    if config.dir.is_empty() {
        bail!("archive.dir must not be empty");
    }
    if config.retention_days == 0 {
        bail!("archive.retention_days must be greater than 0");
    }
    Ok(())
}

fn validate_run_config(config: &RunConfig) -> Result<()> {
    if config.job_timeout_secs == 0 {
        bail!("run.job_timeout_secs must be greater than 0");
    }
    if let Some(id) = &config.snapshot_id {
        if id.contains('/') || id.contains('\\') {
            bail!(
                "run.snapshot_id '{}' contains path separators; use a plain identifier",
                id
            );
        }
    }
    Ok(())
}
