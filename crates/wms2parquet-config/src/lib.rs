// wms2parquet-config - Unified configuration for the collection pipeline
//
// Supports configuration from multiple sources:
// 1. Environment variables (WMS2PARQUET_* prefix, highest priority)
// 2. Config file path from WMS2PARQUET_CONFIG env var
// 3. Config file contents from WMS2PARQUET_CONFIG_CONTENT env var
// 4. Default config file locations (./config.toml, ./.wms2parquet.toml)
// 5. Built-in defaults (lowest priority)
//
// The raw variables API_TOKEN, API_BASE_URL and WAREHOUSES are honored
// without the prefix; they are the contract with the secret store that
// injects them.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::{EnvSource, ENV_PREFIX};

/// Main runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub collector: CollectorConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub archive: ArchiveConfig,

    #[serde(default)]
    pub git: GitConfig,

    #[serde(default)]
    pub run: RunConfig,
}

/// Upstream API connection settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the warehouse API, e.g. "https://api.example.com/odata"
    #[serde(default)]
    pub base_url: String,

    /// Token sent in the `token` request header
    #[serde(default)]
    pub token: String,

    /// Warehouse codes for per-warehouse filtered queries
    #[serde(default)]
    pub warehouses: Vec<String>,
}

/// Collection behavior: retries, pacing and query limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Retries per failed query, beyond the first attempt
    pub max_retries: u32,
    /// Wait between retries of the same query
    pub retry_delay_secs: u64,
    /// Wait between consecutive queries
    pub request_delay_secs: u64,
    /// Row cap per query
    pub take: u32,
    /// How far back the transaction-date filter reaches
    pub lookback_days: u32,
    /// Per-request HTTP timeout
    pub request_timeout_secs: u64,
}

impl CollectorConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_secs(self.request_delay_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_delay_secs: 10,
            request_delay_secs: 30,
            take: 30_000,
            lookback_days: 120,
            request_timeout_secs: 60,
        }
    }
}

/// Snapshot storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory the snapshot files are written to
    pub data_dir: String,
    #[serde(default = "default_parquet_row_group_size")]
    pub parquet_row_group_size: usize,
}

fn default_parquet_row_group_size() -> usize {
    32 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            parquet_row_group_size: default_parquet_row_group_size(),
        }
    }
}

/// Local artifact retention
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Directory archived snapshots are copied into
    pub dir: String,
    /// Archives older than this are pruned
    pub retention_days: u32,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            dir: "./artifacts/warehouse-data".to_string(),
            retention_days: 5,
        }
    }
}

/// Commit gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    /// When false, the commit step becomes a no-op
    pub enabled: bool,
    pub remote: String,
    /// Target branch; current branch when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            remote: "origin".to_string(),
            branch: None,
        }
    }
}

/// Per-run settings: identity, timeout, logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Snapshot id used in filenames; first warehouse code, then run date,
    /// when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    /// Flat timeout for a full pipeline run
    pub job_timeout_secs: u64,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl RunConfig {
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            snapshot_id: None,
            job_timeout_secs: 45 * 60,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl RuntimeConfig {
    /// Load configuration from all sources with priority
    pub fn load() -> Result<Self> {
        sources::load_config()
    }

    /// Load configuration from a specific file path (for CLI --config flag)
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        sources::load_from_file_path(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Validate the API contract needed by the collect step.
    ///
    /// Kept separate from `validate` so verify/commit-only invocations do
    /// not require API credentials.
    pub fn validate_api(&self) -> Result<()> {
        validation::validate_api_config(&self.api)
    }

    /// Resolve the snapshot id for this run: explicit config, then the
    /// first configured warehouse code, then the run date.
    pub fn snapshot_id(&self, run_date: &str) -> String {
        if let Some(id) = &self.run.snapshot_id {
            return id.clone();
        }
        if let Some(code) = self.api.warehouses.first() {
            return code.clone();
        }
        run_date.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let config = RuntimeConfig::default();
        assert_eq!(config.collector.max_retries, 2);
        assert_eq!(config.collector.take, 30_000);
        assert_eq!(config.storage.data_dir, "./data");
        assert_eq!(config.archive.retention_days, 5);
        assert_eq!(config.run.job_timeout_secs, 2_700);
        assert_eq!(config.run.log_format, LogFormat::Text);
        assert!(config.git.enabled);
    }

    #[test]
    fn test_snapshot_id_resolution() {
        let mut config = RuntimeConfig::default();
        assert_eq!(config.snapshot_id("20240301"), "20240301");

        config.api.warehouses = vec!["1145".to_string(), "1290".to_string()];
        assert_eq!(config.snapshot_id("20240301"), "1145");

        config.run.snapshot_id = Some("manual".to_string());
        assert_eq!(config.snapshot_id("20240301"), "manual");
    }

    #[test]
    fn test_parse_toml_sections() {
        let config: RuntimeConfig = toml::from_str(
            r#"
            [api]
            base_url = "https://api.example.com"
            token = "secret"
            warehouses = ["1145"]

            [collector]
            max_retries = 1
            retry_delay_secs = 2
            request_delay_secs = 3
            take = 500
            lookback_days = 30
            request_timeout_secs = 15

            [git]
            enabled = false
            remote = "upstream"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.warehouses, vec!["1145"]);
        assert_eq!(config.collector.take, 500);
        assert!(!config.git.enabled);
        assert_eq!(config.git.remote, "upstream");
        // Unspecified sections fall back to defaults
        assert_eq!(config.storage.data_dir, "./data");
    }
}
