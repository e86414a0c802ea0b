use super::{LogFormat, RuntimeConfig};
use anyhow::{anyhow, Result};

pub const ENV_PREFIX: &str = "WMS2PARQUET_";

/// Abstraction over environment-variable lookups so tests can supply their
/// own source of overrides without touching process state.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;

    /// Get an environment variable WITHOUT the WMS2PARQUET_ prefix.
    /// Used for the secret-store contract variables (API_TOKEN,
    /// API_BASE_URL, WAREHOUSES).
    fn get_raw(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides (highest priority) to the runtime config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    // API contract variables: prefixed form wins over the raw form
    if let Some(url) = get_env_string(env, "API_BASE_URL")? {
        config.api.base_url = url;
    } else if let Some(url) = env.get_raw("API_BASE_URL") {
        config.api.base_url = url;
    }
    if let Some(token) = get_env_string(env, "API_TOKEN")? {
        config.api.token = token;
    } else if let Some(token) = env.get_raw("API_TOKEN") {
        config.api.token = token;
    }
    if let Some(raw) = get_env_string(env, "WAREHOUSES")?.or_else(|| env.get_raw("WAREHOUSES")) {
        config.api.warehouses = parse_warehouses(&raw)?;
    }

    // Collector configuration
    if let Some(val) = get_env_u32(env, "MAX_RETRIES")? {
        config.collector.max_retries = val;
    }
    if let Some(val) = get_env_u64(env, "RETRY_DELAY_SECS")? {
        config.collector.retry_delay_secs = val;
    }
    if let Some(val) = get_env_u64(env, "REQUEST_DELAY_SECS")? {
        config.collector.request_delay_secs = val;
    }
    if let Some(val) = get_env_u32(env, "TAKE")? {
        config.collector.take = val;
    }
    if let Some(val) = get_env_u32(env, "LOOKBACK_DAYS")? {
        config.collector.lookback_days = val;
    }
    if let Some(val) = get_env_u64(env, "REQUEST_TIMEOUT_SECS")? {
        config.collector.request_timeout_secs = val;
    }

    // Storage
    if let Some(path) = get_env_string(env, "DATA_DIR")? {
        config.storage.data_dir = path;
    }
    if let Some(val) = get_env_usize(env, "ROW_GROUP_SIZE")? {
        config.storage.parquet_row_group_size = val;
    }

    // Archive
    if let Some(path) = get_env_string(env, "ARCHIVE_DIR")? {
        config.archive.dir = path;
    }
    if let Some(val) = get_env_u32(env, "RETENTION_DAYS")? {
        config.archive.retention_days = val;
    }

    // Commit gate
    if let Some(val) = get_env_bool(env, "GIT_ENABLED")? {
        config.git.enabled = val;
    }
    if let Some(remote) = get_env_string(env, "GIT_REMOTE")? {
        config.git.remote = remote;
    }
    if let Some(branch) = get_env_string(env, "GIT_BRANCH")? {
        config.git.branch = Some(branch);
    }

    // Run settings
    if let Some(id) = get_env_string(env, "SNAPSHOT_ID")? {
        config.run.snapshot_id = Some(id);
    }
    if let Some(val) = get_env_u64(env, "JOB_TIMEOUT_SECS")? {
        config.run.job_timeout_secs = val;
    }
    if let Some(level) = get_env_string(env, "LOG_LEVEL")? {
        config.run.log_level = level;
    }
    if let Some(format) = get_env_string(env, "LOG_FORMAT")? {
        config.run.log_format = match format.to_lowercase().as_str() {
            "text" => LogFormat::Text,
            "json" => LogFormat::Json,
            other => {
                return Err(anyhow!(
                    "Invalid {}LOG_FORMAT value '{}': expected 'text' or 'json'",
                    ENV_PREFIX,
                    other
                ))
            }
        };
    }

    Ok(())
}

/// WAREHOUSES is a JSON array of codes, e.g. `["1145", "1290"]`.
/// A bare comma-separated list is also accepted.
fn parse_warehouses(raw: &str) -> Result<Vec<String>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed)
            .map_err(|e| anyhow!("Invalid WAREHOUSES value (expected JSON array): {}", e));
    }
    Ok(trimmed
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect())
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Result<Option<String>> {
    Ok(env.get(key).filter(|s| !s.is_empty()))
}

fn get_env_u32<E: EnvSource>(env: &E, key: &str) -> Result<Option<u32>> {
    env.get(key)
        .map(|v| {
            v.parse::<u32>()
                .map_err(|e| anyhow!("Invalid {}{} value '{}': {}", ENV_PREFIX, key, v, e))
        })
        .transpose()
}

fn get_env_u64<E: EnvSource>(env: &E, key: &str) -> Result<Option<u64>> {
    env.get(key)
        .map(|v| {
            v.parse::<u64>()
                .map_err(|e| anyhow!("Invalid {}{} value '{}': {}", ENV_PREFIX, key, v, e))
        })
        .transpose()
}

fn get_env_usize<E: EnvSource>(env: &E, key: &str) -> Result<Option<usize>> {
    env.get(key)
        .map(|v| {
            v.parse::<usize>()
                .map_err(|e| anyhow!("Invalid {}{} value '{}': {}", ENV_PREFIX, key, v, e))
        })
        .transpose()
}

fn get_env_bool<E: EnvSource>(env: &E, key: &str) -> Result<Option<bool>> {
    env.get(key)
        .map(|v| match v.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(anyhow!(
                "Invalid {}{} value '{}': expected a boolean",
                ENV_PREFIX,
                key,
                other
            )),
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapEnv {
        prefixed: HashMap<String, String>,
        raw: HashMap<String, String>,
    }

    impl EnvSource for MapEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.prefixed.get(key).cloned()
        }

        fn get_raw(&self, key: &str) -> Option<String> {
            self.raw.get(key).cloned()
        }
    }

    fn env_with(prefixed: &[(&str, &str)], raw: &[(&str, &str)]) -> MapEnv {
        MapEnv {
            prefixed: prefixed
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            raw: raw
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_raw_secret_variables_apply() {
        let mut config = RuntimeConfig::default();
        let env = env_with(
            &[],
            &[
                ("API_TOKEN", "s3cret"),
                ("API_BASE_URL", "https://api.example.com"),
                ("WAREHOUSES", r#"["1145", "1290"]"#),
            ],
        );
        apply_env_overrides(&mut config, &env).unwrap();

        assert_eq!(config.api.token, "s3cret");
        assert_eq!(config.api.base_url, "https://api.example.com");
        assert_eq!(config.api.warehouses, vec!["1145", "1290"]);
    }

    #[test]
    fn test_prefixed_wins_over_raw() {
        let mut config = RuntimeConfig::default();
        let env = env_with(
            &[("API_TOKEN", "prefixed")],
            &[("API_TOKEN", "raw")],
        );
        apply_env_overrides(&mut config, &env).unwrap();
        assert_eq!(config.api.token, "prefixed");
    }

    #[test]
    fn test_numeric_and_bool_overrides() {
        let mut config = RuntimeConfig::default();
        let env = env_with(
            &[
                ("MAX_RETRIES", "5"),
                ("TAKE", "1000"),
                ("GIT_ENABLED", "false"),
                ("RETENTION_DAYS", "14"),
                ("LOG_FORMAT", "json"),
            ],
            &[],
        );
        apply_env_overrides(&mut config, &env).unwrap();

        assert_eq!(config.collector.max_retries, 5);
        assert_eq!(config.collector.take, 1_000);
        assert!(!config.git.enabled);
        assert_eq!(config.archive.retention_days, 14);
        assert_eq!(config.run.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_numeric_is_rejected() {
        let mut config = RuntimeConfig::default();
        let env = env_with(&[("MAX_RETRIES", "many")], &[]);
        assert!(apply_env_overrides(&mut config, &env).is_err());
    }

    #[test]
    fn test_invalid_log_format_is_rejected() {
        let mut config = RuntimeConfig::default();
        let env = env_with(&[("LOG_FORMAT", "yaml")], &[]);
        let err = apply_env_overrides(&mut config, &env).unwrap_err();
        assert!(err.to_string().contains("LOG_FORMAT"));

        let env = env_with(&[("LOG_FORMAT", "JSON")], &[]);
        apply_env_overrides(&mut config, &env).unwrap();
        assert_eq!(config.run.log_format, LogFormat::Json);
    }

    #[test]
    fn test_comma_separated_warehouses() {
        assert_eq!(parse_warehouses("1145, 1290").unwrap(), vec!["1145", "1290"]);
        assert_eq!(parse_warehouses("  ").unwrap(), Vec::<String>::new());
        assert!(parse_warehouses("[not json").is_err());
    }
}
