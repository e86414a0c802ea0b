// Snapshot archiving with a retention window
//
// Copies data/*.parquet into a timestamped directory under the archive dir
// and prunes archives older than the configured retention. This is the
// local expression of the build-artifact retention contract.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use wms2parquet_config::ArchiveConfig;

const STAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Result of one archive pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveOutcome {
    /// Files copied into the new archive
    pub archived: usize,
    /// Expired archive directories removed
    pub pruned: usize,
    /// Destination of the new archive, when one was created
    pub dest: Option<PathBuf>,
}

/// Archive all Parquet files from the data directory and prune expired
/// archives.
pub fn archive_snapshots(
    data_dir: &Path,
    config: &ArchiveConfig,
    now: DateTime<Utc>,
) -> Result<ArchiveOutcome> {
    let archive_root = PathBuf::from(&config.dir);
    fs::create_dir_all(&archive_root)
        .with_context(|| format!("Failed to create archive directory: {}", config.dir))?;

    let files = parquet_files(data_dir)?;

    let dest = if files.is_empty() {
        info!("Archive: no snapshot files to copy");
        None
    } else {
        let dest = archive_root.join(now.format(STAMP_FORMAT).to_string());
        fs::create_dir_all(&dest)
            .with_context(|| format!("Failed to create archive: {}", dest.display()))?;
        for file in &files {
            let name = file.file_name().context("Snapshot file without a name")?;
            fs::copy(file, dest.join(name))
                .with_context(|| format!("Failed to archive {}", file.display()))?;
        }
        info!(files = files.len(), dest = %dest.display(), "Archive created");
        Some(dest)
    };

    let pruned = prune_expired(&archive_root, now, config.retention_days)?;

    Ok(ArchiveOutcome {
        archived: files.len(),
        pruned,
        dest,
    })
}

fn parquet_files(data_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries = fs::read_dir(data_dir)
        .with_context(|| format!("Failed to read data directory: {}", data_dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "parquet") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Remove archive directories whose timestamp is past the retention window.
/// Directories that do not parse as archive stamps are left alone.
fn prune_expired(archive_root: &Path, now: DateTime<Utc>, retention_days: u32) -> Result<usize> {
    let cutoff = now - Duration::days(i64::from(retention_days));
    let mut pruned = 0;

    for entry in fs::read_dir(archive_root)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Ok(stamp) = NaiveDateTime::parse_from_str(name, STAMP_FORMAT) else {
            warn!(name, "Archive entry does not match the stamp format; skipping");
            continue;
        };

        if stamp.and_utc() < cutoff {
            fs::remove_dir_all(&path)
                .with_context(|| format!("Failed to prune archive: {}", path.display()))?;
            info!(name, "Pruned expired archive");
            pruned += 1;
        }
    }

    Ok(pruned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn config_for(dir: &Path, retention_days: u32) -> ArchiveConfig {
        ArchiveConfig {
            dir: dir.to_string_lossy().to_string(),
            retention_days,
        }
    }

    #[test]
    fn test_archive_copies_parquet_files_only() {
        let tmp = tempfile::tempdir().unwrap();
        let data = tmp.path().join("data");
        fs::create_dir_all(&data).unwrap();
        fs::write(data.join("sales_orders_1145.parquet"), b"PAR1").unwrap();
        fs::write(data.join("notes.txt"), b"skip me").unwrap();

        let archive = tmp.path().join("artifacts");
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let outcome = archive_snapshots(&data, &config_for(&archive, 5), now).unwrap();

        assert_eq!(outcome.archived, 1);
        let dest = outcome.dest.unwrap();
        assert!(dest.join("sales_orders_1145.parquet").exists());
        assert!(!dest.join("notes.txt").exists());
    }

    #[test]
    fn test_empty_data_dir_creates_no_archive() {
        let tmp = tempfile::tempdir().unwrap();
        let data = tmp.path().join("data");
        fs::create_dir_all(&data).unwrap();

        let archive = tmp.path().join("artifacts");
        let outcome =
            archive_snapshots(&data, &config_for(&archive, 5), Utc::now()).unwrap();

        assert_eq!(outcome.archived, 0);
        assert!(outcome.dest.is_none());
    }

    #[test]
    fn test_prune_removes_expired_archives() {
        let tmp = tempfile::tempdir().unwrap();
        let data = tmp.path().join("data");
        fs::create_dir_all(&data).unwrap();

        let archive = tmp.path().join("artifacts");
        fs::create_dir_all(archive.join("20240201T080000Z")).unwrap();
        fs::create_dir_all(archive.join("20240228T080000Z")).unwrap();
        fs::create_dir_all(archive.join("not-an-archive")).unwrap();

        let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let outcome = archive_snapshots(&data, &config_for(&archive, 5), now).unwrap();

        assert_eq!(outcome.pruned, 1);
        assert!(!archive.join("20240201T080000Z").exists());
        assert!(archive.join("20240228T080000Z").exists());
        assert!(archive.join("not-an-archive").exists());
    }
}
