// The linear collection pipeline
//
// collect: run all five entity queries and write one snapshot file each.
// verify: read every snapshot back and log row counts.
// run: collect -> verify -> commit -> archive under one flat timeout.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info};
use wms2parquet_client::{ApiClient, QuerySpec};
use wms2parquet_config::RuntimeConfig;
use wms2parquet_core::{rows_to_record_batch, LoadContext};
use wms2parquet_writer::{
    init_operator, set_parquet_row_group_size, verify_snapshots, SnapshotReport, SnapshotWriter,
};

use crate::{archive, commit};

/// Run all entity queries and write one snapshot file per entity.
///
/// A failed query does not stop the remaining entities, but any failure
/// makes the whole step fail once everything has been attempted.
pub async fn collect(config: &RuntimeConfig) -> Result<()> {
    config.validate_api()?;

    let run_date = Utc::now().format("%Y%m%d").to_string();
    let snapshot_id = config.snapshot_id(&run_date);
    info!(snapshot_id = %snapshot_id, "Starting collection run");

    let client = ApiClient::from_config(&config.api, &config.collector)?;
    std::fs::create_dir_all(&config.storage.data_dir)?;
    set_parquet_row_group_size(config.storage.parquet_row_group_size);
    let writer = SnapshotWriter::new(init_operator(&config.storage)?);

    let specs = QuerySpec::all();
    let mut failed: Vec<&'static str> = Vec::new();

    for (i, spec) in specs.iter().enumerate() {
        match fetch_entity(&client, spec, &config.api.warehouses).await {
            Ok(rows) => {
                let ctx = load_context(spec, &config.api.warehouses);
                let batch = rows_to_record_batch(&rows, &ctx)?;
                writer
                    .write_snapshot(spec.entity, &snapshot_id, &batch)
                    .await?;
            }
            Err(e) => {
                error!(query_id = spec.query_id(), error = %e, "Entity query failed");
                failed.push(spec.query_id());
            }
        }

        // Pacing between queries, skipped after the last one
        if i + 1 < specs.len() {
            tokio::time::sleep(config.collector.request_delay()).await;
        }
    }

    if !failed.is_empty() {
        bail!(
            "{} of {} entity queries failed: {}",
            failed.len(),
            specs.len(),
            failed.join(", ")
        );
    }

    info!("Collection run finished");
    Ok(())
}

async fn fetch_entity(
    client: &ApiClient,
    spec: &QuerySpec,
    warehouses: &[String],
) -> wms2parquet_client::Result<Vec<Value>> {
    if !spec.per_warehouse || warehouses.is_empty() {
        return client.fetch_query(spec, None).await;
    }

    let mut rows = Vec::new();
    for code in warehouses {
        rows.extend(client.fetch_query(spec, Some(code)).await?);
    }
    Ok(rows)
}

fn load_context(spec: &QuerySpec, warehouses: &[String]) -> LoadContext {
    // A single configured warehouse labels the whole batch; mixed-warehouse
    // batches carry the per-row annotation instead
    let warehouse = match warehouses {
        [only] if spec.per_warehouse => Some(only.as_str()),
        _ => None,
    };
    LoadContext::new(spec.query_id(), warehouse, Utc::now())
}

/// Read every snapshot back and log the row-count summary.
pub async fn verify(config: &RuntimeConfig) -> Result<Vec<SnapshotReport>> {
    let operator = init_operator(&config.storage)?;
    let reports = verify_snapshots(&operator).await?;

    if reports.is_empty() {
        info!("Verification: no snapshot files found");
    }
    for report in &reports {
        info!("{}", report.summary_line());
    }

    Ok(reports)
}

/// Full pipeline under the flat job timeout.
pub async fn run(config: &RuntimeConfig, repo_root: &Path) -> Result<()> {
    let started = Instant::now();

    let outcome = tokio::time::timeout(config.run.job_timeout(), async {
        collect(config).await?;
        verify(config).await?;

        // git and fs work blocks; run it off the async workers so the
        // timeout stays armed while a push or copy stalls
        let repo = repo_root.to_path_buf();
        let data_dir = config.storage.data_dir.clone();
        let git = config.git.clone();
        tokio::task::spawn_blocking(move || commit::commit_and_push(&repo, &data_dir, &git))
            .await
            .context("Commit step panicked")??;

        let data_path = PathBuf::from(&config.storage.data_dir);
        let archive_config = config.archive.clone();
        tokio::task::spawn_blocking(move || {
            archive::archive_snapshots(&data_path, &archive_config, Utc::now())
        })
        .await
        .context("Archive step panicked")??;

        Ok::<(), anyhow::Error>(())
    })
    .await;

    let minutes = started.elapsed().as_secs_f64() / 60.0;
    match outcome {
        Err(_) => {
            bail!(
                "Run exceeded the {}s job timeout after {:.2} minutes",
                config.run.job_timeout_secs,
                minutes
            );
        }
        Ok(result) => {
            result?;
            info!(minutes = format!("{minutes:.2}"), "Run completed");
            Ok(())
        }
    }
}
