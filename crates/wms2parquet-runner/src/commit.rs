// Commit gate
//
// Stages the data directory; when nothing is staged the repository is left
// untouched, otherwise exactly one commit is created with a timestamped
// message and pushed upstream. A rejected push is a fatal step failure.
// Nothing serializes concurrent runs; two overlapping pipelines can still
// race on the push.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::process::Command;
use tracing::info;
use wms2parquet_config::GitConfig;

/// Result of running the commit gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// One commit was created with this message
    Committed { message: String },
    /// Nothing was staged; the repository was not mutated
    NoChanges,
    /// The gate is disabled by configuration
    Disabled,
}

/// Commit message format: `Auto-update: <YYYY-MM-DD HH:MM>` (UTC)
pub fn commit_message(now: DateTime<Utc>) -> String {
    format!("Auto-update: {}", now.format("%Y-%m-%d %H:%M"))
}

/// Stage the data directory and commit when there is a staged diff.
///
/// Does not push; `push_upstream` handles that so the two mutations stay
/// separately testable.
pub fn stage_and_commit(
    repo_root: &Path,
    data_dir: &str,
    now: DateTime<Utc>,
) -> Result<CommitOutcome> {
    run_git(repo_root, &["add", "-A", "--", data_dir])?;

    // Exit code 0 means no staged diff
    let status = Command::new("git")
        .args(["diff", "--cached", "--quiet", "--", data_dir])
        .current_dir(repo_root)
        .status()
        .context("Failed to run git diff")?;

    if status.success() {
        info!("Commit gate: no staged changes, skipping commit");
        return Ok(CommitOutcome::NoChanges);
    }

    let message = commit_message(now);
    run_git(repo_root, &["commit", "-m", &message])?;
    info!(message = %message, "Commit gate: commit created");

    Ok(CommitOutcome::Committed { message })
}

/// Push the current branch upstream. Failure aborts the run.
pub fn push_upstream(repo_root: &Path, git: &GitConfig) -> Result<()> {
    let mut args = vec!["push", git.remote.as_str()];
    if let Some(branch) = &git.branch {
        args.push(branch.as_str());
    }
    run_git(repo_root, &args)?;
    info!(remote = %git.remote, "Commit gate: pushed upstream");
    Ok(())
}

/// Full gate: stage, conditionally commit, push when a commit was made.
pub fn commit_and_push(repo_root: &Path, data_dir: &str, git: &GitConfig) -> Result<CommitOutcome> {
    if !git.enabled {
        info!("Commit gate disabled by configuration");
        return Ok(CommitOutcome::Disabled);
    }

    let outcome = stage_and_commit(repo_root, data_dir, Utc::now())?;
    if matches!(outcome, CommitOutcome::Committed { .. }) {
        push_upstream(repo_root, git)?;
    }
    Ok(outcome)
}

fn run_git(repo_root: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_root)
        .output()
        .with_context(|| format!("Failed to run git {}", args.join(" ")))?;

    if !output.status.success() {
        bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_commit_message_format() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 5, 59).unwrap();
        assert_eq!(commit_message(now), "Auto-update: 2024-03-01 08:05");
    }
}
