//! Git metadata
//!
//! Reads commit metadata from the project's working tree. Used only for
//! default configuration values; the pipeline itself never mutates the
//! repository.

use std::path::Path;

use anyhow::{Context, Result};

use crate::infra::process;

/// Short (8 character) commit hash of HEAD
pub fn short_hash(project_dir: &Path) -> Result<String> {
    process::output("git", &["rev-parse", "--short=8", "HEAD"], Some(project_dir))
        .context("Failed to read the current commit hash")
}

/// Unix timestamp of the last commit
pub fn last_commit_timestamp(project_dir: &Path) -> Result<i64> {
    let out = process::output("git", &["log", "-1", "--format=%at", "HEAD"], Some(project_dir))
        .context("Failed to read the last commit timestamp")?;
    out.parse()
        .with_context(|| format!("Unexpected git timestamp output: {out:?}"))
}
