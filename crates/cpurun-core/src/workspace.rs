//! Working-directory preparation.
//!
//! Guarantees a predictable starting state before any external tool runs:
//! the scratch directory is recreated from empty on every run (stale
//! artifacts from a different testcase must never leak into a new one), and
//! the output directory is cleared on full runs only, so restricted runs
//! leave previously produced results in place for downstream tooling.

use crate::config::Config;
use crate::error::PipelineError;
use crate::layout::Layout;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Prepare the scratch and output directories for a run.
pub fn prepare(layout: &Layout, config: &Config) -> Result<(), PipelineError> {
    let output_dir = layout.output_dir();

    if !(config.reference_trace_only || config.testcase_only) {
        clear_dir(&output_dir)?;
    }
    fs::create_dir_all(&output_dir).map_err(|e| PipelineError::fs(&output_dir, e))?;

    let scratch = layout.scratch_dir();
    if scratch.exists() {
        fs::remove_dir_all(&scratch).map_err(|e| PipelineError::fs(&scratch, e))?;
    }
    fs::create_dir_all(&scratch).map_err(|e| PipelineError::fs(&scratch, e))?;

    debug!(scratch = %scratch.display(), output = %output_dir.display(), "workspace prepared");
    Ok(())
}

/// Remove every entry of `dir`, leaving the directory itself in place.
/// A missing directory is fine; it is created by the caller afterwards.
fn clear_dir(dir: &Path) -> Result<(), PipelineError> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(dir).map_err(|e| PipelineError::fs(dir, e))? {
        let entry = entry.map_err(|e| PipelineError::fs(dir, e))?;
        let path = entry.path();
        let result = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        result.map_err(|e| PipelineError::fs(&path, e))?;
    }
    Ok(())
}
