//! Reference-model trace generation.
//!
//! Builds the instruction-level C++ model from source on every invocation,
//! feeds it the verilog-hex memory image on stdin, and captures the emitted
//! per-commit register trace into the output directory. The model executable
//! is transient and removed after use.

use crate::error::PipelineError;
use crate::invoke::{ToolInvocation, ToolRunner};
use crate::layout::Layout;
use crate::toolchain::ArtifactSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Trace file name inside the output directory.
pub const TRACE_FILE: &str = "std_register_status.txt";

pub struct ReferenceModel<'a> {
    layout: &'a Layout,
}

impl<'a> ReferenceModel<'a> {
    pub fn new(layout: &'a Layout) -> Self {
        Self { layout }
    }

    fn executable(&self) -> PathBuf {
        self.layout.scratch("std")
    }

    /// Compile the model, unoptimized, into a transient scratch executable.
    pub fn build_invocation(&self) -> ToolInvocation {
        ToolInvocation::new("build_ref_model", "g++")
            .arg(self.layout.refmodel_source())
            .arg("-std=c++2a")
            .arg("-o")
            .arg(self.executable())
            .arg("-O0")
    }

    /// Run the model over the hex image, trace captured to the output dir.
    pub fn run_invocation(&self, hex_image: &Path) -> ToolInvocation {
        ToolInvocation::new("run_ref_model", self.executable())
            .stdin_from(hex_image)
            .stdout_to(self.layout.output(TRACE_FILE))
    }

    /// Produce the reference trace; returns its path.
    pub async fn run(
        &self,
        runner: &ToolRunner,
        artifacts: &ArtifactSet,
    ) -> Result<PathBuf, PipelineError> {
        info!("generating reference register trace");

        runner.run(self.build_invocation()).await?;
        let run_result = runner.run(self.run_invocation(&artifacts.hex_image)).await;

        // The model executable is not a persisted artifact.
        let exe = self.executable();
        if exe.exists() {
            fs::remove_file(&exe).map_err(|e| PipelineError::fs(&exe, e))?;
        }
        run_result?;

        let trace = self.layout.output(TRACE_FILE);
        info!(trace = %trace.display(), "reference trace written");
        Ok(trace)
    }
}
