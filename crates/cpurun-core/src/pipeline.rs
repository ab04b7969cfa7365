//! Run orchestration.
//!
//! Sequences workspace preparation, the toolchain build, the optional
//! reference model, and the simulator, with three short-circuit points:
//! artifact-generation-only stops after the build, reference-trace-only
//! stops after the trace, and a full run continues into simulation. Help is
//! handled upstream in the CLI and never reaches this module.

use crate::config::Config;
use crate::error::PipelineError;
use crate::invoke::{ToolOutcome, ToolRunner};
use crate::layout::Layout;
use crate::refmodel::ReferenceModel;
use crate::simulator::Simulator;
use crate::testcase::Registry;
use crate::toolchain::{ArtifactSet, Toolchain};
use crate::workspace;
use serde::Serialize;
use std::time::Instant;
use tracing::info;

/// Result of a complete pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// Testcase that was built.
    pub testcase: String,

    /// Outcome of every external invocation, in execution order.
    pub stages: Vec<ToolOutcome>,

    /// Artifact set produced by the toolchain.
    pub artifacts: ArtifactSet,

    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,

    /// Whether every stage passed.
    pub success: bool,
}

impl PipelineReport {
    /// Number of stages that passed.
    pub fn passed_count(&self) -> usize {
        self.stages.iter().filter(|s| s.passed()).count()
    }

    /// Number of stages that failed.
    pub fn failed_count(&self) -> usize {
        self.stages.iter().filter(|s| !s.passed()).count()
    }
}

/// Execute one verification run.
///
/// Stage failures abort the remaining pipeline unless the configuration
/// asked to keep going, in which case the report carries every failed
/// outcome and `success` is false.
pub async fn run(
    layout: &Layout,
    registry: &Registry,
    config: &Config,
) -> Result<PipelineReport, PipelineError> {
    let start = Instant::now();
    info!(testcase = %config.testcase, "starting verification run");

    workspace::prepare(layout, config)?;

    let runner = ToolRunner::new(config.keep_going);
    let case = registry.resolve(&config.testcase);

    let artifacts = Toolchain::new(layout)
        .build(&runner, &case, config.disable_optimization)
        .await?;

    if config.testcase_only {
        info!("artifact generation finished, skipping reference model and simulation");
        return Ok(finish(config, &runner, artifacts, start));
    }

    if config.gen_reference_trace {
        ReferenceModel::new(layout).run(&runner, &artifacts).await?;
    }

    if config.reference_trace_only {
        info!("reference trace finished, skipping simulation");
        return Ok(finish(config, &runner, artifacts, start));
    }

    Simulator::new(layout).run(&runner, config).await?;

    let report = finish(config, &runner, artifacts, start);
    info!(
        passed = report.passed_count(),
        failed = report.failed_count(),
        duration_ms = report.duration_ms,
        "verification run finished"
    );
    Ok(report)
}

fn finish(
    config: &Config,
    runner: &ToolRunner,
    artifacts: ArtifactSet,
    start: Instant,
) -> PipelineReport {
    let stages = runner.outcomes();
    let success = stages.iter().all(ToolOutcome::passed);
    PipelineReport {
        testcase: config.testcase.clone(),
        stages,
        artifacts,
        duration_ms: start.elapsed().as_millis() as u64,
        success,
    }
}
