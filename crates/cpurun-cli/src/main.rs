//! cpurun - verification run driver for a RISC-V CPU implementation
//!
//! One invocation drives a full verification run: cross-compile a testcase,
//! optionally capture a reference register trace, then simulate the design
//! against the produced artifacts. See `--help` for the option surface.

use anyhow::{Context, Result};
use cpurun_core::{pipeline, Config, Invocation, Layout, PipelineReport, Registry, USAGE};
use std::process::ExitCode;
use tracing::Level;

#[tokio::main]
async fn main() -> ExitCode {
    cpurun_core::telemetry::init_tracing(Level::INFO);

    let args: Vec<String> = std::env::args().skip(1).collect();

    match dispatch(&args).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(args: &[String]) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    let layout = Layout::new(cwd);
    let registry =
        Registry::load(&layout.manifest_path()).context("failed to load testcase registry")?;

    // Configuration errors exit 1 before any directory is touched; help
    // exits 0 without a pipeline run.
    let config = match Config::parse(args, &registry) {
        Ok(Invocation::Help) => {
            print!("{USAGE}");
            return Ok(ExitCode::SUCCESS);
        }
        Ok(Invocation::Run(config)) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return Ok(ExitCode::from(1));
        }
    };

    let report = pipeline::run(&layout, &registry, &config)
        .await
        .context("verification pipeline failed")?;

    print_summary(&report);

    if report.success {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn print_summary(report: &PipelineReport) {
    println!();
    println!("Testcase: {}", report.testcase);
    for stage in &report.stages {
        let status = if stage.passed() { "✓" } else { "✗" };
        println!(
            "  {} {} ({}ms, exit code: {})",
            status, stage.stage, stage.duration_ms, stage.exit_code
        );
    }
    println!(
        "Summary: {}/{} stages passed in {}ms",
        report.passed_count(),
        report.stages.len(),
        report.duration_ms
    );
}
