//! External tool invocation.
//!
//! Every external tool runs through a [`ToolInvocation`]: an explicit
//! program path plus a separately quoted argument vector, never a shell
//! string. The [`ToolRunner`] executes invocations one at a time, captures
//! exit status and diagnostic output into a [`ToolOutcome`], and keeps an
//! in-run log of every outcome for the final report.

use crate::error::PipelineError;
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Mutex;
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, warn};

/// Where an invocation's stdout goes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputSink {
    /// Captured into the outcome (the default).
    #[default]
    Capture,

    /// Inherited from the driver, i.e. the user's console.
    Inherit,

    /// Redirected into a file, created fresh.
    File(PathBuf),
}

/// One external tool invocation, fully described before execution.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    /// Pipeline stage name this invocation belongs to.
    pub stage: &'static str,

    /// Executable path.
    pub program: PathBuf,

    /// Argument vector (program name excluded).
    pub args: Vec<OsString>,

    /// Optional file fed to the tool's stdin.
    pub stdin_file: Option<PathBuf>,

    /// Stdout destination.
    pub stdout: OutputSink,
}

impl ToolInvocation {
    pub fn new(stage: &'static str, program: impl Into<PathBuf>) -> Self {
        Self {
            stage,
            program: program.into(),
            args: Vec::new(),
            stdin_file: None,
            stdout: OutputSink::Capture,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin_from(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdin_file = Some(path.into());
        self
    }

    pub fn stdout_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout = OutputSink::File(path.into());
        self
    }

    pub fn inherit_stdout(mut self) -> Self {
        self.stdout = OutputSink::Inherit;
        self
    }

    /// Whether an argument equal to `needle` is present. Test helper for
    /// asserting on constructed command lines.
    pub fn has_arg(&self, needle: impl AsRef<Path>) -> bool {
        let needle = OsString::from(needle.as_ref());
        self.args.iter().any(|a| *a == needle)
    }
}

/// Result of one tool invocation.
#[derive(Debug, Clone, Serialize)]
pub struct ToolOutcome {
    /// Stage name.
    pub stage: String,

    /// Exit code (-1 when terminated by a signal).
    pub exit_code: i32,

    /// Captured stdout (empty when redirected or inherited).
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,

    /// Whether the tool exited successfully.
    pub success: bool,
}

impl ToolOutcome {
    pub fn passed(&self) -> bool {
        self.success && self.exit_code == 0
    }
}

/// Executes invocations sequentially and records their outcomes.
///
/// In strict mode (the default) a non-zero exit aborts the pipeline as
/// [`PipelineError::StageFailed`]; with `keep_going` the failure is logged
/// and the outcome returned so later stages still run. A spawn failure is
/// fatal in both modes.
#[derive(Debug)]
pub struct ToolRunner {
    keep_going: bool,
    log: Mutex<Vec<ToolOutcome>>,
}

impl ToolRunner {
    pub fn new(keep_going: bool) -> Self {
        Self {
            keep_going,
            log: Mutex::new(Vec::new()),
        }
    }

    /// Run one invocation to completion.
    pub async fn run(&self, inv: ToolInvocation) -> Result<ToolOutcome, PipelineError> {
        let start = Instant::now();
        debug!(stage = inv.stage, program = %inv.program.display(), "invoking tool");

        let mut command = Command::new(&inv.program);
        command.args(&inv.args).stderr(Stdio::piped());

        match &inv.stdin_file {
            Some(path) => {
                let file = std::fs::File::open(path).map_err(|e| PipelineError::fs(path, e))?;
                command.stdin(Stdio::from(file));
            }
            None => {
                command.stdin(Stdio::null());
            }
        }

        match &inv.stdout {
            OutputSink::Capture => {
                command.stdout(Stdio::piped());
            }
            OutputSink::Inherit => {
                command.stdout(Stdio::inherit());
            }
            OutputSink::File(path) => {
                let file = std::fs::File::create(path).map_err(|e| PipelineError::fs(path, e))?;
                command.stdout(Stdio::from(file));
            }
        }

        let child = command.spawn().map_err(|source| PipelineError::Spawn {
            stage: inv.stage,
            program: inv.program.display().to_string(),
            source,
        })?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| PipelineError::Spawn {
                stage: inv.stage,
                program: inv.program.display().to_string(),
                source,
            })?;

        let outcome = ToolOutcome {
            stage: inv.stage.to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
            success: output.status.success(),
        };

        self.log.lock().unwrap().push(outcome.clone());

        if !outcome.passed() {
            if self.keep_going {
                warn!(
                    stage = inv.stage,
                    exit_code = outcome.exit_code,
                    "stage failed, continuing (--keep-going)"
                );
            } else {
                return Err(PipelineError::StageFailed {
                    stage: inv.stage,
                    exit_code: outcome.exit_code,
                    stderr: truncate(outcome.stderr.trim(), 2000),
                });
            }
        }

        Ok(outcome)
    }

    /// All outcomes recorded so far, in execution order.
    pub fn outcomes(&self) -> Vec<ToolOutcome> {
        self.log.lock().unwrap().clone()
    }
}

/// Truncate to at most `max_len` bytes, backing off to the nearest char
/// boundary so multibyte tool output cannot panic the error path.
fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
