//! Error types for the verification pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Errors detected while parsing the command line.
///
/// All of these are fatal before any external tool runs or any directory is
/// touched.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A value-taking flag appeared as the last token.
    #[error("{0} without argument")]
    MissingValue(&'static str),

    /// Token not matching any recognized flag.
    #[error("unknown argument: {0}")]
    UnknownFlag(String),

    /// Testcase name not present in the registry.
    #[error("unknown testcase: {0}")]
    UnknownTestcase(String),

    /// Output path that would land outside the output directory.
    #[error("invalid output path: {0} (must be relative to the output directory)")]
    InvalidOutputPath(String),
}

/// Errors raised while the pipeline is running.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// An external tool could not be launched at all.
    #[error("failed to launch {stage} ({program}): {source}")]
    Spawn {
        stage: &'static str,
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An external tool ran but exited with a non-zero status.
    #[error("stage {stage} failed with exit code {exit_code}: {stderr}")]
    StageFailed {
        stage: &'static str,
        exit_code: i32,
        stderr: String,
    },

    /// Filesystem operation on a pipeline-owned path failed.
    #[error("filesystem error at {path}: {source}")]
    Fs {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Testcase manifest could not be decoded.
    #[error("invalid testcase manifest at {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PipelineError {
    pub(crate) fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Fs {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages() {
        assert_eq!(ConfigError::MissingValue("-o").to_string(), "-o without argument");
        assert_eq!(
            ConfigError::UnknownFlag("--frobnicate".to_string()).to_string(),
            "unknown argument: --frobnicate"
        );
        assert_eq!(
            ConfigError::UnknownTestcase("nope".to_string()).to_string(),
            "unknown testcase: nope"
        );
        assert_eq!(
            ConfigError::InvalidOutputPath("/tmp/x".to_string()).to_string(),
            "invalid output path: /tmp/x (must be relative to the output directory)"
        );
    }

    #[test]
    fn test_stage_failed_message_names_stage() {
        let err = PipelineError::StageFailed {
            stage: "link_image",
            exit_code: 1,
            stderr: "undefined reference".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("link_image"));
        assert!(msg.contains("exit code 1"));
    }
}
