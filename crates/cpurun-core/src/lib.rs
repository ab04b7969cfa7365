//! cpurun core - verification pipeline for a RISC-V CPU implementation
//!
//! Provides the orchestration pipeline behind the `cpurun` binary:
//! - Parses and validates the run configuration
//! - Prepares known-state scratch and output directories
//! - Cross-compiles a testcase into simulator-consumable artifacts
//! - Optionally captures a reference register trace from the
//!   instruction-level model
//! - Compiles and executes the Verilog testbench

pub mod config;
pub mod error;
pub mod invoke;
pub mod layout;
pub mod pipeline;
pub mod refmodel;
pub mod simulator;
pub mod telemetry;
pub mod testcase;
pub mod toolchain;
pub mod workspace;

// Re-export key types
pub use config::{Config, Invocation, DEFAULT_TESTCASE, USAGE};
pub use error::{ConfigError, PipelineError};
pub use invoke::{OutputSink, ToolInvocation, ToolOutcome, ToolRunner};
pub use layout::Layout;
pub use pipeline::PipelineReport;
pub use refmodel::ReferenceModel;
pub use simulator::Simulator;
pub use testcase::{Registry, TestcaseSpec};
pub use toolchain::{ArtifactSet, Toolchain};
