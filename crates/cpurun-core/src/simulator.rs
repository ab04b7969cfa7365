//! Hardware simulation of the design under test.
//!
//! Compiles the HDL sources together with one of two testbench variants and
//! executes the result. The bounded variant gives the design a fixed
//! instruction ceiling so a hung design still terminates; the unbounded
//! variant runs until the design signals completion.

use crate::config::Config;
use crate::error::PipelineError;
use crate::invoke::{ToolInvocation, ToolRunner};
use crate::layout::Layout;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Compiled simulation image inside the output directory.
pub const SIM_BUILD: &str = "cpu_build";

/// Top-level HDL sources compiled by name.
const TOP_SOURCES: [&str; 4] = ["cpu.v", "ram.v", "riscv_top.v", "hci.v"];

pub struct Simulator<'a> {
    layout: &'a Layout,
}

impl<'a> Simulator<'a> {
    pub fn new(layout: &'a Layout) -> Self {
        Self { layout }
    }

    /// Testbench source for the requested execution bound.
    pub fn testbench(&self, bounded: bool) -> PathBuf {
        let name = if bounded {
            "testbench_disable_forever.v"
        } else {
            "testbench.v"
        };
        self.layout.sim_dir().join(name)
    }

    /// The named top-level sources plus every `.v` under `src/common/*/`,
    /// walked and sorted deterministically (no shell globbing).
    pub fn hdl_sources(&self) -> Result<Vec<PathBuf>, PipelineError> {
        let hdl = self.layout.hdl_dir();
        let mut sources: Vec<PathBuf> = TOP_SOURCES.iter().map(|s| hdl.join(s)).collect();

        let common = hdl.join("common");
        if !common.is_dir() {
            return Ok(sources);
        }
        let mut shared = Vec::new();
        for group in read_dir_sorted(&common)? {
            if !group.is_dir() {
                continue;
            }
            for file in read_dir_sorted(&group)? {
                if file.extension().is_some_and(|e| e == "v") {
                    shared.push(file);
                }
            }
        }
        sources.extend(shared);
        Ok(sources)
    }

    /// Compile the design and the selected testbench into a vvp image.
    pub fn compile_invocation(&self, bounded: bool) -> Result<ToolInvocation, PipelineError> {
        let inv = ToolInvocation::new("compile_simulation", "iverilog")
            .arg("-g2012")
            .arg("-o")
            .arg(self.layout.output(SIM_BUILD))
            .arg("-I")
            .arg(self.layout.hdl_dir())
            .args(self.hdl_sources()?)
            .arg(self.testbench(bounded));
        Ok(inv)
    }

    /// Execute the compiled simulation. With an output file configured the
    /// simulator's stdout lands there; otherwise it goes to the console.
    pub fn run_invocation(&self, output_file: Option<&str>) -> ToolInvocation {
        let inv = ToolInvocation::new("run_simulation", "vvp").arg(self.layout.output(SIM_BUILD));
        match output_file {
            Some(file) => inv.stdout_to(self.layout.output(file)),
            None => inv.inherit_stdout(),
        }
    }

    /// Compile and execute the simulation per the run configuration.
    pub async fn run(&self, runner: &ToolRunner, config: &Config) -> Result<(), PipelineError> {
        info!(
            bounded = config.disable_forever_bound,
            testcase = %config.testcase,
            "running hardware simulation"
        );

        runner.run(self.compile_invocation(config.disable_forever_bound)?).await?;
        runner.run(self.run_invocation(config.output_file.as_deref())).await?;

        info!("simulation finished");
        Ok(())
    }
}

fn read_dir_sorted(dir: &std::path::Path) -> Result<Vec<PathBuf>, PipelineError> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| PipelineError::fs(dir, e))? {
        entries.push(entry.map_err(|e| PipelineError::fs(dir, e))?.path());
    }
    entries.sort();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoke::OutputSink;

    fn hdl_tree() -> (tempfile::TempDir, Layout) {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::with_prefix(dir.path(), "/opt/riscv");
        for sub in ["src/common/alu", "src/common/regfile", "sim", "bin"] {
            fs::create_dir_all(dir.path().join(sub)).unwrap();
        }
        for file in [
            "src/cpu.v",
            "src/ram.v",
            "src/riscv_top.v",
            "src/hci.v",
            "src/common/alu/adder.v",
            "src/common/regfile/regfile.v",
            "src/common/regfile/notes.txt",
            "sim/testbench.v",
            "sim/testbench_disable_forever.v",
        ] {
            fs::write(dir.path().join(file), "// hdl").unwrap();
        }
        (dir, layout)
    }

    #[test]
    fn test_testbench_variant_selection() {
        let (_dir, layout) = hdl_tree();
        let sim = Simulator::new(&layout);
        assert!(sim.testbench(false).ends_with("sim/testbench.v"));
        assert!(sim.testbench(true).ends_with("sim/testbench_disable_forever.v"));
    }

    #[test]
    fn test_hdl_sources_include_sorted_common_tree() {
        let (_dir, layout) = hdl_tree();
        let sources = Simulator::new(&layout).hdl_sources().unwrap();

        assert!(sources[0].ends_with("src/cpu.v"));
        assert!(sources[3].ends_with("src/hci.v"));
        let tail: Vec<_> = sources[4..]
            .iter()
            .map(|p| p.strip_prefix(layout.root.clone()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            tail,
            vec![
                PathBuf::from("src/common/alu/adder.v"),
                PathBuf::from("src/common/regfile/regfile.v"),
            ]
        );
    }

    #[test]
    fn test_compile_invocation_selects_bounded_testbench() {
        let (_dir, layout) = hdl_tree();
        let sim = Simulator::new(&layout);

        let unbounded = sim.compile_invocation(false).unwrap();
        assert!(unbounded.has_arg(layout.sim_dir().join("testbench.v")));
        assert!(unbounded.has_arg("-g2012"));

        let bounded = sim.compile_invocation(true).unwrap();
        assert!(bounded.has_arg(layout.sim_dir().join("testbench_disable_forever.v")));
        assert!(!bounded.has_arg(layout.sim_dir().join("testbench.v")));
    }

    #[test]
    fn test_run_invocation_output_redirect() {
        let (_dir, layout) = hdl_tree();
        let sim = Simulator::new(&layout);

        let console = sim.run_invocation(None);
        assert_eq!(console.stdout, OutputSink::Inherit);

        let redirected = sim.run_invocation(Some("result.txt"));
        assert_eq!(
            redirected.stdout,
            OutputSink::File(layout.output("result.txt"))
        );
    }
}
