//! Cross-compilation of a testcase into simulator-consumable artifacts.
//!
//! Fixed step order, each step consuming the previous step's output:
//! assemble the boot ROM, stage the testcase source (plus stdin fixture if
//! the registry marks one), compile, link against the no-syscall runtime
//! with the fixed memory-layout script, convert to verilog-hex and raw
//! binary, and emit a disassembly listing for diagnostics.
//!
//! Invocation construction is separated from execution so the exact
//! argument vectors can be asserted on without a toolchain installed.

use crate::error::PipelineError;
use crate::invoke::{ToolInvocation, ToolRunner};
use crate::layout::Layout;
use crate::testcase::TestcaseSpec;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Everything a single build produces.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactSet {
    /// Linked executable image (`test.om`).
    pub linked_image: PathBuf,

    /// Verilog-hex memory image fed to the simulator and reference model.
    pub hex_image: PathBuf,

    /// Raw binary image for non-simulation deployment (RAM upload).
    pub binary_image: PathBuf,

    /// Disassembly listing.
    pub disassembly: PathBuf,

    /// Staged stdin fixture, when the testcase has one.
    pub stdin_fixture: Option<PathBuf>,
}

/// The cross-toolchain invoker.
pub struct Toolchain<'a> {
    layout: &'a Layout,
}

impl<'a> Toolchain<'a> {
    pub fn new(layout: &'a Layout) -> Self {
        Self { layout }
    }

    /// Assemble `sys/rom.s` into a relocatable object in the scratch dir.
    pub fn assemble_invocation(&self) -> ToolInvocation {
        ToolInvocation::new("assemble_rom", self.layout.tool("as"))
            .arg("-o")
            .arg(self.layout.scratch("rom.o"))
            .arg("-march=rv32i")
            .arg(self.layout.sys_dir().join("rom.s"))
    }

    /// Compile the staged testcase source. `-O0` only when optimization is
    /// disabled; this is the single optimization toggle in the pipeline.
    pub fn compile_invocation(&self, disable_optimization: bool) -> ToolInvocation {
        let opt = if disable_optimization { "-O0" } else { "-O2" };
        ToolInvocation::new("compile_testcase", self.layout.tool("gcc"))
            .arg("-o")
            .arg(self.layout.scratch("test.o"))
            .arg("-I")
            .arg(self.layout.sys_dir())
            .arg("-c")
            .arg(self.layout.scratch("test.c"))
            .arg(opt)
            .arg("-march=rv32i")
            .arg("-mabi=ilp32")
            .arg("-Wall")
    }

    /// Link the boot object and the testcase object against the standard
    /// runtime/math/no-syscall libraries with the memory-layout script.
    pub fn link_invocation(&self) -> ToolInvocation {
        let [libc_path, libgcc_path] = self.layout.link_search_paths();
        ToolInvocation::new("link_image", self.layout.tool("ld"))
            .arg("-T")
            .arg(self.layout.sys_dir().join("memory.ld"))
            .arg(self.layout.scratch("rom.o"))
            .arg(self.layout.scratch("test.o"))
            .arg("-L")
            .arg(libc_path)
            .arg("-L")
            .arg(libgcc_path)
            .args(["-lc", "-lgcc", "-lm", "-lnosys"])
            .arg("-o")
            .arg(self.layout.scratch("test.om"))
    }

    /// Convert the linked image into a simulator-loadable verilog-hex image.
    pub fn objcopy_verilog_invocation(&self) -> ToolInvocation {
        ToolInvocation::new("objcopy_verilog", self.layout.tool("objcopy"))
            .args(["-O", "verilog"])
            .arg(self.layout.scratch("test.om"))
            .arg(self.layout.scratch("test.data"))
    }

    /// Convert the linked image into a raw binary image.
    pub fn objcopy_binary_invocation(&self) -> ToolInvocation {
        ToolInvocation::new("objcopy_binary", self.layout.tool("objcopy"))
            .args(["-O", "binary"])
            .arg(self.layout.scratch("test.om"))
            .arg(self.layout.scratch("test.bin"))
    }

    /// Disassemble the linked image into a listing file.
    pub fn disassemble_invocation(&self) -> ToolInvocation {
        ToolInvocation::new("disassemble", self.layout.tool("objdump"))
            .arg("-D")
            .arg(self.layout.scratch("test.om"))
            .stdout_to(self.layout.scratch("test.dump"))
    }

    /// Stage the testcase source (and its stdin fixture, if any) into the
    /// scratch directory.
    fn stage_testcase(&self, case: &TestcaseSpec) -> Result<Option<PathBuf>, PipelineError> {
        let source = self.layout.testcase_source(&case.name);
        let staged = self.layout.scratch("test.c");
        fs::copy(&source, &staged).map_err(|e| PipelineError::fs(&source, e))?;

        if !case.stdin_fixture {
            return Ok(None);
        }
        let fixture = self.layout.testcase_fixture(&case.name);
        let staged_fixture = self.layout.scratch("test.in");
        fs::copy(&fixture, &staged_fixture).map_err(|e| PipelineError::fs(&fixture, e))?;
        Ok(Some(staged_fixture))
    }

    /// Run the full build, producing the artifact set.
    pub async fn build(
        &self,
        runner: &ToolRunner,
        case: &TestcaseSpec,
        disable_optimization: bool,
    ) -> Result<ArtifactSet, PipelineError> {
        info!(testcase = %case.name, disable_optimization, "building testcase artifacts");

        runner.run(self.assemble_invocation()).await?;

        let stdin_fixture = self.stage_testcase(case)?;

        runner.run(self.compile_invocation(disable_optimization)).await?;
        runner.run(self.link_invocation()).await?;
        runner.run(self.objcopy_verilog_invocation()).await?;
        runner.run(self.objcopy_binary_invocation()).await?;
        runner.run(self.disassemble_invocation()).await?;

        Ok(ArtifactSet {
            linked_image: self.layout.scratch("test.om"),
            hex_image: self.layout.scratch("test.data"),
            binary_image: self.layout.scratch("test.bin"),
            disassembly: self.layout.scratch("test.dump"),
            stdin_fixture,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> Layout {
        Layout::with_prefix("/proj", "/opt/riscv")
    }

    #[test]
    fn test_assemble_targets_rv32i() {
        let layout = layout();
        let inv = Toolchain::new(&layout).assemble_invocation();
        assert_eq!(inv.stage, "assemble_rom");
        assert!(inv.program.ends_with("riscv32-unknown-elf-as"));
        assert!(inv.has_arg("-march=rv32i"));
        assert!(inv.has_arg("/proj/sys/rom.s"));
        assert!(inv.has_arg("/proj/test/rom.o"));
    }

    #[test]
    fn test_optimization_toggle_selects_o0() {
        let layout = layout();
        let toolchain = Toolchain::new(&layout);

        let optimized = toolchain.compile_invocation(false);
        assert!(optimized.has_arg("-O2"));
        assert!(!optimized.has_arg("-O0"));

        let unoptimized = toolchain.compile_invocation(true);
        assert!(unoptimized.has_arg("-O0"));
        assert!(!unoptimized.has_arg("-O2"));
    }

    #[test]
    fn test_compile_flags() {
        let layout = layout();
        let inv = Toolchain::new(&layout).compile_invocation(false);
        assert!(inv.program.ends_with("riscv32-unknown-elf-gcc"));
        assert!(inv.has_arg("-mabi=ilp32"));
        assert!(inv.has_arg("-Wall"));
        assert!(inv.has_arg("/proj/test/test.c"));
    }

    #[test]
    fn test_link_uses_memory_script_and_runtime_libs() {
        let layout = layout();
        let inv = Toolchain::new(&layout).link_invocation();
        assert!(inv.has_arg("/proj/sys/memory.ld"));
        assert!(inv.has_arg("/proj/test/rom.o"));
        assert!(inv.has_arg("/proj/test/test.o"));
        for lib in ["-lc", "-lgcc", "-lm", "-lnosys"] {
            assert!(inv.has_arg(lib), "missing {lib}");
        }
        assert!(inv.has_arg("/proj/test/test.om"));
    }

    #[test]
    fn test_objcopy_formats() {
        let layout = layout();
        let toolchain = Toolchain::new(&layout);

        let hex = toolchain.objcopy_verilog_invocation();
        assert!(hex.has_arg("verilog"));
        assert!(hex.has_arg("/proj/test/test.data"));

        let bin = toolchain.objcopy_binary_invocation();
        assert!(bin.has_arg("binary"));
        assert!(bin.has_arg("/proj/test/test.bin"));
    }

    #[test]
    fn test_disassembly_redirects_stdout() {
        let layout = layout();
        let inv = Toolchain::new(&layout).disassemble_invocation();
        assert_eq!(
            inv.stdout,
            crate::invoke::OutputSink::File("/proj/test/test.dump".into())
        );
    }
}
