//! Filesystem contract of a verification run.
//!
//! All fixed directory and tool-path knowledge lives here so the rest of the
//! pipeline deals in named artifacts, never in string-pasted paths.

use std::path::{Path, PathBuf};

/// Default cross-toolchain installation prefix.
pub const DEFAULT_TOOLCHAIN_PREFIX: &str = "/opt/riscv/";

/// Target triple prefix shared by every cross tool.
const CROSS: &str = "riscv32-unknown-elf";

/// GCC version pinned by the toolchain installation, used for the libgcc
/// search path at link time.
const CROSS_GCC_VERSION: &str = "10.2.0";

/// Filesystem layout of a project checkout plus the cross-toolchain prefix.
#[derive(Debug, Clone)]
pub struct Layout {
    /// Project root; every project-relative directory hangs off this.
    pub root: PathBuf,

    /// Cross-toolchain installation prefix (`bin/`, `lib/` live below it).
    pub toolchain_prefix: PathBuf,
}

impl Layout {
    /// Layout rooted at `root`, with the toolchain prefix taken from the
    /// `RISCV_PREFIX` environment variable when set.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let toolchain_prefix = std::env::var_os("RISCV_PREFIX")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TOOLCHAIN_PREFIX));
        Self {
            root: root.into(),
            toolchain_prefix,
        }
    }

    /// Layout with an explicit toolchain prefix (tests, non-default installs).
    pub fn with_prefix(root: impl Into<PathBuf>, prefix: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            toolchain_prefix: prefix.into(),
        }
    }

    /// Path of one cross tool, e.g. `tool("gcc")` →
    /// `<prefix>/bin/riscv32-unknown-elf-gcc`.
    pub fn tool(&self, name: &str) -> PathBuf {
        self.toolchain_prefix
            .join("bin")
            .join(format!("{CROSS}-{name}"))
    }

    /// Library search paths handed to the linker.
    pub fn link_search_paths(&self) -> [PathBuf; 2] {
        [
            self.toolchain_prefix.join(CROSS).join("lib"),
            self.toolchain_prefix
                .join("lib/gcc")
                .join(CROSS)
                .join(CROSS_GCC_VERSION),
        ]
    }

    /// Boot/startup sources and the memory-layout linker script.
    pub fn sys_dir(&self) -> PathBuf {
        self.root.join("sys")
    }

    /// Named testcase sources (and their optional stdin fixtures).
    pub fn testcase_dir(&self) -> PathBuf {
        self.root.join("testcase")
    }

    /// Per-run scratch build directory, recreated from empty every run.
    pub fn scratch_dir(&self) -> PathBuf {
        self.root.join("test")
    }

    /// Persistent output directory (traces, redirected simulator logs).
    pub fn output_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    /// Hardware-description sources of the design under test.
    pub fn hdl_dir(&self) -> PathBuf {
        self.root.join("src")
    }

    /// Testbench variants.
    pub fn sim_dir(&self) -> PathBuf {
        self.root.join("sim")
    }

    /// Reference-model C++ source.
    pub fn refmodel_source(&self) -> PathBuf {
        self.root.join("tools/ws_cpu/CPU.cpp")
    }

    /// Optional registry manifest overriding the built-in testcase table.
    pub fn manifest_path(&self) -> PathBuf {
        self.testcase_dir().join("manifest.json")
    }

    /// Source file of a named testcase.
    pub fn testcase_source(&self, name: &str) -> PathBuf {
        self.testcase_dir().join(format!("{name}.c"))
    }

    /// Stdin fixture of a named testcase.
    pub fn testcase_fixture(&self, name: &str) -> PathBuf {
        self.testcase_dir().join(format!("{name}.in"))
    }

    /// A path inside the scratch directory.
    pub fn scratch(&self, file: &str) -> PathBuf {
        self.scratch_dir().join(file)
    }

    /// A path inside the output directory.
    pub fn output(&self, file: impl AsRef<Path>) -> PathBuf {
        self.output_dir().join(file)
    }
}
