//! Command-line configuration.
//!
//! The grammar keeps the original driver's single-dash multi-character flags
//! (`-case`, `-o`), so parsing is a single left-to-right scan with an
//! explicit cursor: each recognized flag either toggles a field or consumes
//! exactly one following token as its value. The full token list must be
//! consumed before a `Config` exists; a partially parsed command line never
//! reaches the pipeline.

use crate::error::ConfigError;
use crate::testcase::Registry;
use std::path::{Component, Path};

/// Name compiled when no `-case` is given, mirroring the original driver.
/// The default bypasses registry validation.
pub const DEFAULT_TESTCASE: &str = "test";

/// Usage text printed for `-h` / `--help`.
pub const USAGE: &str = "\
usage: cpurun [options]

options:
  -o <path>             redirect simulator output to <path> under bin/
  -case <name>          select testcase by name (validated against the registry)
  --gen-reg             also produce a reference register trace
  --gen-reg-only        produce only the reference trace; skip simulation
  --disable-opt         compile the testcase unoptimized (-O0)
  --disable-forever     use the bounded-execution simulation testbench
  --gen-testcase-only   only produce build artifacts; skip reference model and simulation
  --keep-going          continue past failing pipeline stages (diagnostic mode)
  -h, --help            print this message and exit
";

/// Immutable configuration of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Selected testcase name.
    pub testcase: String,

    /// Simulator output file, relative to the output directory.
    pub output_file: Option<String>,

    /// Produce a reference register trace.
    pub gen_reference_trace: bool,

    /// Stop after the reference trace; implies `gen_reference_trace`.
    pub reference_trace_only: bool,

    /// Compile the testcase with `-O0` instead of `-O2`.
    pub disable_optimization: bool,

    /// Select the bounded-execution testbench variant.
    pub disable_forever_bound: bool,

    /// Stop after artifact generation.
    pub testcase_only: bool,

    /// Continue past failing stages instead of aborting on the first one.
    pub keep_going: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            testcase: DEFAULT_TESTCASE.to_string(),
            output_file: None,
            gen_reference_trace: false,
            reference_trace_only: false,
            disable_optimization: false,
            disable_forever_bound: false,
            testcase_only: false,
            keep_going: false,
        }
    }
}

/// Outcome of parsing: either a runnable configuration or a help request,
/// which terminates successfully without any pipeline work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Run(Config),
    Help,
}

impl Config {
    /// Parse the token list (program name excluded) against a registry.
    ///
    /// Testcase names supplied via `-case` must exist in the registry; the
    /// default name is exempt.
    pub fn parse<S: AsRef<str>>(args: &[S], registry: &Registry) -> Result<Invocation, ConfigError> {
        let mut config = Config::default();
        let mut i = 0;

        while i < args.len() {
            let arg = args[i].as_ref();
            match arg {
                "-o" => {
                    let value = take_value(args, &mut i, "-o")?;
                    // The value is resolved under the output directory; an
                    // absolute or `..`-escaping path would land outside it.
                    let path = Path::new(&value);
                    if path.is_absolute()
                        || path.components().any(|c| matches!(c, Component::ParentDir))
                    {
                        return Err(ConfigError::InvalidOutputPath(value));
                    }
                    config.output_file = Some(value);
                }
                "-case" => {
                    let name = take_value(args, &mut i, "-case")?;
                    // Naming the default explicitly is always accepted;
                    // only other names go through registry validation.
                    if name != DEFAULT_TESTCASE && !registry.contains(&name) {
                        return Err(ConfigError::UnknownTestcase(name));
                    }
                    config.testcase = name;
                }
                "--gen-reg" => config.gen_reference_trace = true,
                "--gen-reg-only" => {
                    config.gen_reference_trace = true;
                    config.reference_trace_only = true;
                }
                "--disable-opt" => config.disable_optimization = true,
                "--disable-forever" => config.disable_forever_bound = true,
                "--gen-testcase-only" => config.testcase_only = true,
                "--keep-going" => config.keep_going = true,
                "-h" | "--help" => return Ok(Invocation::Help),
                other => return Err(ConfigError::UnknownFlag(other.to_string())),
            }
            i += 1;
        }

        Ok(Invocation::Run(config))
    }
}

/// Consume the token following `args[*i]` as a flag value.
fn take_value<S: AsRef<str>>(
    args: &[S],
    i: &mut usize,
    flag: &'static str,
) -> Result<String, ConfigError> {
    if *i + 1 >= args.len() {
        return Err(ConfigError::MissingValue(flag));
    }
    *i += 1;
    Ok(args[*i].as_ref().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Invocation, ConfigError> {
        Config::parse(args, &Registry::builtin())
    }

    fn parse_run(args: &[&str]) -> Config {
        match parse(args).unwrap() {
            Invocation::Run(c) => c,
            Invocation::Help => panic!("unexpected help"),
        }
    }

    #[test]
    fn test_defaults() {
        let config = parse_run(&[]);
        assert_eq!(config, Config::default());
        assert_eq!(config.testcase, "test");
        assert!(config.output_file.is_none());
    }

    #[test]
    fn test_case_and_output() {
        let config = parse_run(&["-case", "gcd", "-o", "result.txt"]);
        assert_eq!(config.testcase, "gcd");
        assert_eq!(config.output_file.as_deref(), Some("result.txt"));
    }

    #[test]
    fn test_boolean_flags() {
        let config = parse_run(&["--disable-opt", "--disable-forever", "--gen-testcase-only"]);
        assert!(config.disable_optimization);
        assert!(config.disable_forever_bound);
        assert!(config.testcase_only);
        assert!(!config.gen_reference_trace);
    }

    #[test]
    fn test_gen_reg_only_implies_gen_reg() {
        let config = parse_run(&["--gen-reg-only"]);
        assert!(config.gen_reference_trace);
        assert!(config.reference_trace_only);

        let config = parse_run(&["--gen-reg"]);
        assert!(config.gen_reference_trace);
        assert!(!config.reference_trace_only);
    }

    #[test]
    fn test_help_short_circuits() {
        assert_eq!(parse(&["-h"]).unwrap(), Invocation::Help);
        assert_eq!(parse(&["--help"]).unwrap(), Invocation::Help);
        // Help wins even after other flags.
        assert_eq!(parse(&["--gen-reg", "--help"]).unwrap(), Invocation::Help);
    }

    #[test]
    fn test_missing_value_errors() {
        assert_eq!(parse(&["-o"]).unwrap_err(), ConfigError::MissingValue("-o"));
        assert_eq!(
            parse(&["--gen-reg", "-case"]).unwrap_err(),
            ConfigError::MissingValue("-case")
        );
    }

    #[test]
    fn test_unknown_flag_rejected() {
        assert_eq!(
            parse(&["--wat"]).unwrap_err(),
            ConfigError::UnknownFlag("--wat".to_string())
        );
    }

    #[test]
    fn test_unknown_testcase_rejected() {
        assert_eq!(
            parse(&["-case", "no_such_case"]).unwrap_err(),
            ConfigError::UnknownTestcase("no_such_case".to_string())
        );
    }

    #[test]
    fn test_default_testcase_bypasses_registry() {
        // "test" is not in the registry; both the implicit default and an
        // explicit `-case test` select it without validation.
        let config = parse_run(&["--gen-reg"]);
        assert_eq!(config.testcase, "test");

        let config = parse_run(&["-case", "test"]);
        assert_eq!(config.testcase, "test");
    }

    #[test]
    fn test_output_path_must_stay_under_output_dir() {
        assert_eq!(
            parse(&["-o", "/tmp/result.txt"]).unwrap_err(),
            ConfigError::InvalidOutputPath("/tmp/result.txt".to_string())
        );
        assert_eq!(
            parse(&["-o", "../escape.txt"]).unwrap_err(),
            ConfigError::InvalidOutputPath("../escape.txt".to_string())
        );

        let config = parse_run(&["-o", "sub/result.txt"]);
        assert_eq!(config.output_file.as_deref(), Some("sub/result.txt"));
    }

    #[test]
    fn test_keep_going_flag() {
        assert!(parse_run(&["--keep-going"]).keep_going);
        assert!(!parse_run(&[]).keep_going);
    }
}
