//! Testcase registry.
//!
//! Each known testcase is an explicit descriptor carrying its name and
//! whether a companion stdin fixture must be staged next to the compiled
//! program. Keeping both facts in one record means the name list and the
//! fixture list cannot drift apart.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One known testcase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestcaseSpec {
    /// Name, keyed to `testcase/<name>.c`.
    pub name: String,

    /// Whether `testcase/<name>.in` must be staged alongside the program.
    #[serde(default)]
    pub stdin_fixture: bool,
}

impl TestcaseSpec {
    fn new(name: &str, stdin_fixture: bool) -> Self {
        Self {
            name: name.to_string(),
            stdin_fixture,
        }
    }
}

/// The set of testcases a run may select with `-case`.
#[derive(Debug, Clone)]
pub struct Registry {
    cases: Vec<TestcaseSpec>,
}

impl Registry {
    /// The built-in descriptor table, matching the sources shipped under
    /// `testcase/`.
    pub fn builtin() -> Self {
        let cases = vec![
            TestcaseSpec::new("array_test1", false),
            TestcaseSpec::new("array_test2", false),
            TestcaseSpec::new("basicopt1", false),
            TestcaseSpec::new("bulgarian", false),
            TestcaseSpec::new("expr", false),
            TestcaseSpec::new("gcd", false),
            TestcaseSpec::new("hanoi", false),
            TestcaseSpec::new("heart", true),
            TestcaseSpec::new("looper", false),
            TestcaseSpec::new("lvalue2", false),
            TestcaseSpec::new("magic", false),
            TestcaseSpec::new("manyarguments", false),
            TestcaseSpec::new("multiarray", false),
            TestcaseSpec::new("naive", false),
            TestcaseSpec::new("pi", false),
            TestcaseSpec::new("qsort", false),
            TestcaseSpec::new("queens", false),
            TestcaseSpec::new("statement_test", false),
            TestcaseSpec::new("superloop", false),
            TestcaseSpec::new("tak", false),
            TestcaseSpec::new("uartboom", false),
        ];
        Self { cases }
    }

    /// Registry decoded from a JSON manifest: an array of
    /// `{"name": ..., "stdin_fixture": ...}` records.
    pub fn from_manifest(path: &Path) -> Result<Self, PipelineError> {
        let raw = std::fs::read_to_string(path).map_err(|e| PipelineError::fs(path, e))?;
        let cases: Vec<TestcaseSpec> =
            serde_json::from_str(&raw).map_err(|e| PipelineError::Manifest {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(Self { cases })
    }

    /// Built-in table unless a manifest file exists at `path`.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        if path.is_file() {
            Self::from_manifest(path)
        } else {
            Ok(Self::builtin())
        }
    }

    /// Look up a descriptor by name.
    pub fn get(&self, name: &str) -> Option<&TestcaseSpec> {
        self.cases.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Descriptor for a run's selected testcase. Names that never went
    /// through registry validation (the default `test`) get a synthetic
    /// descriptor without a fixture.
    pub fn resolve(&self, name: &str) -> TestcaseSpec {
        self.get(name)
            .cloned()
            .unwrap_or_else(|| TestcaseSpec::new(name, false))
    }

    /// All descriptors, in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &TestcaseSpec> {
        self.cases.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_contains_known_cases() {
        let reg = Registry::builtin();
        assert!(reg.contains("gcd"));
        assert!(reg.contains("qsort"));
        assert!(!reg.contains("no_such_case"));
    }

    #[test]
    fn test_builtin_names_are_unique() {
        let reg = Registry::builtin();
        let names: std::collections::HashSet<_> = reg.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names.len(), reg.iter().count());
    }

    #[test]
    fn test_fixture_flag_carried_by_descriptor() {
        let reg = Registry::builtin();
        assert!(reg.get("heart").unwrap().stdin_fixture);
        assert!(!reg.get("gcd").unwrap().stdin_fixture);
    }

    #[test]
    fn test_resolve_unknown_name_is_fixture_free() {
        let reg = Registry::builtin();
        let spec = reg.resolve("test");
        assert_eq!(spec.name, "test");
        assert!(!spec.stdin_fixture);
    }

    #[test]
    fn test_manifest_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(
            &path,
            r#"[{"name":"alpha"},{"name":"beta","stdin_fixture":true}]"#,
        )
        .unwrap();

        let reg = Registry::from_manifest(&path).unwrap();
        assert!(reg.contains("alpha"));
        assert!(reg.get("beta").unwrap().stdin_fixture);
        assert!(!reg.get("alpha").unwrap().stdin_fixture);
    }

    #[test]
    fn test_manifest_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(&path, "not json").unwrap();

        let err = Registry::from_manifest(&path).unwrap_err();
        assert!(err.to_string().contains("invalid testcase manifest"));
    }

    #[test]
    fn test_load_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let reg = Registry::load(&dir.path().join("missing.json")).unwrap();
        assert!(reg.contains("gcd"));
    }
}
