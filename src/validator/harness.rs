//! Multi-case validation: discover engine test outputs and validate each
//! independently.
//!
//! The engine's test runner writes one directory per scenario
//! (`test_0`, `test_1`, ...) under a root named by `CROSS_VAL_OUTPUT_DIR`.
//! Each case is self-contained, so the harness fans the per-case
//! validation out across scoped threads; the replay core itself stays
//! single-threaded per case.

use super::comparator::ComparisonResult;
use super::validator::CrossValidator;
use crate::stream::StreamError;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming the engine's test output root.
pub const OUTPUT_DIR_ENV: &str = "CROSS_VAL_OUTPUT_DIR";

/// Outcome class of one validated case directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseStatus {
    /// Every snapshot comparison matched.
    Passed,
    /// At least one snapshot comparison failed.
    Failed,
    /// Nothing to validate.
    Skipped,
    /// The case could not be validated at all (setup error).
    Error,
}

impl CaseStatus {
    fn tag(self) -> &'static str {
        match self {
            CaseStatus::Passed => "[PASS]",
            CaseStatus::Failed => "[FAIL]",
            CaseStatus::Skipped => "[SKIP]",
            CaseStatus::Error => "[ERR]",
        }
    }
}

/// Result of validating one case directory.
#[derive(Debug, Clone)]
pub struct CaseResult {
    /// Directory name of the case.
    pub name: String,
    /// Outcome class.
    pub status: CaseStatus,
    /// Number of snapshot comparisons run.
    pub comparisons: usize,
    /// Number of failed comparisons.
    pub failures: usize,
    /// Setup-error message, when `status` is `Error`.
    pub error: Option<String>,
    /// Capped sample of difference lines from failed comparisons.
    pub differences: Vec<String>,
}

impl CaseResult {
    fn error(name: String, message: String) -> Self {
        Self {
            name,
            status: CaseStatus::Error,
            comparisons: 0,
            failures: 0,
            error: Some(message),
            differences: Vec::new(),
        }
    }
}

impl fmt::Display for CaseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status.tag(), self.name)?;
        match self.status {
            CaseStatus::Passed => write!(f, " ({} states validated)", self.comparisons),
            CaseStatus::Failed => {
                write!(f, " ({}/{} states failed)", self.failures, self.comparisons)
            }
            CaseStatus::Skipped | CaseStatus::Error => {
                if let Some(message) = &self.error {
                    write!(f, ": {message}")
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// Aggregate outcome over all discovered cases.
#[derive(Debug, Clone, Default)]
pub struct HarnessReport {
    /// Per-case results in discovery order.
    pub cases: Vec<CaseResult>,
}

impl HarnessReport {
    /// Total number of cases.
    #[must_use]
    pub fn total(&self) -> usize {
        self.cases.len()
    }

    /// Cases whose every comparison matched.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.count(CaseStatus::Passed)
    }

    /// Cases with at least one failed comparison.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(CaseStatus::Failed)
    }

    /// Cases that could not be validated.
    #[must_use]
    pub fn errors(&self) -> usize {
        self.count(CaseStatus::Error)
    }

    /// Cases with nothing to validate.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(CaseStatus::Skipped)
    }

    fn count(&self, status: CaseStatus) -> usize {
        self.cases.iter().filter(|c| c.status == status).count()
    }

    /// True when no case failed or errored.
    #[must_use]
    pub fn success(&self) -> bool {
        self.failed() == 0 && self.errors() == 0
    }

    /// Multi-line human-readable report: per-case lines with capped
    /// difference samples, then the aggregate summary block.
    #[must_use]
    pub fn render(&self) -> String {
        use std::fmt::Write as _;

        let mut out = String::new();
        for case in &self.cases {
            let _ = writeln!(out, "{case}");
            if case.status == CaseStatus::Failed && !case.differences.is_empty() {
                let _ = writeln!(out, "  Differences:");
                for diff in case.differences.iter().take(5) {
                    let _ = writeln!(out, "    - {diff}");
                }
                if case.differences.len() > 5 {
                    let _ = writeln!(out, "    ... and {} more", case.differences.len() - 5);
                }
            }
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", "=".repeat(60));
        let _ = writeln!(out, "Cross-Validation Summary");
        let _ = writeln!(out, "{}", "=".repeat(60));
        let _ = writeln!(out, "Total cases: {}", self.total());
        let _ = writeln!(out, "  Passed: {}", self.passed());
        let _ = writeln!(out, "  Failed: {}", self.failed());
        let _ = writeln!(out, "  Errors: {}", self.errors());
        let _ = writeln!(out, "  Skipped: {}", self.skipped());
        let _ = writeln!(out);
        if self.success() {
            let _ = writeln!(out, "ALL CROSS-VALIDATION CASES PASSED");
        } else {
            let _ = writeln!(out, "CROSS-VALIDATION FAILED");
        }
        out
    }
}

/// Discovers and validates every case directory under one root.
#[derive(Debug, Clone)]
pub struct ValidationHarness {
    root: PathBuf,
    parallel: bool,
}

impl ValidationHarness {
    /// Harness over an explicit root directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            parallel: true,
        }
    }

    /// Harness over the root named by `CROSS_VAL_OUTPUT_DIR`.
    ///
    /// # Errors
    ///
    /// Fails when the variable is unset.
    pub fn from_env() -> Result<Self, StreamError> {
        match std::env::var_os(OUTPUT_DIR_ENV) {
            Some(root) => Ok(Self::new(PathBuf::from(root))),
            None => Err(StreamError::MissingInput {
                path: PathBuf::from(format!("${OUTPUT_DIR_ENV}")),
            }),
        }
    }

    /// Validate cases sequentially instead of fanning out.
    #[must_use]
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Case directories under the root: `test_*` directories that contain
    /// at least one `states/state_*.json` export, in name order.
    ///
    /// # Errors
    ///
    /// Fails when the root directory cannot be read.
    pub fn discover_cases(&self) -> Result<Vec<PathBuf>, StreamError> {
        if !self.root.is_dir() {
            return Err(StreamError::MissingInput {
                path: self.root.clone(),
            });
        }
        let mut cases = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            let is_case = path.is_dir()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("test_"));
            if is_case && has_state_files(&path.join("states")) {
                cases.push(path);
            }
        }
        cases.sort();
        debug!(target: "bookreplay::harness", count = cases.len(), "discovered cases");
        Ok(cases)
    }

    fn validate_case(dir: &Path) -> CaseResult {
        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("<case>")
            .to_string();

        if !dir.join("deltas.csv").exists() {
            return CaseResult::error(name, "Missing deltas.csv".to_string());
        }
        if !dir.join("states").is_dir() {
            return CaseResult::error(name, "Missing states/ directory".to_string());
        }

        let validator = CrossValidator::new(dir);
        let results: Vec<ComparisonResult> = match validator.validate_all() {
            Ok(results) => results,
            Err(err) => return CaseResult::error(name, err.to_string()),
        };
        if results.is_empty() {
            return CaseResult::error(name, "No state files to validate".to_string());
        }

        let failures: Vec<&ComparisonResult> = results.iter().filter(|r| !r.matched).collect();
        let mut differences = Vec::new();
        for failure in &failures {
            differences.extend(failure.differences.iter().take(5).cloned());
        }
        differences.truncate(20);

        if failures.is_empty() {
            CaseResult {
                name,
                status: CaseStatus::Passed,
                comparisons: results.len(),
                failures: 0,
                error: None,
                differences: Vec::new(),
            }
        } else {
            CaseResult {
                name,
                status: CaseStatus::Failed,
                comparisons: results.len(),
                failures: failures.len(),
                error: None,
                differences,
            }
        }
    }

    /// Discover and validate every case, fanning out across scoped
    /// threads unless [`Self::sequential`] was requested.
    ///
    /// # Errors
    ///
    /// Fails when the root directory cannot be read; per-case problems
    /// are reported inside the returned report instead.
    pub fn run(&self) -> Result<HarnessReport, StreamError> {
        let cases = self.discover_cases()?;
        if cases.is_empty() {
            info!(target: "bookreplay::harness", root = %self.root.display(), "no case directories found");
            return Ok(HarnessReport {
                cases: vec![CaseResult {
                    name: "discovery".to_string(),
                    status: CaseStatus::Skipped,
                    comparisons: 0,
                    failures: 0,
                    error: Some("No case output directories found".to_string()),
                    differences: Vec::new(),
                }],
            });
        }

        let mut slots: Vec<Option<CaseResult>> = cases.iter().map(|_| None).collect();
        if self.parallel && cases.len() > 1 {
            let scope_outcome = crossbeam::thread::scope(|scope| {
                for (slot, dir) in slots.iter_mut().zip(&cases) {
                    scope.spawn(move |_| {
                        *slot = Some(Self::validate_case(dir));
                    });
                }
            });
            if scope_outcome.is_err() {
                // A worker panicked; its slot stays empty and is reported
                // below as a per-case error.
                debug!(target: "bookreplay::harness", "validation worker panicked");
            }
        } else {
            for (slot, dir) in slots.iter_mut().zip(&cases) {
                *slot = Some(Self::validate_case(dir));
            }
        }

        let results = slots
            .into_iter()
            .zip(&cases)
            .map(|(slot, dir)| {
                slot.unwrap_or_else(|| {
                    let name = dir
                        .file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("<case>")
                        .to_string();
                    CaseResult::error(name, "validation worker panicked".to_string())
                })
            })
            .collect();

        Ok(HarnessReport { cases: results })
    }

    /// The root directory this harness scans.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn has_state_files(states_dir: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(states_dir) else {
        return false;
    };
    entries.flatten().any(|entry| {
        entry
            .file_name()
            .to_str()
            .is_some_and(|n| n.starts_with("state_") && n.ends_with(".json"))
    })
}
