//! Cross-validate engine test outputs against the replay implementation.
//!
//! Usage: `cross_validate [OUTPUT_DIR]`
//!
//! The output root comes from the positional argument or, failing that,
//! from `CROSS_VAL_OUTPUT_DIR`. The root may either be a single scenario
//! directory (containing `deltas.csv` and `states/`) or a harness root
//! holding `test_*` case directories. Exits 0 when every comparison
//! matched, 1 otherwise.

use bookreplay_rs::validator::{CrossValidator, OUTPUT_DIR_ENV, ValidationHarness};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn resolve_root() -> Option<PathBuf> {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os(OUTPUT_DIR_ENV).map(PathBuf::from))
}

fn validate_single(root: &Path) -> ExitCode {
    let validator = CrossValidator::new(root);
    match validator.validate_all() {
        Ok(results) => {
            let mut all_passed = true;
            for result in &results {
                println!("{result}");
                all_passed &= result.matched;
            }
            println!();
            println!(
                "Cross-validation complete: {}",
                if all_passed { "PASSED" } else { "FAILED" }
            );
            println!("Total comparisons: {}", results.len());
            println!(
                "Failures: {}",
                results.iter().filter(|r| !r.matched).count()
            );
            if all_passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let Some(root) = resolve_root() else {
        eprintln!("usage: cross_validate [OUTPUT_DIR]  (or set {OUTPUT_DIR_ENV})");
        return ExitCode::FAILURE;
    };

    // A directory with its own states/ export is a single scenario;
    // anything else is treated as a harness root of test_* cases.
    if root.join("states").is_dir() {
        return validate_single(&root);
    }

    let harness = ValidationHarness::new(&root);
    match harness.run() {
        Ok(report) => {
            print!("{}", report.render());
            if report.success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
