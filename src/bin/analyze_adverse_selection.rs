//! Analyze adverse selection on market-maker resting quotes.
//!
//! Usage: `analyze_adverse_selection [SCENARIO_DIR]`
//!
//! The scenario directory comes from the positional argument or, failing
//! that, from `AS_TEST_OUTPUT_DIR`. It must contain `trades.csv`,
//! `deltas.csv`, `market_state.csv`, and `metadata.json`. The per-fill
//! results are written to `adverse_selection.csv` inside the same
//! directory and the bucket summary is printed. Exits 0 on success, 1 on
//! a setup error.

use bookreplay_rs::analysis::{AdverseSelectionAnalyzer, SCENARIO_DIR_ENV, summary_text};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn resolve_dir() -> Option<PathBuf> {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os(SCENARIO_DIR_ENV).map(PathBuf::from))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let Some(dir) = resolve_dir() else {
        eprintln!("usage: analyze_adverse_selection [SCENARIO_DIR]  (or set {SCENARIO_DIR_ENV})");
        return ExitCode::FAILURE;
    };

    let analyzer = AdverseSelectionAnalyzer::new(&dir);
    match analyzer.run_and_write_csv() {
        Ok(report) => {
            println!(
                "{}",
                summary_text(
                    &report.fills,
                    report.mm_client_id,
                    &report.horizons,
                    report.buckets.len().max(1),
                )
            );
            println!(
                "Wrote {} fills to {}",
                report.fills.len(),
                dir.join("adverse_selection.csv").display()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
