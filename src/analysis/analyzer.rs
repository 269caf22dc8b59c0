//! Directory-level orchestration of the adverse-selection analysis.

use super::buckets::{BucketStats, summarize};
use super::fair_price::FairPriceSeries;
use super::fills::{MakerFill, maker_fills, order_lifecycle};
use super::metadata::AgentDirectory;
use super::report::write_fill_csv;
use crate::stream::{StreamError, load_deltas, load_trades};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default realized-AS horizons, in ticks.
pub const DEFAULT_HORIZONS: [u64; 4] = [50, 100, 200, 500];
/// Default number of quote-age buckets (quartiles).
pub const DEFAULT_BUCKETS: usize = 4;
/// Environment variable naming the scenario directory for the analyzer.
pub const SCENARIO_DIR_ENV: &str = "AS_TEST_OUTPUT_DIR";

/// Failures that stop an analysis run before it produces results.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnalysisError {
    /// An input file was missing or failed to parse.
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// No `MarketMaker` agent in the metadata and no explicit id given.
    #[error("no MarketMaker agent found in metadata")]
    NoMarketMaker,

    /// Several `MarketMaker` agents in the metadata and no explicit id
    /// given to disambiguate.
    #[error("multiple MarketMaker agents found: {candidates:?}; an explicit id is required")]
    MultipleMarketMakers {
        /// The candidate market-maker ids.
        candidates: Vec<u64>,
    },
}

/// Completed analysis over one scenario directory.
#[derive(Debug, Clone)]
pub struct AdverseSelectionReport {
    /// The market maker the analysis tracked.
    pub mm_client_id: u64,
    /// Horizons the realized columns were computed for.
    pub horizons: Vec<u64>,
    /// Every maker fill, in trade order.
    pub fills: Vec<MakerFill>,
    /// Quote-age bucket boundaries.
    pub boundaries: Vec<i64>,
    /// Per-bucket statistics.
    pub buckets: Vec<BucketStats>,
}

/// Adverse-selection analyzer over one scenario directory containing
/// `trades.csv`, `deltas.csv`, `market_state.csv`, and `metadata.json`.
#[derive(Debug, Clone)]
pub struct AdverseSelectionAnalyzer {
    data_dir: PathBuf,
    mm_client_id: Option<u64>,
    horizons: Vec<u64>,
    num_buckets: usize,
}

impl AdverseSelectionAnalyzer {
    /// Analyzer over one scenario directory with default horizons and
    /// bucket count; the market maker is auto-detected from metadata.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            mm_client_id: None,
            horizons: DEFAULT_HORIZONS.to_vec(),
            num_buckets: DEFAULT_BUCKETS,
        }
    }

    /// Track an explicit market-maker id instead of auto-detecting.
    #[must_use]
    pub fn with_market_maker(mut self, client_id: u64) -> Self {
        self.mm_client_id = Some(client_id);
        self
    }

    /// Use explicit realized-AS horizons.
    #[must_use]
    pub fn with_horizons(mut self, horizons: Vec<u64>) -> Self {
        self.horizons = horizons;
        self
    }

    /// Use an explicit quote-age bucket count.
    #[must_use]
    pub fn with_buckets(mut self, num_buckets: usize) -> Self {
        self.num_buckets = num_buckets;
        self
    }

    fn resolve_market_maker(&self, agents: &AgentDirectory) -> Result<u64, AnalysisError> {
        if let Some(id) = self.mm_client_id {
            if !agents.contains(id) {
                warn!(
                    target: "bookreplay::analysis",
                    client_id = id,
                    "requested market maker is not listed in metadata"
                );
            }
            return Ok(id);
        }
        let candidates = agents.market_makers();
        match candidates.len() {
            0 => Err(AnalysisError::NoMarketMaker),
            1 => {
                let only = candidates[0];
                info!(target: "bookreplay::analysis", client_id = only, "auto-detected market maker");
                Ok(only)
            }
            _ => Err(AnalysisError::MultipleMarketMakers { candidates }),
        }
    }

    /// Run the full analysis: lifecycle map, fair-price series, fill
    /// extraction, and bucketing.
    ///
    /// # Errors
    ///
    /// Fails on missing or unparsable inputs, or when the market maker
    /// cannot be resolved from the metadata.
    pub fn run(&self) -> Result<AdverseSelectionReport, AnalysisError> {
        let agents = AgentDirectory::load(self.data_dir.join("metadata.json"))?;
        let mm_client_id = self.resolve_market_maker(&agents)?;

        let deltas = load_deltas(self.data_dir.join("deltas.csv"))?;
        let lifecycle = order_lifecycle(&deltas);
        debug!(target: "bookreplay::analysis", orders = lifecycle.len(), "built order lifecycle map");

        let fair_prices = FairPriceSeries::load(self.data_dir.join("market_state.csv"))?;
        let trades = load_trades(self.data_dir.join("trades.csv"))?;

        let fills = maker_fills(
            &trades,
            mm_client_id,
            &lifecycle,
            &fair_prices,
            &agents,
            &self.horizons,
        );
        info!(
            target: "bookreplay::analysis",
            fills = fills.len(),
            trades = trades.len(),
            "extracted maker fills"
        );

        let (boundaries, buckets) = summarize(&fills, &self.horizons, self.num_buckets);
        Ok(AdverseSelectionReport {
            mm_client_id,
            horizons: self.horizons.clone(),
            fills,
            boundaries,
            buckets,
        })
    }

    /// Run the analysis and write the per-fill CSV next to the inputs as
    /// `adverse_selection.csv`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::run`], plus I/O failures while writing.
    pub fn run_and_write_csv(&self) -> Result<AdverseSelectionReport, AnalysisError> {
        let report = self.run()?;
        let path = self.data_dir.join("adverse_selection.csv");
        write_fill_csv(&path, &report.fills, &report.horizons)?;
        info!(
            target: "bookreplay::analysis",
            path = %path.display(),
            fills = report.fills.len(),
            "wrote per-fill CSV"
        );
        Ok(report)
    }

    /// The scenario directory this analyzer reads from.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
