//! Fair-price lookups over the engine's market-state series.

use crate::stream::{MarketStatePoint, StreamError, load_market_state};
use std::path::Path;

/// The fair-price time series as two parallel arrays sorted by
/// timestamp, for binary-search lookups.
#[derive(Debug, Clone, Default)]
pub struct FairPriceSeries {
    timestamps: Vec<u64>,
    prices: Vec<i64>,
}

impl FairPriceSeries {
    /// Build the series from parsed market-state points. The file is
    /// written with monotone non-decreasing timestamps; order is
    /// preserved as-is.
    #[must_use]
    pub fn from_points(points: &[MarketStatePoint]) -> Self {
        Self {
            timestamps: points.iter().map(|p| p.timestamp).collect(),
            prices: points.iter().map(|p| p.fair_price).collect(),
        }
    }

    /// Load the series from a `market_state.csv` file.
    ///
    /// # Errors
    ///
    /// Fails when the file is missing or fails to parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StreamError> {
        Ok(Self::from_points(&load_market_state(path)?))
    }

    /// Fair price at the first sample whose timestamp is at or after
    /// `target`, or `None` when the series ends before it.
    ///
    /// Horizon measurements use the at-or-after point so they are never
    /// taken against a stale fair price.
    #[must_use]
    pub fn at_or_after(&self, target: u64) -> Option<i64> {
        let idx = self.timestamps.partition_point(|&t| t < target);
        self.prices.get(idx).copied()
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// True for an empty series.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}
