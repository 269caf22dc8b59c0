//! Fair-price time series points from `market_state.csv`.

use serde::{Deserialize, Serialize};

/// One sample of the engine's market state, written at its own cadence
/// with monotone non-decreasing timestamps.
///
/// `best_bid` / `best_ask` of `0` mean the corresponding side of the book
/// was empty at sample time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketStatePoint {
    /// Sample tick.
    pub timestamp: u64,
    /// Fair price of the instrument at the sample tick.
    pub fair_price: i64,
    /// Best bid price, `0` when the bid side was empty.
    pub best_bid: i64,
    /// Best ask price, `0` when the ask side was empty.
    pub best_ask: i64,
}

impl MarketStatePoint {
    /// Best bid, with the empty-side sentinel decoded.
    #[must_use]
    pub fn bid(&self) -> Option<i64> {
        (self.best_bid != 0).then_some(self.best_bid)
    }

    /// Best ask, with the empty-side sentinel decoded.
    #[must_use]
    pub fn ask(&self) -> Option<i64> {
        (self.best_ask != 0).then_some(self.best_ask)
    }
}
