//! Order and side value types shared across the replay pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the book an order rests on.
///
/// Serialized as the engine's literal `BUY` / `SELL` strings so the same
/// type maps delta rows, trade rows, and snapshot orders without adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Bid side.
    #[serde(rename = "BUY")]
    Buy,
    /// Ask side.
    #[serde(rename = "SELL")]
    Sell,
}

impl Side {
    /// The opposite side.
    #[must_use]
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// The engine's wire spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }

    /// Short level name used in diff messages (`bid` / `ask`).
    #[must_use]
    pub fn level_name(self) -> &'static str {
        match self {
            Side::Buy => "bid",
            Side::Sell => "ask",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resting order as reconstructed from the delta stream.
///
/// `timestamp` is the FIFO anchor: the tick at which the order entered or
/// last re-entered the book. Partial fills update `quantity` in place and
/// leave the anchor (and therefore the queue position) untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier assigned by the engine.
    pub order_id: u64,
    /// Owning participant.
    pub client_id: u64,
    /// Book side.
    pub side: Side,
    /// Limit price in integer ticks.
    pub price: i64,
    /// Remaining quantity in integer lots.
    pub quantity: i64,
    /// FIFO anchor tick.
    pub timestamp: u64,
}
