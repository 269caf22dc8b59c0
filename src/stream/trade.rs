//! Executed trade records from the engine's trade stream.

use crate::book::Side;
use serde::{Deserialize, Serialize};

/// One executed trade, as written to `trades.csv`.
///
/// Both participant ids and both order ids are present so downstream
/// consumers can tell which side rested: the order id on the
/// non-aggressor side is the maker quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Tick of execution.
    pub timestamp: u64,
    /// Engine-assigned trade id.
    pub trade_id: u64,
    /// Instrument traded.
    pub instrument_id: u64,
    /// Buying participant.
    pub buyer_id: u64,
    /// Selling participant.
    pub seller_id: u64,
    /// Order id on the buy side.
    pub buyer_order_id: u64,
    /// Order id on the sell side.
    pub seller_order_id: u64,
    /// Execution price in ticks.
    pub price: i64,
    /// Executed quantity.
    pub quantity: i64,
    /// Which side's arrival caused the match.
    pub aggressor_side: Side,
    /// Fair price at trade time, from the engine's price process.
    pub fair_price: i64,
}
