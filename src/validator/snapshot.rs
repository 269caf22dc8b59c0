//! JSON model of the engine's full-state exports.
//!
//! Snapshot files are named `state_NNNNNN.json` (zero-padded sequence
//! index) and carry, per instrument, both sides of the book in display
//! order (bids highest-first, asks lowest-first, orders in FIFO order)
//! plus the per-participant P&L map. Map keys are strings in the JSON;
//! they stay strings here and are decoded where the comparison needs
//! integers, so a malformed key becomes a reported difference rather
//! than a parse failure.

use super::pnl::PnlState;
use crate::book::Side;
use crate::stream::StreamError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One order inside a snapshot level.
///
/// `timestamp` and `instrument_id` are optional in the export and never
/// compared; queue position already encodes arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotOrder {
    /// Order id.
    pub order_id: u64,
    /// Owning participant.
    pub client_id: u64,
    /// Remaining quantity.
    pub quantity: i64,
    /// Price in ticks.
    pub price: i64,
    /// Book side.
    pub side: Side,
    /// FIFO anchor, when exported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    /// Instrument, when exported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument_id: Option<u64>,
}

/// One price level of a snapshot side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotLevel {
    /// Level price in ticks.
    pub price: i64,
    /// Orders at this price, FIFO order.
    #[serde(default)]
    pub orders: Vec<SnapshotOrder>,
}

/// Both sides of one instrument's book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotBook {
    /// Bid levels, highest price first.
    #[serde(default)]
    pub bids: Vec<SnapshotLevel>,
    /// Ask levels, lowest price first.
    #[serde(default)]
    pub asks: Vec<SnapshotLevel>,
}

/// A full-state export from the reference engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSnapshot {
    /// Tick the snapshot was taken at.
    #[serde(default)]
    pub timestamp: u64,
    /// Export step counter.
    #[serde(default)]
    pub sequence_num: u64,
    /// Per-instrument books, keyed by the instrument id's decimal string.
    #[serde(default)]
    pub order_books: BTreeMap<String, SnapshotBook>,
    /// Per-participant P&L, keyed by the client id's decimal string.
    #[serde(default)]
    pub pnl: BTreeMap<String, PnlState>,
}

impl ReferenceSnapshot {
    /// Load and parse one snapshot file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or is not valid JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StreamError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|err| StreamError::Json {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }
}
