//! Atomic book edits and their CSV row mapping.
//!
//! The engine writes one flat 14-column row per edit. Internally the edit
//! is a tagged variant so reverse dispatch and field access are total:
//! a FILL cannot be asked for a `new_price`, and an unmatched delta type
//! fails at parse time rather than deep inside replay.

use crate::book::Side;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant column of a delta row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeltaType {
    /// A new order entered the book.
    #[serde(rename = "ADD")]
    Add,
    /// A resting order was (partially) executed.
    #[serde(rename = "FILL")]
    Fill,
    /// A resting order was withdrawn.
    #[serde(rename = "CANCEL")]
    Cancel,
    /// A resting order was re-priced or re-sized.
    #[serde(rename = "MODIFY")]
    Modify,
}

impl DeltaType {
    /// Wire spelling of the discriminant.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DeltaType::Add => "ADD",
            DeltaType::Fill => "FILL",
            DeltaType::Cancel => "CANCEL",
            DeltaType::Modify => "MODIFY",
        }
    }
}

impl fmt::Display for DeltaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-variant payload of a delta.
///
/// `quantity` is the event's own amount (e.g. the fill size) and
/// `remaining_qty` the post-event remainder on the order; both are needed
/// to reverse the edit without consulting any other state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaKind {
    /// Insert at the tail of the `(side, price)` queue.
    Add {
        /// Submitted quantity.
        quantity: i64,
        /// Quantity actually resting after the add.
        remaining_qty: i64,
    },
    /// Execution against a resting order.
    Fill {
        /// Executed quantity.
        quantity: i64,
        /// Quantity left on the order, zero for a full fill.
        remaining_qty: i64,
        /// Trade this fill belongs to.
        trade_id: u64,
    },
    /// Withdrawal of a resting order.
    Cancel {
        /// Quantity the order had when it was placed.
        quantity: i64,
        /// Quantity still resting at cancel time.
        remaining_qty: i64,
    },
    /// Re-price / re-size. A price-changing modify retires the old id and
    /// creates `new_order_id`; `new_order_id == 0` means the original id
    /// re-enters in place (quantity-only modify).
    Modify {
        /// Quantity on the original order at modify time.
        quantity: i64,
        /// Remainder on the original order at modify time.
        remaining_qty: i64,
        /// Replacement id, or `0` for an in-place modify.
        new_order_id: u64,
        /// Price after the modify.
        new_price: i64,
        /// Quantity after the modify.
        new_quantity: i64,
    },
}

/// One atomic edit from the engine's event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delta {
    /// Tick at which the edit happened.
    pub timestamp: u64,
    /// Engine-assigned ordering within a tick.
    pub sequence_num: u64,
    /// Instrument whose book this edit targets.
    pub instrument_id: u64,
    /// Order the edit refers to.
    pub order_id: u64,
    /// Participant owning the order.
    pub client_id: u64,
    /// Book side of the order.
    pub side: Side,
    /// Price of the order before the edit, in ticks.
    pub price: i64,
    /// Variant payload.
    pub kind: DeltaKind,
}

impl Delta {
    /// The discriminant this delta would carry on the wire.
    #[must_use]
    pub fn delta_type(&self) -> DeltaType {
        match self.kind {
            DeltaKind::Add { .. } => DeltaType::Add,
            DeltaKind::Fill { .. } => DeltaType::Fill,
            DeltaKind::Cancel { .. } => DeltaType::Cancel,
            DeltaKind::Modify { .. } => DeltaType::Modify,
        }
    }

    /// The event's own quantity (fill amount, canceled size, ...).
    #[must_use]
    pub fn quantity(&self) -> i64 {
        match self.kind {
            DeltaKind::Add { quantity, .. }
            | DeltaKind::Fill { quantity, .. }
            | DeltaKind::Cancel { quantity, .. }
            | DeltaKind::Modify { quantity, .. } => quantity,
        }
    }

    /// Post-event remainder on the order.
    #[must_use]
    pub fn remaining_qty(&self) -> i64 {
        match self.kind {
            DeltaKind::Add { remaining_qty, .. }
            | DeltaKind::Fill { remaining_qty, .. }
            | DeltaKind::Cancel { remaining_qty, .. }
            | DeltaKind::Modify { remaining_qty, .. } => remaining_qty,
        }
    }
}

/// Flat image of one CSV row, column-for-column.
///
/// Fields that do not apply to a given delta type are written and read as
/// zero, which is exactly what the engine emits, so a parse/serialize
/// cycle reproduces the input rows bit for bit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaRow {
    /// Tick of the edit.
    pub timestamp: u64,
    /// Ordering within the tick.
    pub sequence_num: u64,
    /// Discriminant.
    pub delta_type: DeltaType,
    /// Order id.
    pub order_id: u64,
    /// Owning participant.
    pub client_id: u64,
    /// Target instrument.
    pub instrument_id: u64,
    /// Book side.
    pub side: Side,
    /// Pre-event price.
    pub price: i64,
    /// Event quantity.
    pub quantity: i64,
    /// Post-event remainder.
    pub remaining_qty: i64,
    /// Trade id (FILL only, else 0).
    pub trade_id: u64,
    /// Replacement order id (MODIFY only, else 0).
    pub new_order_id: u64,
    /// Post-modify price (MODIFY only, else 0).
    pub new_price: i64,
    /// Post-modify quantity (MODIFY only, else 0).
    pub new_quantity: i64,
}

/// Column names of the delta CSV, in file order.
pub const DELTA_COLUMNS: [&str; 14] = [
    "timestamp",
    "sequence_num",
    "delta_type",
    "order_id",
    "client_id",
    "instrument_id",
    "side",
    "price",
    "quantity",
    "remaining_qty",
    "trade_id",
    "new_order_id",
    "new_price",
    "new_quantity",
];

impl From<DeltaRow> for Delta {
    fn from(row: DeltaRow) -> Self {
        let kind = match row.delta_type {
            DeltaType::Add => DeltaKind::Add {
                quantity: row.quantity,
                remaining_qty: row.remaining_qty,
            },
            DeltaType::Fill => DeltaKind::Fill {
                quantity: row.quantity,
                remaining_qty: row.remaining_qty,
                trade_id: row.trade_id,
            },
            DeltaType::Cancel => DeltaKind::Cancel {
                quantity: row.quantity,
                remaining_qty: row.remaining_qty,
            },
            DeltaType::Modify => DeltaKind::Modify {
                quantity: row.quantity,
                remaining_qty: row.remaining_qty,
                new_order_id: row.new_order_id,
                new_price: row.new_price,
                new_quantity: row.new_quantity,
            },
        };
        Delta {
            timestamp: row.timestamp,
            sequence_num: row.sequence_num,
            instrument_id: row.instrument_id,
            order_id: row.order_id,
            client_id: row.client_id,
            side: row.side,
            price: row.price,
            kind,
        }
    }
}

impl From<&Delta> for DeltaRow {
    fn from(delta: &Delta) -> Self {
        let mut row = DeltaRow {
            timestamp: delta.timestamp,
            sequence_num: delta.sequence_num,
            delta_type: delta.delta_type(),
            order_id: delta.order_id,
            client_id: delta.client_id,
            instrument_id: delta.instrument_id,
            side: delta.side,
            price: delta.price,
            quantity: delta.quantity(),
            remaining_qty: delta.remaining_qty(),
            trade_id: 0,
            new_order_id: 0,
            new_price: 0,
            new_quantity: 0,
        };
        match delta.kind {
            DeltaKind::Fill { trade_id, .. } => row.trade_id = trade_id,
            DeltaKind::Modify {
                new_order_id,
                new_price,
                new_quantity,
                ..
            } => {
                row.new_order_id = new_order_id;
                row.new_price = new_price;
                row.new_quantity = new_quantity;
            }
            DeltaKind::Add { .. } | DeltaKind::Cancel { .. } => {}
        }
        row
    }
}
