//! Replay book error types.

use crate::book::Side;
use std::fmt;

/// Errors that can occur while replaying deltas through a [`crate::book::Book`].
///
/// The replay book is deliberately tolerant: in the default configuration a
/// FILL or CANCEL naming an id that never rested is a logged no-op, because
/// the stream legitimately contains aggressor orders that matched on
/// arrival. These variants surface only in strict mode or when an
/// integrity sweep finds the book in a state no valid stream can produce.
#[derive(Debug)]
#[non_exhaustive]
pub enum BookError {
    /// A delta referenced an order id that is not resting in the book.
    UnknownOrder {
        /// The order id the delta referenced.
        order_id: u64,
        /// The delta type that referenced it (`FILL`, `CANCEL`, ...).
        delta_type: &'static str,
    },

    /// An order was found in a queue that disagrees with the registry.
    RegistryMismatch {
        /// The order id with inconsistent bookkeeping.
        order_id: u64,
        /// Location recorded in the registry, if any.
        registered: Option<(i64, Side)>,
        /// Location where the order was actually found.
        found: (i64, Side),
    },

    /// A price key maps to an empty queue.
    EmptyLevel {
        /// Side holding the empty level.
        side: Side,
        /// Price key of the empty level.
        price: i64,
    },

    /// Queue timestamps are not non-decreasing.
    QueueOrderViolation {
        /// Side of the offending queue.
        side: Side,
        /// Price of the offending queue.
        price: i64,
        /// Order whose anchor is earlier than its predecessor's.
        order_id: u64,
    },

    /// Best bid is at or above best ask after a whole-tick apply.
    CrossedBook {
        /// Best bid price.
        best_bid: i64,
        /// Best ask price.
        best_ask: i64,
    },
}

impl fmt::Display for BookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookError::UnknownOrder {
                order_id,
                delta_type,
            } => {
                write!(f, "{delta_type} references unknown order id {order_id}")
            }
            BookError::RegistryMismatch {
                order_id,
                registered,
                found,
            } => {
                write!(
                    f,
                    "registry mismatch for order {order_id}: registered {registered:?}, found {found:?}"
                )
            }
            BookError::EmptyLevel { side, price } => {
                write!(f, "empty {} level left at price {price}", side.level_name())
            }
            BookError::QueueOrderViolation {
                side,
                price,
                order_id,
            } => {
                write!(
                    f,
                    "FIFO anchor out of order at {}[{price}], order {order_id}",
                    side.level_name()
                )
            }
            BookError::CrossedBook { best_bid, best_ask } => {
                write!(f, "crossed book: best bid {best_bid} >= best ask {best_ask}")
            }
        }
    }
}

impl std::error::Error for BookError {}
