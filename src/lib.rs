//! # Market-Sim Replay & Cross-Validation
//!
//! Independent replay companion for a market-simulation engine. The
//! engine records everything it does: an atomic delta stream, a trade
//! stream, periodic full-state JSON snapshots, and a fair-price time
//! series. This crate reconstructs and audits that record so the
//! engine's behavior can be verified bit-exactly against a second
//! implementation.
//!
//! ## Subsystems
//!
//! - **[`book`]**: an order-level limit-order-book that applies deltas
//!   (ADD / FILL / CANCEL / MODIFY) both forward *and* backward,
//!   reconstructing exact FIFO queue state at any point in the stream.
//!   Reverse application restores fully-filled and canceled orders at
//!   their original queue position and knows to leave aggressor orders
//!   (ids that matched on arrival without ever resting) out of the book.
//!
//! - **[`stream`]**: parsers and writers for the engine's CSV formats,
//!   plus [`stream::ReplayIndex`], a byte-offset index over the delta
//!   file that turns "show me tick *t*" into one seek and a bounded read
//!   instead of a full-file scan.
//!
//! - **[`validator`]**: replays deltas and trades against the engine's
//!   ordered snapshot series and reports structural differences in price
//!   levels, FIFO queue order, per-order fields, and per-participant
//!   positions and cash. A harness layer fans the validation of many
//!   independent scenario directories out across threads and reduces
//!   everything to a pass/fail report.
//!
//! - **[`analysis`]**: joins the trade stream, the order lifecycle, and
//!   the fair-price series to measure adverse selection on the market
//!   maker's maker fills: quote age at fill, immediate AS against fair
//!   value, and realized AS at configurable forward horizons, bucketed
//!   by quote-age quantiles.
//!
//! ## Conventions
//!
//! Prices, quantities, cash, and adverse-selection values are integer
//! ticks and lots throughout; floating point appears only in derived
//! display statistics. The core is single-threaded and synchronous: file
//! handles are scoped to one call and every operation completes before
//! returning. Replay is tolerant by default (a FILL or CANCEL for an id
//! that never rested is a logged no-op, since aggressor ids legitimately
//! appear in the stream); [`book::ReplayFlags::STRICT_UNKNOWN_ID`] makes
//! those cases hard errors instead.
//!
//! ## Example
//!
//! ```no_run
//! use bookreplay_rs::prelude::*;
//!
//! fn main() -> Result<(), StreamError> {
//!     // Replay a recorded scenario and diff it against every snapshot.
//!     let validator = CrossValidator::new("output/test_0");
//!     for result in validator.validate_all()? {
//!         println!("{result}");
//!     }
//!
//!     // Inspect the book as of a given tick.
//!     let index = ReplayIndex::build("output/test_0/deltas.csv")?;
//!     if let Some(k) = index.find_index(5_000) {
//!         let mut book = Book::new();
//!         for delta in index.read_up_to(k)? {
//!             let _ = book.apply(&delta);
//!         }
//!         println!("{}", book.format_book(10));
//!     }
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod book;
pub mod stream;
pub mod validator;

pub mod prelude;

pub use analysis::{AdverseSelectionAnalyzer, AdverseSelectionReport, AnalysisError};
pub use book::{Book, BookError, Order, ReplayFlags, Side};
pub use stream::{Delta, DeltaKind, ReplayIndex, StreamError, Trade};
pub use validator::{
    ComparisonResult, CrossValidator, PnlLedger, ReplaySession, StateComparator,
    ValidationHarness,
};
