//! Cross-validation of the replayed state against the engine's exports.

mod comparator;
mod harness;
mod pnl;
mod snapshot;
mod validator;

pub use comparator::{ComparisonResult, StateComparator};
pub use harness::{
    CaseResult, CaseStatus, HarnessReport, OUTPUT_DIR_ENV, ValidationHarness,
};
pub use pnl::{PnlLedger, PnlState};
pub use snapshot::{ReferenceSnapshot, SnapshotBook, SnapshotLevel, SnapshotOrder};
pub use validator::{CrossValidator, ReplaySession};
