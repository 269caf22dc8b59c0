//! Prelude module that re-exports commonly used types.
//!
//! Instead of importing each type individually, you can use:
//!
//! ```rust
//! use bookreplay_rs::prelude::*;
//! ```

// Book reconstruction
pub use crate::book::{Book, BookError, Order, ReplayFlags, Side};

// Stream formats and navigation
pub use crate::stream::{
    Delta, DeltaKind, DeltaRow, DeltaType, MarketStatePoint, ReplayIndex, StreamError, Trade,
    load_deltas, load_market_state, load_trades, write_deltas,
};

// Cross-validation
pub use crate::validator::{
    CaseResult, CaseStatus, ComparisonResult, CrossValidator, HarnessReport, PnlLedger,
    PnlState, ReferenceSnapshot, ReplaySession, StateComparator, ValidationHarness,
};

// Adverse-selection analysis
pub use crate::analysis::{
    AdverseSelectionAnalyzer, AdverseSelectionReport, AgentDirectory, AnalysisError,
    BucketStats, FairPriceSeries, MakerFill, summary_text, write_fill_csv,
};
