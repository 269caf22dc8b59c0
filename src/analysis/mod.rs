//! Adverse-selection analysis of market-maker maker fills.

mod analyzer;
mod buckets;
mod fair_price;
mod fills;
mod metadata;
mod report;

pub use analyzer::{
    AdverseSelectionAnalyzer, AdverseSelectionReport, AnalysisError, DEFAULT_BUCKETS,
    DEFAULT_HORIZONS, SCENARIO_DIR_ENV,
};
pub use buckets::{BucketStats, assign_bucket, bucket_boundaries, bucket_label, summarize};
pub use fair_price::FairPriceSeries;
pub use fills::{MakerFill, maker_fills, order_lifecycle};
pub use metadata::{
    AgentDirectory, AgentRecord, INFORMED_TRADER, MARKET_MAKER, NOISE_TRADER, UNKNOWN,
};
pub use report::{summary_text, write_fill_csv};
