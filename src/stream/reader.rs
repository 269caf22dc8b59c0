//! Whole-file loaders and writers for the engine's CSV outputs.
//!
//! Every function opens its file, consumes it, and closes it before
//! returning; nothing here holds a handle across calls.

use super::delta::{DELTA_COLUMNS, Delta, DeltaRow};
use super::error::StreamError;
use super::market_state::MarketStatePoint;
use super::trade::Trade;
use csv::StringRecord;
use std::path::Path;
use tracing::debug;

/// Verify that every required column appears in a CSV header.
///
/// The delta format in particular must carry `instrument_id`; silently
/// defaulting it would let a malformed export validate against the wrong
/// book.
pub(crate) fn require_columns(
    headers: &StringRecord,
    required: &[&str],
    path: &Path,
) -> Result<(), StreamError> {
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(StreamError::MissingColumn {
                path: path.to_path_buf(),
                column: (*column).to_string(),
            });
        }
    }
    Ok(())
}

fn ensure_exists(path: &Path) -> Result<(), StreamError> {
    if path.exists() {
        Ok(())
    } else {
        Err(StreamError::MissingInput {
            path: path.to_path_buf(),
        })
    }
}

/// Load and parse every delta row of an event file, in file order.
///
/// # Errors
///
/// Fails when the file is missing, a required column (including
/// `instrument_id`) is absent, or any row fails to parse.
pub fn load_deltas(path: impl AsRef<Path>) -> Result<Vec<Delta>, StreamError> {
    let path = path.as_ref();
    ensure_exists(path)?;
    let mut reader = csv::Reader::from_path(path)?;
    require_columns(reader.headers()?, &DELTA_COLUMNS, path)?;

    let mut deltas = Vec::new();
    for row in reader.deserialize::<DeltaRow>() {
        deltas.push(row?.into());
    }
    debug!(target: "bookreplay::stream", path = %path.display(), count = deltas.len(), "loaded deltas");
    Ok(deltas)
}

/// Write deltas back out in the engine's 14-column format.
///
/// Together with [`load_deltas`] this round-trips every field, which is
/// how parser fidelity is checked against captured engine output.
///
/// # Errors
///
/// Fails on I/O or serialization problems.
pub fn write_deltas(path: impl AsRef<Path>, deltas: &[Delta]) -> Result<(), StreamError> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    for delta in deltas {
        writer.serialize(DeltaRow::from(delta))?;
    }
    writer.flush()?;
    Ok(())
}

/// Load every trade of a trade file, in file order.
///
/// # Errors
///
/// Fails when the file is missing or any row fails to parse.
pub fn load_trades(path: impl AsRef<Path>) -> Result<Vec<Trade>, StreamError> {
    let path = path.as_ref();
    ensure_exists(path)?;
    let mut reader = csv::Reader::from_path(path)?;
    let mut trades = Vec::new();
    for row in reader.deserialize::<Trade>() {
        trades.push(row?);
    }
    debug!(target: "bookreplay::stream", path = %path.display(), count = trades.len(), "loaded trades");
    Ok(trades)
}

/// Load the fair-price time series from a market-state file.
///
/// # Errors
///
/// Fails when the file is missing or any row fails to parse.
pub fn load_market_state(path: impl AsRef<Path>) -> Result<Vec<MarketStatePoint>, StreamError> {
    let path = path.as_ref();
    ensure_exists(path)?;
    let mut reader = csv::Reader::from_path(path)?;
    let mut points = Vec::new();
    for row in reader.deserialize::<MarketStatePoint>() {
        points.push(row?);
    }
    debug!(target: "bookreplay::stream", path = %path.display(), count = points.len(), "loaded market state");
    Ok(points)
}
