//! Replay orchestration against an ordered snapshot series.

use super::comparator::{ComparisonResult, StateComparator};
use super::pnl::PnlLedger;
use super::snapshot::ReferenceSnapshot;
use crate::book::Book;
use crate::stream::{Delta, StreamError, Trade, load_deltas, load_trades};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One book per instrument plus the shared P&L ledger.
///
/// The session is what the validator drives forward and the comparator
/// reads: deltas route to their instrument's book, trades to the ledger.
/// Deltas for instruments the session does not track are skipped, so a
/// multi-instrument export can be validated one instrument at a time.
#[derive(Debug, Clone, Default)]
pub struct ReplaySession {
    books: BTreeMap<u64, Book>,
    ledger: PnlLedger,
}

impl ReplaySession {
    /// A session tracking the given instruments, each starting from an
    /// empty book.
    #[must_use]
    pub fn new(instrument_ids: &[u64]) -> Self {
        Self {
            books: instrument_ids
                .iter()
                .map(|&id| (id, Book::new()))
                .collect(),
            ledger: PnlLedger::new(),
        }
    }

    /// Route one delta to its instrument's book. Unknown instruments are
    /// ignored.
    pub fn apply_delta(&mut self, delta: &Delta) {
        if let Some(book) = self.books.get_mut(&delta.instrument_id) {
            // Default sessions run tolerant, so routing cannot fail.
            let _ = book.apply(delta);
        }
    }

    /// Route one trade to the ledger.
    pub fn apply_trade(&mut self, trade: &Trade) {
        self.ledger.apply(trade);
    }

    /// The book of one instrument.
    #[must_use]
    pub fn book(&self, instrument_id: u64) -> Option<&Book> {
        self.books.get(&instrument_id)
    }

    /// All tracked books, keyed by instrument id.
    #[must_use]
    pub fn books(&self) -> &BTreeMap<u64, Book> {
        &self.books
    }

    /// The shared P&L ledger.
    #[must_use]
    pub fn ledger(&self) -> &PnlLedger {
        &self.ledger
    }
}

/// Replays an engine output directory against its snapshot series.
///
/// The directory is expected to contain `deltas.csv`, optionally
/// `trades.csv`, and a `states/` directory of `state_NNNNNN.json`
/// exports. For each snapshot, in sequence order, every delta and trade
/// up to the snapshot's timestamp is applied and the full state is
/// diffed.
#[derive(Debug, Clone)]
pub struct CrossValidator {
    output_dir: PathBuf,
    instrument_ids: Vec<u64>,
    comparator: StateComparator,
}

impl CrossValidator {
    /// Validator over one output directory, tracking instrument 1.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            instrument_ids: vec![1],
            comparator: StateComparator::new(),
        }
    }

    /// Track an explicit set of instruments instead of the default.
    #[must_use]
    pub fn with_instruments(mut self, instrument_ids: Vec<u64>) -> Self {
        self.instrument_ids = instrument_ids;
        self
    }

    /// Replace the comparator (e.g. to set a P&L tolerance).
    #[must_use]
    pub fn with_comparator(mut self, comparator: StateComparator) -> Self {
        self.comparator = comparator;
        self
    }

    /// Enumerate `states/state_NNNNNN.json` files in sequence order.
    fn snapshot_files(&self) -> Result<Vec<(u64, PathBuf)>, StreamError> {
        let states_dir = self.output_dir.join("states");
        if !states_dir.is_dir() {
            return Err(StreamError::MissingInput { path: states_dir });
        }
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&states_dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some(seq) = name
                .strip_prefix("state_")
                .and_then(|rest| rest.strip_suffix(".json"))
                .and_then(|digits| digits.parse::<u64>().ok())
            {
                files.push((seq, path));
            }
        }
        files.sort();
        Ok(files)
    }

    /// Replay all deltas and trades, comparing state at every snapshot.
    ///
    /// One bad snapshot produces one failed [`ComparisonResult`] and
    /// processing continues; content mismatches never abort the run.
    ///
    /// # Errors
    ///
    /// Fails only on unreadable inputs: a missing or malformed
    /// `deltas.csv`, a missing `states/` directory, or an unreadable
    /// `trades.csv` (a merely absent trade file is treated as empty).
    pub fn validate_all(&self) -> Result<Vec<ComparisonResult>, StreamError> {
        let mut deltas = load_deltas(self.output_dir.join("deltas.csv"))?;
        deltas.sort_by_key(|d| (d.timestamp, d.sequence_num));

        let trades_path = self.output_dir.join("trades.csv");
        let mut trades = if trades_path.exists() {
            load_trades(&trades_path)?
        } else {
            Vec::new()
        };
        trades.sort_by_key(|t| t.timestamp);

        let snapshots = self.snapshot_files()?;
        if snapshots.is_empty() {
            return Ok(vec![ComparisonResult::failure(
                0,
                None,
                "No state files found in states directory".to_string(),
            )]);
        }

        let mut session = ReplaySession::new(&self.instrument_ids);
        let mut results = Vec::with_capacity(snapshots.len());
        let mut delta_idx = 0;
        let mut trade_idx = 0;

        for (seq, path) in snapshots {
            let snapshot = match ReferenceSnapshot::load(&path) {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    results.push(ComparisonResult::failure(
                        seq,
                        None,
                        format!("Missing or unreadable state file {}: {err}", path.display()),
                    ));
                    continue;
                }
            };

            while delta_idx < deltas.len() && deltas[delta_idx].timestamp <= snapshot.timestamp {
                session.apply_delta(&deltas[delta_idx]);
                delta_idx += 1;
            }
            while trade_idx < trades.len() && trades[trade_idx].timestamp <= snapshot.timestamp {
                session.apply_trade(&trades[trade_idx]);
                trade_idx += 1;
            }

            let result = self.comparator.compare_full_state(&snapshot, &session);
            debug!(target: "bookreplay::validator", %result, "compared snapshot");
            results.push(result);
        }

        Ok(results)
    }

    /// Validate only the final state after all deltas are applied.
    ///
    /// # Errors
    ///
    /// Same setup-error conditions as [`Self::validate_all`].
    pub fn validate_final_state(&self) -> Result<ComparisonResult, StreamError> {
        let mut results = self.validate_all()?;
        Ok(results.pop().unwrap_or_else(|| {
            ComparisonResult::failure(0, None, "No states to validate".to_string())
        }))
    }

    /// The directory this validator reads from.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}
