//! Structural diff between an engine snapshot and the replayed state.
//!
//! Comparison is strictly read-only and strictly structural: both sides
//! are walked in display order (bids descending, asks ascending, queues
//! in FIFO order) and every disagreement becomes one human-readable
//! difference string. Coarse mismatches (level count, price, queue
//! length) suppress the finer checks beneath them so one root cause does
//! not fan out into hundreds of lines.

use super::pnl::{PnlLedger, PnlState};
use super::snapshot::{ReferenceSnapshot, SnapshotBook, SnapshotLevel, SnapshotOrder};
use super::validator::ReplaySession;
use crate::book::{Book, Order, Side};
use std::collections::BTreeSet;
use std::fmt;

/// Outcome of one snapshot comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonResult {
    /// True when no difference was found.
    pub matched: bool,
    /// Sequence index of the snapshot (from its filename).
    pub sequence_num: u64,
    /// Snapshot tick, when the snapshot could be read.
    pub timestamp: Option<u64>,
    /// One line per disagreement, empty on a match.
    pub differences: Vec<String>,
}

impl ComparisonResult {
    /// A failure result carrying a single explanatory message.
    #[must_use]
    pub fn failure(sequence_num: u64, timestamp: Option<u64>, message: String) -> Self {
        Self {
            matched: false,
            sequence_num,
            timestamp,
            differences: vec![message],
        }
    }
}

impl fmt::Display for ComparisonResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ts = self
            .timestamp
            .map(|t| t.to_string())
            .unwrap_or_else(|| "?".to_string());
        if self.matched {
            write!(f, "[OK] seq={} ts={ts}", self.sequence_num)
        } else {
            let shown = self
                .differences
                .iter()
                .take(3)
                .cloned()
                .collect::<Vec<_>>()
                .join("; ");
            write!(f, "[FAIL] seq={} ts={ts}: {shown}", self.sequence_num)?;
            if self.differences.len() > 3 {
                write!(f, " (+{} more)", self.differences.len() - 3)?;
            }
            Ok(())
        }
    }
}

/// Structural comparator between engine exports and replayed state.
#[derive(Debug, Clone, Default)]
pub struct StateComparator {
    tolerance: i64,
}

impl StateComparator {
    /// Exact comparator (tolerance 0).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Comparator allowing P&L fields to differ by up to `tolerance`.
    #[must_use]
    pub fn with_tolerance(tolerance: i64) -> Self {
        Self { tolerance }
    }

    /// Diff one instrument's book against its snapshot image.
    #[must_use]
    pub fn compare_books(
        &self,
        reference: &SnapshotBook,
        replayed: &Book,
        instrument_id: u64,
    ) -> Vec<String> {
        let mut differences =
            compare_side(&reference.bids, replayed, Side::Buy, instrument_id);
        differences.extend(compare_side(&reference.asks, replayed, Side::Sell, instrument_id));
        differences
    }

    /// Diff the per-participant P&L maps.
    ///
    /// Client-id sets are symmetric-differenced first; shared ids are then
    /// compared field by field with the configured integer tolerance.
    #[must_use]
    pub fn compare_pnl(
        &self,
        reference: &std::collections::BTreeMap<String, PnlState>,
        ledger: &PnlLedger,
    ) -> Vec<String> {
        let mut differences = Vec::new();

        let mut engine_ids: BTreeSet<u64> = BTreeSet::new();
        for key in reference.keys() {
            match key.parse::<u64>() {
                Ok(id) => {
                    engine_ids.insert(id);
                }
                Err(_) => {
                    differences.push(format!("PnL key not an integer: engine key `{key}`"));
                }
            }
        }
        let replay_ids: BTreeSet<u64> = ledger.accounts().keys().copied().collect();

        let only_engine: Vec<u64> = engine_ids.difference(&replay_ids).copied().collect();
        let only_replay: Vec<u64> = replay_ids.difference(&engine_ids).copied().collect();
        if !only_engine.is_empty() {
            differences.push(format!("PnL clients only in engine: {only_engine:?}"));
        }
        if !only_replay.is_empty() {
            differences.push(format!("PnL clients only in replay: {only_replay:?}"));
        }

        for client_id in engine_ids.intersection(&replay_ids) {
            let engine = &reference[&client_id.to_string()];
            let Some(replay) = ledger.get(*client_id) else {
                continue;
            };
            let fields = [
                ("long_position", engine.long_position, replay.long_position),
                ("short_position", engine.short_position, replay.short_position),
                ("cash", engine.cash, replay.cash),
            ];
            for (field, engine_val, replay_val) in fields {
                if (engine_val - replay_val).abs() > self.tolerance {
                    differences.push(format!(
                        "PnL[{client_id}].{field}: engine={engine_val}, replay={replay_val}"
                    ));
                }
            }
        }

        differences
    }

    /// Diff the complete simulation state: every instrument's book, then
    /// the P&L map. Never mutates either side.
    #[must_use]
    pub fn compare_full_state(
        &self,
        snapshot: &ReferenceSnapshot,
        session: &ReplaySession,
    ) -> ComparisonResult {
        let mut differences = Vec::new();

        let mut engine_instruments: BTreeSet<u64> = BTreeSet::new();
        for key in snapshot.order_books.keys() {
            match key.parse::<u64>() {
                Ok(id) => {
                    engine_instruments.insert(id);
                }
                Err(_) => {
                    differences.push(format!(
                        "order book key not an integer: engine key `{key}`"
                    ));
                }
            }
        }
        let replay_instruments: BTreeSet<u64> = session.books().keys().copied().collect();

        let only_engine: Vec<u64> = engine_instruments
            .difference(&replay_instruments)
            .copied()
            .collect();
        let only_replay: Vec<u64> = replay_instruments
            .difference(&engine_instruments)
            .copied()
            .collect();
        if !only_engine.is_empty() {
            differences.push(format!("Order books only in engine: {only_engine:?}"));
        }
        if !only_replay.is_empty() {
            differences.push(format!("Order books only in replay: {only_replay:?}"));
        }

        for instrument_id in engine_instruments.intersection(&replay_instruments) {
            let reference = &snapshot.order_books[&instrument_id.to_string()];
            if let Some(book) = session.book(*instrument_id) {
                differences.extend(self.compare_books(reference, book, *instrument_id));
            }
        }

        differences.extend(self.compare_pnl(&snapshot.pnl, session.ledger()));

        ComparisonResult {
            matched: differences.is_empty(),
            sequence_num: snapshot.sequence_num,
            timestamp: Some(snapshot.timestamp),
            differences,
        }
    }
}

fn compare_side(
    reference_levels: &[SnapshotLevel],
    replayed: &Book,
    side: Side,
    instrument_id: u64,
) -> Vec<String> {
    let mut differences = Vec::new();
    let side_name = side.level_name();
    let replay_levels: Vec<(i64, Vec<Order>)> = replayed
        .iter_side(side)
        .map(|(price, queue)| (price, queue.iter().cloned().collect()))
        .collect();

    if reference_levels.len() != replay_levels.len() {
        differences.push(format!(
            "inst={instrument_id} {side_name} level count: engine={}, replay={}",
            reference_levels.len(),
            replay_levels.len()
        ));
    }

    for (i, reference) in reference_levels.iter().enumerate() {
        let Some((replay_price, replay_orders)) = replay_levels.get(i) else {
            differences.push(format!(
                "inst={instrument_id} {side_name} extra engine level at price {}",
                reference.price
            ));
            continue;
        };

        if reference.price != *replay_price {
            differences.push(format!(
                "inst={instrument_id} {side_name} level {i} price: engine={}, replay={replay_price}",
                reference.price
            ));
            continue;
        }

        if reference.orders.len() != replay_orders.len() {
            differences.push(format!(
                "inst={instrument_id} {side_name}[{}] queue length: engine={}, replay={}",
                reference.price,
                reference.orders.len(),
                replay_orders.len()
            ));
            continue;
        }

        for (j, (engine_order, replay_order)) in
            reference.orders.iter().zip(replay_orders).enumerate()
        {
            let context = format!("inst={instrument_id} {side_name}[{}][{j}]", reference.price);
            differences.extend(compare_order(engine_order, replay_order, &context));
        }
    }

    for (price, _) in replay_levels.iter().skip(reference_levels.len()) {
        differences.push(format!(
            "inst={instrument_id} {side_name} extra replay level at price {price}"
        ));
    }

    differences
}

fn compare_order(reference: &SnapshotOrder, replayed: &Order, context: &str) -> Vec<String> {
    let mut diffs = Vec::new();
    let fields = [
        ("order_id", reference.order_id as i64, replayed.order_id as i64),
        ("client_id", reference.client_id as i64, replayed.client_id as i64),
        ("quantity", reference.quantity, replayed.quantity),
        ("price", reference.price, replayed.price),
    ];
    for (field, engine_val, replay_val) in fields {
        if engine_val != replay_val {
            diffs.push(format!(
                "{context}.{field}: engine={engine_val}, replay={replay_val}"
            ));
        }
    }
    if reference.side != replayed.side {
        diffs.push(format!(
            "{context}.side: engine={}, replay={}",
            reference.side, replayed.side
        ));
    }
    diffs
}
