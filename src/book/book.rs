//! Core replay book: applies the engine's delta stream forward and
//! backward while preserving exact FIFO queue state.
//!
//! The book holds one balanced tree per side keyed by price. Bids are
//! iterated in reverse so the same ascending tree serves both sides
//! without a negated key. Two auxiliary maps keep replay exact:
//!
//! * `registry` maps each resting order id to its `(price, side)` slot so
//!   removals never scan the whole ladder.
//! * `birth_ts` remembers the tick at which each id last became resting.
//!   Entries survive full fills and cancels on purpose: a reverse
//!   traversal must re-insert such orders at their *original* anchor, and
//!   an id with no entry is an aggressor that never rested and must stay
//!   out of the book when its FILL is reversed.

use super::error::BookError;
use super::order::{Order, Side};
use crate::stream::delta::{Delta, DeltaKind};
use bitflags::bitflags;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use tracing::{trace, warn};

bitflags! {
    /// Optional replay behaviors.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ReplayFlags: u32 {
        /// Fail on a forward FILL or CANCEL that names an id which is not
        /// resting, instead of treating it as an aggressor no-op.
        const STRICT_UNKNOWN_ID = 1 << 0;
    }
}

/// Order-level book state reconstructed from the delta stream.
///
/// Equality compares the full structural state (both ladders, the
/// registry, the birth map, and the current tick), which is what the
/// forward/backward replay invariants are stated over.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Book {
    bids: BTreeMap<i64, VecDeque<Order>>,
    asks: BTreeMap<i64, VecDeque<Order>>,
    registry: HashMap<u64, (i64, Side)>,
    birth_ts: HashMap<u64, u64>,
    current_ts: u64,
    flags: ReplayFlags,
}

impl Book {
    /// Create an empty book with default (tolerant) replay flags.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty book with explicit replay flags.
    #[must_use]
    pub fn with_flags(flags: ReplayFlags) -> Self {
        Self {
            flags,
            ..Self::default()
        }
    }

    /// The tick of the last applied delta (or the restored tick after a
    /// reverse step).
    #[must_use]
    pub fn current_timestamp(&self) -> u64 {
        self.current_ts
    }

    /// Number of resting orders across both sides.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.registry.len()
    }

    /// True when no order rests on either side.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    fn ladder(&self, side: Side) -> &BTreeMap<i64, VecDeque<Order>> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn ladder_mut(&mut self, side: Side) -> &mut BTreeMap<i64, VecDeque<Order>> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Append a new order at the tail of its price queue.
    fn push_back(&mut self, order: Order) {
        self.registry
            .insert(order.order_id, (order.price, order.side));
        self.ladder_mut(order.side)
            .entry(order.price)
            .or_default()
            .push_back(order);
    }

    /// Re-insert an order at its FIFO position: immediately before the
    /// first resting order whose anchor is strictly later, or at the tail
    /// when none is. Ties land after existing orders, matching the
    /// forward append.
    fn insert_fifo(&mut self, order: Order) {
        self.registry
            .insert(order.order_id, (order.price, order.side));
        let queue = self
            .ladder_mut(order.side)
            .entry(order.price)
            .or_default();
        let pos = queue
            .iter()
            .position(|resting| resting.timestamp > order.timestamp)
            .unwrap_or(queue.len());
        queue.insert(pos, order);
    }

    /// Remove an order by id, dropping its price level if it empties.
    ///
    /// Returns `None` when the id is not resting. `birth_ts` is never
    /// touched here; callers decide whether the birth entry survives.
    fn remove(&mut self, order_id: u64) -> Option<Order> {
        let (price, side) = self.registry.remove(&order_id)?;
        let ladder = self.ladder_mut(side);
        let queue = ladder.get_mut(&price)?;
        let pos = queue.iter().position(|o| o.order_id == order_id)?;
        let order = queue.remove(pos);
        if queue.is_empty() {
            ladder.remove(&price);
        }
        order
    }

    /// Overwrite the remaining quantity of a resting order in place.
    fn set_quantity(&mut self, order_id: u64, quantity: i64) -> bool {
        let Some(&(price, side)) = self.registry.get(&order_id) else {
            return false;
        };
        let Some(queue) = self.ladder_mut(side).get_mut(&price) else {
            return false;
        };
        match queue.iter_mut().find(|o| o.order_id == order_id) {
            Some(order) => {
                order.quantity = quantity;
                true
            }
            None => false,
        }
    }

    fn on_unknown(&self, order_id: u64, delta_type: &'static str) -> Result<(), BookError> {
        if self.flags.contains(ReplayFlags::STRICT_UNKNOWN_ID) {
            Err(BookError::UnknownOrder {
                order_id,
                delta_type,
            })
        } else {
            warn!(
                target: "bookreplay::book",
                order_id, delta_type, "tolerating delta for id that never rested"
            );
            Ok(())
        }
    }

    /// Advance the book by one tick-atomic edit.
    ///
    /// # Errors
    ///
    /// In the default configuration this never fails: FILL and CANCEL for
    /// unknown ids are no-ops (the stream contains aggressor ids that
    /// never rested). With [`ReplayFlags::STRICT_UNKNOWN_ID`] those cases
    /// return [`BookError::UnknownOrder`].
    pub fn apply(&mut self, delta: &Delta) -> Result<(), BookError> {
        trace!(target: "bookreplay::book", ?delta, "apply");
        self.current_ts = delta.timestamp;

        match delta.kind {
            DeltaKind::Add { remaining_qty, .. } => {
                self.push_back(Order {
                    order_id: delta.order_id,
                    client_id: delta.client_id,
                    side: delta.side,
                    price: delta.price,
                    quantity: remaining_qty,
                    timestamp: delta.timestamp,
                });
                self.birth_ts.insert(delta.order_id, delta.timestamp);
            }

            DeltaKind::Fill { remaining_qty, .. } => {
                if remaining_qty == 0 {
                    if self.remove(delta.order_id).is_none() {
                        self.on_unknown(delta.order_id, "FILL")?;
                    }
                } else if !self.set_quantity(delta.order_id, remaining_qty) {
                    self.on_unknown(delta.order_id, "FILL")?;
                }
            }

            DeltaKind::Cancel { .. } => {
                if self.remove(delta.order_id).is_none() {
                    self.on_unknown(delta.order_id, "CANCEL")?;
                }
            }

            DeltaKind::Modify {
                new_order_id,
                new_price,
                new_quantity,
                ..
            } => {
                self.remove(delta.order_id);
                // new_order_id == 0 is a quantity-only modify: the same id
                // re-enters at the modify tick and its anchor is refreshed,
                // mirroring the lifecycle map in the adverse-selection
                // analyzer.
                let replacement_id = if new_order_id == 0 {
                    delta.order_id
                } else {
                    new_order_id
                };
                self.push_back(Order {
                    order_id: replacement_id,
                    client_id: delta.client_id,
                    side: delta.side,
                    price: new_price,
                    quantity: new_quantity,
                    timestamp: delta.timestamp,
                });
                self.birth_ts.insert(replacement_id, delta.timestamp);
            }
        }

        Ok(())
    }

    /// Undo one tick-atomic edit, restoring the book to the state
    /// immediately before `delta` with `current_timestamp()` set to
    /// `prev_timestamp`.
    ///
    /// A fully-filled id with no birth entry is an aggressor that never
    /// rested and is deliberately not restored. Orders that do re-enter
    /// land at their original FIFO position via their recorded anchor.
    ///
    /// # Errors
    ///
    /// Reverse application is always tolerant; the `Result` is reserved
    /// for future strict-mode symmetry and currently never fails.
    pub fn apply_reverse(&mut self, delta: &Delta, prev_timestamp: u64) -> Result<(), BookError> {
        trace!(target: "bookreplay::book", ?delta, prev_timestamp, "apply_reverse");

        match delta.kind {
            DeltaKind::Add { .. } => {
                self.remove(delta.order_id);
                self.birth_ts.remove(&delta.order_id);
            }

            DeltaKind::Fill {
                quantity,
                remaining_qty,
                ..
            } => {
                if remaining_qty == 0 {
                    if let Some(&born) = self.birth_ts.get(&delta.order_id) {
                        self.insert_fifo(Order {
                            order_id: delta.order_id,
                            client_id: delta.client_id,
                            side: delta.side,
                            price: delta.price,
                            quantity,
                            timestamp: born,
                        });
                    }
                } else {
                    self.set_quantity(delta.order_id, remaining_qty + quantity);
                }
            }

            DeltaKind::Cancel { remaining_qty, .. } => {
                let born = self
                    .birth_ts
                    .get(&delta.order_id)
                    .copied()
                    .unwrap_or(prev_timestamp);
                self.insert_fifo(Order {
                    order_id: delta.order_id,
                    client_id: delta.client_id,
                    side: delta.side,
                    price: delta.price,
                    quantity: remaining_qty,
                    timestamp: born,
                });
            }

            DeltaKind::Modify {
                quantity,
                new_order_id,
                ..
            } => {
                let replacement_id = if new_order_id == 0 {
                    delta.order_id
                } else {
                    new_order_id
                };
                self.remove(replacement_id);
                if replacement_id != delta.order_id {
                    self.birth_ts.remove(&replacement_id);
                }
                let born = self
                    .birth_ts
                    .get(&delta.order_id)
                    .copied()
                    .unwrap_or(prev_timestamp);
                self.insert_fifo(Order {
                    order_id: delta.order_id,
                    client_id: delta.client_id,
                    side: delta.side,
                    price: delta.price,
                    quantity,
                    timestamp: born,
                });
            }
        }

        self.current_ts = prev_timestamp;
        Ok(())
    }

    /// Best bid as `(price, total resting quantity)`.
    #[must_use]
    pub fn best_bid(&self) -> Option<(i64, i64)> {
        self.bids
            .iter()
            .next_back()
            .map(|(&price, queue)| (price, queue.iter().map(|o| o.quantity).sum()))
    }

    /// Best ask as `(price, total resting quantity)`.
    #[must_use]
    pub fn best_ask(&self) -> Option<(i64, i64)> {
        self.asks
            .iter()
            .next()
            .map(|(&price, queue)| (price, queue.iter().map(|o| o.quantity).sum()))
    }

    /// Best ask minus best bid, when both sides are populated.
    #[must_use]
    pub fn spread(&self) -> Option<i64> {
        match (self.best_bid(), self.best_ask()) {
            (Some((bid, _)), Some((ask, _))) => Some(ask - bid),
            _ => None,
        }
    }

    /// Midpoint of the touch, when both sides are populated. Display-only;
    /// every stored price stays in integer ticks.
    #[must_use]
    pub fn midpoint(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some((bid, _)), Some((ask, _))) => Some((bid + ask) as f64 / 2.0),
            _ => None,
        }
    }

    /// Price levels of one side in display order (bids descending, asks
    /// ascending), each with its FIFO queue.
    pub fn iter_side(&self, side: Side) -> Box<dyn Iterator<Item = (i64, &VecDeque<Order>)> + '_> {
        match side {
            Side::Buy => Box::new(self.bids.iter().rev().map(|(&p, q)| (p, q))),
            Side::Sell => Box::new(self.asks.iter().map(|(&p, q)| (p, q))),
        }
    }

    /// Top `levels` price levels per side as `(price, total quantity)`,
    /// bids first.
    #[must_use]
    pub fn depth(&self, levels: usize) -> (Vec<(i64, i64)>, Vec<(i64, i64)>) {
        let sum = |queue: &VecDeque<Order>| queue.iter().map(|o| o.quantity).sum::<i64>();
        let bids = self
            .bids
            .iter()
            .rev()
            .take(levels)
            .map(|(&p, q)| (p, sum(q)))
            .collect();
        let asks = self
            .asks
            .iter()
            .take(levels)
            .map(|(&p, q)| (p, sum(q)))
            .collect();
        (bids, asks)
    }

    /// All price levels per side as `(price, total quantity)`, bids first.
    #[must_use]
    pub fn full_depth(&self) -> (Vec<(i64, i64)>, Vec<(i64, i64)>) {
        self.depth(usize::MAX)
    }

    /// Look up a resting order by id.
    #[must_use]
    pub fn get_order(&self, order_id: u64) -> Option<&Order> {
        let &(price, side) = self.registry.get(&order_id)?;
        self.ladder(side)
            .get(&price)?
            .iter()
            .find(|o| o.order_id == order_id)
    }

    /// Resting orders at one `(side, price)` in FIFO order.
    #[must_use]
    pub fn orders_at(&self, side: Side, price: i64) -> Vec<Order> {
        self.ladder(side)
            .get(&price)
            .map(|queue| queue.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Sweep the whole book and verify its structural invariants: every
    /// queue entry agrees with the registry, no price key holds an empty
    /// queue, FIFO anchors are non-decreasing within each queue, and the
    /// book is not crossed.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn verify_integrity(&self) -> Result<(), BookError> {
        let mut seen: HashSet<u64> = HashSet::with_capacity(self.registry.len());
        for side in [Side::Buy, Side::Sell] {
            for (&price, queue) in self.ladder(side) {
                if queue.is_empty() {
                    return Err(BookError::EmptyLevel { side, price });
                }
                let mut last_ts = 0u64;
                for order in queue {
                    let registered = self.registry.get(&order.order_id).copied();
                    if registered != Some((price, side))
                        || order.price != price
                        || !seen.insert(order.order_id)
                    {
                        return Err(BookError::RegistryMismatch {
                            order_id: order.order_id,
                            registered,
                            found: (price, side),
                        });
                    }
                    if order.timestamp < last_ts {
                        return Err(BookError::QueueOrderViolation {
                            side,
                            price,
                            order_id: order.order_id,
                        });
                    }
                    last_ts = order.timestamp;
                }
            }
        }
        // Every queue entry was registered and unique, so a count
        // mismatch can only mean a registry entry whose queue does not
        // contain it.
        for &order_id in self.registry.keys() {
            if !seen.contains(&order_id) {
                let registered = self.registry.get(&order_id).copied();
                return Err(BookError::RegistryMismatch {
                    order_id,
                    registered,
                    found: registered.unwrap_or((0, Side::Buy)),
                });
            }
        }
        if let (Some((bid, _)), Some((ask, _))) = (self.best_bid(), self.best_ask())
            && bid >= ask
        {
            return Err(BookError::CrossedBook {
                best_bid: bid,
                best_ask: ask,
            });
        }
        Ok(())
    }

    /// Render the top of the book as the two-column text layout used by
    /// the diagnostic binaries.
    #[must_use]
    pub fn format_book(&self, levels: usize) -> String {
        use std::fmt::Write as _;

        let (bid_levels, ask_levels) = self.depth(levels);
        let mut out = String::new();
        let _ = writeln!(out, "{}", "=".repeat(47));
        let _ = writeln!(out, " ORDER BOOK at timestamp {}", self.current_ts);
        let _ = writeln!(out, "{}", "=".repeat(47));
        if let (Some(mid), Some(spread)) = (self.midpoint(), self.spread()) {
            let _ = writeln!(out, " Midpoint: {mid:.1}  Spread: {spread}");
        }
        let _ = writeln!(out, "{:>22} | {:<22}", "BID (Qty @ Price)", "ASK (Qty @ Price)");
        let _ = writeln!(out, "{}+{}", "-".repeat(23), "-".repeat(23));

        let rows = bid_levels.len().max(ask_levels.len());
        for i in 0..rows {
            let bid = bid_levels
                .get(i)
                .map(|(p, q)| format!("{q} @ {p}"))
                .unwrap_or_default();
            let ask = ask_levels
                .get(i)
                .map(|(p, q)| format!("{q} @ {p}"))
                .unwrap_or_default();
            let _ = writeln!(out, "{bid:>22} | {ask:<22}");
        }
        if rows == 0 {
            let _ = writeln!(out, "{:^47}", "(empty)");
        }
        out
    }
}
