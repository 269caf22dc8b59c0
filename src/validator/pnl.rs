//! Closed-system P&L accounting, mirroring the engine's trade
//! notifications.

use crate::stream::Trade;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Position and cash state of one participant.
///
/// Long and short accumulate independently; the engine does no netting
/// and neither does the replay. All values are integer lots and
/// dollar-ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PnlState {
    /// Total bought quantity.
    #[serde(default)]
    pub long_position: i64,
    /// Total sold quantity.
    #[serde(default)]
    pub short_position: i64,
    /// Cash delta from all trades, negative for net buyers.
    #[serde(default)]
    pub cash: i64,
}

impl PnlState {
    /// Long minus short.
    #[must_use]
    pub fn net_position(&self) -> i64 {
        self.long_position - self.short_position
    }
}

/// Per-participant ledger fed by the trade stream.
///
/// The system is closed: every tick of cash a buyer pays, a seller
/// receives, so `total_cash()` and `total_net_position()` are zero after
/// every trade. Entries appear lazily on a participant's first trade.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PnlLedger {
    accounts: HashMap<u64, PnlState>,
}

impl PnlLedger {
    /// Empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger with every trade of `trades` applied, in slice order.
    #[must_use]
    pub fn from_trades(trades: &[Trade]) -> Self {
        let mut ledger = Self::new();
        for trade in trades {
            ledger.apply(trade);
        }
        ledger
    }

    /// Record one trade: the buyer goes longer and pays, the seller goes
    /// shorter and receives.
    pub fn on_trade(&mut self, buyer_id: u64, seller_id: u64, price: i64, quantity: i64) {
        let value = price * quantity;

        let buyer = self.accounts.entry(buyer_id).or_default();
        buyer.long_position += quantity;
        buyer.cash -= value;

        let seller = self.accounts.entry(seller_id).or_default();
        seller.short_position += quantity;
        seller.cash += value;
    }

    /// Record one parsed trade record.
    pub fn apply(&mut self, trade: &Trade) {
        self.on_trade(trade.buyer_id, trade.seller_id, trade.price, trade.quantity);
    }

    /// Apply all trades of the slice whose timestamp is at most `max_ts`,
    /// in slice order.
    pub fn apply_up_to(&mut self, trades: &[Trade], max_ts: u64) {
        for trade in trades {
            if trade.timestamp > max_ts {
                break;
            }
            self.apply(trade);
        }
    }

    /// P&L of one participant, if they have traded.
    #[must_use]
    pub fn get(&self, client_id: u64) -> Option<&PnlState> {
        self.accounts.get(&client_id)
    }

    /// All participant accounts.
    #[must_use]
    pub fn accounts(&self) -> &HashMap<u64, PnlState> {
        &self.accounts
    }

    /// Number of participants seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// True before the first trade.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Sum of all cash balances; zero in a closed system.
    #[must_use]
    pub fn total_cash(&self) -> i64 {
        self.accounts.values().map(|s| s.cash).sum()
    }

    /// Sum of all net positions; zero in a closed system.
    #[must_use]
    pub fn total_net_position(&self) -> i64 {
        self.accounts.values().map(PnlState::net_position).sum()
    }

    /// Drop all state.
    pub fn reset(&mut self) {
        self.accounts.clear();
    }
}
