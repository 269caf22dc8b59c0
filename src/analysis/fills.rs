//! Maker-fill extraction: join the trade stream with the order
//! lifecycle and the fair-price series.

use super::fair_price::FairPriceSeries;
use super::metadata::AgentDirectory;
use crate::book::Side;
use crate::stream::{Delta, DeltaKind, Trade};
use std::collections::HashMap;
use tracing::trace;

/// A fill in which the tracked market maker was the resting (maker)
/// side.
#[derive(Debug, Clone, PartialEq)]
pub struct MakerFill {
    /// Tick of the fill.
    pub fill_timestamp: u64,
    /// Trade this fill belongs to.
    pub trade_id: u64,
    /// The market maker's order id.
    pub mm_order_id: u64,
    /// Side the market maker's quote rested on.
    pub mm_side: Side,
    /// Ticks since the quote last became live at its current id.
    pub quote_age: i64,
    /// Execution price.
    pub fill_price: i64,
    /// Fair price at fill time, from the trade record.
    pub fair_price: i64,
    /// Signed immediate adverse selection; positive favors the maker.
    pub immediate_as: i64,
    /// Realized adverse selection per horizon, parallel to the horizon
    /// list; `None` when the fair-price series ends before the horizon.
    pub realized_as: Vec<Option<i64>>,
    /// The aggressing counterparty.
    pub counterparty_id: u64,
    /// Counterparty's agent type, `Unknown` when unlisted.
    pub counterparty_type: String,
}

/// Scan the delta stream into `order_id -> tick the quote last became
/// live`.
///
/// ADD anchors the id at its insertion tick. MODIFY refreshes the
/// original id's anchor and, when a replacement id is created
/// (`new_order_id != 0`), anchors the replacement at the modify tick:
/// a price-changing modify is a new quote, and its age clock starts
/// when the maker moved it.
#[must_use]
pub fn order_lifecycle(deltas: &[Delta]) -> HashMap<u64, u64> {
    let mut lifecycle = HashMap::new();
    for delta in deltas {
        match delta.kind {
            DeltaKind::Add { .. } => {
                lifecycle.insert(delta.order_id, delta.timestamp);
            }
            DeltaKind::Modify { new_order_id, .. } => {
                lifecycle.insert(delta.order_id, delta.timestamp);
                if new_order_id != 0 {
                    lifecycle.insert(new_order_id, delta.timestamp);
                }
            }
            DeltaKind::Fill { .. } | DeltaKind::Cancel { .. } => {}
        }
    }
    lifecycle
}

/// Extract every fill where `mm_client_id` was the maker.
///
/// A trade qualifies when the aggressor was the *other* side:
/// aggressor BUY with the maker selling, or aggressor SELL with the
/// maker buying. Trades where the maker was the aggressor, was not
/// involved, or whose order id never appears in the lifecycle map are
/// skipped.
#[must_use]
pub fn maker_fills(
    trades: &[Trade],
    mm_client_id: u64,
    lifecycle: &HashMap<u64, u64>,
    fair_prices: &FairPriceSeries,
    agents: &AgentDirectory,
    horizons: &[u64],
) -> Vec<MakerFill> {
    let mut fills = Vec::new();

    for trade in trades {
        let (mm_order_id, mm_side, counterparty_id) = match trade.aggressor_side {
            Side::Buy if trade.seller_id == mm_client_id => {
                (trade.seller_order_id, Side::Sell, trade.buyer_id)
            }
            Side::Sell if trade.buyer_id == mm_client_id => {
                (trade.buyer_order_id, Side::Buy, trade.seller_id)
            }
            _ => continue,
        };

        let Some(&born) = lifecycle.get(&mm_order_id) else {
            trace!(
                target: "bookreplay::analysis",
                mm_order_id,
                trade_id = trade.trade_id,
                "maker order id missing from delta stream, skipping fill"
            );
            continue;
        };
        let quote_age = trade.timestamp as i64 - born as i64;

        let immediate_as = match mm_side {
            Side::Buy => trade.fair_price - trade.price,
            Side::Sell => trade.price - trade.fair_price,
        };

        let realized_as = horizons
            .iter()
            .map(|&h| {
                fair_prices
                    .at_or_after(trade.timestamp + h)
                    .map(|future_fp| match mm_side {
                        Side::Buy => future_fp - trade.price,
                        Side::Sell => trade.price - future_fp,
                    })
            })
            .collect();

        fills.push(MakerFill {
            fill_timestamp: trade.timestamp,
            trade_id: trade.trade_id,
            mm_order_id,
            mm_side,
            quote_age,
            fill_price: trade.price,
            fair_price: trade.fair_price,
            immediate_as,
            realized_as,
            counterparty_id,
            counterparty_type: agents.agent_type_or_unknown(counterparty_id).to_string(),
        });
    }

    fills
}
