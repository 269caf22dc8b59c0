//! Property tests over the replay invariants: forward/reverse round
//! trips, structural integrity after every step, and closed-system
//! P&L accounting.

use bookreplay_rs::book::{Book, Side};
use bookreplay_rs::stream::{Delta, DeltaKind};
use bookreplay_rs::validator::PnlLedger;
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Live {
    order_id: u64,
    client_id: u64,
    side: Side,
    price: i64,
    quantity: i64,
}

/// Expand abstract op codes into a valid delta stream by simulating the
/// engine's bookkeeping: fills and cancels only reference live orders,
/// bid and ask price ranges never cross, and one op variant emits the
/// FILL of an aggressor id that never rested.
fn build_stream(ops: &[(u8, u8, u8)]) -> Vec<Delta> {
    let mut live: Vec<Live> = Vec::new();
    let mut deltas = Vec::new();
    let mut next_id = 1u64;
    let mut ts = 0u64;

    let push = |ts: u64, seq: usize, order: &Live, kind: DeltaKind, deltas: &mut Vec<Delta>| {
        deltas.push(Delta {
            timestamp: ts,
            sequence_num: seq as u64,
            instrument_id: 1,
            order_id: order.order_id,
            client_id: order.client_id,
            side: order.side,
            price: order.price,
            kind,
        });
    };

    for (seq, &(op, a, b)) in ops.iter().enumerate() {
        ts += 1 + u64::from(a % 7);
        let op = if live.is_empty() && matches!(op, 1..=4) { 0 } else { op };
        match op {
            // ADD
            0 => {
                let side = if b % 2 == 0 { Side::Buy } else { Side::Sell };
                let price = match side {
                    Side::Buy => 990 + i64::from(b % 5),
                    Side::Sell => 1005 + i64::from(b % 5),
                };
                let order = Live {
                    order_id: next_id,
                    client_id: 100 + u64::from(b % 3),
                    side,
                    price,
                    quantity: 10 + i64::from(b % 4) * 10,
                };
                next_id += 1;
                push(
                    ts,
                    seq,
                    &order,
                    DeltaKind::Add {
                        quantity: order.quantity,
                        remaining_qty: order.quantity,
                    },
                    &mut deltas,
                );
                live.push(order);
            }
            // Partial FILL (falls through to full when too small)
            1 => {
                let idx = a as usize % live.len();
                let fill_qty = (live[idx].quantity / 2).max(1);
                let remaining = live[idx].quantity - fill_qty;
                let kind = DeltaKind::Fill {
                    quantity: fill_qty,
                    remaining_qty: remaining,
                    trade_id: seq as u64,
                };
                let order = live[idx].clone();
                push(ts, seq, &order, kind, &mut deltas);
                if remaining == 0 {
                    live.remove(idx);
                } else {
                    live[idx].quantity = remaining;
                }
            }
            // Full FILL
            2 => {
                let idx = a as usize % live.len();
                let order = live.remove(idx);
                push(
                    ts,
                    seq,
                    &order,
                    DeltaKind::Fill {
                        quantity: order.quantity,
                        remaining_qty: 0,
                        trade_id: seq as u64,
                    },
                    &mut deltas,
                );
            }
            // CANCEL
            3 => {
                let idx = a as usize % live.len();
                let order = live.remove(idx);
                push(
                    ts,
                    seq,
                    &order,
                    DeltaKind::Cancel {
                        quantity: order.quantity,
                        remaining_qty: order.quantity,
                    },
                    &mut deltas,
                );
            }
            // Price-changing MODIFY (fresh replacement id)
            4 => {
                let idx = a as usize % live.len();
                let old = live[idx].clone();
                let new_price = match old.side {
                    Side::Buy => 990 + i64::from(b % 5),
                    Side::Sell => 1005 + i64::from(b % 5),
                };
                let new_quantity = 10 + i64::from(b % 4) * 10;
                let new_order_id = next_id;
                next_id += 1;
                push(
                    ts,
                    seq,
                    &old,
                    DeltaKind::Modify {
                        quantity: old.quantity,
                        remaining_qty: old.quantity,
                        new_order_id,
                        new_price,
                        new_quantity,
                    },
                    &mut deltas,
                );
                live[idx] = Live {
                    order_id: new_order_id,
                    client_id: old.client_id,
                    side: old.side,
                    price: new_price,
                    quantity: new_quantity,
                };
            }
            // Aggressor FILL: an id that never rested, fully matched on
            // arrival.
            _ => {
                let order = Live {
                    order_id: next_id,
                    client_id: 200,
                    side: if b % 2 == 0 { Side::Buy } else { Side::Sell },
                    price: 1000,
                    quantity: 10,
                };
                next_id += 1;
                push(
                    ts,
                    seq,
                    &order,
                    DeltaKind::Fill {
                        quantity: order.quantity,
                        remaining_qty: 0,
                        trade_id: seq as u64,
                    },
                    &mut deltas,
                );
            }
        }
    }
    deltas
}

proptest! {
    /// Forward K steps then reverse K steps lands back on the initial
    /// book, and every intermediate reverse state equals the matching
    /// forward state. Integrity holds after every single step.
    #[test]
    fn forward_then_reverse_round_trips(
        ops in proptest::collection::vec((0u8..=5, any::<u8>(), any::<u8>()), 1..40)
    ) {
        let deltas = build_stream(&ops);
        let mut book = Book::new();
        let mut states = vec![book.clone()];

        for delta in &deltas {
            book.apply(delta).unwrap();
            book.verify_integrity().unwrap();
            states.push(book.clone());
        }

        for (k, delta) in deltas.iter().enumerate().rev() {
            let prev_ts = if k == 0 { 0 } else { deltas[k - 1].timestamp };
            book.apply_reverse(delta, prev_ts).unwrap();
            book.verify_integrity().unwrap();
            prop_assert_eq!(&book, &states[k], "state mismatch after reversing step {}", k);
        }
        prop_assert!(book.is_empty());
    }

    /// A single apply followed by its reverse is the identity on the
    /// book, whatever state it starts from.
    #[test]
    fn single_step_round_trips_from_any_state(
        setup in proptest::collection::vec((0u8..=5, any::<u8>(), any::<u8>()), 0..20),
        last in (0u8..=5, any::<u8>(), any::<u8>())
    ) {
        let mut ops = setup;
        ops.push(last);
        let deltas = build_stream(&ops);

        let mut book = Book::new();
        for delta in &deltas[..deltas.len() - 1] {
            book.apply(delta).unwrap();
        }
        let before = book.clone();

        let delta = &deltas[deltas.len() - 1];
        let prev_ts = before.current_timestamp();
        book.apply(delta).unwrap();
        book.apply_reverse(delta, prev_ts).unwrap();
        prop_assert_eq!(book, before);
    }

    /// The ledger is zero-sum in cash and net position after any trade
    /// sequence.
    #[test]
    fn pnl_ledger_is_zero_sum(
        trades in proptest::collection::vec((1u64..6, 1u64..6, 1i64..2000, 1i64..100), 0..60)
    ) {
        let mut ledger = PnlLedger::new();
        for (buyer, seller, price, quantity) in trades {
            let seller = if seller == buyer { seller % 5 + 1 } else { seller };
            ledger.on_trade(buyer, seller, price, quantity);
            prop_assert_eq!(ledger.total_cash(), 0);
            prop_assert_eq!(ledger.total_net_position(), 0);
        }
    }
}
