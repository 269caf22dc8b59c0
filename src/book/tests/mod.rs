//! Unit tests for forward and reverse delta replay.


use crate::book::Side;
use crate::stream::{Delta, DeltaKind};

pub(super) fn add(order_id: u64, client_id: u64, side: Side, price: i64, qty: i64, ts: u64) -> Delta {
    Delta {
        timestamp: ts,
        sequence_num: 0,
        instrument_id: 1,
        order_id,
        client_id,
        side,
        price,
        kind: DeltaKind::Add {
            quantity: qty,
            remaining_qty: qty,
        },
    }
}

#[allow(clippy::too_many_arguments)]
pub(super) fn fill(
    order_id: u64,
    client_id: u64,
    side: Side,
    price: i64,
    qty: i64,
    remaining: i64,
    ts: u64,
) -> Delta {
    Delta {
        timestamp: ts,
        sequence_num: 0,
        instrument_id: 1,
        order_id,
        client_id,
        side,
        price,
        kind: DeltaKind::Fill {
            quantity: qty,
            remaining_qty: remaining,
            trade_id: 0,
        },
    }
}

pub(super) fn cancel(
    order_id: u64,
    client_id: u64,
    side: Side,
    price: i64,
    remaining: i64,
    ts: u64,
) -> Delta {
    Delta {
        timestamp: ts,
        sequence_num: 0,
        instrument_id: 1,
        order_id,
        client_id,
        side,
        price,
        kind: DeltaKind::Cancel {
            quantity: remaining,
            remaining_qty: remaining,
        },
    }
}

#[allow(clippy::too_many_arguments)]
pub(super) fn modify(
    order_id: u64,
    client_id: u64,
    side: Side,
    price: i64,
    qty: i64,
    new_order_id: u64,
    new_price: i64,
    new_qty: i64,
    ts: u64,
) -> Delta {
    Delta {
        timestamp: ts,
        sequence_num: 0,
        instrument_id: 1,
        order_id,
        client_id,
        side,
        price,
        kind: DeltaKind::Modify {
            quantity: qty,
            remaining_qty: qty,
            new_order_id,
            new_price,
            new_quantity: new_qty,
        },
    }
}
