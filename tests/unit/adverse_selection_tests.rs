//! End-to-end adverse-selection scenarios.

use bookreplay_rs::analysis::{
    AdverseSelectionAnalyzer, AnalysisError, FairPriceSeries, maker_fills, order_lifecycle,
};
use bookreplay_rs::analysis::{AgentDirectory, AgentRecord};
use bookreplay_rs::book::Side;
use bookreplay_rs::stream::{MarketStatePoint, Trade, load_deltas};
use std::path::Path;

fn agents() -> AgentDirectory {
    AgentDirectory::from_agents(vec![
        AgentRecord {
            client_id: 10,
            agent_type: "MarketMaker".to_string(),
        },
        AgentRecord {
            client_id: 20,
            agent_type: "NoiseTrader".to_string(),
        },
        AgentRecord {
            client_id: 30,
            agent_type: "InformedTrader".to_string(),
        },
    ])
}

fn series(points: &[(u64, i64)]) -> FairPriceSeries {
    let points: Vec<MarketStatePoint> = points
        .iter()
        .map(|&(timestamp, fair_price)| MarketStatePoint {
            timestamp,
            fair_price,
            best_bid: 0,
            best_ask: 0,
        })
        .collect();
    FairPriceSeries::from_points(&points)
}

fn deltas_from_csv(dir: &Path, body: &str) -> Vec<bookreplay_rs::stream::Delta> {
    let header = "timestamp,sequence_num,delta_type,order_id,client_id,instrument_id,side,price,quantity,remaining_qty,trade_id,new_order_id,new_price,new_quantity\n";
    let path = dir.join("deltas.csv");
    std::fs::write(&path, format!("{header}{body}")).unwrap();
    load_deltas(&path).unwrap()
}

fn trade(
    ts: u64,
    buyer_id: u64,
    seller_id: u64,
    buyer_order_id: u64,
    seller_order_id: u64,
    price: i64,
    aggressor_side: Side,
    fair_price: i64,
) -> Trade {
    Trade {
        timestamp: ts,
        trade_id: 1,
        instrument_id: 1,
        buyer_id,
        seller_id,
        buyer_order_id,
        seller_order_id,
        price,
        quantity: 50,
        aggressor_side,
        fair_price,
    }
}

#[test]
fn basic_mm_buy_fill_produces_one_record() {
    let dir = tempfile::tempdir().unwrap();
    let deltas = deltas_from_csv(
        dir.path(),
        "100,1,ADD,1,10,1,BUY,1000,50,50,0,0,0,0\n\
         200,2,ADD,2,20,1,SELL,1000,50,50,0,0,0,0\n\
         200,3,FILL,1,10,1,BUY,1000,50,0,1,0,0,0\n\
         200,4,FILL,2,20,1,SELL,1000,50,0,1,0,0,0\n",
    );
    let lifecycle = order_lifecycle(&deltas);
    let fair = series(&[(200, 950)]);

    let fills = maker_fills(
        &[trade(200, 10, 20, 1, 2, 1000, Side::Sell, 950)],
        10,
        &lifecycle,
        &fair,
        &agents(),
        &[100, 200],
    );

    assert_eq!(fills.len(), 1);
    let fill = &fills[0];
    assert_eq!(fill.mm_side, Side::Buy);
    assert_eq!(fill.quote_age, 100);
    assert_eq!(fill.fill_price, 1000);
    assert_eq!(fill.fair_price, 950);
    assert_eq!(fill.immediate_as, -50);
    assert_eq!(fill.counterparty_type, "NoiseTrader");
}

#[test]
fn modify_resets_quote_age_to_the_modify_tick() {
    let dir = tempfile::tempdir().unwrap();
    let deltas = deltas_from_csv(
        dir.path(),
        "100,1,ADD,1,10,1,BUY,1000,50,50,0,0,0,0\n\
         300,2,MODIFY,1,10,1,BUY,1000,50,50,0,2,995,50\n",
    );
    let lifecycle = order_lifecycle(&deltas);
    let fair = series(&[(500, 990)]);

    let fills = maker_fills(
        &[trade(500, 10, 20, 2, 9, 995, Side::Sell, 990)],
        10,
        &lifecycle,
        &fair,
        &agents(),
        &[],
    );

    assert_eq!(fills.len(), 1);
    // Age anchors at the MODIFY tick, not the original ADD.
    assert_eq!(fills[0].quote_age, 200);
    assert_eq!(fills[0].mm_order_id, 2);
}

#[test]
fn aggressing_market_maker_yields_no_records() {
    let dir = tempfile::tempdir().unwrap();
    let deltas = deltas_from_csv(dir.path(), "100,1,ADD,5,30,1,SELL,1001,50,50,0,0,0,0\n");
    let lifecycle = order_lifecycle(&deltas);
    let fair = series(&[(500, 1000)]);

    let fills = maker_fills(
        &[trade(500, 10, 30, 7, 5, 1001, Side::Buy, 1000)],
        10,
        &lifecycle,
        &fair,
        &agents(),
        &[100],
    );
    assert!(fills.is_empty());
}

#[test]
fn realized_as_tracks_the_fair_price_path() {
    let dir = tempfile::tempdir().unwrap();
    let deltas = deltas_from_csv(dir.path(), "100,1,ADD,1,10,1,BUY,1000,50,50,0,0,0,0\n");
    let lifecycle = order_lifecycle(&deltas);
    let fair = series(&[(300, 920), (400, 880), (500, 900)]);

    let fills = maker_fills(
        &[trade(200, 10, 30, 1, 9, 1000, Side::Sell, 950)],
        10,
        &lifecycle,
        &fair,
        &agents(),
        &[100, 200, 300],
    );

    assert_eq!(fills.len(), 1);
    assert_eq!(
        fills[0].realized_as,
        vec![Some(-80), Some(-120), Some(-100)]
    );
}

#[test]
fn horizons_past_series_end_are_none() {
    let dir = tempfile::tempdir().unwrap();
    let deltas = deltas_from_csv(dir.path(), "100,1,ADD,1,10,1,BUY,1000,50,50,0,0,0,0\n");
    let lifecycle = order_lifecycle(&deltas);
    let fair = series(&[(300, 920)]);

    let fills = maker_fills(
        &[trade(200, 10, 20, 1, 9, 1000, Side::Sell, 950)],
        10,
        &lifecycle,
        &fair,
        &agents(),
        &[100, 500],
    );
    assert_eq!(fills[0].realized_as, vec![Some(-80), None]);
}

#[test]
fn unknown_counterparty_is_reported_as_unknown() {
    let dir = tempfile::tempdir().unwrap();
    let deltas = deltas_from_csv(dir.path(), "100,1,ADD,1,10,1,BUY,1000,50,50,0,0,0,0\n");
    let lifecycle = order_lifecycle(&deltas);
    let fair = series(&[(200, 950)]);

    let fills = maker_fills(
        &[trade(200, 10, 777, 1, 9, 1000, Side::Sell, 950)],
        10,
        &lifecycle,
        &fair,
        &agents(),
        &[],
    );
    assert_eq!(fills[0].counterparty_type, "Unknown");
}

#[test]
fn analyzer_runs_a_full_scenario_directory() {
    let dir = tempfile::tempdir().unwrap();

    std::fs::write(
        dir.path().join("deltas.csv"),
        "timestamp,sequence_num,delta_type,order_id,client_id,instrument_id,side,price,quantity,remaining_qty,trade_id,new_order_id,new_price,new_quantity\n\
         100,1,ADD,1,10,1,BUY,1000,50,50,0,0,0,0\n\
         200,2,FILL,1,10,1,BUY,1000,50,0,1,0,0,0\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("trades.csv"),
        "timestamp,trade_id,instrument_id,buyer_id,seller_id,buyer_order_id,seller_order_id,price,quantity,aggressor_side,fair_price\n\
         200,1,1,10,20,1,2,1000,50,SELL,950\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("market_state.csv"),
        "timestamp,fair_price,best_bid,best_ask\n\
         200,950,999,1001\n\
         300,920,0,1001\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("metadata.json"),
        r#"{"agents": [
            {"client_id": 10, "type": "MarketMaker"},
            {"client_id": 20, "type": "NoiseTrader"}
        ]}"#,
    )
    .unwrap();

    let report = AdverseSelectionAnalyzer::new(dir.path())
        .with_horizons(vec![100, 500])
        .with_buckets(2)
        .run_and_write_csv()
        .unwrap();

    assert_eq!(report.mm_client_id, 10);
    assert_eq!(report.fills.len(), 1);
    assert_eq!(report.fills[0].immediate_as, -50);
    assert_eq!(report.fills[0].realized_as, vec![Some(-80), None]);
    assert_eq!(report.buckets.len(), 2);

    let csv = std::fs::read_to_string(dir.path().join("adverse_selection.csv")).unwrap();
    assert!(csv.starts_with("fill_timestamp,"));
    assert!(csv.contains("realized_as_100,realized_as_500"));
    assert!(csv.lines().nth(1).unwrap().contains("NoiseTrader"));
}

#[test]
fn analyzer_requires_an_unambiguous_market_maker() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("metadata.json"),
        r#"{"agents": [
            {"client_id": 1, "type": "MarketMaker"},
            {"client_id": 2, "type": "MarketMaker"}
        ]}"#,
    )
    .unwrap();

    match AdverseSelectionAnalyzer::new(dir.path()).run() {
        Err(AnalysisError::MultipleMarketMakers { candidates }) => {
            assert_eq!(candidates, vec![1, 2]);
        }
        other => panic!("expected MultipleMarketMakers, got {other:?}"),
    }

    std::fs::write(dir.path().join("metadata.json"), r#"{"agents": []}"#).unwrap();
    match AdverseSelectionAnalyzer::new(dir.path()).run() {
        Err(AnalysisError::NoMarketMaker) => {}
        other => panic!("expected NoMarketMaker, got {other:?}"),
    }
}
