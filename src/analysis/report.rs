//! Per-fill CSV output and the console summary table.

use super::buckets::summarize;
use super::fills::MakerFill;
use crate::stream::StreamError;
use std::collections::BTreeMap;
use std::path::Path;

/// Write per-fill adverse-selection data to CSV.
///
/// Columns: the fixed fill fields, one `realized_as_{h}` column per
/// horizon (empty when the horizon was unavailable), then the
/// counterparty fields.
///
/// # Errors
///
/// Fails on I/O problems while writing.
pub fn write_fill_csv(
    path: impl AsRef<Path>,
    fills: &[MakerFill],
    horizons: &[u64],
) -> Result<(), StreamError> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;

    let mut header: Vec<String> = [
        "fill_timestamp",
        "trade_id",
        "mm_order_id",
        "mm_side",
        "quote_age",
        "fill_price",
        "fair_price",
        "immediate_as",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    header.extend(horizons.iter().map(|h| format!("realized_as_{h}")));
    header.push("counterparty_id".to_string());
    header.push("counterparty_type".to_string());
    writer.write_record(&header)?;

    for fill in fills {
        let mut record: Vec<String> = vec![
            fill.fill_timestamp.to_string(),
            fill.trade_id.to_string(),
            fill.mm_order_id.to_string(),
            fill.mm_side.to_string(),
            fill.quote_age.to_string(),
            fill.fill_price.to_string(),
            fill.fair_price.to_string(),
            fill.immediate_as.to_string(),
        ];
        record.extend(
            fill.realized_as
                .iter()
                .map(|value| value.map(|v| v.to_string()).unwrap_or_default()),
        );
        record.push(fill.counterparty_id.to_string());
        record.push(fill.counterparty_type.clone());
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Render the console summary: the counterparty breakdown followed by
/// the by-quote-age table with a representative horizon column.
#[must_use]
pub fn summary_text(
    fills: &[MakerFill],
    mm_client_id: u64,
    horizons: &[u64],
    num_buckets: usize,
) -> String {
    use std::fmt::Write as _;

    if fills.is_empty() {
        return "No MM maker fills found.".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "Adverse Selection Analysis (MM client_id={mm_client_id})");
    let _ = writeln!(out, "{}", "=".repeat(60));
    let _ = writeln!(out, "Total MM fills: {} (maker only)", fills.len());

    let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
    for fill in fills {
        *by_type.entry(fill.counterparty_type.as_str()).or_default() += 1;
    }
    for (counterparty, count) in by_type {
        let pct = count as f64 / fills.len() as f64 * 100.0;
        let _ = writeln!(out, "  vs {counterparty}: {count} ({pct:.1}%)");
    }

    let (_, stats) = summarize(fills, horizons, num_buckets);
    let display_horizon = (!horizons.is_empty()).then(|| horizons[horizons.len() / 2]);
    let display_idx = horizons.len() / 2;

    let _ = writeln!(out);
    let _ = writeln!(out, "By Quote Age:");
    let mut head = format!(
        "  {:<14} | {:>5} | {:>12} | {:>11}",
        "Bucket", "Count", "Mean Imm. AS", "Med Imm. AS"
    );
    if let Some(h) = display_horizon {
        head.push_str(&format!(" | {:>12}", format!("Mean AS@{h}")));
    }
    head.push_str(&format!(" | {:>10}", "% Informed"));
    let _ = writeln!(out, "{head}");
    let _ = writeln!(out, "  {}", "-".repeat(head.len() - 2));

    for bucket in &stats {
        let mut line = format!(
            "  {:<14} | {:>5} | {:>12.1} | {:>11.1}",
            bucket.label, bucket.count, bucket.mean_immediate_as, bucket.median_immediate_as
        );
        if display_horizon.is_some() {
            let cell = bucket.mean_realized_as[display_idx]
                .map(|v| format!("{v:.1}"))
                .unwrap_or_else(|| "N/A".to_string());
            line.push_str(&format!(" | {cell:>12}"));
        }
        line.push_str(&format!(" | {:>9.1}%", bucket.informed_pct));
        let _ = writeln!(out, "{line}");
    }

    out
}
