//! Quote-age bucketing and per-bucket summary statistics.
//!
//! Buckets are quantile-based: boundaries come from the observed fill
//! ages themselves, so each bucket holds roughly the same number of
//! fills regardless of how the age distribution is shaped.

use super::fills::MakerFill;
use super::metadata::INFORMED_TRADER;

/// Summary statistics of one quote-age bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketStats {
    /// Human-readable half-open age range, e.g. `[120, 480)`.
    pub label: String,
    /// Number of fills in the bucket.
    pub count: usize,
    /// Mean immediate adverse selection.
    pub mean_immediate_as: f64,
    /// Median immediate adverse selection.
    pub median_immediate_as: f64,
    /// Mean realized adverse selection per horizon, parallel to the
    /// horizon list; `None` when no fill in the bucket had that horizon
    /// available.
    pub mean_realized_as: Vec<Option<f64>>,
    /// Percentage of fills whose counterparty was an informed trader.
    pub informed_pct: f64,
}

/// Quantile boundaries from the observed quote-age distribution:
/// `num_buckets - 1` cut points at fractions `i / num_buckets` of the
/// sorted ages. Empty input (or fewer than two buckets) yields no
/// boundaries.
#[must_use]
pub fn bucket_boundaries(fills: &[MakerFill], num_buckets: usize) -> Vec<i64> {
    let mut ages: Vec<i64> = fills.iter().map(|f| f.quote_age).collect();
    ages.sort_unstable();
    if ages.is_empty() || num_buckets < 2 {
        return Vec::new();
    }
    (1..num_buckets)
        .map(|i| {
            let idx = (i * ages.len() / num_buckets).min(ages.len() - 1);
            ages[idx]
        })
        .collect()
}

/// Bucket index for a quote age: the number of boundaries at or below
/// it (upper-bound rule), so ages equal to a cut point land in the
/// higher bucket.
#[must_use]
pub fn assign_bucket(quote_age: i64, boundaries: &[i64]) -> usize {
    boundaries.partition_point(|&b| b <= quote_age)
}

/// Display label of one bucket as a half-open interval.
#[must_use]
pub fn bucket_label(idx: usize, boundaries: &[i64]) -> String {
    if boundaries.is_empty() {
        return "[0, inf)".to_string();
    }
    if idx == 0 {
        format!("[0, {})", boundaries[0])
    } else if idx < boundaries.len() {
        format!("[{}, {})", boundaries[idx - 1], boundaries[idx])
    } else {
        format!("[{}, inf)", boundaries[boundaries.len() - 1])
    }
}

fn mean(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<i64>() as f64 / values.len() as f64
}

fn median(values: &mut [i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid] as f64
    } else {
        (values[mid - 1] + values[mid]) as f64 / 2.0
    }
}

/// Bucket every fill by quote age and compute per-bucket statistics.
///
/// Returns the boundaries together with one [`BucketStats`] per bucket
/// (empty buckets included, with zeroed statistics), so callers can
/// render a complete table.
#[must_use]
pub fn summarize(
    fills: &[MakerFill],
    horizons: &[u64],
    num_buckets: usize,
) -> (Vec<i64>, Vec<BucketStats>) {
    let boundaries = bucket_boundaries(fills, num_buckets);

    let mut grouped: Vec<Vec<&MakerFill>> = vec![Vec::new(); num_buckets.max(1)];
    for fill in fills {
        let bucket = assign_bucket(fill.quote_age, &boundaries).min(grouped.len() - 1);
        grouped[bucket].push(fill);
    }

    let stats = grouped
        .iter()
        .enumerate()
        .map(|(idx, bucket_fills)| {
            let label = bucket_label(idx, &boundaries);
            if bucket_fills.is_empty() {
                return BucketStats {
                    label,
                    count: 0,
                    mean_immediate_as: 0.0,
                    median_immediate_as: 0.0,
                    mean_realized_as: vec![None; horizons.len()],
                    informed_pct: 0.0,
                };
            }

            let mut immediate: Vec<i64> =
                bucket_fills.iter().map(|f| f.immediate_as).collect();
            let mean_realized_as = (0..horizons.len())
                .map(|h_idx| {
                    let available: Vec<i64> = bucket_fills
                        .iter()
                        .filter_map(|f| f.realized_as[h_idx])
                        .collect();
                    (!available.is_empty()).then(|| mean(&available))
                })
                .collect();
            let informed = bucket_fills
                .iter()
                .filter(|f| f.counterparty_type == INFORMED_TRADER)
                .count();

            BucketStats {
                label,
                count: bucket_fills.len(),
                mean_immediate_as: mean(&immediate),
                median_immediate_as: median(&mut immediate),
                mean_realized_as,
                informed_pct: informed as f64 / bucket_fills.len() as f64 * 100.0,
            }
        })
        .collect();

    (boundaries, stats)
}
