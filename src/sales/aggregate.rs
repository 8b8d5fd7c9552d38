//! Grouped rollups
//!
//! Generic sum/mean/std/count by one or more dimensions, plus top-N
//! selection. Every function takes its input explicitly and never mutates
//! it, so any number of rollups may run concurrently over the same table.
//!
//! Results are `BTreeMap`s ordered by group key. Selections that must break
//! exact ties do so by that key order (for grouped values) or by table order
//! (for rows), using stable sorts.

use crate::sales::types::{
    AggregateRow, Dimension, GameSaleRecord, GroupKey, Grouped, Metric, SalesError,
};

/// Builds the group key of `record` for the given dimensions.
pub fn group_key(record: &GameSaleRecord, dimensions: &[Dimension]) -> GroupKey {
    dimensions.iter().map(|d| d.key_of(record)).collect()
}

/// Collects metric values per group, in table order.
fn collect_values(
    records: &[GameSaleRecord],
    dimensions: &[Dimension],
    metric: Metric,
) -> Grouped<Vec<f64>> {
    let mut groups: Grouped<Vec<f64>> = Grouped::new();
    for record in records {
        groups
            .entry(group_key(record, dimensions))
            .or_default()
            .push(metric.value(record));
    }
    groups
}

pub fn sum_by(records: &[GameSaleRecord], dimensions: &[Dimension], metric: Metric) -> Grouped<f64> {
    let mut sums: Grouped<f64> = Grouped::new();
    for record in records {
        *sums.entry(group_key(record, dimensions)).or_insert(0.0) += metric.value(record);
    }
    sums
}

pub fn mean_by(records: &[GameSaleRecord], dimensions: &[Dimension], metric: Metric) -> Grouped<f64> {
    collect_values(records, dimensions, metric)
        .into_iter()
        .map(|(key, values)| {
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            (key, mean)
        })
        .collect()
}

/// Sample standard deviation (N-1 denominator) per group.
///
/// Single-element groups map to `None`: their deviation is undefined, not zero.
pub fn std_by(
    records: &[GameSaleRecord],
    dimensions: &[Dimension],
    metric: Metric,
) -> Grouped<Option<f64>> {
    collect_values(records, dimensions, metric)
        .into_iter()
        .map(|(key, values)| (key, sample_std(&values)))
        .collect()
}

pub fn count_by(records: &[GameSaleRecord], dimensions: &[Dimension]) -> Grouped<usize> {
    let mut counts: Grouped<usize> = Grouped::new();
    for record in records {
        *counts.entry(group_key(record, dimensions)).or_insert(0) += 1;
    }
    counts
}

pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let squared: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((squared / (n - 1.0)).sqrt())
}

/// The `n` rows with the largest metric, ties kept in table order.
pub fn top_n<'a>(records: &'a [GameSaleRecord], metric: Metric, n: usize) -> Vec<&'a GameSaleRecord> {
    let mut rows: Vec<&GameSaleRecord> = records.iter().collect();
    rows.sort_by(|a, b| metric.value(b).total_cmp(&metric.value(a)));
    rows.truncate(n);
    rows
}

/// Grouped values as rows, in key order.
pub fn to_rows(grouped: &Grouped<f64>) -> Vec<AggregateRow> {
    grouped
        .iter()
        .map(|(key, value)| AggregateRow {
            key: key.clone(),
            value: *value,
        })
        .collect()
}

/// Grouped counts as rows, in key order.
pub fn count_rows(grouped: &Grouped<usize>) -> Vec<AggregateRow> {
    grouped
        .iter()
        .map(|(key, count)| AggregateRow {
            key: key.clone(),
            value: *count as f64,
        })
        .collect()
}

/// All rows sorted by value, largest first; ties keep key order.
pub fn sorted_descending(grouped: &Grouped<f64>) -> Vec<AggregateRow> {
    let mut rows = to_rows(grouped);
    rows.sort_by(|a, b| b.value.total_cmp(&a.value));
    rows
}

/// The `n` group keys with the largest value (e.g. top 20 publishers).
pub fn n_largest_by_key(grouped: &Grouped<f64>, n: usize) -> Vec<AggregateRow> {
    let mut rows = sorted_descending(grouped);
    rows.truncate(n);
    rows
}

/// Group with the largest value; the first key wins an exact tie.
///
/// # Returns
/// * `SalesError::NoData` when `grouped` is empty
pub fn max_group(grouped: &Grouped<f64>, operation: &str) -> Result<AggregateRow, SalesError> {
    let mut best: Option<(&GroupKey, f64)> = None;
    for (key, value) in grouped {
        match best {
            Some((_, best_value)) if *value <= best_value => {}
            _ => best = Some((key, *value)),
        }
    }

    best.map(|(key, value)| AggregateRow {
        key: key.clone(),
        value,
    })
    .ok_or_else(|| SalesError::no_data(operation))
}

/// Group with the smallest defined value; undefined (`None`) groups are
/// dropped before selection. The first key wins an exact tie.
pub fn min_defined(grouped: &Grouped<Option<f64>>, operation: &str) -> Result<AggregateRow, SalesError> {
    select_defined(grouped, operation, |candidate, best| candidate < best)
}

/// Group with the largest defined value; see [`min_defined`].
pub fn max_defined(grouped: &Grouped<Option<f64>>, operation: &str) -> Result<AggregateRow, SalesError> {
    select_defined(grouped, operation, |candidate, best| candidate > best)
}

fn select_defined<F>(
    grouped: &Grouped<Option<f64>>,
    operation: &str,
    better: F,
) -> Result<AggregateRow, SalesError>
where
    F: Fn(f64, f64) -> bool,
{
    let mut best: Option<(&GroupKey, f64)> = None;
    for (key, value) in grouped {
        let Some(value) = value.filter(|v| !v.is_nan()) else {
            continue;
        };
        match best {
            Some((_, best_value)) if !better(value, best_value) => {}
            _ => best = Some((key, value)),
        }
    }

    best.map(|(key, value)| AggregateRow {
        key: key.clone(),
        value,
    })
    .ok_or_else(|| SalesError::no_data(operation))
}

/// Group with the largest summed metric over `records`.
pub fn top_group_by(
    records: &[GameSaleRecord],
    dimension: Dimension,
    metric: Metric,
    operation: &str,
) -> Result<AggregateRow, SalesError> {
    max_group(&sum_by(records, &[dimension], metric), operation)
}
