//! Launch versus long-term sales patterns
//!
//! Games released more than once (several rows sharing a name) are split into
//! their launch record and everything that followed. The share of sales that
//! came after launch is the long-tail ratio, which buckets the game into a
//! `SalesPattern`.
//!
//! When no game has more than one row there is nothing to split, and the
//! classifier returns `PatternOutcome::InsufficientData` with a separate,
//! simpler bucketing of single-release games against the overall median.

use std::collections::BTreeMap;

use crate::sales::types::{
    GamePatternRecord, GameSaleRecord, GenrePatternSummary, PatternOutcome, SalesPattern,
    SingleReleaseFallback, SingleReleaseGame, SingleReleaseTier, STANDOUT_MEDIAN_MULTIPLIER,
};

/// Classifies every multi-release game in `records`.
pub fn classify_patterns(records: &[GameSaleRecord]) -> PatternOutcome {
    let patterns: BTreeMap<String, GamePatternRecord> = multi_release_groups(records)
        .into_iter()
        .map(|(name, rows)| (name.to_string(), build_pattern(name, rows)))
        .collect();

    if patterns.is_empty() {
        tracing::debug!(
            rows = records.len(),
            "No multi-release games, using single-release fallback"
        );
        return PatternOutcome::InsufficientData(single_release_fallback(records));
    }

    tracing::debug!(games = patterns.len(), "Classified multi-release games");
    PatternOutcome::Classified(patterns)
}

/// Rows grouped by name, keeping only names with more than one row.
/// Rows inside a group stay in table order.
fn multi_release_groups(records: &[GameSaleRecord]) -> BTreeMap<&str, Vec<&GameSaleRecord>> {
    let mut groups: BTreeMap<&str, Vec<&GameSaleRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.name.as_str()).or_default().push(record);
    }
    groups.retain(|_, rows| rows.len() > 1);
    groups
}

fn build_pattern(name: &str, mut rows: Vec<&GameSaleRecord>) -> GamePatternRecord {
    // earliest year first; within a year the best seller is the launch
    rows.sort_by(|a, b| {
        a.year
            .cmp(&b.year)
            .then_with(|| b.global_sales.total_cmp(&a.global_sales))
    });

    let launch = rows[0];
    let long_term_sales: f64 = rows[1..].iter().map(|r| r.global_sales).sum();
    let ratio = long_tail_ratio(launch.global_sales, long_term_sales);

    GamePatternRecord {
        name: name.to_string(),
        genre: launch.genre.clone(),
        release_count: rows.len(),
        launch_year: launch.year,
        launch_platform: launch.platform.clone(),
        launch_sales: launch.global_sales,
        long_term_sales,
        total_sales: launch.global_sales + long_term_sales,
        long_tail_ratio: ratio,
        pattern: SalesPattern::from_ratio(ratio),
    }
}

/// `long_term / (launch + long_term)`, or 0 when nothing sold.
pub fn long_tail_ratio(launch_sales: f64, long_term_sales: f64) -> f64 {
    let total = launch_sales + long_term_sales;
    if total > 0.0 {
        long_term_sales / total
    } else {
        0.0
    }
}

/// Buckets every row against twice the median global sales.
///
/// Only meaningful when each name appears once, which is exactly the case in
/// which `classify_patterns` falls back to it.
pub fn single_release_fallback(records: &[GameSaleRecord]) -> SingleReleaseFallback {
    let sales: Vec<f64> = records.iter().map(|r| r.global_sales).collect();
    let median_sales = median(&sales);
    let threshold = median_sales.map(|m| m * STANDOUT_MEDIAN_MULTIPLIER);

    let games = records
        .iter()
        .map(|record| {
            let tier = match threshold {
                Some(limit) if record.global_sales > limit => SingleReleaseTier::Standout,
                _ => SingleReleaseTier::Standard,
            };
            SingleReleaseGame {
                name: record.name.clone(),
                genre: record.genre.clone(),
                global_sales: record.global_sales,
                tier,
            }
        })
        .collect();

    SingleReleaseFallback {
        median_sales,
        threshold,
        games,
    }
}

/// Median, averaging the two middle values for even counts.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Genre-level comparison of classified games, ordered by genre name.
pub fn genre_pattern_summary(patterns: &BTreeMap<String, GamePatternRecord>) -> Vec<GenrePatternSummary> {
    let mut by_genre: BTreeMap<&str, Vec<&GamePatternRecord>> = BTreeMap::new();
    for pattern in patterns.values() {
        by_genre.entry(pattern.genre.as_str()).or_default().push(pattern);
    }

    by_genre
        .into_iter()
        .map(|(genre, games)| {
            let count = games.len() as f64;
            let count_of = |wanted: SalesPattern| games.iter().filter(|g| g.pattern == wanted).count();

            GenrePatternSummary {
                genre: genre.to_string(),
                game_count: games.len(),
                mean_long_tail_ratio: games.iter().map(|g| g.long_tail_ratio).sum::<f64>() / count,
                mean_total_sales: games.iter().map(|g| g.total_sales).sum::<f64>() / count,
                front_loaded: count_of(SalesPattern::FrontLoaded),
                balanced: count_of(SalesPattern::Balanced),
                long_term_success: count_of(SalesPattern::LongTermSuccess),
            }
        })
        .collect()
}

/// Genre rollup for an outcome; empty for the fallback variant.
pub fn genre_summary_for(outcome: &PatternOutcome) -> Vec<GenrePatternSummary> {
    match outcome {
        PatternOutcome::Classified(patterns) => genre_pattern_summary(patterns),
        PatternOutcome::InsufficientData(_) => Vec::new(),
    }
}
