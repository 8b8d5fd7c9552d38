//! Derived columns
//!
//! Turns cleaned records into enriched `GameSaleRecord`s: decade bucket,
//! dense ranks within genre and platform, dominant region, and regional
//! percentage shares. Pure: the input slice is never modified.

use std::collections::HashMap;

use crate::sales::types::{CleanRecord, GameSaleRecord, Region};

/// Derives every computed column, preserving input order.
pub fn derive_features(records: &[CleanRecord]) -> Vec<GameSaleRecord> {
    let genre_ranks = dense_ranks(records, |record| record.genre.as_str());
    let platform_ranks = dense_ranks(records, |record| record.platform.as_str());

    records
        .iter()
        .zip(genre_ranks)
        .zip(platform_ranks)
        .map(|((record, genre_rank), platform_rank)| {
            let share = |region: Region| percentage_of(record.region_sales(region), record.global_sales);

            GameSaleRecord {
                rank: record.rank,
                name: record.name.clone(),
                platform: record.platform.clone(),
                year: record.year,
                genre: record.genre.clone(),
                publisher: record.publisher.clone(),
                na_sales: record.na_sales,
                eu_sales: record.eu_sales,
                jp_sales: record.jp_sales,
                other_sales: record.other_sales,
                global_sales: record.global_sales,
                decade: decade_label(record.year),
                genre_rank,
                platform_rank,
                dominant_region: dominant_region(record),
                na_percentage: share(Region::NorthAmerica),
                eu_percentage: share(Region::Europe),
                jp_percentage: share(Region::Japan),
                other_percentage: share(Region::Other),
            }
        })
        .collect()
}

/// Decade bucket for a release year, e.g. 1994 -> "1990s".
pub fn decade_label(year: i32) -> String {
    format!("{}s", year.div_euclid(10) * 10)
}

/// Dense rank of global sales (descending) within each group.
///
/// Equal sales share a rank and the next distinct value gets the previous
/// rank + 1, so `[10, 10, 5]` ranks as `[1, 1, 2]`.
pub fn dense_ranks<'a, F>(records: &'a [CleanRecord], group_of: F) -> Vec<u32>
where
    F: Fn(&'a CleanRecord) -> &'a str,
{
    let mut distinct_sales: HashMap<&str, Vec<f64>> = HashMap::new();
    for record in records {
        distinct_sales
            .entry(group_of(record))
            .or_default()
            .push(record.global_sales);
    }

    for values in distinct_sales.values_mut() {
        values.sort_by(|a, b| b.total_cmp(a));
        values.dedup();
    }

    records
        .iter()
        .map(|record| {
            let values = &distinct_sales[group_of(record)];
            let position = values
                .binary_search_by(|probe| record.global_sales.total_cmp(probe))
                .unwrap_or(0);
            position as u32 + 1
        })
        .collect()
}

/// Region with the largest absolute sales. Exact ties go to the first region
/// in NA, EU, JP, Other order.
pub fn dominant_region(record: &CleanRecord) -> Region {
    let mut best = Region::NorthAmerica;
    let mut best_sales = record.region_sales(best);

    for region in Region::ALL.into_iter().skip(1) {
        let sales = record.region_sales(region);
        if sales > best_sales {
            best = region;
            best_sales = sales;
        }
    }

    best
}

/// `part / whole * 100`, rounded to 2 decimals with halves away from zero.
pub fn percentage_of(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        return f64::NAN;
    }
    round_to_cents(part / whole * 100.0)
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, genre: &str, platform: &str, sales: [f64; 4], global: f64) -> CleanRecord {
        CleanRecord {
            rank: None,
            name: name.to_string(),
            platform: platform.to_string(),
            year: 2001,
            genre: genre.to_string(),
            publisher: "Pub".to_string(),
            na_sales: sales[0],
            eu_sales: sales[1],
            jp_sales: sales[2],
            other_sales: sales[3],
            global_sales: global,
        }
    }

    #[test]
    fn test_dense_rank_ties_share_rank_without_gaps() {
        let records = vec![
            record("A", "Action", "PS2", [0.0; 4], 10.0),
            record("B", "Action", "PS2", [0.0; 4], 10.0),
            record("C", "Action", "PS2", [0.0; 4], 5.0),
        ];

        let enriched = derive_features(&records);
        let ranks: Vec<u32> = enriched.iter().map(|r| r.genre_rank).collect();
        assert_eq!(ranks, vec![1, 1, 2]);
    }

    #[test]
    fn test_ranks_are_per_group() {
        let records = vec![
            record("A", "Action", "PS2", [0.0; 4], 9.0),
            record("B", "Puzzle", "PS2", [0.0; 4], 8.0),
            record("C", "Action", "Wii", [0.0; 4], 7.0),
            record("D", "Puzzle", "Wii", [0.0; 4], 6.0),
        ];

        let enriched = derive_features(&records);
        let genre_ranks: Vec<u32> = enriched.iter().map(|r| r.genre_rank).collect();
        let platform_ranks: Vec<u32> = enriched.iter().map(|r| r.platform_rank).collect();
        assert_eq!(genre_ranks, vec![1, 1, 2, 2]);
        assert_eq!(platform_ranks, vec![1, 2, 1, 2]);
    }

    #[test]
    fn test_ranks_do_not_depend_on_input_order() {
        let records = vec![
            record("C", "Action", "PS2", [0.0; 4], 5.0),
            record("A", "Action", "PS2", [0.0; 4], 10.0),
            record("B", "Action", "PS2", [0.0; 4], 7.5),
        ];

        let ranks: Vec<u32> = derive_features(&records).iter().map(|r| r.genre_rank).collect();
        assert_eq!(ranks, vec![3, 1, 2]);
    }

    #[test]
    fn test_dominant_region_tie_prefers_north_america() {
        let tied = record("A", "Action", "PS2", [5.0, 5.0, 0.0, 0.0], 10.0);
        assert_eq!(dominant_region(&tied), Region::NorthAmerica);

        let japan = record("B", "RPG", "DS", [1.0, 1.0, 4.0, 0.5], 6.5);
        assert_eq!(dominant_region(&japan), Region::Japan);

        let eu_other_tie = record("C", "Racing", "PC", [0.0, 2.0, 0.0, 2.0], 4.0);
        assert_eq!(dominant_region(&eu_other_tie), Region::Europe);
    }

    #[test]
    fn test_dominant_region_all_zero_is_north_america() {
        let silent = record("A", "Action", "PS2", [0.0; 4], 1.0);
        assert_eq!(dominant_region(&silent), Region::NorthAmerica);
    }

    #[test]
    fn test_percentages_round_to_two_decimals() {
        let records = vec![record("A", "Action", "PS2", [1.0, 1.0, 1.0, 0.0], 3.0)];

        let enriched = derive_features(&records);
        assert_eq!(enriched[0].na_percentage, 33.33);
        assert_eq!(enriched[0].eu_percentage, 33.33);
        assert_eq!(enriched[0].jp_percentage, 33.33);
        assert_eq!(enriched[0].other_percentage, 0.0);
    }

    #[test]
    fn test_percentage_of_zero_total_is_nan() {
        assert!(percentage_of(1.0, 0.0).is_nan());
        assert_eq!(percentage_of(1.0, 8.0), 12.5);
    }

    #[test]
    fn test_decade_label() {
        assert_eq!(decade_label(1980), "1980s");
        assert_eq!(decade_label(1999), "1990s");
        assert_eq!(decade_label(2016), "2010s");
    }

    #[test]
    fn test_derive_does_not_reorder_or_mutate() {
        let records = vec![
            record("B", "Action", "PS2", [1.0, 0.0, 0.0, 0.0], 1.0),
            record("A", "Action", "PS2", [2.0, 0.0, 0.0, 0.0], 2.0),
        ];
        let before = records.clone();

        let enriched = derive_features(&records);
        assert_eq!(records, before);
        assert_eq!(enriched[0].name, "B");
        assert_eq!(enriched[1].name, "A");
    }
}
