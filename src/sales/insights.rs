//! Dashboard series
//!
//! Every pre-aggregated series the dashboard charts, built from the generic
//! rollups in `aggregate`. `Dashboard::compute` runs independent groups of
//! series in parallel; they only ever read the shared table.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::sales::aggregate::{
    count_by, count_rows, max_defined, mean_by, min_defined, n_largest_by_key, sorted_descending,
    std_by, sum_by, to_rows, top_group_by, top_n,
};
use crate::sales::types::{
    key_label, AggregateRow, Dimension, GameSaleRecord, KeyPart, Metric, Region, SalesError,
    NOT_AVAILABLE,
};

// ============================================================================
// Limits
// ============================================================================

/// How many entries each top-N series keeps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct DashboardLimits {
    pub top_games: usize,
    pub leaderboard: usize,
    pub top_platforms: usize,
    pub market_share_platforms: usize,
    pub timeline_platforms: usize,
    pub top_publishers: usize,
    pub filter_publishers: usize,
    pub platform_game_count: usize,
    pub regional_comparison: usize,
}

impl Default for DashboardLimits {
    fn default() -> Self {
        Self {
            top_games: 15,
            leaderboard: 20,
            top_platforms: 15,
            market_share_platforms: 20,
            timeline_platforms: 10,
            top_publishers: 15,
            filter_publishers: 20,
            platform_game_count: 15,
            regional_comparison: 10,
        }
    }
}

// ============================================================================
// Series Types
// ============================================================================

/// Total sales of one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionTotal {
    pub region: Region,
    pub sales: f64,
}

/// Sales split across the four regions for one label (a game or a genre)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionalBreakdown {
    pub label: String,
    pub north_america: f64,
    pub europe: f64,
    pub japan: f64,
    pub other: f64,
}

/// Five-number summary of global sales within a genre
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxStats {
    pub genre: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// One leaderboard line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: Option<u32>,
    pub name: String,
    pub platform: String,
    pub year: i32,
    pub genre: String,
    pub publisher: String,
    pub global_sales: f64,
}

impl From<&GameSaleRecord> for LeaderboardEntry {
    fn from(record: &GameSaleRecord) -> Self {
        Self {
            rank: record.rank,
            name: record.name.clone(),
            platform: record.platform.clone(),
            year: record.year,
            genre: record.genre.clone(),
            publisher: record.publisher.clone(),
            global_sales: record.global_sales,
        }
    }
}

/// Headline numbers for a (possibly filtered) table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub total_games: usize,
    pub total_sales: f64,
    /// None for an empty table
    pub average_sales: Option<f64>,
    pub year_range: Option<(i32, i32)>,
    pub unique_platforms: usize,
    pub unique_genres: usize,
    pub unique_publishers: usize,
    pub top_game: Option<String>,
    pub top_sales: Option<f64>,
}

impl DatasetSummary {
    pub fn compute(records: &[GameSaleRecord]) -> Self {
        let total_sales: f64 = records.iter().map(|r| r.global_sales).sum();
        let average_sales = (!records.is_empty()).then(|| total_sales / records.len() as f64);
        let top = top_n(records, Metric::GlobalSales, 1).into_iter().next();

        let distinct = |field: fn(&GameSaleRecord) -> &str| {
            records.iter().map(field).collect::<BTreeSet<_>>().len()
        };

        Self {
            total_games: records.len(),
            total_sales,
            average_sales,
            year_range: year_range(records),
            unique_platforms: distinct(|r| r.platform.as_str()),
            unique_genres: distinct(|r| r.genre.as_str()),
            unique_publishers: distinct(|r| r.publisher.as_str()),
            top_game: top.map(|r| r.name.clone()),
            top_sales: top.map(|r| r.global_sales),
        }
    }

    /// Top game name, or "N/A" for an empty table.
    pub fn top_game_label(&self) -> &str {
        self.top_game.as_deref().unwrap_or(NOT_AVAILABLE)
    }
}

/// Leading genre, platform and publisher by summed global sales
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyInsights {
    pub top_genre: Result<AggregateRow, SalesError>,
    pub top_platform: Result<AggregateRow, SalesError>,
    pub top_publisher: Result<AggregateRow, SalesError>,
}

impl KeyInsights {
    pub fn compute(records: &[GameSaleRecord]) -> Self {
        Self {
            top_genre: top_group_by(
                records,
                Dimension::Genre,
                Metric::GlobalSales,
                "top genre by sales",
            ),
            top_platform: top_group_by(
                records,
                Dimension::Platform,
                Metric::GlobalSales,
                "top platform by sales",
            ),
            top_publisher: top_group_by(
                records,
                Dimension::Publisher,
                Metric::GlobalSales,
                "top publisher by sales",
            ),
        }
    }

    /// Group label, or "N/A" when there was no data to pick from.
    pub fn label(result: &Result<AggregateRow, SalesError>) -> String {
        match result {
            Ok(row) => row.label(),
            Err(_) => NOT_AVAILABLE.to_string(),
        }
    }
}

/// Genres with the lowest and highest spread of per-game sales
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenreConsistency {
    pub most_consistent: Result<AggregateRow, SalesError>,
    pub least_consistent: Result<AggregateRow, SalesError>,
}

impl GenreConsistency {
    /// Genres with a single game have no sample deviation and are skipped.
    pub fn compute(records: &[GameSaleRecord]) -> Self {
        let spread = std_by(records, &[Dimension::Genre], Metric::GlobalSales);
        Self {
            most_consistent: min_defined(&spread, "most consistent genre"),
            least_consistent: max_defined(&spread, "least consistent genre"),
        }
    }
}

/// Values the presentation layer offers in its filter controls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub year_range: Option<(i32, i32)>,
    pub genres: Vec<String>,
    pub platforms: Vec<String>,
    /// Top publishers by sales, sorted alphabetically
    pub publishers: Vec<String>,
}

impl FilterOptions {
    pub fn compute(records: &[GameSaleRecord], publisher_limit: usize) -> Self {
        let sorted_unique = |field: fn(&GameSaleRecord) -> &str| {
            records
                .iter()
                .map(field)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        };

        let publisher_sales = sum_by(records, &[Dimension::Publisher], Metric::GlobalSales);
        let mut publishers: Vec<String> = n_largest_by_key(&publisher_sales, publisher_limit)
            .iter()
            .map(|row| row.label())
            .collect();
        publishers.sort();

        Self {
            year_range: year_range(records),
            genres: sorted_unique(|r| r.genre.as_str()),
            platforms: sorted_unique(|r| r.platform.as_str()),
            publishers,
        }
    }
}

// ============================================================================
// Dashboard
// ============================================================================

/// Every chart series for one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub genre_sales: Vec<AggregateRow>,
    pub top_platforms: Vec<AggregateRow>,
    pub regional_totals: Vec<RegionTotal>,
    pub top_games: Vec<LeaderboardEntry>,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub genre_distribution: Vec<BoxStats>,
    pub genre_average_sales: Vec<AggregateRow>,
    pub genre_timeline: Vec<AggregateRow>,
    pub platform_market_share: Vec<AggregateRow>,
    pub platform_game_counts: Vec<AggregateRow>,
    pub platform_timeline: Vec<AggregateRow>,
    pub regional_comparison: Vec<RegionalBreakdown>,
    pub regional_genre_preferences: Vec<RegionalBreakdown>,
    pub yearly_sales: Vec<AggregateRow>,
    pub top_publishers: Vec<AggregateRow>,
    pub releases_per_year: Vec<AggregateRow>,
}

impl Dashboard {
    pub fn compute(records: &[GameSaleRecord], limits: &DashboardLimits) -> Self {
        let (genres, (platforms, (regions, trends))) = rayon::join(
            || genre_series(records),
            || {
                rayon::join(
                    || platform_series(records, limits),
                    || {
                        rayon::join(
                            || region_series(records, limits),
                            || trend_series(records, limits),
                        )
                    },
                )
            },
        );

        let (genre_sales, genre_distribution, genre_average_sales, genre_timeline) = genres;
        let (top_platforms, platform_market_share, platform_game_counts, platform_timeline) = platforms;
        let (regional_totals, regional_comparison, regional_genre_preferences) = regions;
        let (top_games, leaderboard, yearly_sales, top_publishers, releases_per_year) = trends;

        Self {
            genre_sales,
            top_platforms,
            regional_totals,
            top_games,
            leaderboard,
            genre_distribution,
            genre_average_sales,
            genre_timeline,
            platform_market_share,
            platform_game_counts,
            platform_timeline,
            regional_comparison,
            regional_genre_preferences,
            yearly_sales,
            top_publishers,
            releases_per_year,
        }
    }
}

type GenreSeries = (Vec<AggregateRow>, Vec<BoxStats>, Vec<AggregateRow>, Vec<AggregateRow>);

fn genre_series(records: &[GameSaleRecord]) -> GenreSeries {
    let genre_sales = sorted_descending(&sum_by(records, &[Dimension::Genre], Metric::GlobalSales));
    let genre_average = to_rows(&mean_by(records, &[Dimension::Genre], Metric::GlobalSales));
    let timeline = to_rows(&sum_by(
        records,
        &[Dimension::Year, Dimension::Genre],
        Metric::GlobalSales,
    ));

    (genre_sales, genre_distribution(records), genre_average, timeline)
}

type PlatformSeries = (Vec<AggregateRow>, Vec<AggregateRow>, Vec<AggregateRow>, Vec<AggregateRow>);

fn platform_series(records: &[GameSaleRecord], limits: &DashboardLimits) -> PlatformSeries {
    let platform_sales = sum_by(records, &[Dimension::Platform], Metric::GlobalSales);

    let mut game_counts = count_rows(&count_by(records, &[Dimension::Platform]));
    game_counts.sort_by(|a, b| b.value.total_cmp(&a.value));
    game_counts.truncate(limits.platform_game_count);

    (
        n_largest_by_key(&platform_sales, limits.top_platforms),
        n_largest_by_key(&platform_sales, limits.market_share_platforms),
        game_counts,
        platform_timeline(records, limits.timeline_platforms),
    )
}

/// Yearly sales of the best-selling platforms only.
pub fn platform_timeline(records: &[GameSaleRecord], platform_limit: usize) -> Vec<AggregateRow> {
    let platform_sales = sum_by(records, &[Dimension::Platform], Metric::GlobalSales);
    let leaders: BTreeSet<KeyPart> = n_largest_by_key(&platform_sales, platform_limit)
        .into_iter()
        .filter_map(|row| row.key.into_iter().next())
        .collect();

    let selected: Vec<GameSaleRecord> = records
        .iter()
        .filter(|r| leaders.contains(&Dimension::Platform.key_of(r)))
        .cloned()
        .collect();

    to_rows(&sum_by(
        &selected,
        &[Dimension::Year, Dimension::Platform],
        Metric::GlobalSales,
    ))
}

type RegionSeries = (Vec<RegionTotal>, Vec<RegionalBreakdown>, Vec<RegionalBreakdown>);

fn region_series(records: &[GameSaleRecord], limits: &DashboardLimits) -> RegionSeries {
    let comparison = top_n(records, Metric::GlobalSales, limits.regional_comparison)
        .into_iter()
        .map(|r| RegionalBreakdown {
            label: r.name.clone(),
            north_america: r.na_sales,
            europe: r.eu_sales,
            japan: r.jp_sales,
            other: r.other_sales,
        })
        .collect();

    (regional_totals(records), comparison, regional_genre_preferences(records))
}

/// Summed sales per region, in NA, EU, JP, Other order.
pub fn regional_totals(records: &[GameSaleRecord]) -> Vec<RegionTotal> {
    Region::ALL
        .into_iter()
        .map(|region| RegionTotal {
            region,
            sales: records.iter().map(|r| r.region_sales(region)).sum(),
        })
        .collect()
}

/// Per-genre regional sums, ordered by genre.
pub fn regional_genre_preferences(records: &[GameSaleRecord]) -> Vec<RegionalBreakdown> {
    let by_region =
        Region::ALL.map(|region| sum_by(records, &[Dimension::Genre], Metric::region_sales(region)));
    let [na, eu, jp, other] = &by_region;

    na.iter()
        .map(|(key, north_america)| RegionalBreakdown {
            label: key_label(key),
            north_america: *north_america,
            europe: eu.get(key).copied().unwrap_or(0.0),
            japan: jp.get(key).copied().unwrap_or(0.0),
            other: other.get(key).copied().unwrap_or(0.0),
        })
        .collect()
}

type TrendSeries = (
    Vec<LeaderboardEntry>,
    Vec<LeaderboardEntry>,
    Vec<AggregateRow>,
    Vec<AggregateRow>,
    Vec<AggregateRow>,
);

fn trend_series(records: &[GameSaleRecord], limits: &DashboardLimits) -> TrendSeries {
    let entries = |n: usize| -> Vec<LeaderboardEntry> {
        top_n(records, Metric::GlobalSales, n)
            .into_iter()
            .map(LeaderboardEntry::from)
            .collect()
    };

    let publisher_sales = sum_by(records, &[Dimension::Publisher], Metric::GlobalSales);

    (
        entries(limits.top_games),
        entries(limits.leaderboard),
        to_rows(&sum_by(records, &[Dimension::Year], Metric::GlobalSales)),
        n_largest_by_key(&publisher_sales, limits.top_publishers),
        count_rows(&count_by(records, &[Dimension::Year])),
    )
}

/// Box statistics of global sales per genre, ordered by genre.
pub fn genre_distribution(records: &[GameSaleRecord]) -> Vec<BoxStats> {
    let mut by_genre: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for record in records {
        by_genre
            .entry(record.genre.as_str())
            .or_default()
            .push(record.global_sales);
    }

    by_genre
        .into_iter()
        .map(|(genre, mut sales)| {
            sales.sort_by(|a, b| a.total_cmp(b));
            BoxStats {
                genre: genre.to_string(),
                count: sales.len(),
                min: sales[0],
                q1: quantile(&sales, 0.25),
                median: quantile(&sales, 0.5),
                q3: quantile(&sales, 0.75),
                max: sales[sales.len() - 1],
            }
        })
        .collect()
}

/// Linear-interpolated quantile of an ascending, non-empty slice.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

fn year_range(records: &[GameSaleRecord]) -> Option<(i32, i32)> {
    let min = records.iter().map(|r| r.year).min()?;
    let max = records.iter().map(|r| r.year).max()?;
    Some((min, max))
}
