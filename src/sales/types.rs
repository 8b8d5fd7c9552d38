//! Core type definitions for the sales analytics pipeline
//!
//! Contains the record types produced by the cleaning and enrichment stages,
//! the categorical keys and metrics used by the aggregator, the pattern
//! classification results, and the error enum shared by every stage.
//! Everything here serializes so the presentation layer can consume it as-is.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// Earliest release year retained by the cleaner
pub const MIN_RELEASE_YEAR: i32 = 1980;

/// Placeholder for missing categorical values
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Placeholder shown when an extremum has no data to select from
pub const NOT_AVAILABLE: &str = "N/A";

/// Long-tail ratios at or below this value are front-loaded
pub const FRONT_LOADED_MAX_RATIO: f64 = 0.3;

/// Long-tail ratios at or below this value (and above the front-loaded cap) are balanced
pub const BALANCED_MAX_RATIO: f64 = 0.6;

/// Single-release games selling more than this multiple of the median are standouts
pub const STANDOUT_MEDIAN_MULTIPLIER: f64 = 2.0;

pub const COL_RANK: &str = "Rank";
pub const COL_NAME: &str = "Name";
pub const COL_PLATFORM: &str = "Platform";
pub const COL_YEAR: &str = "Year";
pub const COL_GENRE: &str = "Genre";
pub const COL_PUBLISHER: &str = "Publisher";
pub const COL_NA_SALES: &str = "NA_Sales";
pub const COL_EU_SALES: &str = "EU_Sales";
pub const COL_JP_SALES: &str = "JP_Sales";
pub const COL_OTHER_SALES: &str = "Other_Sales";
pub const COL_GLOBAL_SALES: &str = "Global_Sales";

/// Columns the source file must provide (matched case-sensitively)
pub const REQUIRED_COLUMNS: [&str; 11] = [
    COL_RANK,
    COL_NAME,
    COL_PLATFORM,
    COL_YEAR,
    COL_GENRE,
    COL_PUBLISHER,
    COL_NA_SALES,
    COL_EU_SALES,
    COL_JP_SALES,
    COL_OTHER_SALES,
    COL_GLOBAL_SALES,
];

// ============================================================================
// Regions
// ============================================================================

/// Sales region, in the fixed order used for tie-breaking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "North America")]
    NorthAmerica,
    #[serde(rename = "Europe")]
    Europe,
    #[serde(rename = "Japan")]
    Japan,
    #[serde(rename = "Other")]
    Other,
}

impl Region {
    /// All regions in tie-break order: NA, EU, JP, Other
    pub const ALL: [Region; 4] = [
        Region::NorthAmerica,
        Region::Europe,
        Region::Japan,
        Region::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Region::NorthAmerica => "North America",
            Region::Europe => "Europe",
            Region::Japan => "Japan",
            Region::Other => "Other",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Record Types
// ============================================================================

/// A row that survived cleaning, before derived columns are added
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanRecord {
    pub rank: Option<u32>,
    pub name: String,
    pub platform: String,
    pub year: i32,
    pub genre: String,
    pub publisher: String,
    pub na_sales: f64,
    pub eu_sales: f64,
    pub jp_sales: f64,
    pub other_sales: f64,
    pub global_sales: f64,
}

impl CleanRecord {
    pub fn region_sales(&self, region: Region) -> f64 {
        match region {
            Region::NorthAmerica => self.na_sales,
            Region::Europe => self.eu_sales,
            Region::Japan => self.jp_sales,
            Region::Other => self.other_sales,
        }
    }
}

/// One row of the enriched sales table
///
/// Created once by the load/clean/derive pipeline and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSaleRecord {
    /// Ranking from the source file (not re-validated)
    pub rank: Option<u32>,
    pub name: String,
    pub platform: String,
    /// Release year, always >= 1980
    pub year: i32,
    pub genre: String,
    pub publisher: String,
    /// Sales in millions of units
    pub na_sales: f64,
    pub eu_sales: f64,
    pub jp_sales: f64,
    pub other_sales: f64,
    /// Always > 0
    pub global_sales: f64,
    /// Decade bucket such as "1990s"
    pub decade: String,
    /// Dense rank of global sales within the genre (1 = best seller)
    pub genre_rank: u32,
    /// Dense rank of global sales within the platform (1 = best seller)
    pub platform_rank: u32,
    pub dominant_region: Region,
    /// Regional share of global sales in percent, rounded to 2 decimals
    pub na_percentage: f64,
    pub eu_percentage: f64,
    pub jp_percentage: f64,
    pub other_percentage: f64,
}

impl GameSaleRecord {
    pub fn region_sales(&self, region: Region) -> f64 {
        match region {
            Region::NorthAmerica => self.na_sales,
            Region::Europe => self.eu_sales,
            Region::Japan => self.jp_sales,
            Region::Other => self.other_sales,
        }
    }

    pub fn region_percentage(&self, region: Region) -> f64 {
        match region {
            Region::NorthAmerica => self.na_percentage,
            Region::Europe => self.eu_percentage,
            Region::Japan => self.jp_percentage,
            Region::Other => self.other_percentage,
        }
    }
}

// ============================================================================
// Aggregation Keys
// ============================================================================

/// Categorical column a rollup can group by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    Name,
    Platform,
    Year,
    Genre,
    Publisher,
    Decade,
    DominantRegion,
}

impl Dimension {
    /// Extracts this dimension's value from a record.
    pub fn key_of(&self, record: &GameSaleRecord) -> KeyPart {
        match self {
            Dimension::Name => KeyPart::Label(record.name.clone()),
            Dimension::Platform => KeyPart::Label(record.platform.clone()),
            Dimension::Year => KeyPart::Year(record.year),
            Dimension::Genre => KeyPart::Label(record.genre.clone()),
            Dimension::Publisher => KeyPart::Label(record.publisher.clone()),
            Dimension::Decade => KeyPart::Label(record.decade.clone()),
            Dimension::DominantRegion => {
                KeyPart::Label(record.dominant_region.label().to_string())
            }
        }
    }
}

/// Numeric column a rollup can aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    NaSales,
    EuSales,
    JpSales,
    OtherSales,
    GlobalSales,
    NaPercentage,
    EuPercentage,
    JpPercentage,
    OtherPercentage,
}

impl Metric {
    pub fn value(&self, record: &GameSaleRecord) -> f64 {
        match self {
            Metric::NaSales => record.na_sales,
            Metric::EuSales => record.eu_sales,
            Metric::JpSales => record.jp_sales,
            Metric::OtherSales => record.other_sales,
            Metric::GlobalSales => record.global_sales,
            Metric::NaPercentage => record.na_percentage,
            Metric::EuPercentage => record.eu_percentage,
            Metric::JpPercentage => record.jp_percentage,
            Metric::OtherPercentage => record.other_percentage,
        }
    }

    /// The absolute sales metric for a region.
    pub fn region_sales(region: Region) -> Metric {
        match region {
            Region::NorthAmerica => Metric::NaSales,
            Region::Europe => Metric::EuSales,
            Region::Japan => Metric::JpSales,
            Region::Other => Metric::OtherSales,
        }
    }
}

/// One component of a group key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyPart {
    Year(i32),
    Label(String),
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Year(year) => write!(f, "{}", year),
            KeyPart::Label(label) => f.write_str(label),
        }
    }
}

/// Tuple of key parts, one per grouping dimension
pub type GroupKey = Vec<KeyPart>;

/// Grouped rollup result, ordered by key
pub type Grouped<V> = BTreeMap<GroupKey, V>;

/// Renders a group key as "A / B / C".
pub fn key_label(key: &[KeyPart]) -> String {
    key.iter()
        .map(|part| part.to_string())
        .collect::<Vec<_>>()
        .join(" / ")
}

/// Ephemeral (key, metric) pair produced for a single chart request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRow {
    pub key: GroupKey,
    pub value: f64,
}

impl AggregateRow {
    pub fn label(&self) -> String {
        key_label(&self.key)
    }
}

// ============================================================================
// Pattern Types
// ============================================================================

/// Launch-versus-long-term sales pattern of a multi-release game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SalesPattern {
    /// Long-tail ratio <= 0.3
    FrontLoaded,
    /// 0.3 < long-tail ratio <= 0.6
    Balanced,
    /// Long-tail ratio > 0.6
    LongTermSuccess,
}

impl SalesPattern {
    /// Buckets a long-tail ratio. Both boundaries are exclusive on the upper side:
    /// exactly 0.3 is front-loaded and exactly 0.6 is balanced.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > BALANCED_MAX_RATIO {
            SalesPattern::LongTermSuccess
        } else if ratio > FRONT_LOADED_MAX_RATIO {
            SalesPattern::Balanced
        } else {
            SalesPattern::FrontLoaded
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SalesPattern::FrontLoaded => "Front-Loaded",
            SalesPattern::Balanced => "Balanced",
            SalesPattern::LongTermSuccess => "Long-Term Success",
        }
    }
}

/// Launch/long-term split for a game with more than one release record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePatternRecord {
    pub name: String,
    /// Genre of the launch record
    pub genre: String,
    pub release_count: usize,
    pub launch_year: i32,
    pub launch_platform: String,
    pub launch_sales: f64,
    pub long_term_sales: f64,
    pub total_sales: f64,
    pub long_tail_ratio: f64,
    pub pattern: SalesPattern,
}

/// Performance tier for the single-release fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SingleReleaseTier {
    /// Sold more than twice the median
    Standout,
    Standard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleReleaseGame {
    pub name: String,
    pub genre: String,
    pub global_sales: f64,
    pub tier: SingleReleaseTier,
}

/// Buckets computed when no game has more than one release record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleReleaseFallback {
    /// Median global sales over all rows, None for an empty table
    pub median_sales: Option<f64>,
    /// Sales above this value are standouts
    pub threshold: Option<f64>,
    /// Games in table order
    pub games: Vec<SingleReleaseGame>,
}

/// Result of pattern classification
///
/// Callers must handle both variants: the fallback is a different, simpler
/// computation and is never mixed into the classified mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "camelCase")]
pub enum PatternOutcome {
    /// At least one multi-release game exists; keyed by game name
    Classified(BTreeMap<String, GamePatternRecord>),
    /// No multi-release game exists
    InsufficientData(SingleReleaseFallback),
}

/// Genre-level rollup of classified games
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenrePatternSummary {
    pub genre: String,
    pub game_count: usize,
    pub mean_long_tail_ratio: f64,
    pub mean_total_sales: f64,
    pub front_loaded: usize,
    pub balanced: usize,
    pub long_term_success: usize,
}

// ============================================================================
// Error Types
// ============================================================================

/// Typed error enum for the sales pipeline
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "code", content = "details", rename_all = "camelCase")]
pub enum SalesError {
    /// Source file missing, unreadable or unparseable
    #[error("Failed to load sales data: {message}")]
    DataSource { message: String },

    /// Required columns absent from the source header
    #[error("Missing required columns: {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    /// An extremum was requested over zero rows
    #[error("No data available for {operation}")]
    NoData { operation: String },

    /// Configuration file or override is invalid
    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

impl SalesError {
    pub fn no_data(operation: impl Into<String>) -> Self {
        SalesError::NoData {
            operation: operation.into(),
        }
    }

    /// True for errors the presentation layer should replace with a placeholder.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SalesError::NoData { .. })
    }
}
