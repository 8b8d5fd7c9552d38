//! Immutable sales table and filtering
//!
//! A `SalesTable` is a cheaply clonable, read-only view over enriched records.
//! Filtering never touches the underlying rows; it yields a new table holding
//! only the matching ones, in their original order.

use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::sales::types::GameSaleRecord;

/// Read-only sequence of enriched records
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SalesTable {
    records: Arc<[GameSaleRecord]>,
}

impl SalesTable {
    pub fn new(records: Vec<GameSaleRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }

    pub fn records(&self) -> &[GameSaleRecord] {
        &self.records
    }

    /// Rows matching every constraint of `filter`.
    pub fn filter(&self, filter: &SalesFilter) -> SalesTable {
        if filter.is_unconstrained() {
            return self.clone();
        }
        self.filter_by(|record| filter.matches(record))
    }

    /// Rows for which `predicate` holds.
    pub fn filter_by<P>(&self, predicate: P) -> SalesTable
    where
        P: Fn(&GameSaleRecord) -> bool,
    {
        SalesTable::new(
            self.records
                .iter()
                .filter(|record| predicate(record))
                .cloned()
                .collect(),
        )
    }
}

impl Default for SalesTable {
    fn default() -> Self {
        SalesTable::new(Vec::new())
    }
}

impl Deref for SalesTable {
    type Target = [GameSaleRecord];

    fn deref(&self) -> &Self::Target {
        &self.records
    }
}

impl From<Vec<GameSaleRecord>> for SalesTable {
    fn from(records: Vec<GameSaleRecord>) -> Self {
        SalesTable::new(records)
    }
}

/// Conjunction of optional constraints; `None` means "no constraint"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesFilter {
    /// Inclusive (from, to) release year range
    pub year_range: Option<(i32, i32)>,
    pub genre: Option<String>,
    pub platform: Option<String>,
    pub publisher: Option<String>,
}

impl SalesFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_year_range(mut self, from: i32, to: i32) -> Self {
        self.year_range = Some((from, to));
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    pub fn is_unconstrained(&self) -> bool {
        self.year_range.is_none()
            && self.genre.is_none()
            && self.platform.is_none()
            && self.publisher.is_none()
    }

    pub fn matches(&self, record: &GameSaleRecord) -> bool {
        let in_years = self
            .year_range
            .map_or(true, |(from, to)| record.year >= from && record.year <= to);

        in_years
            && label_matches(&self.genre, &record.genre)
            && label_matches(&self.platform, &record.platform)
            && label_matches(&self.publisher, &record.publisher)
    }
}

fn label_matches(constraint: &Option<String>, value: &str) -> bool {
    constraint.as_deref().map_or(true, |expected| expected == value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sales::types::Region;

    fn record(name: &str, year: i32, genre: &str, platform: &str, publisher: &str) -> GameSaleRecord {
        GameSaleRecord {
            rank: None,
            name: name.to_string(),
            platform: platform.to_string(),
            year,
            genre: genre.to_string(),
            publisher: publisher.to_string(),
            na_sales: 1.0,
            eu_sales: 0.0,
            jp_sales: 0.0,
            other_sales: 0.0,
            global_sales: 1.0,
            decade: "2000s".to_string(),
            genre_rank: 1,
            platform_rank: 1,
            dominant_region: Region::NorthAmerica,
            na_percentage: 100.0,
            eu_percentage: 0.0,
            jp_percentage: 0.0,
            other_percentage: 0.0,
        }
    }

    fn sample() -> SalesTable {
        SalesTable::new(vec![
            record("A", 2004, "Action", "PS2", "Sony"),
            record("B", 2005, "Action", "Wii", "Nintendo"),
            record("C", 2008, "Sports", "Wii", "Nintendo"),
            record("D", 2010, "Action", "X360", "Microsoft"),
            record("E", 2011, "Action", "PS3", "Sony"),
        ])
    }

    fn names(table: &SalesTable) -> Vec<&str> {
        table.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_unconstrained_filter_keeps_everything() {
        let table = sample();
        let filtered = table.filter(&SalesFilter::new());
        assert_eq!(filtered.len(), 5);
    }

    #[test]
    fn test_year_range_is_inclusive() {
        let table = sample();
        let filtered = table.filter(&SalesFilter::new().with_year_range(2005, 2010));
        assert_eq!(names(&filtered), vec!["B", "C", "D"]);
    }

    #[test]
    fn test_filters_combine_as_conjunction() {
        let table = sample();
        let filter = SalesFilter::new()
            .with_genre("Action")
            .with_platform("Wii")
            .with_publisher("Nintendo");
        assert_eq!(names(&table.filter(&filter)), vec!["B"]);
    }

    #[test]
    fn test_filter_order_does_not_matter() {
        let table = sample();
        let years = SalesFilter::new().with_year_range(2005, 2010);
        let genre = SalesFilter::new().with_genre("Action");

        let years_then_genre = table.filter(&years).filter(&genre);
        let genre_then_years = table.filter(&genre).filter(&years);
        assert_eq!(years_then_genre, genre_then_years);
        assert_eq!(names(&years_then_genre), vec!["B", "D"]);
    }

    #[test]
    fn test_filter_leaves_source_untouched() {
        let table = sample();
        let filtered = table.filter(&SalesFilter::new().with_genre("Sports"));
        assert_eq!(filtered.len(), 1);
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn test_filter_with_no_match_is_empty() {
        let table = sample();
        let filtered = table.filter(&SalesFilter::new().with_genre("Strategy"));
        assert!(filtered.is_empty());
    }
}
