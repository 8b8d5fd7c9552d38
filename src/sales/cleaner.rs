//! Row cleaning
//!
//! Coerces raw cells into typed records and removes rows that violate the
//! domain constraints. Row-level defects are repaired or dropped, never
//! raised: only a missing column fails the whole table.
//!
//! Per-row steps, in order:
//! 1. drop rows missing `Name` or `Global_Sales`
//! 2. coerce `Year` (non-numeric/missing -> 0)
//! 3. drop rows released before 1980 (this also drops the 0 sentinel)
//! 4. coerce the sales columns (non-numeric/missing/negative -> 0.0)
//! 5. trim the label columns (missing/blank -> "Unknown")
//! 6. drop rows with `Global_Sales <= 0`
//! 7. coerce `Rank` (invalid -> absent)
//!
//! Survivors are then stably sorted by global sales, descending.

use serde::Serialize;

use crate::sales::loader::{ColumnIndex, RawTable};
use crate::sales::types::{CleanRecord, SalesError, MIN_RELEASE_YEAR, UNKNOWN_LABEL};

/// Cell values read as missing, matching the usual CSV null markers
const MISSING_MARKERS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Row counts for each cleaning decision
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleaningReport {
    pub input_rows: usize,
    pub missing_name_or_sales: usize,
    pub before_min_year: usize,
    pub non_positive_sales: usize,
    pub output_rows: usize,
}

/// Cleaned records plus the report describing what was dropped
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedTable {
    /// Sorted by global sales, descending; ties keep input order
    pub records: Vec<CleanRecord>,
    pub report: CleaningReport,
}

/// Cleans a raw table.
///
/// # Returns
/// * `CleanedTable` with typed records sorted by global sales
/// * `SalesError::Schema` if any required column is absent
pub fn clean(raw: &RawTable) -> Result<CleanedTable, SalesError> {
    let columns = ColumnIndex::resolve(&raw.headers)?;

    let mut report = CleaningReport {
        input_rows: raw.rows.len(),
        ..CleaningReport::default()
    };

    let mut records: Vec<CleanRecord> = raw
        .rows
        .iter()
        .filter_map(|row| clean_row(row, &columns, &mut report))
        .collect();

    // sort_by is stable, so equal sales keep their input order
    records.sort_by(|a, b| b.global_sales.total_cmp(&a.global_sales));

    report.output_rows = records.len();

    tracing::info!(
        input = report.input_rows,
        kept = report.output_rows,
        missing_name_or_sales = report.missing_name_or_sales,
        before_min_year = report.before_min_year,
        non_positive_sales = report.non_positive_sales,
        "Cleaned sales table"
    );

    Ok(CleanedTable { records, report })
}

fn clean_row(row: &[String], columns: &ColumnIndex, report: &mut CleaningReport) -> Option<CleanRecord> {
    let name = cell(row, columns.name);
    let global = cell(row, columns.global_sales);
    if name.is_none() || global.is_none() {
        report.missing_name_or_sales += 1;
        return None;
    }

    let year = coerce_year(cell(row, columns.year));
    if year < MIN_RELEASE_YEAR {
        report.before_min_year += 1;
        return None;
    }

    let global_sales = coerce_sales(global);
    let na_sales = coerce_sales(cell(row, columns.na_sales));
    let eu_sales = coerce_sales(cell(row, columns.eu_sales));
    let jp_sales = coerce_sales(cell(row, columns.jp_sales));
    let other_sales = coerce_sales(cell(row, columns.other_sales));

    let name = normalize_label(name);
    let platform = normalize_label(cell(row, columns.platform));
    let genre = normalize_label(cell(row, columns.genre));
    let publisher = normalize_label(cell(row, columns.publisher));

    if global_sales <= 0.0 {
        report.non_positive_sales += 1;
        return None;
    }

    let rank = coerce_rank(cell(row, columns.rank));

    Some(CleanRecord {
        rank,
        name,
        platform,
        year,
        genre,
        publisher,
        na_sales,
        eu_sales,
        jp_sales,
        other_sales,
        global_sales,
    })
}

/// Returns the cell at `index`, or None when it is absent or a null marker.
fn cell(row: &[String], index: usize) -> Option<&str> {
    row.get(index)
        .map(|value| value.as_str())
        .filter(|value| !is_missing(value))
}

/// True for blank cells and the common textual null markers ("N/A", "NaN", ...).
pub fn is_missing(value: &str) -> bool {
    MISSING_MARKERS.contains(&value.trim())
}

fn parse_number(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

/// Coerces a year cell, truncating fractional values ("2006.0" -> 2006).
/// Missing or non-numeric values become the 0 sentinel.
pub fn coerce_year(value: Option<&str>) -> i32 {
    let Some(value) = value else {
        return 0;
    };

    if let Ok(year) = value.trim().parse::<i32>() {
        return year;
    }

    match parse_number(value) {
        Some(year) if year >= i32::MIN as f64 && year <= i32::MAX as f64 => year.trunc() as i32,
        _ => 0,
    }
}

/// Coerces a sales cell. Missing, non-numeric and negative values become 0.0.
pub fn coerce_sales(value: Option<&str>) -> f64 {
    match value.and_then(parse_number) {
        Some(sales) if sales > 0.0 => sales,
        _ => 0.0,
    }
}

/// Coerces a rank cell. Only non-negative whole numbers are kept.
pub fn coerce_rank(value: Option<&str>) -> Option<u32> {
    let value = value?;

    if let Ok(rank) = value.trim().parse::<u32>() {
        return Some(rank);
    }

    parse_number(value)
        .filter(|rank| *rank >= 0.0 && rank.fract() == 0.0 && *rank <= u32::MAX as f64)
        .map(|rank| rank as u32)
}

/// Trims a label cell, substituting "Unknown" for missing or blank values.
pub fn normalize_label(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => UNKNOWN_LABEL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sales::loader::parse_raw_content;

    const HEADER: &str =
        "Rank,Name,Platform,Year,Genre,Publisher,NA_Sales,EU_Sales,JP_Sales,Other_Sales,Global_Sales";

    fn clean_lines(lines: &[&str]) -> CleanedTable {
        let content = format!("{}\n{}", HEADER, lines.join("\n"));
        let raw = parse_raw_content(&content).unwrap();
        clean(&raw).unwrap()
    }

    #[test]
    fn test_clean_basic_row() {
        let table = clean_lines(&["1, Wii Sports ,Wii,2006,Sports,Nintendo,41.49,29.02,3.77,8.46,82.74"]);

        assert_eq!(table.records.len(), 1);
        let record = &table.records[0];
        assert_eq!(record.rank, Some(1));
        assert_eq!(record.name, "Wii Sports");
        assert_eq!(record.year, 2006);
        assert_eq!(record.global_sales, 82.74);
        assert_eq!(table.report.output_rows, 1);
    }

    #[test]
    fn test_clean_drops_missing_name_or_global_sales() {
        let table = clean_lines(&[
            "1,,Wii,2006,Sports,Nintendo,1,1,1,1,4",
            "2,Game,Wii,2006,Sports,Nintendo,1,1,1,1,",
            "3,Kept,Wii,2006,Sports,Nintendo,1,1,1,1,4",
        ]);

        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0].name, "Kept");
        assert_eq!(table.report.missing_name_or_sales, 2);
    }

    #[test]
    fn test_clean_drops_unknown_and_early_years() {
        let table = clean_lines(&[
            "1,NoYear,Wii,N/A,Sports,Nintendo,1,1,1,1,4",
            "2,Garbage,Wii,soon,Sports,Nintendo,1,1,1,1,4",
            "3,Old,2600,1979,Action,Atari,1,1,1,1,4",
            "4,Edge,2600,1980,Action,Atari,1,1,1,1,4",
            "5,Float,PS2,2006.0,Action,Sony,1,1,1,1,4",
        ]);

        let names: Vec<&str> = table.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Edge", "Float"]);
        assert_eq!(table.records[1].year, 2006);
        assert_eq!(table.report.before_min_year, 3);
    }

    #[test]
    fn test_clean_coerces_bad_sales_to_zero() {
        let table = clean_lines(&["1,Game,PS,1995,Racing,Sony,abc,,-1,0.5,2.0"]);

        let record = &table.records[0];
        assert_eq!(record.na_sales, 0.0);
        assert_eq!(record.eu_sales, 0.0);
        assert_eq!(record.jp_sales, 0.0);
        assert_eq!(record.other_sales, 0.5);
    }

    #[test]
    fn test_clean_drops_non_positive_global_sales() {
        let table = clean_lines(&[
            "1,Zero,PS,1995,Racing,Sony,0,0,0,0,0",
            "2,Text,PS,1995,Racing,Sony,0,0,0,0,lots",
            "3,Negative,PS,1995,Racing,Sony,0,0,0,0,-2",
            "4,Kept,PS,1995,Racing,Sony,0,0,0,0,0.01",
        ]);

        assert_eq!(table.records.len(), 1);
        assert_eq!(table.report.non_positive_sales, 3);
    }

    #[test]
    fn test_clean_fills_unknown_labels() {
        let table = clean_lines(&["1,Game,  ,1995,,N/A,1,0,0,0,1"]);

        let record = &table.records[0];
        assert_eq!(record.platform, UNKNOWN_LABEL);
        assert_eq!(record.genre, UNKNOWN_LABEL);
        assert_eq!(record.publisher, UNKNOWN_LABEL);
    }

    #[test]
    fn test_clean_invalid_rank_is_absent() {
        let table = clean_lines(&[
            "x,A,PS,1995,Racing,Sony,1,0,0,0,3",
            "7.0,B,PS,1995,Racing,Sony,1,0,0,0,2",
            "2.5,C,PS,1995,Racing,Sony,1,0,0,0,1",
        ]);

        assert_eq!(table.records[0].rank, None);
        assert_eq!(table.records[1].rank, Some(7));
        assert_eq!(table.records[2].rank, None);
    }

    #[test]
    fn test_clean_sorts_descending_and_keeps_input_order_for_ties() {
        let table = clean_lines(&[
            "1,Low,PS,1995,Racing,Sony,0,0,0,0,1.0",
            "2,TieFirst,PS,1995,Racing,Sony,0,0,0,0,5.0",
            "3,High,PS,1995,Racing,Sony,0,0,0,0,9.0",
            "4,TieSecond,PS,1995,Racing,Sony,0,0,0,0,5.0",
        ]);

        let names: Vec<&str> = table.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["High", "TieFirst", "TieSecond", "Low"]);
    }

    #[test]
    fn test_clean_ignores_extra_columns() {
        let content = format!("{},Critic_Score\n1,Game,PS,1995,Racing,Sony,1,0,0,0,1,88", HEADER);
        let raw = parse_raw_content(&content).unwrap();

        let table = clean(&raw).unwrap();
        assert_eq!(table.records.len(), 1);
    }

    #[test]
    fn test_clean_missing_column_is_schema_error() {
        let raw = parse_raw_content("Name,Global_Sales\nGame,1.0").unwrap();

        match clean(&raw) {
            Err(SalesError::Schema { missing }) => assert!(missing.contains(&"Year".to_string())),
            other => panic!("Expected Schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_coerce_helpers() {
        assert_eq!(coerce_year(Some(" 1999 ")), 1999);
        assert_eq!(coerce_year(Some("1e10")), 0);
        assert_eq!(coerce_year(None), 0);
        assert_eq!(coerce_sales(Some("inf")), 0.0);
        assert_eq!(coerce_sales(Some(" 1.25")), 1.25);
        assert_eq!(coerce_rank(Some("-3")), None);
        assert!(is_missing(" NaN "));
        assert!(!is_missing("Nintendo"));
    }
}
