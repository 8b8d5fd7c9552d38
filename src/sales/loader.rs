//! Record loading
//!
//! Reads the delimited sales file into a raw, untyped table and resolves the
//! required columns. No value coercion happens here; that is the cleaner's job.

use std::path::Path;

use crate::sales::types::{
    SalesError, COL_EU_SALES, COL_GENRE, COL_GLOBAL_SALES, COL_JP_SALES, COL_NAME,
    COL_NA_SALES, COL_OTHER_SALES, COL_PLATFORM, COL_PUBLISHER, COL_RANK, COL_YEAR,
    REQUIRED_COLUMNS,
};

/// A single row of raw cell values, padded or truncated to the header count
pub type RawRow = Vec<String>;

/// Raw tabular input as read from disk
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Column headers from the first line
    pub headers: Vec<String>,
    /// Data rows (each row is a vector of cell values)
    pub rows: Vec<RawRow>,
    /// Rows the csv reader rejected as malformed
    pub skipped_rows: usize,
}

/// Positions of the required columns within a raw row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndex {
    pub rank: usize,
    pub name: usize,
    pub platform: usize,
    pub year: usize,
    pub genre: usize,
    pub publisher: usize,
    pub na_sales: usize,
    pub eu_sales: usize,
    pub jp_sales: usize,
    pub other_sales: usize,
    pub global_sales: usize,
}

impl ColumnIndex {
    /// Resolves every required column by exact (case-sensitive) header name.
    ///
    /// Extra columns are ignored. Fails with `SalesError::Schema` listing all
    /// missing columns in their canonical order.
    pub fn resolve(headers: &[String]) -> Result<Self, SalesError> {
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|column| !headers.iter().any(|h| h == *column))
            .map(|column| column.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(SalesError::Schema { missing });
        }

        let find = |column: &str| headers.iter().position(|h| h == column).unwrap_or(0);

        Ok(ColumnIndex {
            rank: find(COL_RANK),
            name: find(COL_NAME),
            platform: find(COL_PLATFORM),
            year: find(COL_YEAR),
            genre: find(COL_GENRE),
            publisher: find(COL_PUBLISHER),
            na_sales: find(COL_NA_SALES),
            eu_sales: find(COL_EU_SALES),
            jp_sales: find(COL_JP_SALES),
            other_sales: find(COL_OTHER_SALES),
            global_sales: find(COL_GLOBAL_SALES),
        })
    }
}

/// Reads the raw bytes of the source file.
///
/// # Arguments
/// * `path` - Path to the sales file
///
/// # Returns
/// * File contents, or `SalesError::DataSource` if the file cannot be read
pub async fn read_source_bytes(path: &Path) -> Result<Vec<u8>, SalesError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| SalesError::DataSource {
            message: format!("Failed to read file '{}': {}", path.display(), e),
        })
}

/// Read a sales file from disk and parse it into a raw table.
pub async fn read_raw_table(path: &Path) -> Result<RawTable, SalesError> {
    let bytes = read_source_bytes(path).await?;
    let table = parse_raw_bytes(&bytes)?;

    tracing::info!(
        "Loaded {} raw rows from {}",
        table.rows.len(),
        path.display()
    );

    Ok(table)
}

/// Parses file bytes, replacing invalid UTF-8 sequences instead of failing.
pub fn parse_raw_bytes(bytes: &[u8]) -> Result<RawTable, SalesError> {
    let content = String::from_utf8_lossy(bytes);
    parse_raw_content(&content)
}

/// Parse delimited content from a string.
///
/// # Behavior
/// - Handles variable column counts (short rows are padded, long rows truncated)
/// - Skips malformed rows with a warning
/// - Does not trim cells; whitespace handling belongs to the cleaner
pub fn parse_raw_content(content: &str) -> Result<RawTable, SalesError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| SalesError::DataSource {
            message: format!("Failed to parse headers: {}", e),
        })?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(SalesError::DataSource {
            message: "Source has no headers".to_string(),
        });
    }

    let header_count = headers.len();
    let mut rows: Vec<RawRow> = Vec::new();
    let mut skipped_rows = 0;

    for (line_number, result) in reader.records().enumerate() {
        match result {
            Ok(record) => rows.push(normalize_row(&record, header_count)),
            Err(e) => {
                skipped_rows += 1;
                tracing::warn!("Skipping malformed row {}: {}", line_number + 2, e);
            }
        }
    }

    if skipped_rows > 0 {
        tracing::info!(
            "Parsing complete: {} rows parsed, {} rows skipped due to errors",
            rows.len(),
            skipped_rows
        );
    }

    Ok(RawTable {
        headers,
        rows,
        skipped_rows,
    })
}

fn normalize_row(record: &csv::StringRecord, header_count: usize) -> RawRow {
    let mut row: RawRow = record.iter().map(|s| s.to_string()).collect();
    row.resize(header_count, String::new());
    row
}
