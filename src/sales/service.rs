//! Caller-facing sales operations
//!
//! `load_and_process` runs the whole pipeline for one file. `SalesService`
//! adds the identity-keyed cache on top and builds the JSON-ready report the
//! presentation layer renders.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::config::AppConfig;
use crate::sales::cache::{DatasetCache, SourceIdentity};
use crate::sales::cleaner::{self, CleaningReport};
use crate::sales::features::derive_features;
use crate::sales::insights::{Dashboard, DatasetSummary, FilterOptions, GenreConsistency, KeyInsights};
use crate::sales::loader::{self, RawTable};
use crate::sales::patterns::{classify_patterns, genre_summary_for};
use crate::sales::table::{SalesFilter, SalesTable};
use crate::sales::types::{GenrePatternSummary, PatternOutcome, SalesError};

/// Cleans a raw table and derives every computed column.
///
/// Deterministic: the same raw input always yields the same table.
pub fn process_raw(raw: &RawTable) -> Result<(SalesTable, CleaningReport), SalesError> {
    let cleaned = cleaner::clean(raw)?;
    let records = derive_features(&cleaned.records);
    Ok((SalesTable::new(records), cleaned.report))
}

/// Loads, cleans and enriches the sales file at `path`.
///
/// # Returns
/// * `Ok(SalesTable)` - Enriched table sorted by global sales
/// * `Err(SalesError::DataSource)` - If the file is missing or unreadable
/// * `Err(SalesError::Schema)` - If required columns are absent
pub async fn load_and_process(path: &Path) -> Result<SalesTable, SalesError> {
    let raw = loader::read_raw_table(path).await?;
    let (table, report) = process_raw(&raw)?;
    log_cleaning(path, &report);
    Ok(table)
}

fn log_cleaning(path: &Path, report: &CleaningReport) {
    tracing::info!(
        path = %path.display(),
        input_rows = report.input_rows,
        output_rows = report.output_rows,
        missing_name_or_sales = report.missing_name_or_sales,
        before_min_year = report.before_min_year,
        non_positive_sales = report.non_positive_sales,
        "Processed sales data"
    );
}

/// Everything the dashboard shows for one filtered view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub filter: SalesFilter,
    pub filter_options: FilterOptions,
    pub summary: DatasetSummary,
    pub insights: KeyInsights,
    pub consistency: GenreConsistency,
    pub patterns: PatternOutcome,
    pub genre_patterns: Vec<GenrePatternSummary>,
    pub dashboard: Dashboard,
}

/// Owns the configuration and the processed-table cache
pub struct SalesService {
    config: AppConfig,
    cache: Mutex<DatasetCache>,
}

impl SalesService {
    pub fn new(config: AppConfig) -> Self {
        let cache = DatasetCache::new(config.cache_capacity);
        Self {
            config,
            cache: Mutex::new(cache),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Processed table for the configured source.
    ///
    /// The file is re-read on every call to compute its identity; the
    /// pipeline only runs when that identity is not cached.
    pub async fn dataset(&self) -> Result<Arc<SalesTable>, SalesError> {
        let path = self.config.data_path.as_path();
        let bytes = loader::read_source_bytes(path).await?;
        let identity = SourceIdentity::from_file(path, &bytes).await?;

        if let Some(table) = self.cache.lock().get(&identity) {
            tracing::debug!(path = %path.display(), "Dataset cache hit");
            return Ok(table);
        }

        tracing::debug!(
            path = %path.display(),
            hash = %identity.content_hash,
            "Dataset cache miss"
        );

        let raw = loader::parse_raw_bytes(&bytes)?;
        let (table, report) = process_raw(&raw)?;
        log_cleaning(path, &report);

        let table = Arc::new(table);
        self.cache.lock().insert(identity, Arc::clone(&table));
        Ok(table)
    }

    /// Forgets every cached version of the configured source.
    pub fn invalidate(&self) -> usize {
        let removed = self.cache.lock().invalidate(&self.config.data_path);
        tracing::info!(
            path = %self.config.data_path.display(),
            removed,
            "Invalidated dataset cache"
        );
        removed
    }

    pub fn cached_versions(&self) -> usize {
        self.cache.lock().len()
    }

    /// Builds the full report for `filter` applied to `table`.
    ///
    /// Filter options always describe the unfiltered table.
    pub fn report(&self, table: &SalesTable, filter: &SalesFilter) -> SalesReport {
        let limits = &self.config.dashboard;
        let view = table.filter(filter);

        if view.is_empty() {
            tracing::warn!("No records match the current filter");
        }

        let patterns = classify_patterns(&view);
        let genre_patterns = genre_summary_for(&patterns);

        SalesReport {
            filter: filter.clone(),
            filter_options: FilterOptions::compute(table, limits.filter_publishers),
            summary: DatasetSummary::compute(&view),
            insights: KeyInsights::compute(&view),
            consistency: GenreConsistency::compute(&view),
            patterns,
            genre_patterns,
            dashboard: Dashboard::compute(&view, limits),
        }
    }
}
