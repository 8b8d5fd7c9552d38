//! Video game sales analytics core
//!
//! Loads the sales file, cleans and enriches it into an immutable table, and
//! provides the filters, rollups and pattern classification the dashboard
//! renders.

pub mod aggregate;
pub mod cache;
pub mod cleaner;
pub mod features;
pub mod insights;
pub mod loader;
pub mod patterns;
pub mod service;
pub mod table;
pub mod types;

pub use service::{load_and_process, process_raw, SalesReport, SalesService};
pub use table::{SalesFilter, SalesTable};
pub use types::*;
