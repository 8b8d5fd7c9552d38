pub mod config;
pub mod sales;

pub use config::AppConfig;
pub use sales::{SalesError, SalesFilter, SalesService, SalesTable};
