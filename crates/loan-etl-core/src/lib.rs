//! Loan ETL: load -> normalize -> fix anomaly -> impute -> drop -> derive -> write parquet.

pub mod config;
pub mod credit;
pub mod error;
pub mod insights;
pub mod loader;
pub mod pipeline;
pub mod schema;
pub mod transform;
pub mod writer;

pub use config::{ConfigFile, ConfigOverrides, EtlConfig, LoadOptions, OutputCompression, OutputOptions};
pub use credit::CreditCategory;
pub use error::{EtlError, Result};
pub use pipeline::{LoanDataTransformer, RunSummary};
pub use schema::{LoanColumn, LoanRecord};
