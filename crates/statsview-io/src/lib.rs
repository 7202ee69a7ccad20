//! statsview-io - Dataset loading
//!
//! Readers turn files into named, typed columns that a data collection
//! can hold:
//!
//! - **CSV / TSV**: delimited text with per-column type inference
//!
//! Text columns are reported as categorical; numeric and boolean columns
//! as numeric components.

pub mod reader;
pub mod schema;

#[cfg(feature = "csv")]
pub mod csv_reader;

pub use reader::*;
pub use schema::*;
