//! Assay: data-quality and descriptive statistics for tabular files.
//!
//! Assay reads a CSV, JSON or spreadsheet file into a normalized table, infers
//! column types, computes descriptive statistics and runs two families of
//! checks: generic ones (duplicate rows, missing data, IQR outliers) and
//! domain rules driven by a [`ParameterRegistry`]. The built-in registry
//! covers soil test data (pH, nutrients, texture); others load from JSON.
//!
//! # Example
//!
//! ```no_run
//! use assay::Assay;
//!
//! let assay = Assay::new();
//! let report = assay.analyze("soil_samples.csv").unwrap();
//!
//! println!("Columns: {}", report.columns.len());
//! println!("Issues: {}", report.issues.len());
//! ```

pub mod domain;
pub mod error;
pub mod inference;
pub mod input;
pub mod report;
pub mod schema;
pub mod validation;

mod assay;

pub use crate::assay::{Assay, AssayConfig};
pub use domain::{MatchMode, ParameterRegistry};
pub use error::{AssayError, Result};
pub use input::{CsvMode, DataTable, SourceMetadata};
pub use report::{Report, ReportAssembler};
pub use schema::{ColumnProfile, ColumnType, Statistics};
pub use validation::{QualityIssue, Severity};
