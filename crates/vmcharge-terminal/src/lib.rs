//! Terminal output formatting for vmcharge
//!
//! This crate provides the table and JSON formatters for charge reports,
//! interval breakdowns, and charge tables.

pub mod output;

pub use output::{JsonFormatter, OutputFormatter, TableFormatter, get_formatter};
