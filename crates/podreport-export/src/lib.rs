//! CSV report export for podreport
//!
//! This crate writes collected [`PodRecord`]s to a comma-delimited file
//! with a header row.

mod csv_report;

pub use csv_report::{DEFAULT_REPORT_PATH, ExportError, ExportOutcome, ReportExporter, write_report};

// Re-export types used in our public API
pub use podreport_types::PodRecord;
