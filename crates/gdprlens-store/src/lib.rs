//! Storage layer: case discovery, annotation record files, error-marker audits.

mod audit;
mod error;
mod records;
mod scan;

pub use audit::{audit, AuditReport, DEFAULT_MARKER, DEFAULT_REPORT_FILE};
pub use error::StoreError;
pub use records::write_record;
pub use scan::{scan, CASE_EXTENSION};
