#![forbid(unsafe_code)]

pub mod csv_import;
pub mod error;
pub mod report_export;

pub use csv_import::{read_records, read_records_from_path};
pub use error::StorageError;
pub use report_export::{ExportFormat, render_markdown, write_json, write_markdown, write_report};
