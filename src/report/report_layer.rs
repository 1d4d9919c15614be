// The report module renders query results for human consumption.

#[path = "xlsx_export.rs"]
pub mod xlsx_export;

pub use xlsx_export::{write_report, ExportError};
