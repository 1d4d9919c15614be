use std::path::Path;

use rust_xlsxwriter::{Workbook, XlsxError};
use thiserror::Error;

use crate::core::keywords::KeywordRecord;

/// Errors raised while writing the report file.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write spreadsheet: {0}")]
    Spreadsheet(#[from] XlsxError),
    #[error("Failed to finalize report file: {0}")]
    Io(#[from] std::io::Error),
}

/// Fixed column headers, kept as-is from the report consumers' template
/// (the searches columns are labeled in Russian there).
const HEADERS: [&str; 8] = [
    "Keyword",
    "Avg. monthly searches",
    "Competition (indexed value)",
    "Top of page bid (low range)",
    "Top of page bid (high range)",
    "Searches: - последний месяц",
    "Searches: - 12 месяцев назад от последнего месяца",
    "Searches: - первый самый ранее доступный месяц",
];

/// Write the records to an xlsx file: one header row, one row per record,
/// eight columns. After a successful save the file is chmodded to 0644 so
/// the report is group/world readable.
pub fn write_report(path: &Path, records: &[KeywordRecord]) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (column, label) in HEADERS.iter().enumerate() {
        worksheet.write_string(0, column as u16, *label)?;
    }

    for (index, record) in records.iter().enumerate() {
        let row = index as u32 + 1;
        worksheet.write_string(row, 0, record.keyword.as_str())?;
        worksheet.write_number(row, 1, record.avg_monthly_searches as f64)?;
        worksheet.write_number(row, 2, record.competition_index as f64)?;
        worksheet.write_number(row, 3, record.low_top_of_page_bid_micros as f64)?;
        worksheet.write_number(row, 4, record.high_top_of_page_bid_micros as f64)?;
        worksheet.write_number(row, 5, record.searches_last_month as f64)?;
        worksheet.write_number(row, 6, record.searches_last_year as f64)?;
        worksheet.write_number(row, 7, record.searches_first_month as f64)?;
    }

    workbook.save(path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644))?;
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
