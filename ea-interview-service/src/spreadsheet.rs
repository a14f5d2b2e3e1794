use rust_xlsxwriter::{Format, Workbook, XlsxError};
use thiserror::Error;

use crate::deliverables::table::Table;

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Error)]
pub enum SpreadsheetError {
    #[error("spreadsheet export failed: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("table has too many {0} for a worksheet")]
    TooLarge(&'static str),
}

/// Writes `table` into a one-sheet workbook with a bold header row.
pub fn table_to_xlsx(table: &Table, sheet_name: &str) -> Result<Vec<u8>, SpreadsheetError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (col, name) in table.columns.iter().enumerate() {
        let col = u16::try_from(col).map_err(|_| SpreadsheetError::TooLarge("columns"))?;
        worksheet.write_string_with_format(0, col, name, &header)?;
    }
    for (row, cells) in table.rows.iter().enumerate() {
        let row = u32::try_from(row + 1).map_err(|_| SpreadsheetError::TooLarge("rows"))?;
        for (col, cell) in cells.iter().enumerate() {
            let col = u16::try_from(col).map_err(|_| SpreadsheetError::TooLarge("columns"))?;
            worksheet.write_string(row, col, cell)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}
