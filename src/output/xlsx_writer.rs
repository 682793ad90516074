use crate::output::traits::{record_row, OutputResult, RecordWriter, COLUMNS};
use crate::state::ProductRecord;
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;

const SHEET_NAME: &str = "Products";

/// Spreadsheet output, one worksheet with a bold header row
#[derive(Debug, Default)]
pub struct XlsxWriter;

impl RecordWriter for XlsxWriter {
    fn extension(&self) -> &'static str {
        "xlsx"
    }

    fn write(&self, path: &Path, records: &[ProductRecord]) -> OutputResult<()> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();

        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;

        for (col, name) in COLUMNS.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *name, &header)?;
        }

        for (row, record) in records.iter().enumerate() {
            let row = row as u32 + 1;
            for (col, value) in record_row(record).iter().enumerate() {
                sheet.write_string(row, col as u16, value)?;
            }
        }

        workbook.save(path)?;
        Ok(())
    }
}
