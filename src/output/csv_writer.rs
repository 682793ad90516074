use crate::output::traits::{record_row, OutputError, OutputResult, RecordWriter, COLUMNS};
use crate::state::ProductRecord;
use std::path::Path;

/// Delimited text output
pub struct CsvWriter {
    delimiter: u8,
}

impl CsvWriter {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Builds a writer from a configured delimiter string
    pub fn from_delimiter(delimiter: &str) -> OutputResult<Self> {
        match delimiter.as_bytes() {
            [byte] if byte.is_ascii() => Ok(Self::new(*byte)),
            _ => Err(OutputError::Delimiter(delimiter.to_string())),
        }
    }
}

impl RecordWriter for CsvWriter {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn write(&self, path: &Path, records: &[ProductRecord]) -> OutputResult<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_path(path)?;

        writer.write_record(COLUMNS)?;
        for record in records {
            writer.write_record(&record_row(record))?;
        }
        writer.flush()?;

        Ok(())
    }
}
