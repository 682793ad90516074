use crate::config::OutputConfig;
use crate::output::csv_writer::CsvWriter;
use crate::output::traits::{OutputResult, RecordWriter};
use crate::output::xlsx_writer::XlsxWriter;
use crate::state::ProductRecord;
use chrono::Local;
use std::path::{Path, PathBuf};

/// Accumulates records and persists them in every configured format
///
/// Both formats receive the same rows in the same order. Persisting is
/// meant to run once, after the crawl stops for any reason.
pub struct ResultSink {
    directory: PathBuf,
    basename: String,
    timestamped: bool,
    writers: Vec<Box<dyn RecordWriter>>,
    records: Vec<ProductRecord>,
}

impl ResultSink {
    /// Creates a sink writing CSV and XLSX as configured
    pub fn new(config: &OutputConfig) -> OutputResult<Self> {
        let writers: Vec<Box<dyn RecordWriter>> = vec![
            Box::new(CsvWriter::from_delimiter(&config.delimiter)?),
            Box::new(XlsxWriter),
        ];

        Ok(Self::with_writers(config, writers))
    }

    pub fn with_writers(config: &OutputConfig, writers: Vec<Box<dyn RecordWriter>>) -> Self {
        Self {
            directory: PathBuf::from(&config.directory),
            basename: config.basename.clone(),
            timestamped: config.timestamped,
            writers,
            records: Vec::new(),
        }
    }

    pub fn accept(&mut self, record: ProductRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    /// File stem for this run, e.g. `output_20240501_134502`
    pub fn file_stem(&self) -> String {
        if self.timestamped {
            format!("{}_{}", self.basename, Local::now().format("%Y%m%d_%H%M%S"))
        } else {
            self.basename.clone()
        }
    }

    /// Writes all accumulated records, returning the files created
    ///
    /// With no records nothing is written and the list is empty.
    pub fn persist(&self) -> OutputResult<Vec<PathBuf>> {
        if self.records.is_empty() {
            tracing::info!("No records collected, nothing to save");
            return Ok(Vec::new());
        }

        std::fs::create_dir_all(&self.directory)?;
        let stem = self.file_stem();

        let mut saved = Vec::with_capacity(self.writers.len());
        for writer in &self.writers {
            let path = output_path(&self.directory, &stem, writer.extension());
            writer.write(&path, &self.records)?;
            tracing::info!("Saved {} records to {}", self.records.len(), path.display());
            saved.push(path);
        }

        Ok(saved)
    }
}

impl Extend<ProductRecord> for ResultSink {
    fn extend<I: IntoIterator<Item = ProductRecord>>(&mut self, iter: I) {
        self.records.extend(iter);
    }
}

fn output_path(directory: &Path, stem: &str, extension: &str) -> PathBuf {
    directory.join(format!("{}.{}", stem, extension))
}
