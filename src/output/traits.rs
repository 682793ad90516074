//! Output writer traits and types
//!
//! This module defines the trait interface for record writers and the
//! column layout every tabular format shares.

use crate::state::ProductRecord;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Invalid delimiter '{0}': expected a single ASCII character")]
    Delimiter(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Column set shared by every output format, in order
pub const COLUMNS: [&str; 7] = [
    "title",
    "price",
    "link",
    "category",
    "image",
    "description",
    "in_stock",
];

/// One record as cells matching `COLUMNS`
///
/// Fields that were not requested become empty cells, so every format
/// carries the same column set regardless of configuration.
pub fn record_row(record: &ProductRecord) -> [String; 7] {
    [
        record.title.clone(),
        record.price.clone(),
        record.link.clone(),
        record.category.clone(),
        record.image.clone().unwrap_or_default(),
        record.description.clone().unwrap_or_default(),
        record
            .in_stock()
            .map(|in_stock| in_stock.to_string())
            .unwrap_or_default(),
    ]
}

/// Trait for tabular record writers
///
/// A writer receives the whole record sequence at once and produces one
/// file. Implementations must not reorder records.
pub trait RecordWriter: Send + Sync {
    /// File extension without the dot
    fn extension(&self) -> &'static str;

    /// Writes `records` to `path`, replacing any existing file
    ///
    /// # Arguments
    ///
    /// * `path` - Destination file
    /// * `records` - Records in output order
    fn write(&self, path: &Path, records: &[ProductRecord]) -> OutputResult<()>;
}
