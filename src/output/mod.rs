//! Output module for persisting crawl results
//!
//! This module handles:
//! - Writing product records as delimited text and as a spreadsheet
//! - Accumulating records and naming output files per run
//! - Printing end-of-run statistics

mod csv_writer;
mod sink;
pub mod stats;
mod traits;
mod xlsx_writer;

pub use csv_writer::CsvWriter;
pub use sink::ResultSink;
pub use stats::{format_statistics, print_statistics};
pub use traits::{record_row, OutputError, OutputResult, RecordWriter, COLUMNS};
pub use xlsx_writer::XlsxWriter;
