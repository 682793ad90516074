//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `ProductRecord`: the merged, validated output unit
//! - `Availability`: stock status from a controlled vocabulary
//! - `CrawlState`: seen-set, accumulated records and page cursor of one crawl
//! - `CrawlStats`: diagnostic counters

mod crawl_state;
mod record;

// Re-export main types
pub use crawl_state::{CrawlState, CrawlStats};
pub use record::{Availability, ProductRecord, RecordError};
