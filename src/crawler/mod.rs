//! Crawler module for catalog traversal and product enrichment
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - Listing page parsing (product tiles and the next-page link)
//! - Product detail resolution
//! - Overall crawl coordination

mod coordinator;
mod debug;
mod detail;
mod fetcher;
mod listing;

pub use coordinator::{Coordinator, CrawlOutcome, CrawlReport, Termination};
pub use debug::HtmlDumper;
pub use detail::{DetailResolver, Enrichment, Resolution};
pub use fetcher::{
    build_http_client, FetchError, FetchFailure, FetchedPage, Fetcher, HttpTransport, RawResponse,
    RetryPolicy, Transport, TransportError,
};
pub use listing::{CatalogPage, ListingParser, Tile};
