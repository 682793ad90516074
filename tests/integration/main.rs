//! Integration tests for Catalog-Harvest
//!
//! These tests drive the full engine against wiremock servers.

mod crawl_tests;
mod output_tests;
mod support;
