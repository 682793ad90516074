//! End-of-run statistics
//!
//! This module renders the crawl counters, the outcome and the elapsed
//! wall-clock time for the terminal.

use crate::crawler::CrawlReport;
use std::fmt::Write;

/// Renders the statistics block for a finished crawl
///
/// # Arguments
///
/// * `report` - The finished crawl
/// * `saved` - Number of records written to output
pub fn format_statistics(report: &CrawlReport, saved: usize) -> String {
    let stats = &report.stats;
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(out, "=== Crawl Statistics ===\n");
    let _ = writeln!(out, "Outcome: {}", report.outcome);
    let _ = writeln!(out, "  Listing pages fetched: {}", stats.pages_fetched);
    let _ = writeln!(out, "  Product links found: {}", stats.links_discovered);
    let _ = writeln!(out, "  Duplicates dropped: {}", stats.duplicates_dropped);
    if stats.offsite_ignored > 0 {
        let _ = writeln!(out, "  Off-site links ignored: {}", stats.offsite_ignored);
    }
    let _ = writeln!(out, "  Product pages skipped: {}", stats.products_skipped);
    let _ = writeln!(out, "  Records without title: {}", stats.records_dropped);
    if stats.records_filtered > 0 {
        let _ = writeln!(out, "  Filtered (not in stock): {}", stats.records_filtered);
    }
    let _ = writeln!(out);

    let elapsed = report.elapsed.as_secs_f64();
    let rate = if elapsed > 0.0 {
        stats.records_kept as f64 / elapsed
    } else {
        0.0
    };
    let _ = writeln!(
        out,
        "Saved {} records in {:.1}s ({:.2} records/sec)",
        saved, elapsed, rate
    );

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(report: &CrawlReport, saved: usize) {
    print!("{}", format_statistics(report, saved));
}
