use crate::state::ProductRecord;
use crate::url::ProductRef;
use std::collections::HashSet;
use url::Url;

/// Counters describing what happened during a crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Listing pages fetched and parsed
    pub pages_fetched: u32,

    /// Product links found on listing pages (after per-page dedup)
    pub links_discovered: u64,

    /// Links dropped because an earlier page already listed them
    pub duplicates_dropped: u64,

    /// Links pointing away from the catalog's host
    pub offsite_ignored: u64,

    /// Products whose detail page could not be fetched
    pub products_skipped: u64,

    /// Records rejected for a missing title
    pub records_dropped: u64,

    /// Records excluded by the in-stock filter
    pub records_filtered: u64,

    /// Records accepted into the output
    pub records_kept: u64,
}

/// State owned by the coordinator for one crawl invocation
///
/// Only the coordinator's control flow mutates this; workers hand their
/// results back over a channel and never touch it directly.
#[derive(Debug)]
pub struct CrawlState {
    seen: HashSet<ProductRef>,
    visited_pages: HashSet<String>,
    records: Vec<ProductRecord>,
    cursor: Option<Url>,
    page_index: u32,
    pub stats: CrawlStats,
}

impl CrawlState {
    /// Creates the initial state with the cursor on the first listing page
    pub fn new(start_url: Url) -> Self {
        Self {
            seen: HashSet::new(),
            visited_pages: HashSet::new(),
            records: Vec::new(),
            cursor: Some(start_url),
            page_index: 0,
            stats: CrawlStats::default(),
        }
    }

    /// The listing page to fetch next, if any
    pub fn cursor(&self) -> Option<&Url> {
        self.cursor.as_ref()
    }

    /// Number of listing pages entered so far
    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    /// Records the current cursor as visited and returns its 1-based page number
    pub fn enter_page(&mut self) -> u32 {
        if let Some(url) = &self.cursor {
            self.visited_pages.insert(url.as_str().to_string());
        }
        self.page_index += 1;
        self.page_index
    }

    /// Returns true if `url` has already been fetched as a listing page
    pub fn page_visited(&self, url: &Url) -> bool {
        self.visited_pages.contains(url.as_str())
    }

    /// Moves the cursor to the next listing page (or past the last one)
    pub fn advance(&mut self, next: Option<Url>) {
        self.cursor = next;
    }

    /// Claims a product for this crawl; false if it was already seen
    pub fn claim(&mut self, product: &ProductRef) -> bool {
        self.seen.insert(product.clone())
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Appends a validated record
    pub fn accept(&mut self, record: ProductRecord) {
        self.stats.records_kept += 1;
        self.records.push(record);
    }

    /// Consumes the state, yielding the accumulated records and counters
    pub fn into_parts(self) -> (Vec<ProductRecord>, CrawlStats) {
        (self.records, self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> Url {
        Url::parse("https://shop.example.com/rowery?page=1").unwrap()
    }

    fn product(path: &str) -> ProductRef {
        ProductRef::new(&start().join(path).unwrap()).unwrap()
    }

    #[test]
    fn test_claim_is_global_across_pages() {
        let mut state = CrawlState::new(start());
        assert!(state.claim(&product("/produkt/1")));
        assert!(state.claim(&product("/produkt/2")));
        assert!(!state.claim(&product("/produkt/1/")));
        assert_eq!(state.seen_count(), 2);
    }

    #[test]
    fn test_page_tracking() {
        let mut state = CrawlState::new(start());
        assert_eq!(state.enter_page(), 1);
        assert!(state.page_visited(&start()));

        let next = Url::parse("https://shop.example.com/rowery?page=2").unwrap();
        assert!(!state.page_visited(&next));
        state.advance(Some(next.clone()));
        assert_eq!(state.cursor(), Some(&next));
        assert_eq!(state.enter_page(), 2);

        state.advance(None);
        assert!(state.cursor().is_none());
        assert_eq!(state.page_index(), 2);
    }

    #[test]
    fn test_accept_counts_records() {
        let mut state = CrawlState::new(start());
        state.accept(ProductRecord::new("Bike X", "999 zł", "https://shop.example.com/p/1").unwrap());

        let (records, stats) = state.into_parts();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Bike X");
        assert_eq!(stats.records_kept, 1);
    }
}
