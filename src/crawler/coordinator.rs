//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the page loop that coordinates the whole crawl:
//! - Fetching listing pages one at a time and following "next" links
//! - Dropping product links already seen earlier in the crawl
//! - Fanning product enrichment out to a bounded worker pool
//! - Merging tiles with enrichment into records, in page order
//! - Stopping on interrupt while keeping every completed record
//!
//! `CrawlState` lives on the coordinator's own control flow. Workers only
//! send their `Resolution` back over a channel.

use crate::config::Config;
use crate::crawler::debug::HtmlDumper;
use crate::crawler::detail::{DetailResolver, Enrichment, Resolution};
use crate::crawler::fetcher::{FetchError, FetchedPage, Fetcher, RetryPolicy, Transport};
use crate::crawler::listing::{CatalogPage, ListingParser, Tile};
use crate::extract::FieldExtractor;
use crate::state::{CrawlState, CrawlStats, ProductRecord};
use crate::url::ProductRef;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Why pagination ended normally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// A listing page had no product links
    NoItems,
    /// The last page had no "next" control
    NoNextPage,
    /// The configured page cap was reached
    PageLimit,
    /// The "next" link pointed back at a page already crawled
    PageLoop,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::NoItems => "page without products",
            Self::NoNextPage => "no next page",
            Self::PageLimit => "page limit reached",
            Self::PageLoop => "next link loops back",
        };
        f.write_str(reason)
    }
}

/// How a crawl ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlOutcome {
    Completed(Termination),
    /// Stopped by an external interrupt
    Interrupted,
    /// A listing page could not be fetched; pagination stopped there
    ListingFailed(FetchError),
}

impl CrawlOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

impl fmt::Display for CrawlOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed(reason) => write!(f, "completed ({})", reason),
            Self::Interrupted => f.write_str("interrupted"),
            Self::ListingFailed(e) => write!(f, "stopped: {}", e),
        }
    }
}

/// Everything a finished crawl hands to the caller
#[derive(Debug)]
pub struct CrawlReport {
    /// Accepted records, page by page in tile order
    pub records: Vec<ProductRecord>,
    pub stats: CrawlStats,
    pub outcome: CrawlOutcome,
    pub elapsed: Duration,
}

impl CrawlReport {
    /// Process exit status for this crawl
    ///
    /// | Outcome | Records | Code |
    /// |---------|---------|------|
    /// | Completed | any | 0 |
    /// | Interrupted / listing failure | some | 2 |
    /// | Interrupted / listing failure | none | 1 |
    pub fn exit_code(&self) -> u8 {
        match (&self.outcome, self.records.is_empty()) {
            (CrawlOutcome::Completed(_), _) => 0,
            (_, false) => 2,
            (_, true) => 1,
        }
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    start_url: Url,
    fetcher: Arc<Fetcher>,
    listing: ListingParser,
    resolver: Arc<DetailResolver>,
    dumper: HtmlDumper,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a coordinator that fetches over HTTP
    ///
    /// # Arguments
    ///
    /// * `config` - The validated crawler configuration
    /// * `cancel` - Cancelled on external interrupt
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(HarvestError)` - Bad start URL, selector, or HTTP client setup
    pub fn new(config: Config, cancel: CancellationToken) -> crate::Result<Self> {
        let fetcher = Fetcher::from_config(&config.fetch)?;
        Self::build(config, fetcher, cancel)
    }

    /// Creates a coordinator on top of a custom transport
    pub fn with_transport(
        config: Config,
        transport: Arc<dyn Transport>,
        cancel: CancellationToken,
    ) -> crate::Result<Self> {
        let fetcher = Fetcher::new(transport, RetryPolicy::from_config(&config.fetch));
        Self::build(config, fetcher, cancel)
    }

    fn build(config: Config, fetcher: Fetcher, cancel: CancellationToken) -> crate::Result<Self> {
        let start_url = Url::parse(&config.crawler.start_url)?;
        let listing = ListingParser::from_config(&config.extraction, start_url.clone())?;
        let extractor = FieldExtractor::from_config(&config.extraction)?;
        let dumper = HtmlDumper::new(config.output.debug_html_dir.as_deref());
        let fetcher = Arc::new(fetcher);

        let resolver = DetailResolver::new(
            fetcher.clone(),
            Arc::new(extractor),
            config.enrichment.clone(),
            config.crawler.request_delay(),
        )
        .with_dumper(dumper.clone());

        Ok(Self {
            config: Arc::new(config),
            start_url,
            fetcher,
            listing,
            resolver: Arc::new(resolver),
            dumper,
            cancel,
        })
    }

    /// Runs the page loop until pagination ends, a listing page fails, or
    /// the cancellation token fires
    ///
    /// Never fails: every way of stopping is a `CrawlOutcome`, and the report
    /// always carries the records merged so far.
    pub async fn run(&self) -> CrawlReport {
        let started = Instant::now();
        let mut state = CrawlState::new(self.start_url.clone());

        tracing::info!(
            "Starting crawl at {} with {} workers",
            self.start_url,
            self.config.crawler.max_workers
        );

        let outcome = self.crawl_pages(&mut state).await;
        let (records, stats) = state.into_parts();
        let elapsed = started.elapsed();

        tracing::info!(
            "Crawl {}: {} records from {} pages in {:?}",
            outcome,
            records.len(),
            stats.pages_fetched,
            elapsed
        );

        CrawlReport {
            records,
            stats,
            outcome,
            elapsed,
        }
    }

    async fn crawl_pages(&self, state: &mut CrawlState) -> CrawlOutcome {
        loop {
            let Some(page_url) = state.cursor().cloned() else {
                return CrawlOutcome::Completed(Termination::NoNextPage);
            };

            if let Some(limit) = self.config.crawler.page_limit() {
                if state.page_index() >= limit {
                    tracing::info!("Reached page limit of {}", limit);
                    return CrawlOutcome::Completed(Termination::PageLimit);
                }
            }

            if state.page_index() > 0 && !self.pause_between_pages().await {
                return CrawlOutcome::Interrupted;
            }

            let page_number = state.enter_page();
            tracing::debug!("Fetching listing page {}: {}", page_number, page_url);

            let fetched = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return CrawlOutcome::Interrupted,
                result = self.fetcher.fetch(&page_url) => result,
            };

            let fetched = match fetched {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!("Listing page {} failed, stopping: {}", page_number, e);
                    return CrawlOutcome::ListingFailed(e);
                }
            };

            self.dumper
                .dump(&HtmlDumper::listing_name(page_number), &fetched.body)
                .await;

            let catalog = self.parse_listing(&fetched);
            state.stats.pages_fetched += 1;
            state.stats.offsite_ignored += catalog.offsite_ignored;
            state.stats.links_discovered += catalog.tiles.len() as u64;

            tracing::info!(
                "Page {}: {} ({} items)",
                page_number,
                page_url,
                catalog.tiles.len()
            );

            if catalog.is_empty() {
                tracing::info!("No products on page {}, nothing more to scrape", page_number);
                return CrawlOutcome::Completed(Termination::NoItems);
            }

            let fresh = claim_new(state, catalog.tiles);
            if self.enrich_page(state, page_number, fresh).await {
                return CrawlOutcome::Interrupted;
            }

            match catalog.next_page {
                None => {
                    state.advance(None);
                    return CrawlOutcome::Completed(Termination::NoNextPage);
                }
                Some(next) if state.page_visited(&next) => {
                    tracing::warn!("Next link {} was already crawled, stopping", next);
                    return CrawlOutcome::Completed(Termination::PageLoop);
                }
                Some(next) => state.advance(Some(next)),
            }
        }
    }

    /// Parses a listing page without holding the document across an await
    fn parse_listing(&self, page: &FetchedPage) -> CatalogPage {
        let document = page.document();
        self.listing.parse_page(&document, &page.final_url)
    }

    /// Sleeps the politeness delay; false if interrupted meanwhile
    async fn pause_between_pages(&self) -> bool {
        let delay = self.config.crawler.request_delay();
        if delay.is_zero() {
            return !self.cancel.is_cancelled();
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }

    /// Enriches one page's new products and merges them into `state`
    ///
    /// Returns true if the crawl was interrupted. On interrupt, results that
    /// arrive within the shutdown grace window are still merged; the rest of
    /// the page's workers are aborted.
    async fn enrich_page(
        &self,
        state: &mut CrawlState,
        page_number: u32,
        products: Vec<(ProductRef, Tile)>,
    ) -> bool {
        if products.is_empty() {
            tracing::debug!("Page {} listed only known products", page_number);
            return self.cancel.is_cancelled();
        }

        let semaphore = Arc::new(Semaphore::new(self.config.crawler.max_workers as usize));
        let (tx, mut rx) = mpsc::unbounded_channel::<(usize, Resolution)>();
        let mut workers = JoinSet::new();

        for (index, (_, tile)) in products.iter().enumerate() {
            let semaphore = semaphore.clone();
            let resolver = self.resolver.clone();
            let tx = tx.clone();
            let link = tile.link.clone();
            let dump_as = self
                .dumper
                .is_enabled()
                .then(|| HtmlDumper::product_name(page_number, index))
                .flatten();

            workers.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                let resolution = resolver.resolve(&link, dump_as.as_deref()).await;
                let _ = tx.send((index, resolution));
            });
        }
        drop(tx);

        let mut results: Vec<Option<Resolution>> = (0..products.len()).map(|_| None).collect();
        let mut interrupted = false;

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    interrupted = true;
                    break;
                }
                received = rx.recv() => match received {
                    Some((index, resolution)) => results[index] = Some(resolution),
                    None => break,
                },
            }
        }

        if interrupted {
            let grace = self.config.crawler.shutdown_grace();
            tracing::warn!(
                "Interrupted, waiting up to {:?} for {} outstanding products",
                grace,
                results.iter().filter(|r| r.is_none()).count()
            );

            let deadline = tokio::time::sleep(grace);
            tokio::pin!(deadline);
            loop {
                tokio::select! {
                    _ = &mut deadline => break,
                    received = rx.recv() => match received {
                        Some((index, resolution)) => results[index] = Some(resolution),
                        None => break,
                    },
                }
            }
            // Results already queued when the deadline fired still count
            while let Ok((index, resolution)) = rx.try_recv() {
                results[index] = Some(resolution);
            }
            workers.abort_all();
        }

        for ((product, tile), result) in products.into_iter().zip(results) {
            match result {
                Some(Resolution::Enriched(enrichment)) => {
                    self.merge(state, product, tile, enrichment)
                }
                Some(Resolution::Skipped(e)) => {
                    tracing::warn!("Skipping product page: {}", e);
                    state.stats.products_skipped += 1;
                    let empty = Enrichment::empty(self.resolver.enrichment_config());
                    self.merge(state, product, tile, empty);
                }
                None => tracing::debug!("Abandoned {}", product),
            }
        }

        interrupted
    }

    /// Combines tile and enrichment into a record and accepts it into state
    fn merge(&self, state: &mut CrawlState, product: ProductRef, tile: Tile, enrichment: Enrichment) {
        let price = if tile.price.is_empty() {
            enrichment.price
        } else {
            tile.price
        };

        let mut record = match ProductRecord::new(tile.title, price, product.to_string()) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Dropping record: {}", e);
                state.stats.records_dropped += 1;
                return;
            }
        };

        record.category = enrichment.category;
        record.image = enrichment.image;
        record.description = enrichment.description;
        record.availability = enrichment.availability;

        if self.config.enrichment.filter_in_stock_only && record.in_stock() != Some(true) {
            tracing::debug!("Filtered out-of-stock product {}", record.link);
            state.stats.records_filtered += 1;
            return;
        }

        state.accept(record);
    }
}

/// Claims this page's products in the crawl-wide seen set, keeping page order
fn claim_new(state: &mut CrawlState, tiles: Vec<Tile>) -> Vec<(ProductRef, Tile)> {
    let mut fresh = Vec::with_capacity(tiles.len());
    for tile in tiles {
        let product = match ProductRef::new(&tile.link) {
            Ok(product) => product,
            Err(e) => {
                tracing::debug!("Ignoring unusable link {}: {}", tile.link, e);
                continue;
            }
        };

        if state.claim(&product) {
            fresh.push((product, tile));
        } else {
            tracing::debug!("Already seen {}", product);
            state.stats.duplicates_dropped += 1;
        }
    }
    fresh
}
