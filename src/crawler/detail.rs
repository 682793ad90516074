//! Product detail resolver
//!
//! Fetches a product page and runs the field extractor for the enrichment
//! fields the configuration asks for. A product page that cannot be fetched
//! yields `Resolution::Skipped`; it never fails the crawl.

use crate::config::{EnrichField, EnrichmentConfig};
use crate::crawler::debug::HtmlDumper;
use crate::crawler::fetcher::{FetchError, FetchedPage, Fetcher};
use crate::extract::{Field, FieldExtractor, PageContext};
use crate::state::Availability;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Fields resolved from a product page
///
/// Optional fields are `None` when the configuration did not request them,
/// and `Some("")` when requested but not found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
    pub category: String,
    /// Only used when the listing tile had no price
    pub price: String,
    pub image: Option<String>,
    pub description: Option<String>,
    pub availability: Option<Availability>,
}

impl Enrichment {
    /// Enrichment for a product whose page could not be fetched
    pub fn empty(config: &EnrichmentConfig) -> Self {
        let requested = |field| config.wants(field).then(String::new);
        Self {
            category: String::new(),
            price: String::new(),
            image: requested(EnrichField::Image),
            description: requested(EnrichField::Description),
            availability: config
                .wants(EnrichField::Availability)
                .then_some(Availability::Unknown),
        }
    }
}

/// Outcome of resolving one product link
#[derive(Debug, Clone)]
pub enum Resolution {
    Enriched(Enrichment),
    Skipped(FetchError),
}

/// Resolves enrichment fields for product links
pub struct DetailResolver {
    fetcher: Arc<Fetcher>,
    extractor: Arc<FieldExtractor>,
    enrichment: EnrichmentConfig,
    delay: Duration,
    dumper: HtmlDumper,
}

impl DetailResolver {
    /// Creates a resolver
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Shared fetcher (retry policy included)
    /// * `extractor` - Field cascades compiled from configuration
    /// * `enrichment` - Which optional fields to resolve
    /// * `delay` - Politeness delay slept before every product fetch
    pub fn new(
        fetcher: Arc<Fetcher>,
        extractor: Arc<FieldExtractor>,
        enrichment: EnrichmentConfig,
        delay: Duration,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            enrichment,
            delay,
            dumper: HtmlDumper::default(),
        }
    }

    pub fn with_dumper(mut self, dumper: HtmlDumper) -> Self {
        self.dumper = dumper;
        self
    }

    pub fn enrichment_config(&self) -> &EnrichmentConfig {
        &self.enrichment
    }

    /// Fetches `link` and extracts its enrichment fields
    ///
    /// When `dump_as` is set and HTML dumping is enabled, the raw page is
    /// saved under that file name.
    pub async fn resolve(&self, link: &Url, dump_as: Option<&str>) -> Resolution {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let page = match self.fetcher.fetch(link).await {
            Ok(page) => page,
            Err(e) => return Resolution::Skipped(e),
        };

        if let Some(name) = dump_as {
            self.dumper.dump(name, &page.body).await;
        }

        Resolution::Enriched(self.extract(&page))
    }

    /// Runs the requested cascades over a fetched product page
    pub fn extract(&self, page: &FetchedPage) -> Enrichment {
        let document = page.document();
        let context = PageContext::new(&document, &page.final_url);
        let wanted = |field: EnrichField, target: Field| {
            self.enrichment
                .wants(field)
                .then(|| self.extractor.extract(&context, target))
        };

        let availability = wanted(EnrichField::Availability, Field::Availability).map(|code| {
            if code.is_empty() {
                Availability::Unknown
            } else {
                Availability::from_code(&code)
            }
        });

        Enrichment {
            category: self.extractor.extract(&context, Field::Category),
            price: self.extractor.extract(&context, Field::Price),
            image: wanted(EnrichField::Image, Field::Image),
            description: wanted(EnrichField::Description, Field::Description),
            availability,
        }
    }
}
