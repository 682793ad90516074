use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

/// Main configuration structure for Catalog-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawl traversal configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// First listing page of the catalog (may carry a page-size query)
    pub start_url: String,

    /// Ceiling on concurrent product-page fetches
    #[serde(default = "default_max_workers")]
    pub max_workers: u32,

    /// Hard cap on listing pages; 0 means unlimited
    #[serde(default)]
    pub max_pages: u32,

    /// Fixed delay before each product fetch and between listing pages (milliseconds)
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// How long outstanding enrichment may keep running after an interrupt (milliseconds)
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl CrawlerConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Page limit as an option; `None` when unlimited
    pub fn page_limit(&self) -> Option<u32> {
        (self.max_pages > 0).then_some(self.max_pages)
    }
}

/// HTTP request configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FetchConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Retries after the first attempt for transient failures
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Linear backoff unit: retry k waits k × base
    #[serde(default = "default_retry_backoff_base_ms")]
    pub retry_backoff_base_ms: u64,
}

impl FetchConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn retry_backoff_base(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_base_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            request_timeout_ms: default_request_timeout_ms(),
            retry_count: default_retry_count(),
            retry_backoff_base_ms: default_retry_backoff_base_ms(),
        }
    }
}

/// Optional enrichment field resolved from the product page
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichField {
    Category,
    Image,
    Description,
    Availability,
}

impl fmt::Display for EnrichField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Category => "category",
            Self::Image => "image",
            Self::Description => "description",
            Self::Availability => "availability",
        };
        f.write_str(name)
    }
}

/// Which enrichment fields to resolve and whether to filter on stock
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EnrichmentConfig {
    /// Category is always resolved, whether listed here or not
    #[serde(default = "default_enrich_fields")]
    pub fields: BTreeSet<EnrichField>,

    #[serde(default)]
    pub filter_in_stock_only: bool,
}

impl EnrichmentConfig {
    /// Category is always wanted; availability is implied by the stock filter
    pub fn wants(&self, field: EnrichField) -> bool {
        match field {
            EnrichField::Category => true,
            EnrichField::Availability if self.filter_in_stock_only => true,
            _ => self.fields.contains(&field),
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            fields: default_enrich_fields(),
            filter_in_stock_only: false,
        }
    }
}

/// Maps a lowercase title prefix to a category label
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryKeyword {
    pub prefix: String,
    pub label: String,
}

/// Selector cascades and heuristics used by the listing parser and field extractor
///
/// Every `*-selectors` list is tried in order; the first entry is the
/// current template, later entries are legacy template variants.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ExtractionConfig {
    pub tile_selectors: Vec<String>,
    pub tile_title_selectors: Vec<String>,
    pub tile_price_selectors: Vec<String>,
    pub next_page_selectors: Vec<String>,
    pub product_path_keywords: Vec<String>,

    pub title_selectors: Vec<String>,
    pub price_selectors: Vec<String>,
    pub image_selectors: Vec<String>,
    pub description_selectors: Vec<String>,
    pub availability_selectors: Vec<String>,
    pub breadcrumb_selectors: Vec<String>,

    /// Breadcrumb trail starts with a "home" crumb that must be stripped
    pub breadcrumb_includes_home: bool,
    /// Breadcrumb trail ends with the product itself, which must be stripped
    pub breadcrumb_includes_leaf: bool,
    pub category_separator: String,
    pub category_keywords: Vec<CategoryKeyword>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            tile_selectors: strings(&[
                "div.product-wrapper",
                ".product-miniature",
                "article.product",
                "li.product",
                "div.product",
                "div.js-product",
                "[data-id-product]",
            ]),
            tile_title_selectors: strings(&[
                "a.product-name",
                ".product-title a",
                ".product-title",
                "h2 a",
                "h3 a",
            ]),
            tile_price_selectors: strings(&["span.price", ".product-price", ".price"]),
            next_page_selectors: strings(&[
                "a[rel=\"next\"]",
                ".pagination-next a",
                ".next a",
                "link[rel=\"next\"]",
            ]),
            product_path_keywords: strings(&["/rower", "/produkt", "/product"]),
            title_selectors: strings(&["h1.product-name", "h1[itemprop='name']", "h1"]),
            price_selectors: strings(&[
                ".current-price",
                ".product-prices .price",
                "span[itemprop='price']",
                ".price",
            ]),
            image_selectors: strings(&[
                "img.js-qv-product-cover",
                ".product-cover img",
                "img[itemprop='image']",
                "meta[property=\"og:image\"]",
            ]),
            description_selectors: strings(&[
                "#description",
                ".product-description",
                "[itemprop='description']",
            ]),
            availability_selectors: strings(&[
                "link[itemprop='availability']",
                "meta[itemprop='availability']",
            ]),
            breadcrumb_selectors: strings(&[
                "nav.breadcrumb li",
                "ol.breadcrumb li",
                ".breadcrumbs li",
                "[itemtype*='BreadcrumbList'] [itemprop='itemListElement']",
            ]),
            breadcrumb_includes_home: true,
            breadcrumb_includes_leaf: true,
            category_separator: " > ".to_string(),
            category_keywords: default_category_keywords(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: String,

    /// File stem shared by the CSV and XLSX outputs
    #[serde(default = "default_output_basename")]
    pub basename: String,

    /// Append a `_YYYYmmdd_HHMMSS` suffix so runs never clobber each other
    #[serde(default = "default_true")]
    pub timestamped: bool,

    /// Field delimiter for the text output
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Directory for raw HTML dumps of fetched pages
    #[serde(default)]
    pub debug_html_dir: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            basename: default_output_basename(),
            timestamped: true,
            delimiter: default_delimiter(),
            debug_html_dir: None,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_max_workers() -> u32 {
    8
}

fn default_request_delay_ms() -> u64 {
    500
}

fn default_shutdown_grace_ms() -> u64 {
    2000
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
        .to_string()
}

fn default_accept_language() -> String {
    "pl,en;q=0.9".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_base_ms() -> u64 {
    1200
}

fn default_enrich_fields() -> BTreeSet<EnrichField> {
    [
        EnrichField::Category,
        EnrichField::Image,
        EnrichField::Description,
    ]
    .into_iter()
    .collect()
}

fn default_category_keywords() -> Vec<CategoryKeyword> {
    [
        ("gravel", "Rowery gravel"),
        ("mtb", "Rowery MTB"),
        ("szos", "Rowery szosowe"),
        ("trekking", "Rowery trekkingowe"),
        ("cross", "Rowery crossowe"),
        ("miejsk", "Rowery miejskie"),
        ("elektryczn", "Rowery elektryczne"),
        ("dzieci", "Rowery dziecięce"),
    ]
    .into_iter()
    .map(|(prefix, label)| CategoryKeyword {
        prefix: prefix.to_string(),
        label: label.to_string(),
    })
    .collect()
}

fn default_output_directory() -> String {
    ".".to_string()
}

fn default_output_basename() -> String {
    "output".to_string()
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_true() -> bool {
    true
}
