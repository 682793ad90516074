//! Field extraction for product and listing pages
//!
//! Every field is resolved by an ordered cascade of strategies:
//! the current template's selector, legacy template selectors, embedded
//! JSON-LD structured data, and (for category only) a keyword heuristic
//! over the page title. The first strategy that yields a non-empty,
//! whitespace-normalized value wins; a field nobody can find is the empty
//! string, never an error.

mod extractor;
mod strategy;
mod structured;
mod text;

pub use extractor::FieldExtractor;
pub use strategy::{
    BreadcrumbStrategy, CrumbPolicy, KeywordStrategy, PageContext, SelectorStrategy, Strategy,
    StructuredDataStrategy,
};
pub use structured::StructuredData;
pub use text::{element_text, normalize_text};

use crate::ConfigError;
use scraper::Selector;
use std::fmt;

/// A product field the extractor knows how to find
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Title,
    Price,
    Image,
    Description,
    Category,
    Availability,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Title => "title",
            Self::Price => "price",
            Self::Image => "image",
            Self::Description => "description",
            Self::Category => "category",
            Self::Availability => "availability",
        };
        f.write_str(name)
    }
}

/// Compiles a CSS selector, mapping failures to a configuration error
pub(crate) fn compile_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// Compiles an ordered list of CSS selectors
pub(crate) fn compile_selectors(selectors: &[String]) -> Result<Vec<Selector>, ConfigError> {
    selectors.iter().map(|s| compile_selector(s)).collect()
}
