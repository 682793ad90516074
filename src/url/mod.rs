//! URL handling module for Catalog-Harvest
//!
//! This module provides product-identity normalization, link resolution,
//! the product-path heuristic and host extraction.

mod domain;
mod links;
mod normalize;

use std::fmt;
use url::Url;

// Re-export main functions
pub use domain::{extract_domain, is_same_site};
pub use links::{is_product_link, resolve_link};
pub use normalize::normalize_url;

/// A normalized, absolute product URL discovered on a listing page
///
/// Two refs are the same product exactly when their normalized URL strings
/// are equal; the crawl-wide seen-set is keyed on this identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductRef(Url);

impl ProductRef {
    /// Normalizes `url` into a product identity
    pub fn new(url: &Url) -> crate::UrlResult<Self> {
        normalize_url(url.as_str()).map(Self)
    }

    pub fn url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ProductRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}
