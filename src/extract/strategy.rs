//! Extraction strategies
//!
//! Each strategy is one way of finding a field on a page. They share a single
//! signature so a field's cascade is just an ordered list of them.

use crate::config::CategoryKeyword;
use crate::extract::{element_text, normalize_text, Field, StructuredData};
use scraper::{Html, Selector};
use std::cell::OnceCell;
use url::Url;

/// A parsed page plus lazily parsed structured data
///
/// JSON-LD is only parsed when a strategy first asks for it, and at most once
/// per page.
pub struct PageContext<'a> {
    document: &'a Html,
    url: &'a Url,
    structured: OnceCell<StructuredData>,
}

impl<'a> PageContext<'a> {
    pub fn new(document: &'a Html, url: &'a Url) -> Self {
        Self {
            document,
            url,
            structured: OnceCell::new(),
        }
    }

    pub fn document(&self) -> &'a Html {
        self.document
    }

    pub fn url(&self) -> &'a Url {
        self.url
    }

    pub fn structured(&self) -> &StructuredData {
        self.structured
            .get_or_init(|| StructuredData::from_document(self.document))
    }
}

/// One step of a field's extraction cascade
pub trait Strategy: Send + Sync {
    /// Short label used in trace logs
    fn name(&self) -> &str;

    /// Returns a non-empty normalized value, or None to fall through
    fn extract(&self, page: &PageContext<'_>) -> Option<String>;
}

/// Value of the first element matching a CSS selector
///
/// For each match the listed attributes are tried in order, then the
/// element's text content.
pub struct SelectorStrategy {
    label: String,
    selector: Selector,
    attributes: Vec<&'static str>,
}

impl SelectorStrategy {
    pub fn new(label: impl Into<String>, selector: Selector) -> Self {
        Self {
            label: label.into(),
            selector,
            attributes: Vec::new(),
        }
    }

    /// Prefers these attributes over text content
    pub fn with_attributes(mut self, attributes: &[&'static str]) -> Self {
        self.attributes = attributes.to_vec();
        self
    }
}

impl Strategy for SelectorStrategy {
    fn name(&self) -> &str {
        &self.label
    }

    fn extract(&self, page: &PageContext<'_>) -> Option<String> {
        page.document().select(&self.selector).find_map(|element| {
            let from_attr = self.attributes.iter().find_map(|attr| {
                element
                    .value()
                    .attr(attr)
                    .map(normalize_text)
                    .filter(|v| !v.is_empty())
            });
            let value = from_attr.unwrap_or_else(|| element_text(&element));
            (!value.is_empty()).then_some(value)
        })
    }
}

/// Which crumbs of a breadcrumb trail are not part of the category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrumbPolicy {
    /// First crumb is the site root ("Home")
    pub includes_home: bool,
    /// Last crumb is the product itself
    pub includes_leaf: bool,
    pub separator: String,
}

impl CrumbPolicy {
    /// Joins the crumbs between root and leaf; None if nothing is left
    pub fn category(&self, crumbs: &[String]) -> Option<String> {
        let mut inner = crumbs;
        if self.includes_leaf {
            inner = inner.split_last().map(|(_, rest)| rest).unwrap_or_default();
        }
        if self.includes_home {
            inner = inner.split_first().map(|(_, rest)| rest).unwrap_or_default();
        }

        let joined = inner
            .iter()
            .map(|crumb| crumb.as_str())
            .filter(|crumb| !crumb.is_empty())
            .collect::<Vec<_>>()
            .join(&self.separator);
        (!joined.is_empty()).then_some(joined)
    }
}

/// Category from an HTML breadcrumb trail
pub struct BreadcrumbStrategy {
    label: String,
    selector: Selector,
    policy: CrumbPolicy,
}

impl BreadcrumbStrategy {
    pub fn new(label: impl Into<String>, selector: Selector, policy: CrumbPolicy) -> Self {
        Self {
            label: label.into(),
            selector,
            policy,
        }
    }
}

impl Strategy for BreadcrumbStrategy {
    fn name(&self) -> &str {
        &self.label
    }

    fn extract(&self, page: &PageContext<'_>) -> Option<String> {
        let crumbs: Vec<String> = page
            .document()
            .select(&self.selector)
            .map(|element| {
                let text = element_text(&element);
                normalize_text(text.trim_matches(|c| matches!(c, '>' | '/' | '»' | '›' | '|')))
            })
            .filter(|crumb| !crumb.is_empty())
            .collect();

        if crumbs.is_empty() {
            return None;
        }
        self.policy.category(&crumbs)
    }
}

enum StructuredSource {
    Product(Field),
    Breadcrumbs(CrumbPolicy),
}

/// Field value from embedded JSON-LD
pub struct StructuredDataStrategy {
    label: String,
    source: StructuredSource,
}

impl StructuredDataStrategy {
    /// Reads `field` from the first product node that has it
    pub fn product(field: Field) -> Self {
        Self {
            label: format!("json-ld:{}", field),
            source: StructuredSource::Product(field),
        }
    }

    /// Category from a JSON-LD `BreadcrumbList`
    pub fn breadcrumbs(policy: CrumbPolicy) -> Self {
        Self {
            label: "json-ld:breadcrumbs".to_string(),
            source: StructuredSource::Breadcrumbs(policy),
        }
    }
}

impl Strategy for StructuredDataStrategy {
    fn name(&self) -> &str {
        &self.label
    }

    fn extract(&self, page: &PageContext<'_>) -> Option<String> {
        let data = page.structured();
        match &self.source {
            StructuredSource::Product(field) => data.product_value(*field),
            StructuredSource::Breadcrumbs(policy) => data
                .breadcrumbs()
                .iter()
                .find_map(|trail| policy.category(trail)),
        }
    }
}

/// Category guessed from words of the page title
///
/// A keyword matches when any word of the `<title>` or main heading starts
/// with its prefix (case-insensitive). Keywords are tried in order.
pub struct KeywordStrategy {
    label: String,
    headings: Vec<Selector>,
    keywords: Vec<CategoryKeyword>,
}

impl KeywordStrategy {
    pub fn new(headings: Vec<Selector>, keywords: Vec<CategoryKeyword>) -> Self {
        Self {
            label: "keyword-heuristic".to_string(),
            headings,
            keywords,
        }
    }

    fn page_titles(&self, document: &Html) -> Vec<String> {
        let mut titles = Vec::new();
        if let Ok(title) = Selector::parse("title") {
            titles.extend(document.select(&title).map(|el| element_text(&el)));
        }
        titles.extend(
            self.headings
                .iter()
                .filter_map(|selector| document.select(selector).next())
                .map(|el| element_text(&el)),
        );
        titles
    }
}

impl Strategy for KeywordStrategy {
    fn name(&self) -> &str {
        &self.label
    }

    fn extract(&self, page: &PageContext<'_>) -> Option<String> {
        if self.keywords.is_empty() {
            return None;
        }

        let titles = self.page_titles(page.document()).join(" ").to_lowercase();
        let words: Vec<&str> = titles
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        self.keywords
            .iter()
            .find(|keyword| {
                let prefix = keyword.prefix.trim().to_lowercase();
                words.iter().any(|word| word.starts_with(&prefix))
            })
            .map(|keyword| normalize_text(&keyword.label))
    }
}
