//! JSON-LD structured data embedded in product pages
//!
//! Blocks are parsed defensively: a block that is not valid JSON is counted
//! and skipped, the remaining blocks are still used.

use crate::extract::normalize_text;
use crate::extract::Field;
use scraper::{Html, Selector};
use serde_json::{Map, Value};

const PRODUCT_TYPES: &[&str] = &[
    "Product",
    "ProductGroup",
    "IndividualProduct",
    "ProductModel",
    "Bike",
    "Thing",
];

/// Product nodes and breadcrumb trails found in a page's JSON-LD blocks
#[derive(Debug, Clone, Default)]
pub struct StructuredData {
    products: Vec<Map<String, Value>>,
    breadcrumbs: Vec<Vec<String>>,
    malformed_blocks: usize,
}

impl StructuredData {
    /// Parses every `application/ld+json` script in the document
    pub fn from_document(document: &Html) -> Self {
        let mut data = Self::default();

        let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
            return data;
        };

        for script in document.select(&selector) {
            let raw = script.text().collect::<String>();
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }

            match serde_json::from_str::<Value>(raw) {
                Ok(value) => data.collect(value),
                Err(e) => {
                    tracing::debug!("Skipping malformed JSON-LD block: {}", e);
                    data.malformed_blocks += 1;
                }
            }
        }

        data
    }

    /// Number of blocks that failed to parse
    pub fn malformed_blocks(&self) -> usize {
        self.malformed_blocks
    }

    /// Breadcrumb trails, each as crumb names in position order
    pub fn breadcrumbs(&self) -> &[Vec<String>] {
        &self.breadcrumbs
    }

    /// First non-empty value for `field` across all product nodes
    pub fn product_value(&self, field: Field) -> Option<String> {
        self.products
            .iter()
            .find_map(|product| product_field(product, field))
    }

    fn collect(&mut self, value: Value) {
        match value {
            Value::Array(items) => items.into_iter().for_each(|item| self.collect(item)),
            Value::Object(mut map) => {
                if let Some(graph) = map.remove("@graph") {
                    self.collect(graph);
                }

                if has_type(&map, "BreadcrumbList") {
                    let trail = breadcrumb_trail(&map);
                    if !trail.is_empty() {
                        self.breadcrumbs.push(trail);
                    }
                } else if PRODUCT_TYPES.iter().any(|t| has_type(&map, t)) {
                    self.products.push(map);
                }
            }
            _ => {}
        }
    }
}

fn has_type(map: &Map<String, Value>, wanted: &str) -> bool {
    match map.get("@type") {
        Some(Value::String(t)) => t == wanted,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(wanted)),
        _ => false,
    }
}

fn breadcrumb_trail(map: &Map<String, Value>) -> Vec<String> {
    let Some(Value::Array(elements)) = map.get("itemListElement") else {
        return Vec::new();
    };

    let mut crumbs: Vec<(i64, String)> = elements
        .iter()
        .enumerate()
        .filter_map(|(index, element)| {
            let element = element.as_object()?;
            let position = element
                .get("position")
                .and_then(|p| p.as_i64().or_else(|| p.as_str()?.parse().ok()))
                .unwrap_or(index as i64);
            let name = element
                .get("name")
                .and_then(scalar_text)
                .or_else(|| {
                    element
                        .get("item")
                        .and_then(|item| item.get("name"))
                        .and_then(scalar_text)
                })?;
            Some((position, name))
        })
        .collect();

    crumbs.sort_by_key(|(position, _)| *position);
    crumbs.into_iter().map(|(_, name)| name).collect()
}

fn product_field(product: &Map<String, Value>, field: Field) -> Option<String> {
    match field {
        Field::Title => product.get("name").and_then(scalar_text),
        Field::Description => product.get("description").and_then(scalar_text),
        Field::Category => product.get("category").and_then(named_text),
        Field::Image => product.get("image").and_then(image_url),
        Field::Price => offer(product).and_then(offer_price),
        Field::Availability => offer(product)
            .and_then(|o| o.get("availability"))
            .and_then(scalar_text),
    }
}

/// First offer of a product; `offers` may be an object or a list
fn offer(product: &Map<String, Value>) -> Option<&Map<String, Value>> {
    match product.get("offers")? {
        Value::Array(offers) => offers.iter().find_map(Value::as_object),
        Value::Object(offer) => Some(offer),
        _ => None,
    }
}

fn offer_price(offer: &Map<String, Value>) -> Option<String> {
    let amount = offer
        .get("price")
        .or_else(|| offer.get("lowPrice"))
        .and_then(scalar_text)?;

    match offer.get("priceCurrency").and_then(scalar_text) {
        Some(currency) => Some(format!("{} {}", amount, currency)),
        None => Some(amount),
    }
}

fn image_url(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => items.iter().find_map(image_url),
        Value::Object(map) => map
            .get("url")
            .or_else(|| map.get("contentUrl"))
            .and_then(scalar_text),
        other => scalar_text(other),
    }
}

/// A string, or an object carrying a `name`
fn named_text(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => map.get("name").and_then(scalar_text),
        Value::Array(items) => items.iter().find_map(named_text),
        other => scalar_text(other),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => normalize_text(s),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
