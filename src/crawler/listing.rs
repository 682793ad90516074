//! Listing page parser
//!
//! This module turns one catalog page into:
//! - An ordered list of product tiles (link plus the cheap title/price)
//! - The URL of the next listing page, if the page has a "next" control

use crate::config::ExtractionConfig;
use crate::extract::{compile_selector, compile_selectors, element_text, normalize_text};
use crate::url::{is_product_link, is_same_site, resolve_link, ProductRef};
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Compact per-item data scraped straight from a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    /// Absolute product URL as it appeared on the page
    pub link: Url,
    /// Empty when the tile had no title element
    pub title: String,
    /// Raw currency-formatted text, possibly empty
    pub price: String,
}

/// What one listing page yielded
#[derive(Debug, Clone)]
pub struct CatalogPage {
    /// Tiles in page order, unique by product identity
    pub tiles: Vec<Tile>,
    pub next_page: Option<Url>,
    /// Product links on this page that pointed at another host
    pub offsite_ignored: u64,
}

impl CatalogPage {
    /// Product links in page order
    pub fn links(&self) -> impl Iterator<Item = &Url> {
        self.tiles.iter().map(|tile| &tile.link)
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Listing parser with all selectors compiled up front
pub struct ListingParser {
    tile_selectors: Vec<(String, Selector)>,
    title_selectors: Vec<Selector>,
    price_selectors: Vec<Selector>,
    next_selectors: Vec<Selector>,
    anchor: Selector,
    keywords: Vec<String>,
    site: Url,
}

impl ListingParser {
    /// Compiles the listing selectors from `config`
    ///
    /// # Arguments
    ///
    /// * `config` - Extraction settings with the tile and pagination cascades
    /// * `site` - Start URL; product links on other hosts are ignored
    pub fn from_config(config: &ExtractionConfig, site: Url) -> Result<Self, ConfigError> {
        let tile_selectors = config
            .tile_selectors
            .iter()
            .map(|raw| Ok((raw.clone(), compile_selector(raw)?)))
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self {
            tile_selectors,
            title_selectors: compile_selectors(&config.tile_title_selectors)?,
            price_selectors: compile_selectors(&config.tile_price_selectors)?,
            next_selectors: compile_selectors(&config.next_page_selectors)?,
            anchor: compile_selector("a[href]")?,
            keywords: config.product_path_keywords.clone(),
            site,
        })
    }

    /// Extracts product tiles and the next-page link from a listing page
    ///
    /// # Discovery Rules
    ///
    /// 1. Tile container selectors are tried in order; the first one that
    ///    yields at least one product tile wins.
    /// 2. Otherwise every hyperlink whose path matches a product keyword is
    ///    taken, titled by its anchor text, without a price.
    ///
    /// Links are made absolute against `page_url` and deduplicated within the
    /// page, keeping first-seen order. Off-site links are dropped.
    pub fn parse_page(&self, document: &Html, page_url: &Url) -> CatalogPage {
        let mut offsite_ignored = 0;
        let mut tiles = Vec::new();

        for (label, selector) in &self.tile_selectors {
            let candidates = document
                .select(selector)
                .filter_map(|container| self.tile_from_container(container, page_url));
            tiles = self.collect(candidates, &mut offsite_ignored);

            if !tiles.is_empty() {
                tracing::debug!(
                    "Tile selector '{}' matched {} products on {}",
                    label,
                    tiles.len(),
                    page_url
                );
                break;
            }
        }

        if tiles.is_empty() {
            tiles = self.collect(self.scan_anchors(document, page_url), &mut offsite_ignored);
            if !tiles.is_empty() {
                tracing::debug!(
                    "No tile selector matched on {}, anchor scan found {} products",
                    page_url,
                    tiles.len()
                );
            }
        }

        CatalogPage {
            tiles,
            next_page: self.next_page(document, page_url),
            offsite_ignored,
        }
    }

    /// Drops off-site links and in-page duplicates, preserving order
    fn collect(&self, candidates: impl Iterator<Item = Tile>, offsite: &mut u64) -> Vec<Tile> {
        let mut seen = HashSet::new();
        let mut tiles = Vec::new();
        let mut dropped = 0;

        for tile in candidates {
            if !is_same_site(&tile.link, &self.site) {
                dropped += 1;
                continue;
            }
            let Ok(identity) = ProductRef::new(&tile.link) else {
                continue;
            };
            if seen.insert(identity) {
                tiles.push(tile);
            }
        }

        *offsite = dropped;
        tiles
    }

    fn tile_from_container(&self, container: ElementRef<'_>, page_url: &Url) -> Option<Tile> {
        let anchors: Vec<(ElementRef<'_>, Url)> = container
            .select(&self.anchor)
            .filter_map(|a| {
                let href = a.value().attr("href")?;
                resolve_link(href, page_url).map(|url| (a, url))
            })
            .collect();

        // Containers without a product link (cart, wishlist, promo) yield no tile
        let (anchor, link) = anchors
            .into_iter()
            .find(|(_, url)| is_product_link(url, &self.keywords))?;

        let title = first_text(container, &self.title_selectors)
            .or_else(|| non_empty(element_text(&anchor)))
            .or_else(|| anchor.value().attr("title").and_then(|t| non_empty(normalize_text(t))))
            .unwrap_or_default();

        let price = first_text(container, &self.price_selectors).unwrap_or_default();

        Some(Tile { link, title, price })
    }

    fn scan_anchors<'a>(
        &'a self,
        document: &'a Html,
        page_url: &'a Url,
    ) -> impl Iterator<Item = Tile> + 'a {
        document.select(&self.anchor).filter_map(move |a| {
            let link = resolve_link(a.value().attr("href")?, page_url)?;
            if !is_product_link(&link, &self.keywords) {
                return None;
            }
            Some(Tile {
                link,
                title: element_text(&a),
                price: String::new(),
            })
        })
    }

    /// First "next" control pointing somewhere other than the current page
    fn next_page(&self, document: &Html, page_url: &Url) -> Option<Url> {
        self.next_selectors.iter().find_map(|selector| {
            document.select(selector).find_map(|element| {
                let next = resolve_link(element.value().attr("href")?, page_url)?;
                (!same_page(&next, page_url)).then_some(next)
            })
        })
    }
}

fn first_text(container: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        container
            .select(selector)
            .find_map(|element| non_empty(element_text(&element)))
    })
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn same_page(a: &Url, b: &Url) -> bool {
    let mut a = a.clone();
    let mut b = b.clone();
    a.set_fragment(None);
    b.set_fragment(None);
    a == b
}
