use crate::config::ExtractionConfig;
use crate::extract::{
    compile_selector, compile_selectors, BreadcrumbStrategy, CrumbPolicy, Field, KeywordStrategy,
    PageContext, SelectorStrategy, Strategy, StructuredDataStrategy,
};
use crate::ConfigError;
use std::collections::HashMap;

/// Ordered strategy cascades for every product field
///
/// Built once from configuration and shared read-only by all enrichment
/// workers.
pub struct FieldExtractor {
    cascades: HashMap<Field, Vec<Box<dyn Strategy>>>,
}

impl FieldExtractor {
    /// Builds the cascades described by `config`
    ///
    /// Per field, selector strategies come first in configured order
    /// (current template, then legacy variants), then JSON-LD, then the
    /// category keyword heuristic.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ConfigError> {
        let policy = CrumbPolicy {
            includes_home: config.breadcrumb_includes_home,
            includes_leaf: config.breadcrumb_includes_leaf,
            separator: config.category_separator.clone(),
        };

        let mut cascades: HashMap<Field, Vec<Box<dyn Strategy>>> = HashMap::new();

        cascades.insert(
            Field::Title,
            selector_cascade(Field::Title, &config.title_selectors, &[])?,
        );
        cascades.insert(
            Field::Price,
            selector_cascade(Field::Price, &config.price_selectors, &["content"])?,
        );
        cascades.insert(
            Field::Image,
            selector_cascade(
                Field::Image,
                &config.image_selectors,
                &["src", "content", "data-src"],
            )?,
        );
        cascades.insert(
            Field::Description,
            selector_cascade(Field::Description, &config.description_selectors, &["content"])?,
        );
        cascades.insert(
            Field::Availability,
            selector_cascade(
                Field::Availability,
                &config.availability_selectors,
                &["href", "content"],
            )?,
        );

        let category = cascades.entry(Field::Category).or_default();
        for raw in &config.breadcrumb_selectors {
            category.push(Box::new(BreadcrumbStrategy::new(
                raw.clone(),
                compile_selector(raw)?,
                policy.clone(),
            )));
        }
        category.push(Box::new(StructuredDataStrategy::breadcrumbs(policy)));
        category.push(Box::new(StructuredDataStrategy::product(Field::Category)));
        category.push(Box::new(KeywordStrategy::new(
            compile_selectors(&config.title_selectors)?,
            config.category_keywords.clone(),
        )));

        Ok(Self { cascades })
    }

    /// Runs the cascade for `field`; empty string means not found
    pub fn extract(&self, page: &PageContext<'_>, field: Field) -> String {
        let Some(cascade) = self.cascades.get(&field) else {
            return String::new();
        };

        for strategy in cascade {
            if let Some(value) = strategy.extract(page) {
                tracing::trace!(
                    "{}: '{}' matched {} on {}",
                    field,
                    strategy.name(),
                    value,
                    page.url()
                );
                return match field {
                    Field::Image => absolutize(page, &value),
                    _ => value,
                };
            }
        }

        tracing::trace!("{}: no strategy matched on {}", field, page.url());
        String::new()
    }

    /// Names of the strategies tried for `field`, in priority order
    pub fn strategy_names(&self, field: Field) -> Vec<&str> {
        self.cascades
            .get(&field)
            .map(|cascade| cascade.iter().map(|s| s.name()).collect())
            .unwrap_or_default()
    }
}

/// Selector strategies in configured order, then the JSON-LD product value
fn selector_cascade(
    field: Field,
    selectors: &[String],
    attributes: &[&'static str],
) -> Result<Vec<Box<dyn Strategy>>, ConfigError> {
    let mut cascade: Vec<Box<dyn Strategy>> = Vec::with_capacity(selectors.len() + 1);
    for raw in selectors {
        let strategy =
            SelectorStrategy::new(raw.clone(), compile_selector(raw)?).with_attributes(attributes);
        cascade.push(Box::new(strategy));
    }
    cascade.push(Box::new(StructuredDataStrategy::product(field)));
    Ok(cascade)
}

fn absolutize(page: &PageContext<'_>, value: &str) -> String {
    page.url()
        .join(value)
        .map(|url| url.to_string())
        .unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;
    use url::Url;

    fn extractor() -> FieldExtractor {
        FieldExtractor::from_config(&ExtractionConfig::default()).unwrap()
    }

    fn extract(html: &str, field: Field) -> String {
        let doc = Html::parse_document(html);
        let url = Url::parse("https://shop.example.com/produkt/12-bike-x").unwrap();
        let page = PageContext::new(&doc, &url);
        extractor().extract(&page, field)
    }

    const PRODUCT_PAGE: &str = r#"
        <html><head>
          <title>Bike X - Sklep</title>
          <script type="application/ld+json">
            {"@type": "Product", "name": "Bike X (json)",
             "image": "https://cdn.example.com/x-json.jpg",
             "offers": {"price": "999.00", "priceCurrency": "PLN",
                        "availability": "https://schema.org/InStock"}}
          </script>
          <script type="application/ld+json">
            {"@type": "BreadcrumbList", "itemListElement": [
              {"position": 1, "name": "Home"},
              {"position": 2, "name": "Gravel Bikes"},
              {"position": 3, "name": "Bike X"}]}
          </script>
        </head><body>
          <h1 class="product-name">  Bike
             X </h1>
          <div class="product-cover"><img src="/img/x.jpg"></div>
        </body></html>"#;

    #[test]
    fn test_primary_selector_beats_structured_data() {
        assert_eq!(extract(PRODUCT_PAGE, Field::Title), "Bike X");
    }

    #[test]
    fn test_structured_data_fallback() {
        assert_eq!(extract(PRODUCT_PAGE, Field::Price), "999.00 PLN");
        assert_eq!(
            extract(PRODUCT_PAGE, Field::Availability),
            "https://schema.org/InStock"
        );
        assert_eq!(extract(PRODUCT_PAGE, Field::Category), "Gravel Bikes");
    }

    #[test]
    fn test_image_is_absolute() {
        assert_eq!(
            extract(PRODUCT_PAGE, Field::Image),
            "https://shop.example.com/img/x.jpg"
        );
    }

    #[test]
    fn test_missing_field_is_empty_string() {
        assert_eq!(extract(PRODUCT_PAGE, Field::Description), "");
        assert_eq!(extract("<html></html>", Field::Title), "");
    }

    #[test]
    fn test_legacy_selector_used_when_primary_absent() {
        let html = r#"<h1 itemprop="name">Legacy Bike</h1><h1>Generic</h1>"#;
        assert_eq!(extract(html, Field::Title), "Legacy Bike");
    }

    #[test]
    fn test_plain_price_class_is_last_selector() {
        let html = r#"<h1>Bike X</h1><p>Cena: <span class="price">1 099 zł</span></p>"#;
        assert_eq!(extract(html, Field::Price), "1 099 zł");
    }

    #[test]
    fn test_html_breadcrumbs_beat_json_ld() {
        let html = r#"
            <nav class="breadcrumb"><ol>
              <li>Start</li><li>Rowery</li><li>Gravel</li><li>Bike X</li>
            </ol></nav>
            <script type="application/ld+json">
              {"@type": "BreadcrumbList", "itemListElement": [
                {"position": 1, "name": "Home"}, {"position": 2, "name": "Other"},
                {"position": 3, "name": "Bike X"}]}
            </script>"#;
        assert_eq!(extract(html, Field::Category), "Rowery > Gravel");
    }

    #[test]
    fn test_category_keyword_fallback() {
        let html = "<html><head><title>Rower MTB Bike Z</title></head><body></body></html>";
        assert_eq!(extract(html, Field::Category), "Rowery MTB");
    }

    #[test]
    fn test_malformed_json_ld_does_not_block_other_blocks() {
        let html = r#"
            <script type="application/ld+json">{ not json </script>
            <script type="application/ld+json">{"@type": "Product", "description": "Opis"}</script>"#;
        assert_eq!(extract(html, Field::Description), "Opis");
    }

    #[test]
    fn test_strategy_order_is_inspectable() {
        let extractor = extractor();
        let names = extractor.strategy_names(Field::Title);
        assert_eq!(
            names,
            vec!["h1.product-name", "h1[itemprop='name']", "h1", "json-ld:title"]
        );

        let category = extractor.strategy_names(Field::Category);
        assert_eq!(category.last(), Some(&"keyword-heuristic"));
        assert!(extractor.strategy_names(Field::Price).contains(&"json-ld:price"));
    }
}
