//! Shared fixtures: a tiny bike shop rendered as HTML

use catalog_harvest::config::{parse_config, Config};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at `base_url`
///
/// `extra` is appended verbatim, so tests can add whole sections.
pub fn create_test_config(base_url: &str, extra: &str) -> Config {
    parse_config(&format!(
        r#"
        [crawler]
        start-url = "{}/rowery"
        max-workers = 4
        request-delay-ms = 0
        shutdown-grace-ms = 100

        [fetch]
        request-timeout-ms = 60000
        retry-count = 1
        retry-backoff-base-ms = 10

        {}
        "#,
        base_url, extra
    ))
    .expect("test config must be valid")
}

/// A listing page with PrestaShop-style tiles
///
/// Each tile is `(href, title, price)`; an empty title renders a tile
/// without any title text.
pub fn listing_page(tiles: &[(&str, &str, &str)], next: Option<&str>) -> String {
    let mut html = String::from("<html><head><title>Rowery</title></head><body><div id=\"products\">");
    for (href, title, price) in tiles {
        html.push_str(&format!(
            r#"<div class="product-wrapper">
                 <a class="thumbnail" href="{href}"><img src="/img/thumb.jpg"></a>
                 <a class="product-name" href="{href}">{title}</a>
                 <span class="price">{price}</span>
               </div>"#
        ));
    }
    html.push_str("</div>");
    if let Some(next) = next {
        html.push_str(&format!(
            r#"<nav class="pagination"><a rel="next" href="{}">Następna</a></nav>"#,
            next
        ));
    }
    html.push_str("</body></html>");
    html
}

/// A product page carrying JSON-LD availability and breadcrumbs
pub fn product_page(name: &str, category: &str, availability: &str) -> String {
    format!(
        r#"<html><head>
             <title>{name} - Sklep rowerowy</title>
             <script type="application/ld+json">
               {{"@context": "https://schema.org", "@type": "Product", "name": "{name}",
                 "description": "Opis {name}",
                 "image": "https://cdn.example.com/{name}.jpg",
                 "offers": {{"@type": "Offer", "price": "1.00", "priceCurrency": "PLN",
                            "availability": "{availability}"}}}}
             </script>
             <script type="application/ld+json">
               {{"@type": "BreadcrumbList", "itemListElement": [
                 {{"@type": "ListItem", "position": 1, "name": "Home"}},
                 {{"@type": "ListItem", "position": 2, "name": "{category}"}},
                 {{"@type": "ListItem", "position": 3, "name": "{name}"}}]}}
             </script>
           </head><body><h1 class="product-name">{name}</h1></body></html>"#
    )
}

pub async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

pub async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Paths the server was asked for, in arrival order
pub async fn requested_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| request.url.path().to_string())
        .collect()
}
