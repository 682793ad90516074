//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small paginated catalog and run the
//! full crawl cycle end-to-end.

use crate::support::{
    create_test_config, listing_page, mount_html, mount_status, product_page, requested_paths,
};
use catalog_harvest::crawler::{Coordinator, CrawlOutcome, FetchFailure, Termination};
use catalog_harvest::Availability;
use std::collections::HashSet;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_paginated_crawl_with_enrichment() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_html(
        &server,
        "/rowery",
        listing_page(
            &[
                ("/produkt/1-bike-x", "Bike X", "999 zł"),
                ("/produkt/2-bike-y", "Bike Y", "1 499 zł"),
            ],
            Some("/rowery/2"),
        ),
    )
    .await;
    mount_html(
        &server,
        "/rowery/2",
        listing_page(
            &[
                // Re-listed from page 1 with tracking noise
                ("/produkt/2-bike-y?utm_source=listing", "Bike Y", "1 499 zł"),
                ("/produkt/3-bike-z", "Bike Z", ""),
            ],
            None,
        ),
    )
    .await;
    mount_html(
        &server,
        "/produkt/1-bike-x",
        product_page("Bike X", "Gravel Bikes", "https://schema.org/InStock"),
    )
    .await;
    mount_html(
        &server,
        "/produkt/2-bike-y",
        product_page("Bike Y", "MTB", "https://schema.org/OutOfStock"),
    )
    .await;
    mount_html(
        &server,
        "/produkt/3-bike-z",
        product_page("BikeZ", "Trekking", "InStock"),
    )
    .await;

    let config = create_test_config(
        &base_url,
        "[enrichment]\nfields = [\"image\", \"description\", \"availability\"]",
    );
    let report = Coordinator::new(config, CancellationToken::new())
        .unwrap()
        .run()
        .await;

    assert_eq!(report.outcome, CrawlOutcome::Completed(Termination::NoNextPage));
    assert_eq!(report.stats.pages_fetched, 2);
    assert_eq!(report.stats.duplicates_dropped, 1);

    let titles: Vec<&str> = report.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Bike X", "Bike Y", "Bike Z"]);

    let bike_x = &report.records[0];
    assert_eq!(bike_x.price, "999 zł");
    assert_eq!(bike_x.category, "Gravel Bikes");
    assert_eq!(bike_x.in_stock(), Some(true));
    assert_eq!(bike_x.link, format!("{}/produkt/1-bike-x", base_url));

    let bike_y = &report.records[1];
    assert_eq!(bike_y.category, "MTB");
    assert_eq!(bike_y.availability, Some(Availability::OutOfStock));

    // Tile had no price, so the product page's price is used
    let bike_z = &report.records[2];
    assert_eq!(bike_z.price, "1.00 PLN");
    assert_eq!(
        bike_z.image.as_deref(),
        Some("https://cdn.example.com/BikeZ.jpg")
    );
    assert_eq!(bike_z.description.as_deref(), Some("Opis BikeZ"));

    // No two records share a normalized link
    let links: HashSet<&str> = report.records.iter().map(|r| r.link.as_str()).collect();
    assert_eq!(links.len(), report.records.len());

    // The duplicate product page was never fetched twice
    let product_fetches = requested_paths(&server)
        .await
        .into_iter()
        .filter(|p| p == "/produkt/2-bike-y")
        .count();
    assert_eq!(product_fetches, 1);
}

#[tokio::test]
async fn test_untitled_tile_dropped_and_broken_product_kept() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_html(
        &server,
        "/rowery",
        listing_page(
            &[
                ("/produkt/1-no-title", "", "999 zł"),
                ("/produkt/2-gone", "Bike Gone", "500 zł"),
                ("/produkt/3-ok", "Bike Ok", "700 zł"),
            ],
            None,
        ),
    )
    .await;
    mount_html(
        &server,
        "/produkt/1-no-title",
        product_page("Untitled", "Gravel Bikes", "InStock"),
    )
    .await;
    mount_status(&server, "/produkt/2-gone", 404).await;
    mount_html(
        &server,
        "/produkt/3-ok",
        product_page("Bike Ok", "Gravel Bikes", "InStock"),
    )
    .await;

    let config = create_test_config(&base_url, "");
    let report = Coordinator::new(config, CancellationToken::new())
        .unwrap()
        .run()
        .await;

    let titles: Vec<&str> = report.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Bike Gone", "Bike Ok"]);
    assert!(report.records.iter().all(|r| !r.title.is_empty()));

    let gone = &report.records[0];
    assert_eq!(gone.price, "500 zł");
    assert_eq!(gone.category, "");

    assert_eq!(report.stats.records_dropped, 1);
    assert_eq!(report.stats.products_skipped, 1);
    assert_eq!(report.exit_code(), 0);
}

#[tokio::test]
async fn test_listing_failure_stops_and_preserves_records() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_html(
        &server,
        "/rowery",
        listing_page(&[("/produkt/1", "Bike X", "999 zł")], Some("/rowery/2")),
    )
    .await;
    mount_status(&server, "/rowery/2", 503).await;
    mount_html(
        &server,
        "/produkt/1",
        product_page("Bike X", "Gravel Bikes", "InStock"),
    )
    .await;

    let config = create_test_config(&base_url, "");
    let report = Coordinator::new(config, CancellationToken::new())
        .unwrap()
        .run()
        .await;

    match &report.outcome {
        CrawlOutcome::ListingFailed(e) => {
            assert!(e.url.ends_with("/rowery/2"));
            assert!(matches!(
                e.cause,
                FetchFailure::RetriesExhausted { attempts: 2, .. }
            ));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.exit_code(), 2);

    // One initial attempt plus one retry, never a restart from page 1
    let paths = requested_paths(&server).await;
    assert_eq!(paths.iter().filter(|p| *p == "/rowery/2").count(), 2);
    assert_eq!(paths.iter().filter(|p| *p == "/rowery").count(), 1);
}

#[tokio::test]
async fn test_transient_product_error_is_retried() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_html(
        &server,
        "/rowery",
        listing_page(&[("/produkt/1", "Bike X", "999 zł")], None),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/produkt/1"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_html(
        &server,
        "/produkt/1",
        product_page("Bike X", "Gravel Bikes", "InStock"),
    )
    .await;

    let config = create_test_config(&base_url, "");
    let report = Coordinator::new(config, CancellationToken::new())
        .unwrap()
        .run()
        .await;

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].category, "Gravel Bikes");
    assert_eq!(report.stats.products_skipped, 0);
}

#[tokio::test]
async fn test_interrupt_after_first_page_keeps_exactly_first_page() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_html(
        &server,
        "/rowery",
        listing_page(
            &[("/produkt/1", "Bike X", "999 zł"), ("/produkt/2", "Bike Y", "1 zł")],
            Some("/rowery/2"),
        ),
    )
    .await;
    // Page 2 hangs until the crawl is interrupted
    Mock::given(method("GET"))
        .and(path("/rowery/2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_page(&[("/produkt/3", "Bike Z", "2 zł")], None))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;
    mount_html(&server, "/produkt/1", product_page("Bike X", "Gravel", "InStock")).await;
    mount_html(&server, "/produkt/2", product_page("Bike Y", "Gravel", "InStock")).await;
    mount_html(&server, "/produkt/3", product_page("Bike Z", "Gravel", "InStock")).await;

    let cancel = CancellationToken::new();
    let config = create_test_config(&base_url, "");
    let coordinator = Coordinator::new(config, cancel.clone()).unwrap();

    // Interrupt as soon as page 2 has been requested
    let watcher = {
        let cancel = cancel.clone();
        let server = &server;
        async move {
            loop {
                if requested_paths(server).await.iter().any(|p| p == "/rowery/2") {
                    cancel.cancel();
                    return;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    };

    let (report, ()) = tokio::join!(coordinator.run(), watcher);

    assert_eq!(report.outcome, CrawlOutcome::Interrupted);
    let titles: Vec<&str> = report.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Bike X", "Bike Y"]);
    assert_eq!(report.exit_code(), 2);
}

#[tokio::test]
async fn test_in_stock_filter_and_page_cap() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_html(
        &server,
        "/rowery",
        listing_page(
            &[
                ("/produkt/1", "In Stock", "1 zł"),
                ("/produkt/2", "Sold Out", "2 zł"),
                ("/produkt/3", "No Data", "3 zł"),
            ],
            Some("/rowery/2"),
        ),
    )
    .await;
    mount_html(&server, "/produkt/1", product_page("In Stock", "Gravel", "InStock")).await;
    mount_html(&server, "/produkt/2", product_page("Sold Out", "Gravel", "SoldOut")).await;
    mount_html(&server, "/produkt/3", product_page("No Data", "Gravel", "")).await;

    let mut config = create_test_config(
        &base_url,
        "[enrichment]\nfields = []\nfilter-in-stock-only = true",
    );
    config.crawler.max_pages = 1;

    let report = Coordinator::new(config, CancellationToken::new())
        .unwrap()
        .run()
        .await;

    assert_eq!(report.outcome, CrawlOutcome::Completed(Termination::PageLimit));
    let titles: Vec<&str> = report.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["In Stock"]);
    assert_eq!(report.stats.records_filtered, 2);

    // Filtered products were still fetched
    let paths = requested_paths(&server).await;
    assert!(paths.iter().any(|p| p == "/produkt/2"));
    assert!(paths.iter().any(|p| p == "/produkt/3"));
    assert!(!paths.iter().any(|p| p == "/rowery/2"));
}

#[tokio::test]
async fn test_empty_first_page_is_normal_completion() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_html(
        &server,
        "/rowery",
        "<html><body><p>Brak produktów w tej kategorii</p></body></html>".to_string(),
    )
    .await;

    let config = create_test_config(&base_url, "");
    let report = Coordinator::new(config, CancellationToken::new())
        .unwrap()
        .run()
        .await;

    assert_eq!(report.outcome, CrawlOutcome::Completed(Termination::NoItems));
    assert!(report.records.is_empty());
    assert_eq!(report.exit_code(), 0);
}

#[tokio::test]
async fn test_unreachable_start_page_collects_nothing() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_status(&server, "/rowery", 404).await;

    let config = create_test_config(&base_url, "");
    let report = Coordinator::new(config, CancellationToken::new())
        .unwrap()
        .run()
        .await;

    assert!(matches!(report.outcome, CrawlOutcome::ListingFailed(_)));
    assert!(report.records.is_empty());
    assert_eq!(report.exit_code(), 1);
}
