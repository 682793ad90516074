//! End-to-end tests for persisting crawl results

use crate::support::{create_test_config, listing_page, mount_html, product_page};
use catalog_harvest::output::COLUMNS;
use catalog_harvest::{Coordinator, ResultSink};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::MockServer;

#[tokio::test]
async fn test_crawl_results_saved_as_csv_and_xlsx() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let out = TempDir::new().unwrap();

    mount_html(
        &server,
        "/rowery",
        listing_page(
            &[
                ("/produkt/1", "Bike X", "999 zł"),
                ("/produkt/2", "Bike; \"Quoted\"", "1 299 zł"),
            ],
            None,
        ),
    )
    .await;
    mount_html(
        &server,
        "/produkt/1",
        product_page("Bike X", "Gravel Bikes", "InStock"),
    )
    .await;
    mount_html(
        &server,
        "/produkt/2",
        product_page("Bike Q", "Rowery MTB", "OutOfStock"),
    )
    .await;

    let config = create_test_config(
        &base_url,
        &format!(
            r#"
            [enrichment]
            fields = ["availability"]

            [output]
            directory = "{}"
            basename = "bikes"
            timestamped = false
            delimiter = ";"
            "#,
            out.path().display()
        ),
    );

    let mut sink = ResultSink::new(&config.output).unwrap();
    let report = Coordinator::new(config, CancellationToken::new())
        .unwrap()
        .run()
        .await;
    sink.extend(report.records);

    let saved = sink.persist().unwrap();
    assert_eq!(
        saved,
        vec![out.path().join("bikes.csv"), out.path().join("bikes.xlsx")]
    );
    assert!(out.path().join("bikes.xlsx").metadata().unwrap().len() > 0);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .from_path(out.path().join("bikes.csv"))
        .unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, COLUMNS.map(String::from).to_vec());

    let rows: Vec<Vec<String>> = reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][0], "Bike X");
    assert_eq!(rows[0][1], "999 zł");
    assert_eq!(rows[0][3], "Gravel Bikes");
    assert_eq!(rows[0][6], "true");
    assert_eq!(rows[1][0], "Bike; \"Quoted\"");
    assert_eq!(rows[1][3], "Rowery MTB");
    assert_eq!(rows[1][6], "false");
}

#[tokio::test]
async fn test_nothing_collected_writes_no_files() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let out = TempDir::new().unwrap();
    let target = out.path().join("results");

    mount_html(&server, "/rowery", "<html><body></body></html>".to_string()).await;

    let config = create_test_config(
        &base_url,
        &format!(
            "[output]\ndirectory = \"{}\"\ntimestamped = false",
            target.display()
        ),
    );

    let mut sink = ResultSink::new(&config.output).unwrap();
    let report = Coordinator::new(config, CancellationToken::new())
        .unwrap()
        .run()
        .await;
    sink.extend(report.records);

    assert!(sink.persist().unwrap().is_empty());
    assert!(!target.exists());
}
