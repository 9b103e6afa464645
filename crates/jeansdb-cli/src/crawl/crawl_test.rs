use std::sync::Mutex;

use jeansdb_core::AppConfig;
use jeansdb_db::{connect_in_memory, count_products, ensure_schema, get_product};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

/// Records every reporter call as a short string.
#[derive(Default)]
struct RecordingReporter {
    events: Mutex<Vec<String>>,
}

impl RecordingReporter {
    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl CrawlReporter for RecordingReporter {
    fn catalog_discovered(&self, _listing_url: &str, product_count: usize) {
        self.push(format!("discovered:{product_count}"));
    }

    fn pause(&self, products_done: usize, _secs: u64) {
        self.push(format!("pause:{products_done}"));
    }

    fn product_failed(&self, product_id: &str, _error: &ScraperError) {
        self.push(format!("product_failed:{product_id}"));
    }

    fn product_without_variants(&self, product_id: &str) {
        self.push(format!("no_variants:{product_id}"));
    }

    fn variant_failed(&self, product_id: &str, _error: &ScraperError) {
        self.push(format!("variant_failed:{product_id}"));
    }

    fn duplicate_variant(&self, product_id: &str) {
        self.push(format!("duplicate:{product_id}"));
    }

    fn record_stored(&self, product_id: &str, outcome: UpsertOutcome) {
        let kind = match outcome {
            UpsertOutcome::Inserted => "inserted",
            UpsertOutcome::PriceUpdated { .. } => "updated",
            UpsertOutcome::Unchanged => "unchanged",
        };
        self.push(format!("{kind}:{product_id}"));
    }

    fn record_rejected(&self, product_id: &str, _error: &DbError) {
        self.push(format!("rejected:{product_id}"));
    }

    fn dry_run_record(&self, record: &NormalizedRecord) {
        self.push(format!("dry_run:{}", record.product_id));
    }

    fn finished(&self, _totals: &CrawlTotals) {
        self.push("finished".to_owned());
    }
}

const LISTING_HEAD: &str = r#"<html><body>
  <h2 class="load-more-heading" data-items-shown="36" data-total="2">Showing 2 of 2</h2>
</body></html>"#;

const FULL_LISTING: &str = r#"<html><body>
  <ul class="products-listing">
    <li><article class="hm-product-item" data-articlecode="0985159001"></article></li>
    <li><article class="hm-product-item" data-articlecode="1008549006"></article></li>
  </ul>
</body></html>"#;

fn detail_html(name: &str, price: &str, swatches: &[(&str, &str)]) -> String {
    let swatch_markup: String = swatches
        .iter()
        .map(|(id, color)| {
            format!(r#"<a class="filter-option miniature" data-color="{color}" data-articlecode="{id}"></a>"#)
        })
        .collect();
    format!(
        r#"<html><body>
  <h1 class="product-item-headline">{name}</h1>
  <div class="product-item-price">{price}</div>
  {swatch_markup}
  <div class="pdp-description-list-item"><dt>Fit</dt><dd>Slim fit</dd></div>
  <div class="pdp-description-list-item">
    <dt>Composition</dt>
    <dd>Shell: Cotton 98%, Spandex 2%</dd>
    <dd>Pocket lining: Polyester 65%, Cotton 35%</dd>
  </div>
  <div class="pdp-description-list-item"><dt>Size</dt><dd>Inseam 105cm</dd></div>
</body></html>"#
    )
}

/// Mounts the category landing page and its full listing.
async fn mount_listing(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/men/jeans.html"))
        .and(query_param("page-size", "36"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FULL_LISTING))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/men/jeans.html"))
        .and(query_param_is_missing("page-size"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING_HEAD))
        .mount(server)
        .await;
}

/// Listing works; every product page answers 404.
async fn missing_products_site() -> MockServer {
    let server = MockServer::start().await;
    mount_listing(&server).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    server
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// A two-product catalog. Product `0985159001` offers two colors; product
/// `1008549006` re-lists the black variant and has its own page without a
/// price block.
async fn catalog_site(black_price: &str) -> MockServer {
    let server = MockServer::start().await;
    mount_listing(&server).await;

    let swatches_a = [("0985159001", "Denim blue"), ("0985159002", "Black")];
    mount_page(
        &server,
        "/productpage.0985159001.html",
        detail_html("Slim Jeans", "$ 49.99", &swatches_a),
    )
    .await;
    mount_page(
        &server,
        "/productpage.0985159002.html",
        detail_html("Slim Jeans", black_price, &swatches_a),
    )
    .await;
    mount_page(
        &server,
        "/productpage.1008549006.html",
        r#"<html><body>
  <h1 class="product-item-headline">Loose Jeans</h1>
  <a class="filter-option miniature" data-color="Light blue" data-articlecode="1008549006"></a>
  <a class="filter-option miniature" data-color="Black" data-articlecode="0985159002"></a>
</body></html>"#
            .to_owned(),
    )
    .await;

    server
}

fn test_config(server: &MockServer) -> AppConfig {
    AppConfig {
        base_url: format!("{}/men/jeans.html", server.uri()),
        product_url_template: format!("{}/productpage.{{id}}.html", server.uri()),
        work_dir: std::env::temp_dir(),
        database_path: "unused.sqlite".into(),
        table_name: "mens_jeans".to_owned(),
        log_dir: "logs".into(),
        log_level: "info".to_owned(),
        user_agent: "jeansdb-test/0.1".to_owned(),
        http_headers: Vec::new(),
        request_timeout_secs: 5,
        max_retries: 0,
        retry_backoff_base_secs: 0,
        pause_every: 0,
        pause_secs: 0,
        max_concurrent_products: 1,
        db_max_connections: 1,
    }
}

fn options(config: &AppConfig, limit: Option<usize>) -> CrawlOptions {
    CrawlOptions::from_app_config(
        config,
        limit,
        NaiveDate::from_ymd_opt(2021, 10, 5).unwrap(),
    )
}

async fn memory_store() -> (SqlitePool, TableName) {
    let pool = connect_in_memory().await.unwrap();
    let table = TableName::parse("mens_jeans").unwrap();
    ensure_schema(&pool, &table).await.unwrap();
    (pool, table)
}

#[tokio::test]
async fn crawl_stores_every_new_variant_and_counts_failures() {
    let server = catalog_site("$ 39.99").await;
    let config = test_config(&server);
    let client = build_client(&config).unwrap();
    let (pool, table) = memory_store().await;
    let reporter = RecordingReporter::default();

    let totals = run_crawl(
        &client,
        RecordSink::Store {
            pool: &pool,
            table: &table,
        },
        &options(&config, None),
        &reporter,
    )
    .await
    .unwrap();

    assert_eq!(
        totals,
        CrawlTotals {
            discovered: 2,
            processed: 2,
            inserted: 2,
            updated: 0,
            skipped: 1,
            failed: 1,
        }
    );
    // Worker and writer events interleave; compare as a set.
    let mut events = reporter.events();
    events.sort();
    assert_eq!(
        events,
        vec![
            "discovered:2",
            "duplicate:0985159002",
            "finished",
            "inserted:0985159001",
            "inserted:0985159002",
            "variant_failed:1008549006",
        ]
    );

    assert_eq!(count_products(&pool, &table).await.unwrap(), 2);
    let black = get_product(&pool, &table, "0985159002").await.unwrap().unwrap();
    assert_eq!(black.name, "slim_jeans");
    assert_eq!(black.product_color, "black");
    assert_eq!(black.fit, "slim_fit");
    assert!((black.price - 39.99).abs() < 1e-9);
    assert_eq!(black.size_number.as_deref(), Some("105"));
    assert_eq!(black.cotton, Some(0.98));
    assert_eq!(black.spandex, Some(0.02));
    assert_eq!(
        black.scrapy_datetime,
        NaiveDate::from_ymd_opt(2021, 10, 5).unwrap()
    );
}

#[tokio::test]
async fn second_crawl_updates_only_changed_prices() {
    let (pool, table) = memory_store().await;
    let sink = RecordSink::Store {
        pool: &pool,
        table: &table,
    };

    let first = catalog_site("$ 39.99").await;
    let config = test_config(&first);
    run_crawl(
        &build_client(&config).unwrap(),
        sink,
        &options(&config, None),
        &RecordingReporter::default(),
    )
    .await
    .unwrap();

    let repriced = catalog_site("$ 29.99").await;
    let config = test_config(&repriced);
    let totals = run_crawl(
        &build_client(&config).unwrap(),
        sink,
        &options(&config, None),
        &RecordingReporter::default(),
    )
    .await
    .unwrap();

    assert_eq!(totals.inserted, 0);
    assert_eq!(totals.updated, 1);
    // One unchanged record plus the duplicate swatch.
    assert_eq!(totals.skipped, 2);
    assert_eq!(count_products(&pool, &table).await.unwrap(), 2);
    let black = get_product(&pool, &table, "0985159002").await.unwrap().unwrap();
    assert!((black.price - 29.99).abs() < 1e-9);
}

#[tokio::test]
async fn dry_run_writes_nothing() {
    let server = catalog_site("$ 39.99").await;
    let config = test_config(&server);
    let (pool, table) = memory_store().await;
    let reporter = RecordingReporter::default();

    let totals = run_crawl(
        &build_client(&config).unwrap(),
        RecordSink::DryRun,
        &options(&config, None),
        &reporter,
    )
    .await
    .unwrap();

    assert_eq!(totals.processed, 2);
    assert_eq!(totals.inserted, 0);
    assert!(reporter
        .events()
        .contains(&"dry_run:0985159001".to_owned()));
    assert_eq!(count_products(&pool, &table).await.unwrap(), 0);
}

#[tokio::test]
async fn limit_restricts_top_level_products() {
    let server = catalog_site("$ 39.99").await;
    let config = test_config(&server);
    let (pool, table) = memory_store().await;

    let totals = run_crawl(
        &build_client(&config).unwrap(),
        RecordSink::Store {
            pool: &pool,
            table: &table,
        },
        &options(&config, Some(1)),
        &RecordingReporter::default(),
    )
    .await
    .unwrap();

    assert_eq!(totals.discovered, 2);
    assert_eq!(totals.processed, 2);
    assert_eq!(totals.failed, 0);
    assert_eq!(totals.skipped, 0);
}

#[tokio::test]
async fn variant_listing_failure_counts_one_failure() {
    let server = missing_products_site().await;
    let config = test_config(&server);
    let reporter = RecordingReporter::default();
    let totals = run_crawl(
        &build_client(&config).unwrap(),
        RecordSink::DryRun,
        &options(&config, None),
        &reporter,
    )
    .await
    .unwrap();

    assert_eq!(totals.failed, 2);
    assert_eq!(totals.processed, 0);
    assert!(reporter
        .events()
        .contains(&"product_failed:1008549006".to_owned()));
}

#[tokio::test]
async fn discovery_failure_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
        .mount(&server)
        .await;

    let config = test_config(&server);
    let err = run_crawl(
        &build_client(&config).unwrap(),
        RecordSink::DryRun,
        &options(&config, None),
        &RecordingReporter::default(),
    )
    .await
    .unwrap_err();

    assert!(
        matches!(err, CrawlError::Discovery(ScraperError::Parse { .. })),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn store_failure_aborts_the_run() {
    let server = catalog_site("$ 39.99").await;
    let config = test_config(&server);
    // No schema: every reconcile fails with "no such table".
    let pool = connect_in_memory().await.unwrap();
    let table = TableName::parse("mens_jeans").unwrap();

    let err = run_crawl(
        &build_client(&config).unwrap(),
        RecordSink::Store {
            pool: &pool,
            table: &table,
        },
        &options(&config, None),
        &RecordingReporter::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CrawlError::Store(_)), "got: {err:?}");
}

#[tokio::test]
async fn pause_follows_the_nth_product() {
    let server = missing_products_site().await;
    let mut config = test_config(&server);
    config.pause_every = 1;
    let reporter = RecordingReporter::default();

    run_crawl(
        &build_client(&config).unwrap(),
        RecordSink::DryRun,
        &options(&config, None),
        &reporter,
    )
    .await
    .unwrap();

    // One worker: the first product runs unpaused, the pause sits between
    // the two products, and nothing pauses after the last one.
    assert_eq!(
        reporter.events(),
        vec![
            "discovered:2",
            "product_failed:0985159001",
            "pause:1",
            "product_failed:1008549006",
            "finished",
        ]
    );
}

#[tokio::test]
async fn no_pause_before_threshold_is_reached() {
    let server = catalog_site("$ 39.99").await;
    let mut config = test_config(&server);
    config.pause_every = 2;
    let reporter = RecordingReporter::default();

    run_crawl(
        &build_client(&config).unwrap(),
        RecordSink::DryRun,
        &options(&config, None),
        &reporter,
    )
    .await
    .unwrap();

    assert!(
        !reporter.events().iter().any(|e| e.starts_with("pause:")),
        "two products with pause_every=2 must not pause: {:?}",
        reporter.events()
    );
}

#[tokio::test]
async fn failed_variant_is_retried_by_sibling_product() {
    let server = catalog_site("$ 39.99").await;
    // The black variant fails once, while product 0985159001 is processed.
    Mock::given(method("GET"))
        .and(path("/productpage.0985159002.html"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    let config = test_config(&server);
    let (pool, table) = memory_store().await;
    let reporter = RecordingReporter::default();

    let totals = run_crawl(
        &build_client(&config).unwrap(),
        RecordSink::Store {
            pool: &pool,
            table: &table,
        },
        &options(&config, None),
        &reporter,
    )
    .await
    .unwrap();

    assert_eq!(totals.inserted, 2);
    assert_eq!(totals.skipped, 0);
    assert_eq!(totals.failed, 2);
    let events = reporter.events();
    assert!(events.contains(&"variant_failed:0985159002".to_owned()));
    assert!(events.contains(&"inserted:0985159002".to_owned()));
    assert!(!events.contains(&"duplicate:0985159002".to_owned()));
    assert!(get_product(&pool, &table, "0985159002")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn product_without_variants_counts_as_skipped() {
    let server = MockServer::start().await;
    mount_listing(&server).await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(detail_html("Slim Jeans", "$ 49.99", &[])),
        )
        .mount(&server)
        .await;
    let config = test_config(&server);
    let reporter = RecordingReporter::default();

    let totals = run_crawl(
        &build_client(&config).unwrap(),
        RecordSink::DryRun,
        &options(&config, None),
        &reporter,
    )
    .await
    .unwrap();

    assert_eq!(
        totals,
        CrawlTotals {
            discovered: 2,
            processed: 0,
            inserted: 0,
            updated: 0,
            skipped: 2,
            failed: 0,
        }
    );
    let events = reporter.events();
    assert!(events.contains(&"no_variants:0985159001".to_owned()));
    assert!(events.contains(&"no_variants:1008549006".to_owned()));
}

#[tokio::test]
async fn concurrent_workers_store_each_variant_once() {
    let server = catalog_site("$ 39.99").await;
    let mut config = test_config(&server);
    config.max_concurrent_products = 4;
    let (pool, table) = memory_store().await;

    let totals = run_crawl(
        &build_client(&config).unwrap(),
        RecordSink::Store {
            pool: &pool,
            table: &table,
        },
        &options(&config, None),
        &RecordingReporter::default(),
    )
    .await
    .unwrap();

    assert_eq!(totals.inserted, 2);
    assert_eq!(totals.processed + totals.failed + totals.skipped, 4);
    assert_eq!(count_products(&pool, &table).await.unwrap(), 2);
}

#[test]
fn totals_serialize_with_field_names() {
    let totals = CrawlTotals {
        discovered: 3,
        processed: 2,
        inserted: 1,
        updated: 1,
        skipped: 0,
        failed: 1,
    };
    let json = serde_json::to_value(totals).unwrap();
    assert_eq!(json["discovered"], 3);
    assert_eq!(json["failed"], 1);
    assert_eq!(
        totals.to_string(),
        "discovered=3 processed=2 inserted=1 updated=1 skipped=0 failed=1"
    );
}
