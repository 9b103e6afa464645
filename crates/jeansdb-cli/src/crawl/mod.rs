//! Crawl orchestration: discover the catalog, walk every product's color
//! variants, normalize their detail pages and reconcile them into the store.
//!
//! Per-variant failures are reported and counted rather than propagated, so
//! one broken page does not abort the run. Discovery failures and store
//! failures other than constraint violations are fatal.

mod pacer;
mod reporter;

use std::collections::HashSet;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use jeansdb_core::{AppConfig, NormalizedRecord};
use jeansdb_db::{DbError, PoolConfig, TableName, UpsertOutcome};
use jeansdb_scraper::{normalize_record, CatalogClient, ScraperError};
use serde::Serialize;
use sqlx::SqlitePool;
use tokio::sync::mpsc;

use pacer::Pacer;
pub(crate) use reporter::{CrawlReporter, TracingReporter};

/// Normalized records buffered between the workers and the writer.
const RECORD_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, thiserror::Error)]
pub(crate) enum CrawlError {
    #[error("catalog discovery failed: {0}")]
    Discovery(#[source] ScraperError),
    #[error("store failure: {0}")]
    Store(#[from] DbError),
    #[error("crawl setup failed: {0}")]
    Setup(String),
}

/// Run-level counters, printed at the end of every crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub(crate) struct CrawlTotals {
    /// Top-level product ids found on the full listing.
    pub discovered: usize,
    /// Variant records that reached the writer.
    pub processed: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Unchanged records, variants already claimed earlier in the run, and
    /// products whose page lists no color variants.
    pub skipped: usize,
    pub failed: usize,
}

impl fmt::Display for CrawlTotals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "discovered={} processed={} inserted={} updated={} skipped={} failed={}",
            self.discovered,
            self.processed,
            self.inserted,
            self.updated,
            self.skipped,
            self.failed
        )
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CrawlOptions {
    pub base_url: String,
    /// Process only the first `limit` top-level products.
    pub limit: Option<usize>,
    pub max_concurrent: usize,
    pub pause_every: usize,
    pub pause_secs: u64,
    /// Stamped on every record as `scrapy_datetime`.
    pub captured_on: NaiveDate,
}

impl CrawlOptions {
    pub(crate) fn from_app_config(
        config: &AppConfig,
        limit: Option<usize>,
        captured_on: NaiveDate,
    ) -> Self {
        Self {
            base_url: config.base_url.clone(),
            limit,
            max_concurrent: config.max_concurrent_products.max(1),
            pause_every: config.pause_every,
            pause_secs: config.pause_secs,
            captured_on,
        }
    }
}

/// Where normalized records go.
#[derive(Clone, Copy)]
pub(crate) enum RecordSink<'a> {
    Store {
        pool: &'a SqlitePool,
        table: &'a TableName,
    },
    /// Report each record without touching the store.
    DryRun,
}

/// Builds the page client from configuration.
///
/// # Errors
///
/// Returns [`CrawlError::Setup`] if a configured header is invalid or the
/// HTTP client cannot be built.
pub(crate) fn build_client(config: &AppConfig) -> Result<CatalogClient, CrawlError> {
    CatalogClient::from_app_config(config)
        .map_err(|e| CrawlError::Setup(format!("failed to build catalog client: {e}")))
}

/// Opens the configured store and makes sure the products table exists.
///
/// # Errors
///
/// Returns [`CrawlError::Store`] if the table name is invalid, the database
/// cannot be opened, or the schema statement fails.
pub(crate) async fn open_store(config: &AppConfig) -> Result<(SqlitePool, TableName), CrawlError> {
    let table = TableName::parse(&config.table_name)?;
    let path = config.resolved_database_path();
    let pool = jeansdb_db::connect_pool(&path, PoolConfig::from_app_config(config)).await?;
    jeansdb_db::ensure_schema(&pool, &table).await?;
    tracing::debug!(path = %path.display(), %table, "store ready");
    Ok((pool, table))
}

/// Resolves the full listing URL and the product ids it lists.
///
/// # Errors
///
/// Returns [`CrawlError::Discovery`] on any fetch or parse failure.
pub(crate) async fn discover_catalog(
    client: &CatalogClient,
    base_url: &str,
) -> Result<(String, Vec<String>), CrawlError> {
    let listing_url = client
        .discover_catalog_url(base_url)
        .await
        .map_err(CrawlError::Discovery)?;
    let product_ids = client
        .list_product_ids(&listing_url)
        .await
        .map_err(CrawlError::Discovery)?;
    Ok((listing_url, product_ids))
}

/// Runs one full crawl.
///
/// Top-level products are processed by up to `options.max_concurrent`
/// workers; every normalized record goes through a channel to a single
/// writer, the only caller of [`jeansdb_db::reconcile_product`].
///
/// # Errors
///
/// - [`CrawlError::Discovery`] if the catalog cannot be discovered or listed.
/// - [`CrawlError::Store`] on a store failure other than a constraint
///   violation. Workers stop picking up new products once the writer fails.
pub(crate) async fn run_crawl(
    client: &CatalogClient,
    sink: RecordSink<'_>,
    options: &CrawlOptions,
    reporter: &dyn CrawlReporter,
) -> Result<CrawlTotals, CrawlError> {
    let (listing_url, mut product_ids) = discover_catalog(client, &options.base_url).await?;
    reporter.catalog_discovered(&listing_url, product_ids.len());

    let discovered = product_ids.len();
    if let Some(limit) = options.limit {
        product_ids.truncate(limit);
    }

    let pacer = Pacer::new(options.pause_every, Duration::from_secs(options.pause_secs));
    let seen = Mutex::new(HashSet::new());
    let worker = ProductWorker {
        client,
        pacer: &pacer,
        seen: &seen,
        reporter,
        captured_on: options.captured_on,
        pause_secs: options.pause_secs,
    };

    let (tx, rx) = mpsc::channel(RECORD_CHANNEL_CAPACITY);
    let producer = async {
        let tx = tx;
        stream::iter(product_ids)
            .map(|product_id| worker.process_product(product_id, tx.clone()))
            .buffer_unordered(options.max_concurrent.max(1))
            .fold(ProductTally::default(), |acc, tally| async move {
                acc.merge(tally)
            })
            .await
    };
    let writer = write_records(rx, sink, reporter);

    let (produced, written) = tokio::join!(producer, writer);
    let written = written?;

    let totals = CrawlTotals {
        discovered,
        processed: written.processed,
        inserted: written.inserted,
        updated: written.updated,
        skipped: written.unchanged + produced.duplicates + produced.without_variants,
        failed: written.rejected + produced.failed,
    };
    reporter.finished(&totals);
    Ok(totals)
}

#[derive(Debug, Default, Clone, Copy)]
struct ProductTally {
    duplicates: usize,
    /// Products whose page lists no color variants.
    without_variants: usize,
    failed: usize,
}

impl ProductTally {
    fn merge(self, other: Self) -> Self {
        Self {
            duplicates: self.duplicates + other.duplicates,
            without_variants: self.without_variants + other.without_variants,
            failed: self.failed + other.failed,
        }
    }
}

struct ProductWorker<'a> {
    client: &'a CatalogClient,
    pacer: &'a Pacer,
    /// Variant ids claimed by a worker; sibling products list the same
    /// swatches. An id is released again when its extraction fails.
    seen: &'a Mutex<HashSet<String>>,
    reporter: &'a dyn CrawlReporter,
    captured_on: NaiveDate,
    pause_secs: u64,
}

impl ProductWorker<'_> {
    /// Lists one product's color variants and sends each new variant's
    /// normalized record to the writer.
    async fn process_product(
        &self,
        product_id: String,
        tx: mpsc::Sender<NormalizedRecord>,
    ) -> ProductTally {
        let mut tally = ProductTally::default();
        if tx.is_closed() {
            return tally;
        }

        self.pacer
            .admit(|done| self.reporter.pause(done, self.pause_secs))
            .await;

        let variants = match self.client.extract_color_variants(&product_id).await {
            Ok(variants) => variants,
            Err(e) => {
                self.reporter.product_failed(&product_id, &e);
                tally.failed += 1;
                return tally;
            }
        };
        if variants.is_empty() {
            self.reporter.product_without_variants(&product_id);
            tally.without_variants += 1;
            return tally;
        }

        for variant in variants {
            if !self.claim(&variant.product_id) {
                self.reporter.duplicate_variant(&variant.product_id);
                tally.duplicates += 1;
                continue;
            }

            let record = match self.extract_record(&variant).await {
                Ok(record) => record,
                Err(e) => {
                    self.reporter.variant_failed(&variant.product_id, &e);
                    // A sibling product listing the same swatch may retry it.
                    self.release(&variant.product_id);
                    tally.failed += 1;
                    continue;
                }
            };

            // Writer gone: a fatal store error is already on its way up.
            if tx.send(record).await.is_err() {
                break;
            }
        }
        tally
    }

    async fn extract_record(
        &self,
        variant: &jeansdb_core::ColorVariant,
    ) -> Result<NormalizedRecord, ScraperError> {
        let raw = self.client.extract_detail(variant).await?;
        normalize_record(raw, self.captured_on)
    }

    /// Marks a variant as taken. Returns `false` when another product
    /// already claimed it.
    fn claim(&self, product_id: &str) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(product_id.to_owned())
    }

    fn release(&self, product_id: &str) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(product_id);
    }
}

#[derive(Debug, Default)]
struct WriteTally {
    processed: usize,
    inserted: usize,
    updated: usize,
    unchanged: usize,
    rejected: usize,
}

/// Drains the record channel into `sink`. Returns on the first store error
/// that is not a constraint violation, closing the channel.
async fn write_records(
    mut rx: mpsc::Receiver<NormalizedRecord>,
    sink: RecordSink<'_>,
    reporter: &dyn CrawlReporter,
) -> Result<WriteTally, CrawlError> {
    let mut tally = WriteTally::default();

    while let Some(record) = rx.recv().await {
        tally.processed += 1;

        let RecordSink::Store { pool, table } = sink else {
            reporter.dry_run_record(&record);
            continue;
        };

        match jeansdb_db::reconcile_product(pool, table, &record).await {
            Ok(outcome) => {
                match outcome {
                    UpsertOutcome::Inserted => tally.inserted += 1,
                    UpsertOutcome::PriceUpdated { .. } => tally.updated += 1,
                    UpsertOutcome::Unchanged => tally.unchanged += 1,
                }
                reporter.record_stored(&record.product_id, outcome);
            }
            Err(e) if e.is_constraint_violation() => {
                reporter.record_rejected(&record.product_id, &e);
                tally.rejected += 1;
            }
            Err(e) => {
                rx.close();
                return Err(CrawlError::Store(e));
            }
        }
    }

    Ok(tally)
}

#[cfg(test)]
#[path = "crawl_test.rs"]
mod tests;
