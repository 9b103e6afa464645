//! Crawl progress events.
//!
//! The orchestrator reports through [`CrawlReporter`] instead of logging
//! directly; production runs use [`TracingReporter`].

use jeansdb_core::NormalizedRecord;
use jeansdb_db::{DbError, UpsertOutcome};
use jeansdb_scraper::ScraperError;

use super::CrawlTotals;

pub(crate) trait CrawlReporter: Send + Sync {
    fn catalog_discovered(&self, listing_url: &str, product_count: usize);
    /// `products_done` top-level products have gone through; the crawl now
    /// sleeps `secs` before the next one.
    fn pause(&self, products_done: usize, secs: u64);
    /// Variant listing for a top-level product failed; its variants are lost.
    fn product_failed(&self, product_id: &str, error: &ScraperError);
    /// The product page offers no color swatch, so there is nothing to store.
    fn product_without_variants(&self, product_id: &str);
    /// Detail fetch, parse or normalization failed for one variant.
    fn variant_failed(&self, product_id: &str, error: &ScraperError);
    /// Variant already handled earlier in this run via a sibling product.
    fn duplicate_variant(&self, product_id: &str);
    fn record_stored(&self, product_id: &str, outcome: UpsertOutcome);
    /// Store refused the record (constraint violation); the run continues.
    fn record_rejected(&self, product_id: &str, error: &DbError);
    fn dry_run_record(&self, record: &NormalizedRecord);
    fn finished(&self, totals: &CrawlTotals);
}

pub(crate) struct TracingReporter;

impl CrawlReporter for TracingReporter {
    fn catalog_discovered(&self, listing_url: &str, product_count: usize) {
        tracing::info!(listing_url, product_count, "catalog discovered");
    }

    fn pause(&self, products_done: usize, secs: u64) {
        tracing::info!(products_done, secs, "pausing crawl");
    }

    fn product_failed(&self, product_id: &str, error: &ScraperError) {
        tracing::error!(
            product_id,
            fetch = error.is_fetch(),
            error = %error,
            "failed to list color variants"
        );
    }

    fn product_without_variants(&self, product_id: &str) {
        tracing::debug!(product_id, "product page lists no color variants");
    }

    fn variant_failed(&self, product_id: &str, error: &ScraperError) {
        tracing::error!(
            product_id,
            fetch = error.is_fetch(),
            error = %error,
            "failed to extract product details"
        );
    }

    fn duplicate_variant(&self, product_id: &str) {
        tracing::debug!(product_id, "variant already seen this run");
    }

    fn record_stored(&self, product_id: &str, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => tracing::info!(product_id, "inserted product"),
            UpsertOutcome::PriceUpdated { previous_price } => {
                tracing::info!(product_id, previous_price, "updated product price");
            }
            UpsertOutcome::Unchanged => tracing::debug!(product_id, "product unchanged"),
        }
    }

    fn record_rejected(&self, product_id: &str, error: &DbError) {
        tracing::error!(product_id, error = %error, "store rejected product");
    }

    fn dry_run_record(&self, record: &NormalizedRecord) {
        tracing::info!(
            product_id = %record.product_id,
            name = %record.name,
            price = record.price,
            "dry-run: would reconcile product"
        );
    }

    fn finished(&self, totals: &CrawlTotals) {
        tracing::info!(
            discovered = totals.discovered,
            processed = totals.processed,
            inserted = totals.inserted,
            updated = totals.updated,
            skipped = totals.skipped,
            failed = totals.failed,
            "crawl finished"
        );
    }
}
