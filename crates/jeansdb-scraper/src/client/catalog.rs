//! Catalog discovery: the "show all" listing URL and the product ids on it.

use crate::error::ScraperError;
use crate::page::{parse_listing_indicators, parse_product_ids};

use super::CatalogClient;

/// Page size that loads the whole category at once: `ceil(total / shown) * shown`.
///
/// `shown` must be non-zero; [`parse_listing_indicators`] guarantees that.
#[must_use]
pub fn listing_page_size(shown: u32, total: u32) -> u64 {
    let shown = u64::from(shown.max(1));
    u64::from(total).div_ceil(shown) * shown
}

/// Appends the `page-size` query parameter to the category URL.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidUrl`] if `base_url` is not an absolute URL.
pub fn full_listing_url(base_url: &str, page_size: u64) -> Result<String, ScraperError> {
    let mut url = reqwest::Url::parse(base_url).map_err(|e| ScraperError::InvalidUrl {
        url: base_url.to_owned(),
        reason: e.to_string(),
    })?;
    url.query_pairs_mut()
        .append_pair("page-size", &page_size.to_string());
    Ok(url.to_string())
}

impl CatalogClient {
    /// Fetches the category landing page and derives the URL that lists every
    /// product in one response.
    ///
    /// # Errors
    ///
    /// - Fetch errors from [`CatalogClient::fetch_page`].
    /// - [`ScraperError::Parse`] if the page-size indicators are missing or
    ///   unparsable.
    /// - [`ScraperError::InvalidUrl`] if `base_url` is not an absolute URL.
    pub async fn discover_catalog_url(&self, base_url: &str) -> Result<String, ScraperError> {
        let html = self.fetch_page(base_url).await?;
        let indicators = parse_listing_indicators(&html)?;
        let page_size = listing_page_size(indicators.shown, indicators.total);
        tracing::debug!(
            shown = indicators.shown,
            total = indicators.total,
            page_size,
            "derived full listing page size"
        );
        full_listing_url(base_url, page_size)
    }

    /// Fetches the full listing and returns its article codes in document order.
    ///
    /// # Errors
    ///
    /// - Fetch errors from [`CatalogClient::fetch_page`].
    /// - [`ScraperError::Parse`] if the listing container is missing.
    pub async fn list_product_ids(&self, full_listing_url: &str) -> Result<Vec<String>, ScraperError> {
        let html = self.fetch_page(full_listing_url).await?;
        parse_product_ids(&html)
    }
}
