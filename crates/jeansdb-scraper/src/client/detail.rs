//! Per-product and per-variant detail page extraction.

use jeansdb_core::{ColorVariant, RawDetailRecord};

use crate::detail::build_raw_record;
use crate::error::ScraperError;
use crate::page::{parse_color_variants, parse_detail_page};

use super::CatalogClient;

impl CatalogClient {
    /// Lists the color variants offered on a product's detail page.
    ///
    /// Returns an empty list when the page has no variant selector.
    ///
    /// # Errors
    ///
    /// Fetch errors from [`CatalogClient::fetch_page`].
    pub async fn extract_color_variants(
        &self,
        product_id: &str,
    ) -> Result<Vec<ColorVariant>, ScraperError> {
        let html = self.fetch_page(&self.product_url(product_id)).await?;
        Ok(parse_color_variants(&html))
    }

    /// Fetches a color variant's own detail page and extracts its raw fields.
    ///
    /// # Errors
    ///
    /// - Fetch errors from [`CatalogClient::fetch_page`].
    /// - [`ScraperError::Parse`] if the headline or price element is missing.
    pub async fn extract_detail(
        &self,
        variant: &ColorVariant,
    ) -> Result<RawDetailRecord, ScraperError> {
        let url = self.product_url(&variant.product_id);
        let html = self.fetch_page(&url).await?;
        let page = parse_detail_page(&html, &url)?;
        Ok(build_raw_record(page, variant))
    }
}
