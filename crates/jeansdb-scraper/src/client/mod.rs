//! HTTP client for the category listing and product detail pages.

mod catalog;
mod detail;

use std::time::Duration;

use jeansdb_core::{AppConfig, PRODUCT_ID_PLACEHOLDER};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;

use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;

pub use catalog::{full_listing_url, listing_page_size};

/// Connection and retry settings for [`CatalogClient`].
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    /// Browser-like identity; the site serves degraded markup or rejects
    /// requests without one.
    pub user_agent: String,
    /// Additional headers sent with every request.
    pub headers: Vec<(String, String)>,
    /// Maximum number of retry attempts after the first failure.
    pub max_retries: u32,
    /// Base delay in seconds for exponential backoff: `backoff_base_secs * 2^attempt`.
    pub backoff_base_secs: u64,
}

impl FetchSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.request_timeout_secs,
            user_agent: config.user_agent.clone(),
            headers: config.http_headers.clone(),
            max_retries: config.max_retries,
            backoff_base_secs: config.retry_backoff_base_secs,
        }
    }
}

/// Page fetcher for one retail catalog.
///
/// Every request carries the configured `User-Agent` and header map.
/// Transient failures (429, 5xx, network errors) are retried with exponential
/// backoff up to `max_retries` additional attempts.
pub struct CatalogClient {
    client: Client,
    product_url_template: String,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl CatalogClient {
    /// Creates a client whose detail-page URLs come from
    /// `product_url_template` (containing a `{id}` placeholder).
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidHeader`] if a configured header name or value
    ///   is not valid HTTP.
    /// - [`ScraperError::Http`] if the underlying `reqwest::Client` cannot be
    ///   constructed.
    pub fn new(settings: &FetchSettings, product_url_template: &str) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(settings.user_agent.as_str())
            .default_headers(build_header_map(&settings.headers)?)
            .build()?;
        Ok(Self {
            client,
            product_url_template: product_url_template.to_owned(),
            max_retries: settings.max_retries,
            backoff_base_secs: settings.backoff_base_secs,
        })
    }

    /// # Errors
    ///
    /// See [`CatalogClient::new`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Self::new(
            &FetchSettings::from_app_config(config),
            &config.product_url_template,
        )
    }

    /// Detail page URL for an article code.
    #[must_use]
    pub fn product_url(&self, product_id: &str) -> String {
        self.product_url_template
            .replace(PRODUCT_ID_PLACEHOLDER, product_id)
    }

    /// Fetches `url` and returns the response body, retrying transient errors.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RateLimited`]: HTTP 429 after all retries.
    /// - [`ScraperError::NotFound`]: HTTP 404 (not retried).
    /// - [`ScraperError::UnexpectedStatus`]: any other non-2xx status (5xx retried, 4xx not).
    /// - [`ScraperError::Http`]: network or timeout failure after all retries.
    pub async fn fetch_page(&self, url: &str) -> Result<String, ScraperError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, move || async move {
            let response = self
                .client
                .get(url)
                .header(
                    reqwest::header::ACCEPT,
                    "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
                )
                .send()
                .await?;
            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(60);
                return Err(ScraperError::RateLimited {
                    url: url.to_owned(),
                    retry_after_secs,
                });
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(ScraperError::NotFound {
                    url: url.to_owned(),
                });
            }

            if !status.is_success() {
                return Err(ScraperError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.to_owned(),
                });
            }

            Ok(response.text().await?)
        })
        .await
    }
}

fn build_header_map(headers: &[(String, String)]) -> Result<HeaderMap, ScraperError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| ScraperError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        let header_value =
            HeaderValue::from_str(value).map_err(|e| ScraperError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        map.append(header_name, header_value);
    }
    Ok(map)
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
