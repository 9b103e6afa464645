use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited fetching {url} (retry after {retry_after_secs}s)")]
    RateLimited { url: String, retry_after_secs: u64 },

    #[error("page not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// An expected element or attribute is missing from the page, which
    /// usually means the site's markup changed.
    #[error("parse error in {context}: {reason}")]
    Parse { context: String, reason: String },

    #[error("normalization error for product {product_id}: {reason}")]
    Normalization { product_id: String, reason: String },

    #[error("invalid request header \"{name}\": {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ScraperError {
    /// `true` for network and HTTP status failures, as opposed to problems
    /// with the content of a page that was fetched successfully.
    #[must_use]
    pub fn is_fetch(&self) -> bool {
        matches!(
            self,
            Self::Http(_)
                | Self::RateLimited { .. }
                | Self::NotFound { .. }
                | Self::UnexpectedStatus { .. }
        )
    }

    pub(crate) fn parse(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            context: context.into(),
            reason: reason.into(),
        }
    }
}
