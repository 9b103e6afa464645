pub mod client;
pub mod description;
pub mod detail;
pub mod error;
pub mod normalize;
pub mod page;
pub mod parse;
mod rate_limit;

pub use client::{full_listing_url, listing_page_size, CatalogClient, FetchSettings};
pub use error::ScraperError;
pub use normalize::normalize_record;
