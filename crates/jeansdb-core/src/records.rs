use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One color swatch on a product detail page.
///
/// `product_id` is the swatch's own article code, which is the SKU-level key
/// used for detail fetches and storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorVariant {
    pub product_id: String,
    /// Swatch label as rendered, e.g. `"Denim blue"`.
    pub color: String,
}

/// Text fields scraped from a single color variant's detail page, before any
/// cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDetailRecord {
    pub product_id: String,
    /// Headline text, possibly padded with whitespace and newlines.
    pub name: String,
    /// Price block text including the currency symbol, e.g. `"$ 49.99"`.
    pub price: String,
    pub color: String,
    /// Comma-joined composition group with lining groups already removed,
    /// e.g. `"98% Cotton, 2% Spandex"`.
    pub composition: Option<String>,
    pub fit: Option<String>,
    /// Either a garment measurement (`"... 105cm"`) or a model size (`"32/32"`).
    pub size: Option<String>,
}

/// A cleaned, typed product row ready for reconciliation against the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub product_id: String,
    /// Lowercase with spaces replaced by underscores, e.g. `"slim_jeans"`.
    pub name: String,
    pub price: f64,
    pub product_color: String,
    pub fit: String,
    /// Three-digit centimeter measurement, e.g. `"105"`.
    pub size_number: Option<String>,
    /// Model size such as `"32/34"`, or a single trailing size token.
    pub size_model: Option<String>,
    /// Cotton share in `[0, 1]`.
    pub cotton: Option<f64>,
    /// Spandex share in `[0, 1]`.
    pub spandex: Option<f64>,
    pub scrapy_datetime: NaiveDate,
}
