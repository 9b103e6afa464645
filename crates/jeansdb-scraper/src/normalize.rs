//! Normalization from [`RawDetailRecord`] to [`NormalizedRecord`].
//!
//! Field-level parsing lives in [`crate::parse`]; this module decides which
//! fields are required and assembles the typed record.

use chrono::NaiveDate;
use jeansdb_core::{NormalizedRecord, RawDetailRecord};

use crate::error::ScraperError;
use crate::parse::{
    composition_segments, parse_fraction, parse_price, parse_size_model, parse_size_number,
    snake_label,
};

/// Normalizes a raw detail record captured on `captured_on`.
///
/// Deterministic and free of I/O. Optional source fields map to `None`
/// (or an empty `fit`) rather than failing.
///
/// # Errors
///
/// Returns [`ScraperError::Normalization`] if the name is blank or the price
/// text is not a number once whitespace and the currency symbol are removed.
pub fn normalize_record(
    raw: RawDetailRecord,
    captured_on: NaiveDate,
) -> Result<NormalizedRecord, ScraperError> {
    let name = snake_label(&raw.name);
    if name.is_empty() {
        return Err(ScraperError::Normalization {
            product_id: raw.product_id,
            reason: "product name is blank".into(),
        });
    }

    let Some(price) = parse_price(&raw.price) else {
        return Err(ScraperError::Normalization {
            reason: format!("price {:?} is not numeric", raw.price.trim()),
            product_id: raw.product_id,
        });
    };

    let (size_number, size_model) = match raw.size.as_deref() {
        Some(size) => (parse_size_number(size), parse_size_model(size)),
        None => (None, None),
    };

    let (cotton, spandex) = raw
        .composition
        .as_deref()
        .map_or((None, None), composition_fractions);

    Ok(NormalizedRecord {
        product_id: raw.product_id,
        name,
        price,
        product_color: snake_label(&raw.color),
        fit: raw.fit.as_deref().map(snake_label).unwrap_or_default(),
        size_number,
        size_model,
        cotton,
        spandex,
        scrapy_datetime: captured_on,
    })
}

/// Segment 0 is read as the cotton share and segment 1 as the spandex share.
fn composition_fractions(composition: &str) -> (Option<f64>, Option<f64>) {
    let segments = composition_segments(composition);
    let cotton = segments.first().and_then(|s| parse_fraction(s));
    let spandex = segments.get(1).and_then(|s| parse_fraction(s));
    (cotton, spandex)
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
