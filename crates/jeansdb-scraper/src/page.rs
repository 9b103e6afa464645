//! Markup extraction for the listing and product detail pages.
//!
//! Everything here is synchronous and works on an already-fetched body:
//! `scraper::Html` is not `Send`, so documents never live across an `.await`.
//! Selectors target one fixed page shape; when the site changes its markup
//! these functions fail with [`ScraperError::Parse`] rather than returning
//! partial data.

use std::collections::HashSet;
use std::sync::LazyLock;

use jeansdb_core::ColorVariant;
use scraper::{ElementRef, Html, Selector};

use crate::error::ScraperError;

static LOAD_MORE_HEADING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2.load-more-heading").expect("valid selector"));
static PRODUCTS_LISTING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("ul.products-listing").expect("valid selector"));
static PRODUCT_ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("article.hm-product-item").expect("valid selector"));
// Matches both the plain swatch and the `active` one for the current variant.
static COLOR_SWATCH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.filter-option.miniature").expect("valid selector"));
static HEADLINE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1.product-item-headline").expect("valid selector"));
static PRICE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.product-item-price").expect("valid selector"));
static DESCRIPTION_ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.pdp-description-list-item").expect("valid selector"));

/// Page-size indicators read from the listing's "load more" heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingIndicators {
    /// Items rendered on first load (`data-items-shown`).
    pub shown: u32,
    /// Items in the whole category (`data-total`).
    pub total: u32,
}

/// One `pdp-description-list-item` block: its label line and the raw lines
/// that follow it. Values may be blank; see [`crate::description`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptionEntry {
    pub label: String,
    pub values: Vec<String>,
}

/// Raw text pulled from a color variant's detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailPage {
    pub name: String,
    pub price: String,
    pub entries: Vec<DescriptionEntry>,
}

/// Reads `data-items-shown` and `data-total` from the listing heading.
///
/// # Errors
///
/// Returns [`ScraperError::Parse`] if the heading is missing, either attribute
/// is absent or not an unsigned integer, or `shown` is zero.
pub fn parse_listing_indicators(html: &str) -> Result<ListingIndicators, ScraperError> {
    let document = Html::parse_document(html);
    let heading = document
        .select(&LOAD_MORE_HEADING)
        .next()
        .ok_or_else(|| ScraperError::parse("listing page", "no h2.load-more-heading element"))?;

    let shown = numeric_attr(heading, "data-items-shown")?;
    let total = numeric_attr(heading, "data-total")?;
    if shown == 0 {
        return Err(ScraperError::parse(
            "listing page",
            "data-items-shown is 0; cannot derive page count",
        ));
    }
    Ok(ListingIndicators { shown, total })
}

fn numeric_attr(element: ElementRef<'_>, attr: &str) -> Result<u32, ScraperError> {
    let raw = element.value().attr(attr).ok_or_else(|| {
        ScraperError::parse("listing page", format!("load-more heading has no {attr}"))
    })?;
    raw.trim().parse::<u32>().map_err(|e| {
        ScraperError::parse(
            "listing page",
            format!("{attr}=\"{raw}\" is not a count: {e}"),
        )
    })
}

/// Collects `data-articlecode` from every product tile in the listing, in
/// document order, without duplicates.
///
/// # Errors
///
/// Returns [`ScraperError::Parse`] if the listing container is missing.
pub fn parse_product_ids(html: &str) -> Result<Vec<String>, ScraperError> {
    let document = Html::parse_document(html);
    let listing = document
        .select(&PRODUCTS_LISTING)
        .next()
        .ok_or_else(|| ScraperError::parse("full listing page", "no ul.products-listing element"))?;

    let mut seen = HashSet::new();
    let ids = listing
        .select(&PRODUCT_ITEM)
        .filter_map(|item| item.value().attr("data-articlecode"))
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .filter(|code| seen.insert(code.to_string()))
        .map(str::to_owned)
        .collect();
    Ok(ids)
}

/// Reads color swatches from a product detail page, in document order.
///
/// Swatches missing either `data-color` or `data-articlecode` are skipped.
/// A page without a variant selector yields an empty list.
#[must_use]
pub fn parse_color_variants(html: &str) -> Vec<ColorVariant> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    document
        .select(&COLOR_SWATCH)
        .filter_map(|swatch| {
            let color = swatch.value().attr("data-color")?.trim();
            let product_id = swatch.value().attr("data-articlecode")?.trim();
            if product_id.is_empty() || !seen.insert(product_id.to_owned()) {
                return None;
            }
            Some(ColorVariant {
                product_id: product_id.to_owned(),
                color: color.to_owned(),
            })
        })
        .collect()
}

/// Extracts headline, price block and description entries from a detail page.
///
/// `context` names the page in error messages (usually its URL).
///
/// # Errors
///
/// Returns [`ScraperError::Parse`] if the headline or price element is
/// missing or empty.
pub fn parse_detail_page(html: &str, context: &str) -> Result<DetailPage, ScraperError> {
    let document = Html::parse_document(html);

    let name = required_text(&document, &HEADLINE, "h1.product-item-headline", context)?;
    let price = required_text(&document, &PRICE, "div.product-item-price", context)?;

    let entries = document
        .select(&DESCRIPTION_ITEM)
        .filter_map(description_entry)
        .collect();

    Ok(DetailPage {
        name,
        price,
        entries,
    })
}

fn required_text(
    document: &Html,
    selector: &Selector,
    what: &str,
    context: &str,
) -> Result<String, ScraperError> {
    let text: String = document
        .select(selector)
        .next()
        .ok_or_else(|| ScraperError::parse(context, format!("no {what} element")))?
        .text()
        .collect();
    if text.trim().is_empty() {
        return Err(ScraperError::parse(context, format!("{what} is empty")));
    }
    Ok(text)
}

/// Splits a description block into lines. The first non-blank line is the
/// label; every later line (blank or not) is a value.
fn description_entry(item: ElementRef<'_>) -> Option<DescriptionEntry> {
    let mut lines = item
        .text()
        .flat_map(str::lines)
        .map(str::trim)
        .skip_while(|line| line.is_empty());
    let label = lines.next()?.to_owned();
    let values = lines.map(str::to_owned).collect();
    Some(DescriptionEntry { label, values })
}

#[cfg(test)]
#[path = "page_test.rs"]
mod tests;
