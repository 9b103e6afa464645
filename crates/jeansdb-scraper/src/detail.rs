//! Assembly of a [`RawDetailRecord`] from a parsed detail page.

use jeansdb_core::{ColorVariant, RawDetailRecord};

use crate::description::DescriptionTable;
use crate::page::DetailPage;

const COMPOSITION_LABEL: &str = "Composition";
const FIT_LABEL: &str = "Fit";
const SIZE_LABEL: &str = "Size";

/// Composition sub-labels describing parts other than the garment shell.
const LINING_LABELS: &[&str] = &["Pocket lining", "Lining"];

/// Builds the raw record for `variant` from its detail page.
///
/// The description table is read row by row; rows whose composition belongs
/// to a lining are skipped and the first remaining row supplies composition,
/// fit and size. When every row is a lining row the record keeps fit and size
/// from the first row and has no composition.
#[must_use]
pub fn build_raw_record(page: DetailPage, variant: &ColorVariant) -> RawDetailRecord {
    let table = DescriptionTable::from_entries(&page.entries);
    let rows = table.rows();

    let shell_row = rows
        .iter()
        .find(|row| row.get(COMPOSITION_LABEL).is_none_or(|c| !is_lining(c)));

    let (composition, fit, size) = match (shell_row, rows.first()) {
        (Some(row), _) => (
            row.get(COMPOSITION_LABEL).map(strip_sub_label),
            row.get(FIT_LABEL),
            row.get(SIZE_LABEL),
        ),
        (None, Some(row)) => (None, row.get(FIT_LABEL), row.get(SIZE_LABEL)),
        (None, None) => (None, None, None),
    };

    RawDetailRecord {
        product_id: variant.product_id.clone(),
        name: page.name,
        price: page.price,
        color: variant.color.clone(),
        composition: composition.map(str::to_owned),
        fit: fit.map(str::to_owned),
        size: size.map(str::to_owned),
    }
}

/// Splits `"Pocket lining: Polyester 65%"` into its sub-label, if any.
fn sub_label(composition: &str) -> Option<&str> {
    composition.split_once(':').map(|(label, _)| label.trim())
}

/// `true` when a composition line describes a lining rather than the shell.
#[must_use]
pub fn is_lining(composition: &str) -> bool {
    sub_label(composition).is_some_and(|label| {
        LINING_LABELS
            .iter()
            .any(|lining| label.eq_ignore_ascii_case(lining))
    })
}

/// Drops a `"Shell:"`-style prefix, leaving the comma-joined material list.
fn strip_sub_label(composition: &str) -> &str {
    match composition.split_once(':') {
        Some((_, rest)) => rest.trim(),
        None => composition.trim(),
    }
}
