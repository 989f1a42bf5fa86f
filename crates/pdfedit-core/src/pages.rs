//! Page-level edits: rotate, delete, reorder and insert blank pages
//!
//! Page numbers in this module are 1-based. Numbers that do not exist in
//! the document are skipped with a warning rather than failing the edit.

use crate::document::{number, PageSize, PdfDocument};
use crate::error::{PdfEditError, Result};
use crate::selection::PageIndexSet;
use lopdf::{Object, ObjectId};

/// Rotate pages clockwise by `degrees`, which must be a multiple of 90.
///
/// The rotation is added to each page's current (possibly inherited)
/// `/Rotate` and normalised to `0..360`. `None` rotates every page.
pub fn rotate_pages(
    pdf_bytes: &[u8],
    degrees: i64,
    selection: Option<&PageIndexSet>,
) -> Result<Vec<u8>> {
    if degrees % 90 != 0 {
        return Err(PdfEditError::InvalidRotation(degrees));
    }

    let mut doc = PdfDocument::from_bytes(pdf_bytes)?;
    let page_count = doc.page_count();
    let selection = match selection {
        Some(set) => set.clone(),
        None => PageIndexSet::all(page_count),
    };

    let mut rotated = 0;
    for index in selection.within(page_count) {
        let Some(page_id) = doc.page_id(index) else {
            continue;
        };

        let current = doc
            .inherited_attribute(page_id, b"Rotate")
            .as_ref()
            .and_then(number)
            .unwrap_or(0.0) as i64;
        let angle = (current.rem_euclid(360) + degrees.rem_euclid(360)).rem_euclid(360);

        doc.inner_mut()
            .get_dictionary_mut(page_id)?
            .set("Rotate", Object::Integer(angle));
        rotated += 1;
    }

    tracing::debug!("Rotated {} page(s) by {} degrees", rotated, degrees);
    doc.to_bytes()
}

/// Remove the given pages.
///
/// Deleting every page is refused with `NoPagesSelected`, since a PDF
/// needs at least one page.
pub fn delete_pages(pdf_bytes: &[u8], pages: &[u32]) -> Result<Vec<u8>> {
    let mut doc = PdfDocument::from_bytes(pdf_bytes)?;
    let page_count = doc.page_count();

    // Zeros are reported by `from_page_numbers`
    for &page in pages {
        if page as usize > page_count {
            tracing::warn!("Invalid page number {} for deletion, ignoring", page);
        }
    }

    let doomed = PageIndexSet::from_page_numbers(pages);
    let remaining: Vec<ObjectId> = doc
        .page_ids()
        .into_iter()
        .enumerate()
        .filter(|(index, _)| !doomed.contains(*index))
        .map(|(_, id)| id)
        .collect();

    if remaining.is_empty() {
        return Err(PdfEditError::NoPagesSelected);
    }

    tracing::debug!("Deleting {} page(s)", page_count - remaining.len());
    doc.set_page_order(&remaining)?;
    doc.to_bytes()
}

/// Rebuild the document from pages in the given order.
///
/// Pages may be repeated; pages that are not listed are dropped.
pub fn reorder_pages(pdf_bytes: &[u8], order: &[u32]) -> Result<Vec<u8>> {
    let mut doc = PdfDocument::from_bytes(pdf_bytes)?;
    let page_count = doc.page_count();

    let mut ids = Vec::with_capacity(order.len());
    for &page in order {
        match page.checked_sub(1).and_then(|i| doc.page_id(i as usize)) {
            Some(id) => ids.push(id),
            None => tracing::warn!(
                "Invalid page number {} in new order (document has {} pages), ignoring",
                page,
                page_count
            ),
        }
    }

    if ids.is_empty() {
        return Err(PdfEditError::NoPagesSelected);
    }

    doc.set_page_order(&ids)?;
    doc.to_bytes()
}

/// Insert a blank page so that it becomes page `page_num`.
///
/// `0` and `1` insert at the front; anything past the end appends.
pub fn insert_blank_page(pdf_bytes: &[u8], page_num: u32, size: PageSize) -> Result<Vec<u8>> {
    let mut doc = PdfDocument::from_bytes(pdf_bytes)?;
    let mut ids = doc.page_ids();

    let position = (page_num.saturating_sub(1) as usize).min(ids.len());
    let blank = doc.new_blank_page(size)?;
    ids.insert(position, blank);

    tracing::debug!(
        "Inserting {}x{} blank page at position {}",
        size.width,
        size.height,
        position + 1
    );
    doc.set_page_order(&ids)?;
    doc.to_bytes()
}
