//! PDF Split algorithm
//!
//! Extracts pages from a PDF by deleting every page that is not wanted and
//! pruning the objects that are no longer reachable.

use crate::document::PdfDocument;
use crate::error::{PdfEditError, Result};
use crate::selection::PageIndexSet;
use lopdf::Document;

/// One page of a split, numbered from 1 in the source document
#[derive(Debug, Clone)]
pub struct SplitPage {
    pub page_number: u32,
    pub bytes: Vec<u8>,
}

impl SplitPage {
    /// Conventional output file name, e.g. `page_3.pdf`
    pub fn file_name(&self) -> String {
        format!("page_{}.pdf", self.page_number)
    }
}

/// Keep only the given zero-based pages (which must exist)
fn keep_pages(doc: &Document, keep: &[usize]) -> Result<Vec<u8>> {
    let page_count = doc.get_pages().len();
    let mut new_doc = doc.clone();

    // Delete unwanted pages (must delete in reverse order to maintain indices)
    let pages_to_delete: Vec<u32> = (0..page_count)
        .rev()
        .filter(|i| keep.binary_search(i).is_err())
        .map(|i| i as u32 + 1)
        .collect();
    for page_num in pages_to_delete {
        new_doc.delete_pages(&[page_num]);
    }

    PdfDocument::from_document(new_doc).to_bytes()
}

/// Split a PDF into one single-page document per selected page.
///
/// Indices past the end of the document are skipped.
pub fn split_pages(pdf_bytes: &[u8], selection: &PageIndexSet) -> Result<Vec<SplitPage>> {
    let doc = PdfDocument::from_bytes(pdf_bytes)?;
    let page_count = doc.page_count();

    let skipped = selection.len() - selection.within(page_count).count();
    if skipped > 0 {
        tracing::debug!("Skipping {} selected page(s) beyond page {}", skipped, page_count);
    }

    selection
        .within(page_count)
        .map(|index| {
            Ok(SplitPage {
                page_number: index as u32 + 1,
                bytes: keep_pages(doc.inner(), &[index])?,
            })
        })
        .collect()
}

/// Extract the selected pages, in ascending order, into a single document.
pub fn extract_pages(pdf_bytes: &[u8], selection: &PageIndexSet) -> Result<Vec<u8>> {
    let doc = PdfDocument::from_bytes(pdf_bytes)?;
    let keep: Vec<usize> = selection.within(doc.page_count()).collect();

    if keep.is_empty() {
        return Err(PdfEditError::NoPagesSelected);
    }

    keep_pages(doc.inner(), &keep)
}
