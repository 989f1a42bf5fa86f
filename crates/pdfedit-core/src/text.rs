//! Text extraction

use crate::document::PdfDocument;
use crate::error::Result;
use crate::selection::PageIndexSet;

/// Extract the text of the selected pages (every page when `None`),
/// joined with newlines in page order.
///
/// A page whose text cannot be decoded contributes an empty string.
pub fn extract_text(pdf_bytes: &[u8], selection: Option<&PageIndexSet>) -> Result<String> {
    let doc = PdfDocument::from_bytes(pdf_bytes)?;
    let page_count = doc.page_count();
    let selection = match selection {
        Some(set) => set.clone(),
        None => PageIndexSet::all(page_count),
    };

    let chunks: Vec<String> = selection
        .within(page_count)
        .map(|index| {
            let page_number = index as u32 + 1;
            doc.inner()
                .extract_text(&[page_number])
                .unwrap_or_else(|e| {
                    tracing::warn!("Could not extract text from page {}: {}", page_number, e);
                    String::new()
                })
        })
        .collect();

    Ok(chunks.join("\n"))
}
