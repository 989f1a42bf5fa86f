//! PDF editing operations
//!
//! Every operation takes the PDF as bytes and returns new bytes, so callers
//! decide where documents come from and where they go. Page numbers are
//! 1-based at this boundary; `PageIndexSet` holds 0-based indices.
//!
//! - Page structure: `merge_documents`, `split_pages`, `extract_pages`,
//!   `rotate_pages`, `delete_pages`, `reorder_pages`, `insert_blank_page`
//! - Content: `write_text`, `add_image`, `sign`, `edit_text`, `apply_plan`
//! - Forms: `list_fields`, `fill_form`, `flatten_form`
//! - Reading: `extract_text`, `get_page_count`

pub mod apply_operations;
pub mod document;
pub mod edit;
pub mod error;
pub mod fonts;
pub mod forms;
pub mod image;
pub mod merge;
pub mod operations;
pub mod overlay;
pub mod pages;
pub mod selection;
pub mod split;
pub mod stamp;
pub mod text;

#[cfg(test)]
mod test_support;

pub use apply_operations::apply_plan;
pub use document::{PageSize, PdfDocument};
pub use edit::{edit_text, EditOutcome, TextEdit};
pub use error::{PageRangeError, PdfEditError, Result};
pub use fonts::{Color, StandardFont};
pub use forms::{fill_form, flatten_form, list_fields, FieldKind, FormField};
pub use image::EmbeddedImage;
pub use merge::merge_documents;
pub use operations::{OverlayOperation, OverlayPlan, PdfRect, TextStyle};
pub use pages::{delete_pages, insert_blank_page, reorder_pages, rotate_pages};
pub use selection::PageIndexSet;
pub use split::{extract_pages, split_pages, SplitPage};
pub use stamp::{add_image, sign, write_text, ImagePlacement, SignatureOptions, TextPlacement};
pub use text::extract_text;

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<u32> {
    let doc = PdfDocument::from_bytes(bytes)?;
    Ok(doc.page_count() as u32)
}
