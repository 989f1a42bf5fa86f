//! Text, image and signature stamps
//!
//! Each stamp is a single-item overlay on one page. Pages are 1-based;
//! page 0 is treated as page 1.

use crate::document::PdfDocument;
use crate::error::{PdfEditError, Result};
use crate::fonts::{Color, StandardFont};
use crate::image::EmbeddedImage;
use crate::overlay::{compose_overlays, PageOverlay};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const DEFAULT_FONT_SIZE: f64 = 12.0;
pub const DEFAULT_SIGNATURE_WIDTH: f64 = 180.0;
pub const DEFAULT_SIGNATURE_MARGIN: f64 = 36.0;

#[derive(Debug, Clone, PartialEq)]
pub struct TextPlacement {
    pub page: u32,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub font: StandardFont,
    pub size: f64,
    pub color: Color,
}

impl TextPlacement {
    /// Helvetica 12pt black text on `page`
    pub fn new(page: u32, text: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            page,
            text: text.into(),
            x,
            y,
            font: StandardFont::Helvetica,
            size: DEFAULT_FONT_SIZE,
            color: Color::BLACK,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    pub page: u32,
    pub x: f64,
    pub y: f64,
    /// Missing dimensions keep the image's aspect ratio
    pub width: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignatureOptions {
    /// `None` signs the last page
    pub page: Option<u32>,
    pub width: f64,
    pub margin_x: f64,
    pub margin_y: f64,
}

impl Default for SignatureOptions {
    fn default() -> Self {
        Self {
            page: None,
            width: DEFAULT_SIGNATURE_WIDTH,
            margin_x: DEFAULT_SIGNATURE_MARGIN,
            margin_y: DEFAULT_SIGNATURE_MARGIN,
        }
    }
}

/// Zero-based index for a 1-based page number, with 0 meaning page 1
pub(crate) fn page_index(doc: &PdfDocument, page: u32) -> Result<usize> {
    let page = page.max(1);
    let page_count = doc.page_count();
    if page as usize > page_count {
        return Err(PdfEditError::PageOutOfRange { page, page_count });
    }
    Ok(page as usize - 1)
}

fn compose_single(doc: &mut PdfDocument, index: usize, overlay: PageOverlay) -> Result<Vec<u8>> {
    compose_overlays(doc, BTreeMap::from([(index, overlay)]))?;
    doc.to_bytes()
}

/// Draw a line (or lines) of text onto one page
pub fn write_text(pdf_bytes: &[u8], placement: &TextPlacement) -> Result<Vec<u8>> {
    let mut doc = PdfDocument::from_bytes(pdf_bytes)?;
    let index = page_index(&doc, placement.page)?;

    let mut overlay = PageOverlay::new();
    overlay.text(
        placement.text.clone(),
        placement.x,
        placement.y,
        placement.font,
        placement.size,
        placement.color,
    );

    tracing::debug!(
        "Writing {} chars at ({}, {}) on page {}",
        placement.text.chars().count(),
        placement.x,
        placement.y,
        index + 1
    );
    compose_single(&mut doc, index, overlay)
}

/// Place an image onto one page
pub fn add_image(
    pdf_bytes: &[u8],
    image: &EmbeddedImage,
    placement: &ImagePlacement,
) -> Result<Vec<u8>> {
    let mut doc = PdfDocument::from_bytes(pdf_bytes)?;
    let index = page_index(&doc, placement.page)?;
    let (width, height) = image.scaled_size(placement.width, placement.height);

    let mut overlay = PageOverlay::new();
    overlay.image(
        Arc::new(image.clone()),
        placement.x,
        placement.y,
        width,
        height,
    );
    compose_single(&mut doc, index, overlay)
}

/// Place a signature image in the bottom-right corner of a page.
///
/// This is a visual signature only; nothing is cryptographically signed.
pub fn sign(
    pdf_bytes: &[u8],
    image: &EmbeddedImage,
    options: &SignatureOptions,
) -> Result<Vec<u8>> {
    let mut doc = PdfDocument::from_bytes(pdf_bytes)?;
    let index = match options.page {
        Some(page) => page_index(&doc, page)?,
        None => doc
            .page_count()
            .checked_sub(1)
            .ok_or(PdfEditError::PageOutOfRange {
                page: 1,
                page_count: 0,
            })?,
    };

    let page_size = doc.page_size(index)?;
    let (width, height) = image.scaled_size(Some(options.width), None);
    let x = page_size.width - options.margin_x - width;
    let y = options.margin_y;

    let mut overlay = PageOverlay::new();
    overlay.image(Arc::new(image.clone()), x, y, width, height);

    tracing::debug!("Signature placed at ({}, {}) on page {}", x, y, index + 1);
    compose_single(&mut doc, index, overlay)
}
