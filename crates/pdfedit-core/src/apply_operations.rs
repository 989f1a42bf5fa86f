//! Apply overlay plans to PDF documents

use crate::document::PdfDocument;
use crate::error::Result;
use crate::fonts::Color;
use crate::image::EmbeddedImage;
use crate::operations::{OverlayOperation, OverlayPlan};
use crate::overlay::{compose_overlays, PageOverlay};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

/// Compose every operation of `plan` onto the document in one pass.
///
/// Page 0 is treated as page 1. Operations for pages past the end are
/// skipped with a warning. An empty plan returns the input unchanged.
pub fn apply_plan(pdf_bytes: &[u8], plan: &OverlayPlan) -> Result<Vec<u8>> {
    if plan.is_empty() {
        // No changes, return original
        return Ok(pdf_bytes.to_vec());
    }

    let mut doc = PdfDocument::from_bytes(pdf_bytes)?;
    let mut overlays: BTreeMap<usize, PageOverlay> = BTreeMap::new();
    let mut images: HashMap<PathBuf, Arc<EmbeddedImage>> = HashMap::new();

    for op in plan.operations() {
        let index = op.page().max(1) as usize - 1;
        let overlay = overlays.entry(index).or_default();

        match op {
            OverlayOperation::AddText { x, y, text, style, .. } => {
                overlay.text(
                    text.clone(),
                    *x,
                    *y,
                    style.standard_font(),
                    style.font_size,
                    style.fill_color()?,
                );
            }
            OverlayOperation::AddImage {
                path,
                x,
                y,
                width,
                height,
                ..
            } => {
                let image = match images.get(path) {
                    Some(image) => Arc::clone(image),
                    None => {
                        let image = Arc::new(EmbeddedImage::from_path(path)?);
                        images.insert(path.clone(), Arc::clone(&image));
                        image
                    }
                };
                let (w, h) = image.scaled_size(*width, *height);
                overlay.image(image, *x, *y, w, h);
            }
            OverlayOperation::AddWhiteRect { rect, .. } => {
                overlay.rect(rect.x, rect.y, rect.width, rect.height, Color::WHITE);
            }
        }
    }

    let touched = compose_overlays(&mut doc, overlays)?;
    tracing::debug!(
        "Applied {} operations across {} pages",
        plan.len(),
        touched
    );
    doc.to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PdfEditError;
    use crate::operations::{PdfRect, TextStyle};
    use crate::test_support::{create_png, create_test_pdf};

    fn page_content(bytes: &[u8], index: usize) -> String {
        let doc = PdfDocument::from_bytes(bytes).unwrap();
        let page_id = doc.page_id(index).unwrap();
        String::from_utf8_lossy(&doc.inner().get_page_content(page_id).unwrap()).into_owned()
    }

    #[test]
    fn test_empty_plan_returns_original() {
        let pdf = create_test_pdf(1);
        let result = apply_plan(&pdf, &OverlayPlan::new()).unwrap();
        assert_eq!(result, pdf);
    }

    #[test]
    fn test_text_and_cover_on_different_pages() {
        let pdf = create_test_pdf(2);
        let plan: OverlayPlan = vec![
            OverlayOperation::AddText {
                page: 1,
                x: 100.0,
                y: 700.0,
                text: "Hello World".to_string(),
                style: TextStyle::default(),
            },
            OverlayOperation::AddWhiteRect {
                page: 2,
                rect: PdfRect {
                    x: 50.0,
                    y: 600.0,
                    width: 300.0,
                    height: 20.0,
                },
            },
        ]
        .into_iter()
        .collect();

        let result = apply_plan(&pdf, &plan).unwrap();
        assert!(result.starts_with(b"%PDF-"));
        assert!(page_content(&result, 0).contains("(Hello World) Tj"));
        assert!(page_content(&result, 1).contains("re"));
        assert!(!page_content(&result, 1).contains("Hello World"));
    }

    #[test]
    fn test_invalid_color_fails() {
        let pdf = create_test_pdf(1);
        let plan: OverlayPlan = vec![OverlayOperation::AddText {
            page: 1,
            x: 0.0,
            y: 0.0,
            text: "x".to_string(),
            style: TextStyle {
                color: "not-a-color".to_string(),
                ..Default::default()
            },
        }]
        .into_iter()
        .collect();

        assert!(matches!(
            apply_plan(&pdf, &plan),
            Err(PdfEditError::InvalidColor(_))
        ));
    }

    #[test]
    fn test_image_from_path_is_loaded_once() {
        let dir = std::env::temp_dir().join(format!("pdfedit-plan-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("logo.png");
        std::fs::write(&path, create_png(4, 4)).unwrap();

        let pdf = create_test_pdf(2);
        let plan: OverlayPlan = (1..=2)
            .map(|page| OverlayOperation::AddImage {
                page,
                path: path.clone(),
                x: 10.0,
                y: 10.0,
                width: Some(40.0),
                height: None,
            })
            .collect();

        let result = apply_plan(&pdf, &plan).unwrap();
        let doc = PdfDocument::from_bytes(&result).unwrap();
        let images = doc
            .inner()
            .objects
            .values()
            .filter(|obj| {
                obj.as_stream()
                    .ok()
                    .and_then(|s| s.dict.get(b"Subtype").ok())
                    .and_then(|s| s.as_name().ok())
                    == Some(b"Image".as_slice())
                    && obj
                        .as_stream()
                        .map(|s| s.dict.has(b"SMask"))
                        .unwrap_or(false)
            })
            .count();
        // One color image shared by both pages
        assert_eq!(images, 1);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_page_is_skipped() {
        let pdf = create_test_pdf(1);
        let plan: OverlayPlan = vec![OverlayOperation::AddWhiteRect {
            page: 9,
            rect: PdfRect {
                x: 0.0,
                y: 0.0,
                width: 1.0,
                height: 1.0,
            },
        }]
        .into_iter()
        .collect();

        let result = apply_plan(&pdf, &plan).unwrap();
        assert_eq!(PdfDocument::from_bytes(&result).unwrap().page_count(), 1);
    }
}
