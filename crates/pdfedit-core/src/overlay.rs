//! Overlay composition
//!
//! An overlay is a list of drawing items placed on top of an existing page.
//! Composing one appends a new content stream to the page and registers the
//! fonts and images it uses in the page's resource dictionary under names
//! that do not collide with what the page already uses.

use crate::document::PdfDocument;
use crate::error::Result;
use crate::fonts::{Color, StandardFont};
use crate::image::EmbeddedImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Object, ObjectId};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Line spacing as a multiple of the font size
const LEADING: f64 = 1.2;

#[derive(Debug, Clone)]
pub enum OverlayItem {
    /// Text with its baseline origin at (`x`, `y`). `\n` starts a new line.
    Text {
        text: String,
        x: f64,
        y: f64,
        font: StandardFont,
        size: f64,
        color: Color,
    },
    /// Image scaled into the box with lower-left corner (`x`, `y`)
    Image {
        image: Arc<EmbeddedImage>,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    /// Existing form XObject drawn with the transformation `matrix`
    Form { xobject: ObjectId, matrix: [f64; 6] },
    /// Filled rectangle
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: Color,
    },
}

/// Items to draw on a single page, in painting order.
#[derive(Debug, Clone, Default)]
pub struct PageOverlay {
    items: Vec<OverlayItem>,
}

impl PageOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: OverlayItem) {
        self.items.push(item);
    }

    pub fn text(
        &mut self,
        text: impl Into<String>,
        x: f64,
        y: f64,
        font: StandardFont,
        size: f64,
        color: Color,
    ) -> &mut Self {
        self.push(OverlayItem::Text {
            text: text.into(),
            x,
            y,
            font,
            size,
            color,
        });
        self
    }

    pub fn image(
        &mut self,
        image: Arc<EmbeddedImage>,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> &mut Self {
        self.push(OverlayItem::Image {
            image,
            x,
            y,
            width,
            height,
        });
        self
    }

    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color) -> &mut Self {
        self.push(OverlayItem::Rect {
            x,
            y,
            width,
            height,
            color,
        });
        self
    }

    pub fn items(&self) -> &[OverlayItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Draw overlays onto pages, keyed by zero-based page index.
///
/// Indices past the end of the document are skipped with a warning. Each
/// touched page has its existing content wrapped in `q ... Q` so the overlay
/// starts from the default graphics state. Returns the number of pages
/// that received an overlay.
pub fn compose_overlays(
    doc: &mut PdfDocument,
    overlays: BTreeMap<usize, PageOverlay>,
) -> Result<usize> {
    let page_count = doc.page_count();
    let mut fonts: HashMap<StandardFont, ObjectId> = HashMap::new();
    let mut images: Vec<(Arc<EmbeddedImage>, ObjectId)> = Vec::new();
    let mut touched = 0;

    for (index, overlay) in overlays {
        if overlay.is_empty() {
            continue;
        }

        let Some(page_id) = doc.page_id(index) else {
            tracing::warn!(
                "Skipping overlay for page {}: document has {} pages",
                index + 1,
                page_count
            );
            continue;
        };

        let mut resources = page_resources(doc, page_id);
        let mut font_dict = sub_dictionary(doc, &resources, b"Font");
        let mut xobject_dict = sub_dictionary(doc, &resources, b"XObject");

        let mut font_names: HashMap<StandardFont, Vec<u8>> = HashMap::new();
        let mut operations = Vec::new();

        for item in overlay.items {
            match item {
                OverlayItem::Rect {
                    x,
                    y,
                    width,
                    height,
                    color,
                } => {
                    operations.extend([
                        Operation::new("q", vec![]),
                        fill_color(color),
                        Operation::new("re", vec![real(x), real(y), real(width), real(height)]),
                        Operation::new("f", vec![]),
                        Operation::new("Q", vec![]),
                    ]);
                }
                OverlayItem::Text {
                    text,
                    x,
                    y,
                    font,
                    size,
                    color,
                } => {
                    let name = match font_names.get(&font) {
                        Some(name) => name.clone(),
                        None => {
                            let font_id = match fonts.get(&font) {
                                Some(id) => *id,
                                None => {
                                    let id = doc.inner_mut().add_object(font_object(font));
                                    fonts.insert(font, id);
                                    id
                                }
                            };
                            let name = fresh_name(&font_dict, "F");
                            font_dict.set(name.clone(), Object::Reference(font_id));
                            font_names.insert(font, name.clone());
                            name
                        }
                    };
                    operations.extend(text_operations(&text, x, y, font, &name, size, color));
                }
                OverlayItem::Image {
                    image,
                    x,
                    y,
                    width,
                    height,
                } => {
                    let existing = images
                        .iter()
                        .find(|(seen, _)| Arc::ptr_eq(seen, &image))
                        .map(|(_, id)| *id);
                    let image_id = match existing {
                        Some(id) => id,
                        None => {
                            let id = image.add_to_document(doc.inner_mut())?;
                            images.push((image, id));
                            id
                        }
                    };
                    let name = fresh_name(&xobject_dict, "Im");
                    xobject_dict.set(name.clone(), Object::Reference(image_id));

                    operations.extend(draw_xobject(name, [width, 0.0, 0.0, height, x, y]));
                }
                OverlayItem::Form { xobject, matrix } => {
                    let name = fresh_name(&xobject_dict, "Fm");
                    xobject_dict.set(name.clone(), Object::Reference(xobject));
                    operations.extend(draw_xobject(name, matrix));
                }
            }
        }

        if !font_dict.is_empty() {
            resources.set("Font", Object::Dictionary(font_dict));
        }
        if !xobject_dict.is_empty() {
            resources.set("XObject", Object::Dictionary(xobject_dict));
        }
        doc.inner_mut()
            .get_dictionary_mut(page_id)?
            .set("Resources", Object::Dictionary(resources));

        let content = Content { operations }.encode()?;
        doc.isolate_content(page_id)?;
        doc.append_content(page_id, content)?;

        tracing::debug!("Composed overlay onto page {}", index + 1);
        touched += 1;
    }

    Ok(touched)
}

fn text_operations(
    text: &str,
    x: f64,
    y: f64,
    font: StandardFont,
    font_name: &[u8],
    size: f64,
    color: Color,
) -> Vec<Operation> {
    let mut ops = vec![
        Operation::new("q", vec![]),
        Operation::new("BT", vec![]),
        fill_color(color),
        Operation::new("Tf", vec![Object::Name(font_name.to_vec()), real(size)]),
        Operation::new("TL", vec![real(size * LEADING)]),
        Operation::new("Td", vec![real(x), real(y)]),
    ];

    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            ops.push(Operation::new("T*", vec![]));
        }
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(
                font.encode(line.trim_end_matches('\r')),
                lopdf::StringFormat::Literal,
            )],
        ));
    }

    ops.push(Operation::new("ET", vec![]));
    ops.push(Operation::new("Q", vec![]));
    ops
}

fn draw_xobject(name: Vec<u8>, matrix: [f64; 6]) -> [Operation; 4] {
    [
        Operation::new("q", vec![]),
        Operation::new("cm", matrix.iter().map(|&v| real(v)).collect()),
        Operation::new("Do", vec![Object::Name(name)]),
        Operation::new("Q", vec![]),
    ]
}

fn font_object(font: StandardFont) -> Object {
    let mut dict = dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => font.base_font(),
    };
    if !font.is_symbolic() {
        dict.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
    }
    Object::Dictionary(dict)
}

fn fill_color(color: Color) -> Operation {
    Operation::new(
        "rg",
        vec![
            Object::Real(color.r),
            Object::Real(color.g),
            Object::Real(color.b),
        ],
    )
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

/// The page's effective resource dictionary as a direct copy
fn page_resources(doc: &PdfDocument, page_id: ObjectId) -> Dictionary {
    match doc.inherited_attribute(page_id, b"Resources") {
        Some(Object::Dictionary(dict)) => dict,
        _ => Dictionary::new(),
    }
}

/// A resource category (`Font`, `XObject`) as a direct copy
fn sub_dictionary(doc: &PdfDocument, resources: &Dictionary, key: &[u8]) -> Dictionary {
    resources
        .get(key)
        .ok()
        .and_then(|obj| doc.resolve(obj).ok())
        .and_then(|obj| obj.as_dict().ok())
        .cloned()
        .unwrap_or_default()
}

/// First `<prefix><n>` name not already present in `dict`
fn fresh_name(dict: &Dictionary, prefix: &str) -> Vec<u8> {
    (1..)
        .map(|n| format!("{}{}", prefix, n).into_bytes())
        .find(|name| !dict.has(name))
        .unwrap_or_else(|| prefix.as_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_nested_pdf, create_png, create_test_pdf};

    fn page_text(doc: &PdfDocument, index: usize) -> String {
        let page_id = doc.page_id(index).unwrap();
        let content = doc.inner().get_page_content(page_id).unwrap();
        String::from_utf8_lossy(&content).into_owned()
    }

    fn page_fonts(doc: &PdfDocument, index: usize) -> Dictionary {
        let page_id = doc.page_id(index).unwrap();
        let resources = page_resources(doc, page_id);
        sub_dictionary(doc, &resources, b"Font")
    }

    #[test]
    fn test_fresh_name_skips_existing() {
        let dict = dictionary! { "F1" => 1, "F2" => 2 };
        assert_eq!(fresh_name(&dict, "F"), b"F3".to_vec());
        assert_eq!(fresh_name(&Dictionary::new(), "Im"), b"Im1".to_vec());
    }

    #[test]
    fn test_text_overlay_does_not_clobber_existing_font() {
        let mut doc = PdfDocument::from_bytes(&create_test_pdf(1)).unwrap();
        let mut overlay = PageOverlay::new();
        overlay.text("Hello", 50.0, 50.0, StandardFont::TimesBold, 14.0, Color::BLACK);

        let touched = compose_overlays(&mut doc, BTreeMap::from([(0, overlay)])).unwrap();
        assert_eq!(touched, 1);

        let fonts = page_fonts(&doc, 0);
        // F1 is the page's own Helvetica; the overlay font got F2
        assert!(fonts.has(b"F1"));
        assert!(fonts.has(b"F2"));

        let content = page_text(&doc, 0);
        assert!(content.contains("(Hello) Tj"));
        assert!(content.contains("/F2 "));
        assert!(content.contains("(Page 1) Tj"));
    }

    #[test]
    fn test_same_font_reused_on_page() {
        let mut doc = PdfDocument::from_bytes(&create_test_pdf(1)).unwrap();
        let mut overlay = PageOverlay::new();
        overlay
            .text("a", 10.0, 10.0, StandardFont::Courier, 10.0, Color::BLACK)
            .text("b", 10.0, 30.0, StandardFont::Courier, 10.0, Color::BLACK);

        compose_overlays(&mut doc, BTreeMap::from([(0, overlay)])).unwrap();
        assert_eq!(page_fonts(&doc, 0).len(), 2);
    }

    #[test]
    fn test_out_of_range_page_is_skipped() {
        let mut doc = PdfDocument::from_bytes(&create_test_pdf(2)).unwrap();
        let mut overlay = PageOverlay::new();
        overlay.rect(0.0, 0.0, 10.0, 10.0, Color::WHITE);

        let touched = compose_overlays(&mut doc, BTreeMap::from([(7, overlay)])).unwrap();
        assert_eq!(touched, 0);
    }

    #[test]
    fn test_image_overlay_registers_xobject() {
        let mut doc = PdfDocument::from_bytes(&create_test_pdf(1)).unwrap();
        let image = Arc::new(EmbeddedImage::from_bytes(&create_png(2, 2)).unwrap());
        let mut overlay = PageOverlay::new();
        overlay.image(image, 100.0, 100.0, 50.0, 50.0);

        compose_overlays(&mut doc, BTreeMap::from([(0, overlay)])).unwrap();

        let page_id = doc.page_id(0).unwrap();
        let resources = page_resources(&doc, page_id);
        let xobjects = sub_dictionary(&doc, &resources, b"XObject");
        assert!(xobjects.has(b"Im1"));
        assert!(page_text(&doc, 0).contains("/Im1 Do"));
    }

    #[test]
    fn test_overlay_on_inherited_resources() {
        let mut doc = PdfDocument::from_bytes(&create_nested_pdf()).unwrap();
        let mut overlay = PageOverlay::new();
        overlay.text("Stamp", 72.0, 72.0, StandardFont::Helvetica, 12.0, Color::BLACK);

        compose_overlays(&mut doc, BTreeMap::from([(1, overlay)])).unwrap();

        let bytes = doc.to_bytes().unwrap();
        let reloaded = PdfDocument::from_bytes(&bytes).unwrap();
        assert!(page_fonts(&reloaded, 1).has(b"F1"));
        assert!(page_fonts(&reloaded, 0).is_empty());
    }

    #[test]
    fn test_multiline_text_uses_next_line_operator() {
        let ops = text_operations(
            "one\ntwo",
            0.0,
            0.0,
            StandardFont::Helvetica,
            b"F1",
            10.0,
            Color::BLACK,
        );
        let operators: Vec<&str> = ops.iter().map(|op| op.operator.as_str()).collect();
        assert_eq!(
            operators,
            vec!["q", "BT", "rg", "Tf", "TL", "Td", "Tj", "T*", "Tj", "ET", "Q"]
        );
    }
}
