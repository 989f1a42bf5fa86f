//! AcroForm fields: listing, filling and flattening
//!
//! Only terminal fields (those that carry a value) are exposed, by their
//! fully qualified dotted name. Text field values get a regenerated
//! appearance stream so that they show up when the form is flattened.

use crate::document::PdfDocument;
use crate::error::{PdfEditError, Result};
use crate::fonts::StandardFont;
use crate::overlay::{compose_overlays, OverlayItem, PageOverlay};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Object, ObjectId, Stream, StringFormat};
use serde::Serialize;
use std::collections::BTreeMap;

/// Field tree depth after which traversal gives up.
const MAX_FIELD_DEPTH: usize = 32;

/// Annotation flags that keep a widget off the printed page
const HIDDEN_FLAGS: i64 = 0b10 | 0b10_0000;

const RADIO_FLAG: i64 = 1 << 15;
const PUSHBUTTON_FLAG: i64 = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Checkbox,
    Radio,
    Button,
    Choice,
    Signature,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormField {
    pub name: String,
    pub kind: FieldKind,
    pub value: Option<String>,
}

/// A terminal field and where it lives in the document
#[derive(Debug, Clone)]
struct FieldNode {
    id: ObjectId,
    name: String,
    kind: FieldKind,
}

/// Decode a PDF text string (UTF-16BE with BOM, otherwise Latin-1)
fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// Encode a PDF text string, falling back to UTF-16BE outside Latin-1
fn encode_text_string(text: &str) -> Vec<u8> {
    if text.chars().all(|c| (c as u32) < 0x100) {
        return text.chars().map(|c| c as u32 as u8).collect();
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    bytes
}

fn value_to_string(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        Object::Integer(i) => Some(i.to_string()),
        Object::Real(r) => Some(r.to_string()),
        Object::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(value_to_string).collect();
            Some(parts.join(", "))
        }
        _ => None,
    }
}

/// Field attribute, inherited from ancestor fields when absent
fn field_attribute(doc: &PdfDocument, id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut node_id = id;
    for _ in 0..MAX_FIELD_DEPTH {
        let node = doc.inner().get_dictionary(node_id).ok()?;
        if let Ok(value) = node.get(key) {
            return doc.resolve(value).ok().cloned();
        }
        node_id = node.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

fn field_kind(doc: &PdfDocument, id: ObjectId) -> FieldKind {
    let flags = field_attribute(doc, id, b"Ff")
        .and_then(|f| f.as_i64().ok())
        .unwrap_or(0);

    match field_attribute(doc, id, b"FT").as_ref().and_then(|ft| ft.as_name().ok()) {
        Some(b"Tx") => FieldKind::Text,
        Some(b"Btn") if flags & PUSHBUTTON_FLAG != 0 => FieldKind::Button,
        Some(b"Btn") if flags & RADIO_FLAG != 0 => FieldKind::Radio,
        Some(b"Btn") => FieldKind::Checkbox,
        Some(b"Ch") => FieldKind::Choice,
        Some(b"Sig") => FieldKind::Signature,
        _ => FieldKind::Unknown,
    }
}

/// Root field references from the catalog's AcroForm
fn root_fields(doc: &PdfDocument) -> Vec<ObjectId> {
    let Ok(catalog_id) = doc.catalog_id() else {
        return Vec::new();
    };
    let acroform = doc
        .inner()
        .get_dictionary(catalog_id)
        .ok()
        .and_then(|catalog| catalog.get(b"AcroForm").ok())
        .and_then(|obj| doc.resolve(obj).ok())
        .and_then(|obj| obj.as_dict().ok());

    acroform
        .and_then(|form| form.get(b"Fields").ok())
        .and_then(|obj| doc.resolve(obj).ok())
        .and_then(|obj| obj.as_array().ok())
        .map(|fields| {
            fields
                .iter()
                .filter_map(|f| f.as_reference().ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Kid references of a field node that are themselves fields (have `/T`)
fn field_kids(doc: &PdfDocument, id: ObjectId) -> Vec<ObjectId> {
    doc.inner()
        .get_dictionary(id)
        .ok()
        .and_then(|dict| dict.get(b"Kids").ok())
        .and_then(|obj| doc.resolve(obj).ok())
        .and_then(|obj| obj.as_array().ok())
        .map(|kids| {
            kids.iter()
                .filter_map(|k| k.as_reference().ok())
                .filter(|&kid| {
                    doc.inner()
                        .get_dictionary(kid)
                        .map(|d| d.has(b"T"))
                        .unwrap_or(false)
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Widget annotations of a terminal field: its kids, or the field itself
fn widgets(doc: &PdfDocument, id: ObjectId) -> Vec<ObjectId> {
    let kids: Vec<ObjectId> = doc
        .inner()
        .get_dictionary(id)
        .ok()
        .and_then(|dict| dict.get(b"Kids").ok())
        .and_then(|obj| doc.resolve(obj).ok())
        .and_then(|obj| obj.as_array().ok())
        .map(|kids| kids.iter().filter_map(|k| k.as_reference().ok()).collect())
        .unwrap_or_default();

    if kids.is_empty() {
        vec![id]
    } else {
        kids
    }
}

fn collect_fields(doc: &PdfDocument) -> Vec<FieldNode> {
    let mut out = Vec::new();
    let mut stack: Vec<(ObjectId, String, usize)> = root_fields(doc)
        .into_iter()
        .rev()
        .map(|id| (id, String::new(), 0))
        .collect();

    while let Some((id, prefix, depth)) = stack.pop() {
        if depth > MAX_FIELD_DEPTH {
            tracing::warn!("Form field tree too deep, stopping at {}", prefix);
            continue;
        }

        let partial = doc
            .inner()
            .get_dictionary(id)
            .ok()
            .and_then(|d| d.get(b"T").ok())
            .and_then(value_to_string);
        let name = match (prefix.is_empty(), partial) {
            (true, Some(p)) => p,
            (false, Some(p)) => format!("{}.{}", prefix, p),
            (_, None) => prefix.clone(),
        };

        let kids = field_kids(doc, id);
        if kids.is_empty() {
            out.push(FieldNode {
                id,
                kind: field_kind(doc, id),
                name,
            });
        } else {
            for kid in kids.into_iter().rev() {
                stack.push((kid, name.clone(), depth + 1));
            }
        }
    }

    out
}

/// List the terminal fields of the document's form
pub fn list_fields(pdf_bytes: &[u8]) -> Result<Vec<FormField>> {
    let doc = PdfDocument::from_bytes(pdf_bytes)?;
    Ok(collect_fields(&doc)
        .into_iter()
        .map(|node| FormField {
            value: field_attribute(&doc, node.id, b"V")
                .as_ref()
                .and_then(value_to_string),
            name: node.name,
            kind: node.kind,
        })
        .collect())
}

/// Names of the "on" appearance states of a button widget
fn on_states(doc: &PdfDocument, widget: ObjectId) -> Vec<Vec<u8>> {
    doc.inner()
        .get_dictionary(widget)
        .ok()
        .and_then(|w| w.get(b"AP").ok())
        .and_then(|ap| doc.resolve(ap).ok())
        .and_then(|ap| ap.as_dict().ok())
        .and_then(|ap| ap.get(b"N").ok())
        .and_then(|n| doc.resolve(n).ok())
        .and_then(|n| n.as_dict().ok())
        .map(|states| {
            states
                .iter()
                .map(|(k, _)| k.clone())
                .filter(|k| k.as_slice() != b"Off")
                .collect()
        })
        .unwrap_or_default()
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "true" | "yes" | "on" | "1" | "x" | "checked"
    )
}

fn is_falsy(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "" | "false" | "no" | "off" | "0"
    )
}

fn set_button(doc: &mut PdfDocument, field: &FieldNode, value: &str) -> Result<()> {
    let targets = widgets(doc, field.id);

    // "true"-like values mean "whatever the first widget calls its on state"
    let state: Vec<u8> = if is_falsy(value) {
        b"Off".to_vec()
    } else if is_truthy(value) {
        targets
            .iter()
            .flat_map(|&w| on_states(doc, w))
            .next()
            .unwrap_or_else(|| b"Yes".to_vec())
    } else {
        value.as_bytes().to_vec()
    };

    for widget in targets {
        let appearance = if on_states(doc, widget).contains(&state) {
            state.clone()
        } else {
            b"Off".to_vec()
        };
        doc.inner_mut()
            .get_dictionary_mut(widget)?
            .set("AS", Object::Name(appearance));
    }

    doc.inner_mut()
        .get_dictionary_mut(field.id)?
        .set("V", Object::Name(state));
    Ok(())
}

/// Font size from a default appearance string such as `/Helv 0 Tf 0 g`
fn da_font_size(da: &str) -> Option<f64> {
    let tokens: Vec<&str> = da.split_whitespace().collect();
    let pos = tokens.iter().position(|t| *t == "Tf")?;
    tokens.get(pos.checked_sub(1)?)?.parse().ok()
}

/// Build a plain Helvetica appearance stream showing `value`
fn text_appearance(doc: &mut PdfDocument, widget: ObjectId, field_id: ObjectId, value: &str) -> Result<()> {
    let Some(rect) = doc
        .inner()
        .get_dictionary(widget)?
        .get(b"Rect")
        .ok()
        .cloned()
    else {
        return Ok(());
    };
    let rect = doc.rect_from_object(&rect)?;
    let width = (rect[2] - rect[0]).abs();
    let height = (rect[3] - rect[1]).abs();

    let da_size = field_attribute(doc, field_id, b"DA")
        .as_ref()
        .and_then(value_to_string)
        .and_then(|da| da_font_size(&da))
        .unwrap_or(0.0);
    // Size 0 means auto-size to the field height
    let size = if da_size > 0.0 {
        da_size
    } else {
        (height * 0.7).clamp(4.0, 12.0)
    };

    let font = StandardFont::Helvetica;
    let baseline = ((height - size) / 2.0).max(0.0) + size * 0.22;
    let content = Content {
        operations: vec![
            Operation::new("BMC", vec![Object::Name(b"Tx".to_vec())]),
            Operation::new("q", vec![]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(b"Helv".to_vec()), Object::Real(size as f32)]),
            Operation::new("Td", vec![Object::Real(2.0), Object::Real(baseline as f32)]),
            Operation::new(
                "Tj",
                vec![Object::String(font.encode(value), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
            Operation::new("EMC", vec![]),
        ],
    };

    let font_id = doc.inner_mut().add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => font.base_font(),
        "Encoding" => "WinAnsiEncoding",
    });
    let stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), Object::Real(width as f32), Object::Real(height as f32)],
            "Resources" => dictionary! {
                "Font" => dictionary! { "Helv" => Object::Reference(font_id) },
            },
        },
        content.encode()?,
    );
    let stream_id = doc.inner_mut().add_object(stream);

    doc.inner_mut()
        .get_dictionary_mut(widget)?
        .set("AP", dictionary! { "N" => Object::Reference(stream_id) });
    Ok(())
}

fn set_text(doc: &mut PdfDocument, field: &FieldNode, value: &str) -> Result<()> {
    doc.inner_mut().get_dictionary_mut(field.id)?.set(
        "V",
        Object::String(encode_text_string(value), StringFormat::Literal),
    );
    for widget in widgets(doc, field.id) {
        text_appearance(doc, widget, field.id, value)?;
    }
    Ok(())
}

fn set_need_appearances(doc: &mut PdfDocument) -> Result<()> {
    let catalog_id = doc.catalog_id()?;
    let acroform = doc.inner().get_dictionary(catalog_id)?.get(b"AcroForm")?.clone();
    match acroform {
        Object::Reference(id) => {
            doc.inner_mut()
                .get_dictionary_mut(id)?
                .set("NeedAppearances", Object::Boolean(true));
        }
        Object::Dictionary(mut dict) => {
            dict.set("NeedAppearances", Object::Boolean(true));
            doc.inner_mut()
                .get_dictionary_mut(catalog_id)?
                .set("AcroForm", Object::Dictionary(dict));
        }
        _ => {}
    }
    Ok(())
}

/// Assign values to form fields by fully qualified name.
///
/// Checkbox and radio values are appearance state names (`"Yes"`, `"Off"`);
/// `"true"`/`"on"`/`"1"` select the widget's own on state. Unknown names are
/// skipped with a warning. A document without a form is returned unchanged.
pub fn fill_form(
    pdf_bytes: &[u8],
    values: &BTreeMap<String, String>,
    flatten: bool,
) -> Result<Vec<u8>> {
    let mut doc = PdfDocument::from_bytes(pdf_bytes)?;
    let fields = collect_fields(&doc);

    if fields.is_empty() {
        tracing::warn!("Document has no form fields; nothing to fill");
        return Ok(pdf_bytes.to_vec());
    }

    let by_name: BTreeMap<&str, &FieldNode> =
        fields.iter().map(|f| (f.name.as_str(), f)).collect();

    let mut filled = 0;
    for (name, value) in values {
        let Some(field) = by_name.get(name.as_str()) else {
            tracing::warn!("No form field named '{}', skipping", name);
            continue;
        };

        match field.kind {
            FieldKind::Checkbox | FieldKind::Radio => set_button(&mut doc, field, value)?,
            FieldKind::Text | FieldKind::Choice => set_text(&mut doc, field, value)?,
            FieldKind::Button | FieldKind::Signature | FieldKind::Unknown => {
                tracing::warn!("Field '{}' cannot hold a value, skipping", name);
                continue;
            }
        }
        filled += 1;
    }

    set_need_appearances(&mut doc)?;
    tracing::debug!("Filled {} of {} requested fields", filled, values.len());

    if flatten {
        flatten_document(&mut doc)?;
    }
    doc.to_bytes()
}

/// Bake every visible annotation's appearance into the page content and
/// remove all annotations and the interactive form.
pub fn flatten_form(pdf_bytes: &[u8]) -> Result<Vec<u8>> {
    let mut doc = PdfDocument::from_bytes(pdf_bytes)?;
    let count = flatten_document(&mut doc)?;
    tracing::debug!("Flattened {} annotation appearances", count);
    doc.to_bytes()
}

/// Normal appearance stream of an annotation, honouring `/AS` for
/// appearance dictionaries with several states
fn normal_appearance(doc: &PdfDocument, annot: &Dictionary) -> Option<ObjectId> {
    let ap = doc.resolve(annot.get(b"AP").ok()?).ok()?.as_dict().ok()?;
    match ap.get(b"N").ok()? {
        Object::Reference(id) => match doc.inner().get_object(*id).ok()? {
            Object::Stream(_) => Some(*id),
            Object::Dictionary(states) => {
                let state = annot.get(b"AS").ok()?.as_name().ok()?;
                states.get(state).ok()?.as_reference().ok()
            }
            _ => None,
        },
        Object::Dictionary(states) => {
            let state = annot.get(b"AS").ok()?.as_name().ok()?;
            states.get(state).ok()?.as_reference().ok()
        }
        _ => None,
    }
}

/// Matrix mapping an appearance's BBox onto the annotation Rect
fn appearance_matrix(doc: &PdfDocument, stream_id: ObjectId, rect: [f64; 4]) -> Result<[f64; 6]> {
    let stream = doc
        .inner()
        .get_object(stream_id)?
        .as_stream()
        .map_err(|_| PdfEditError::Operation("Appearance is not a stream".into()))?;

    let bbox = match stream.dict.get(b"BBox") {
        Ok(obj) => doc.rect_from_object(obj)?,
        Err(_) => [0.0, 0.0, rect[2] - rect[0], rect[3] - rect[1]],
    };

    let (x1, y1) = (rect[0].min(rect[2]), rect[1].min(rect[3]));
    let rect_w = (rect[2] - rect[0]).abs();
    let rect_h = (rect[3] - rect[1]).abs();
    let bbox_w = (bbox[2] - bbox[0]).abs();
    let bbox_h = (bbox[3] - bbox[1]).abs();

    let sx = if bbox_w > 0.0 { rect_w / bbox_w } else { 1.0 };
    let sy = if bbox_h > 0.0 { rect_h / bbox_h } else { 1.0 };
    let bx = bbox[0].min(bbox[2]);
    let by = bbox[1].min(bbox[3]);

    Ok([sx, 0.0, 0.0, sy, x1 - bx * sx, y1 - by * sy])
}

fn flatten_document(doc: &mut PdfDocument) -> Result<usize> {
    let mut overlays = BTreeMap::new();

    for (index, page_id) in doc.page_ids().into_iter().enumerate() {
        let annots: Vec<Object> = match doc.inner().get_dictionary(page_id)?.get(b"Annots") {
            Ok(obj) => doc
                .resolve(obj)?
                .as_array()
                .map(|a| a.clone())
                .unwrap_or_default(),
            Err(_) => continue,
        };

        let mut overlay = PageOverlay::new();
        for annot in &annots {
            let Ok(dict) = doc.resolve(annot).and_then(|a| {
                a.as_dict()
                    .map_err(|_| PdfEditError::Operation("Annotation is not a dictionary".into()))
            }) else {
                continue;
            };

            let flags = dict.get(b"F").and_then(|f| f.as_i64()).unwrap_or(0);
            if flags & HIDDEN_FLAGS != 0 {
                continue;
            }
            let Some(stream_id) = normal_appearance(doc, dict) else {
                continue;
            };
            let Ok(rect) = dict.get(b"Rect").map(|r| r.clone()) else {
                continue;
            };
            let rect = doc.rect_from_object(&rect)?;
            let matrix = appearance_matrix(doc, stream_id, rect)?;
            overlay.push(OverlayItem::Form {
                xobject: stream_id,
                matrix,
            });
        }

        doc.inner_mut().get_dictionary_mut(page_id)?.remove(b"Annots");
        if !overlay.is_empty() {
            overlays.insert(index, overlay);
        }
    }

    // Appearance streams used as page XObjects must be typed as forms
    for overlay in overlays.values() {
        for item in overlay.items() {
            if let OverlayItem::Form { xobject, .. } = item {
                if let Ok(Object::Stream(stream)) = doc.inner_mut().get_object_mut(*xobject) {
                    stream.dict.set("Type", Object::Name(b"XObject".to_vec()));
                    stream.dict.set("Subtype", Object::Name(b"Form".to_vec()));
                }
            }
        }
    }

    let flattened = overlays.values().map(PageOverlay::len).sum();
    compose_overlays(doc, overlays)?;

    let catalog_id = doc.catalog_id()?;
    doc.inner_mut()
        .get_dictionary_mut(catalog_id)?
        .remove(b"AcroForm");

    Ok(flattened)
}
