//! PDF Merge algorithm
//!
//! Combines multiple PDFs into a single document.

use crate::document::PdfDocument;
use crate::error::{PdfEditError, Result};
use lopdf::{Document, Object, ObjectId};

/// Merge multiple PDFs into one
///
/// The algorithm:
/// 1. If empty, return error
/// 2. If single document, return it as-is
/// 3. Use the first document as the destination
/// 4. For each further source document:
///    a. Offset its object ids past the destination's highest id
///    b. Import all objects with remapped references
///    c. Append its pages to the destination page list
/// 5. Rebuild the destination page tree and serialize
pub fn merge_documents(documents: Vec<Vec<u8>>) -> Result<Vec<u8>> {
    let mut documents = documents.into_iter();
    let first = documents.next().ok_or(PdfEditError::NoDocuments)?;

    // Single document - return as-is
    let rest: Vec<Vec<u8>> = documents.collect();
    if rest.is_empty() {
        return Ok(first);
    }

    let mut dest = Document::load_mem(&first)
        .map_err(|e| PdfEditError::Load(format!("document 1: {}", e)))?;
    let mut page_refs: Vec<ObjectId> = dest.get_pages().into_values().collect();

    for (i, bytes) in rest.iter().enumerate() {
        let source = Document::load_mem(bytes)
            .map_err(|e| PdfEditError::Load(format!("document {}: {}", i + 2, e)))?;

        let id_offset = dest.max_id;
        let source_pages: Vec<ObjectId> = source.get_pages().into_values().collect();

        for (old_id, object) in source.objects {
            let new_id = (old_id.0 + id_offset, old_id.1);
            dest.objects.insert(new_id, remap_object_refs(object, id_offset));
        }

        page_refs.extend(
            source_pages
                .into_iter()
                .map(|(num, generation)| (num + id_offset, generation)),
        );

        dest.max_id = dest.max_id.max(source.max_id + id_offset);
        tracing::debug!("Imported document {} at id offset {}", i + 2, id_offset);
    }

    let mut merged = PdfDocument::from_document(dest);
    merged.set_page_order(&page_refs)?;
    tracing::debug!("Merged {} documents into {} pages", rest.len() + 1, page_refs.len());
    merged.to_bytes()
}

/// Recursively remap object references in an object
fn remap_object_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(arr) => Object::Array(
            arr.into_iter()
                .map(|o| remap_object_refs(o, offset))
                .collect(),
        ),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = remap_object_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = remap_object_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}
