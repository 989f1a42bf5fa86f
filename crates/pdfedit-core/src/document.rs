//! Document wrapper
//!
//! A thin layer over `lopdf::Document` with the page-tree helpers every
//! operation needs: ordered page lookup, inherited attributes, page tree
//! rebuilding and content-stream appends.

use crate::error::{PdfEditError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::path::Path;

/// Attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Page tree depth after which parent traversal gives up.
const MAX_TREE_DEPTH: usize = 64;

/// Page dimensions in points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub const LETTER: PageSize = PageSize {
        width: 612.0,
        height: 792.0,
    };

    pub const A4: PageSize = PageSize {
        width: 595.0,
        height: 842.0,
    };
}

impl Default for PageSize {
    fn default() -> Self {
        Self::LETTER
    }
}

pub struct PdfDocument {
    doc: Document,
}

impl PdfDocument {
    /// Load a PDF from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(bytes).map_err(|e| PdfEditError::Load(e.to_string()))?;
        Ok(Self { doc })
    }

    /// Load a PDF from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_document(doc: Document) -> Self {
        Self { doc }
    }

    pub fn inner(&self) -> &Document {
        &self.doc
    }

    pub fn inner_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Page object ids in document order
    pub fn page_ids(&self) -> Vec<ObjectId> {
        self.doc.get_pages().into_values().collect()
    }

    /// Page object id for a zero-based page index
    pub fn page_id(&self, index: usize) -> Option<ObjectId> {
        let page_num = u32::try_from(index + 1).ok()?;
        self.doc.get_pages().get(&page_num).copied()
    }

    /// Page object id for a 1-based page number, or `PageOutOfRange`
    pub fn require_page(&self, page: u32) -> Result<ObjectId> {
        self.doc
            .get_pages()
            .get(&page)
            .copied()
            .ok_or(PdfEditError::PageOutOfRange {
                page,
                page_count: self.page_count(),
            })
    }

    /// Size of a page from its (possibly inherited) MediaBox
    pub fn page_size(&self, index: usize) -> Result<PageSize> {
        let page_id = self
            .page_id(index)
            .ok_or(PdfEditError::PageOutOfRange {
                page: index as u32 + 1,
                page_count: self.page_count(),
            })?;

        let media_box = match self.inherited_attribute(page_id, b"MediaBox") {
            Some(obj) => obj,
            None => return Ok(PageSize::default()),
        };

        let rect = self.rect_from_object(&media_box)?;
        Ok(PageSize {
            width: (rect[2] - rect[0]).abs(),
            height: (rect[3] - rect[1]).abs(),
        })
    }

    /// Look up an attribute on a page, walking up the Parent chain.
    ///
    /// References are followed, so the returned object is always direct.
    pub fn inherited_attribute(&self, page_id: ObjectId, key: &[u8]) -> Option<Object> {
        let mut node_id = page_id;

        for _ in 0..MAX_TREE_DEPTH {
            let node = self.doc.get_dictionary(node_id).ok()?;
            if let Ok(value) = node.get(key) {
                return self.resolve(value).ok().cloned();
            }
            node_id = node.get(b"Parent").ok()?.as_reference().ok()?;
        }

        None
    }

    /// Follow a reference to its target; direct objects are returned as is
    pub fn resolve<'a>(&'a self, obj: &'a Object) -> Result<&'a Object> {
        match obj {
            Object::Reference(id) => Ok(self.doc.get_object(*id)?),
            other => Ok(other),
        }
    }

    /// Parse a rectangle array (`[x1 y1 x2 y2]`), following references
    pub fn rect_from_object(&self, obj: &Object) -> Result<[f64; 4]> {
        let arr = self
            .resolve(obj)?
            .as_array()
            .map_err(|_| PdfEditError::Operation("Rectangle is not an array".into()))?;

        if arr.len() != 4 {
            return Err(PdfEditError::Operation(format!(
                "Rectangle has {} entries, expected 4",
                arr.len()
            )));
        }

        let mut rect = [0.0; 4];
        for (slot, value) in rect.iter_mut().zip(arr) {
            *slot = number(self.resolve(value)?)
                .ok_or_else(|| PdfEditError::Operation("Rectangle entry is not a number".into()))?;
        }
        Ok(rect)
    }

    /// Object id of the root Pages node
    pub fn pages_root(&self) -> Result<ObjectId> {
        let catalog = self.catalog_id()?;
        self.doc
            .get_dictionary(catalog)?
            .get(b"Pages")
            .and_then(Object::as_reference)
            .map_err(|_| PdfEditError::Operation("No Pages in catalog".into()))
    }

    /// Object id of the document catalog
    pub fn catalog_id(&self) -> Result<ObjectId> {
        self.doc
            .trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .map_err(|_| PdfEditError::Operation("No Root in trailer".into()))
    }

    /// Copy inherited attributes onto the page itself so the page no longer
    /// depends on intermediate page tree nodes.
    pub fn materialize_inherited(&mut self, page_id: ObjectId) -> Result<()> {
        let mut inherited = Vec::new();
        {
            let page = self.doc.get_dictionary(page_id)?;
            for key in INHERITABLE_KEYS {
                if page.has(key) {
                    continue;
                }
                if let Some(value) = self.inherited_attribute(page_id, key) {
                    inherited.push((key.to_vec(), value));
                }
            }
        }

        let page = self.doc.get_dictionary_mut(page_id)?;
        for (key, value) in inherited {
            page.set(key, value);
        }
        Ok(())
    }

    /// Replace the page tree with a flat list of pages in the given order.
    ///
    /// A page id listed more than once is cloned, so every leaf keeps a
    /// single Parent.
    pub fn set_page_order(&mut self, pages: &[ObjectId]) -> Result<()> {
        let root_id = self.pages_root()?;

        for &page_id in pages {
            self.materialize_inherited(page_id)?;
        }

        let mut seen = std::collections::HashSet::new();
        let mut kids = Vec::with_capacity(pages.len());
        for &page_id in pages {
            let id = if seen.insert(page_id) {
                page_id
            } else {
                let copy = self.doc.get_dictionary(page_id)?.clone();
                self.doc.add_object(Object::Dictionary(copy))
            };
            self.doc
                .get_dictionary_mut(id)?
                .set("Parent", Object::Reference(root_id));
            kids.push(Object::Reference(id));
        }

        let root = self.doc.get_dictionary_mut(root_id)?;
        root.set("Count", Object::Integer(kids.len() as i64));
        root.set("Kids", Object::Array(kids));
        for key in INHERITABLE_KEYS {
            root.remove(key);
        }

        Ok(())
    }

    /// Add a new blank page object (not yet placed in the page tree)
    pub fn new_blank_page(&mut self, size: PageSize) -> Result<ObjectId> {
        let root_id = self.pages_root()?;
        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(root_id));
        page.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(size.width as f32),
                Object::Real(size.height as f32),
            ]),
        );
        page.set("Resources", Object::Dictionary(Dictionary::new()));
        Ok(self.doc.add_object(Object::Dictionary(page)))
    }

    /// Wrap the page's existing content in `q ... Q` so later content
    /// starts from the default graphics state.
    pub fn isolate_content(&mut self, page_id: ObjectId) -> Result<()> {
        let has_content = self.doc.get_dictionary(page_id)?.has(b"Contents");
        if !has_content {
            return Ok(());
        }

        let open_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let close_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));

        let existing = self.doc.get_dictionary(page_id)?.get(b"Contents")?.clone();
        let mut parts = vec![Object::Reference(open_id)];
        match existing {
            Object::Array(arr) => parts.extend(arr),
            Object::Reference(id) => match self.doc.get_object(id) {
                Ok(Object::Array(arr)) => parts.extend(arr.iter().cloned()),
                _ => parts.push(Object::Reference(id)),
            },
            other => parts.push(other),
        }
        parts.push(Object::Reference(close_id));

        self.doc
            .get_dictionary_mut(page_id)?
            .set("Contents", Object::Array(parts));
        Ok(())
    }

    /// Append a content stream to a page
    pub fn append_content(&mut self, page_id: ObjectId, content: Vec<u8>) -> Result<()> {
        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), content));

        let existing = self.doc.get_dictionary(page_id)?.get(b"Contents").ok().cloned();
        let contents = match existing {
            Some(Object::Reference(existing_id)) => {
                // Contents may point at an array of streams
                match self.doc.get_object(existing_id) {
                    Ok(Object::Array(arr)) => {
                        let mut arr = arr.clone();
                        arr.push(Object::Reference(content_id));
                        Object::Array(arr)
                    }
                    _ => Object::Array(vec![
                        Object::Reference(existing_id),
                        Object::Reference(content_id),
                    ]),
                }
            }
            Some(Object::Array(mut arr)) => {
                arr.push(Object::Reference(content_id));
                Object::Array(arr)
            }
            _ => Object::Reference(content_id),
        };

        self.doc
            .get_dictionary_mut(page_id)?
            .set("Contents", contents);
        Ok(())
    }

    /// Serialize, dropping objects no longer reachable from the trailer
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.doc.prune_objects();
        self.doc.compress();

        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| PdfEditError::Save(e.to_string()))?;
        Ok(buffer)
    }

    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

/// Numeric value of an Integer or Real object
pub fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}
