//! In-place text replacement
//!
//! PDF content streams have no notion of editable text, so a replacement is
//! drawn on top: the first occurrence of the old text is located by
//! interpreting the page's text operators, covered with a white rectangle,
//! and the new text is drawn at the same baseline origin.
//!
//! Glyph widths are estimated from the standard font metrics, so the cover
//! rectangle is approximate for fonts with unusual proportions. Text inside
//! form XObjects is not searched.

use crate::document::{number, PdfDocument};
use crate::error::Result;
use crate::fonts::{Color, StandardFont};
use crate::overlay::{compose_overlays, PageOverlay};
use crate::stamp::{page_index, DEFAULT_FONT_SIZE};
use lopdf::content::{Content, Operation};
use lopdf::Object;
use std::collections::BTreeMap;

/// Kerning (thousandths of an em) in a `TJ` array treated as a word gap
const TJ_SPACE_THRESHOLD: f64 = -250.0;

/// Affine matrix `[a b c d e f]` in PDF row-vector convention
type Matrix = [f64; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

fn multiply(m1: &Matrix, m2: &Matrix) -> Matrix {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

fn translate(tx: f64, ty: f64) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

fn apply(m: &Matrix, x: f64, y: f64) -> (f64, f64) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

fn vertical_scale(m: &Matrix) -> f64 {
    (m[2] * m[2] + m[3] * m[3]).sqrt()
}

fn horizontal_scale(m: &Matrix) -> f64 {
    (m[0] * m[0] + m[1] * m[1]).sqrt()
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextEdit {
    /// 1-based page number; 0 is treated as 1
    pub page: u32,
    pub old_text: String,
    pub new_text: String,
    /// Defaults to Helvetica
    pub font: Option<StandardFont>,
    /// Defaults to the size of the text being replaced
    pub size: Option<f64>,
    /// Defaults to black
    pub color: Option<Color>,
}

impl TextEdit {
    pub fn new(page: u32, old_text: impl Into<String>, new_text: impl Into<String>) -> Self {
        Self {
            page,
            old_text: old_text.into(),
            new_text: new_text.into(),
            font: None,
            size: None,
            color: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub bytes: Vec<u8>,
    /// `false` when the old text was not found and nothing changed
    pub replaced: bool,
}

/// Location of found text in user space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMatch {
    /// Baseline origin of the first matched glyph
    pub x: f64,
    pub y: f64,
    pub width: f64,
    /// Effective font size after text and graphics scaling
    pub size: f64,
}

/// Text state while walking a content stream
struct TextScanner<'a> {
    needle: &'a str,
    ctm: Matrix,
    stack: Vec<Matrix>,
    tm: Matrix,
    tlm: Matrix,
    font_size: f64,
    leading: f64,
}

impl<'a> TextScanner<'a> {
    fn new(needle: &'a str) -> Self {
        Self {
            needle,
            ctm: IDENTITY,
            stack: Vec::new(),
            tm: IDENTITY,
            tlm: IDENTITY,
            font_size: DEFAULT_FONT_SIZE,
            leading: 0.0,
        }
    }

    fn scan(mut self, operations: &[Operation]) -> Option<TextMatch> {
        for op in operations {
            let operands = &op.operands;
            let num = |i: usize| operands.get(i).and_then(number).unwrap_or(0.0);

            let found = match op.operator.as_str() {
                "q" => {
                    self.stack.push(self.ctm);
                    None
                }
                "Q" => {
                    self.ctm = self.stack.pop().unwrap_or(IDENTITY);
                    None
                }
                "cm" => {
                    let m = [num(0), num(1), num(2), num(3), num(4), num(5)];
                    self.ctm = multiply(&m, &self.ctm);
                    None
                }
                "BT" => {
                    self.tm = IDENTITY;
                    self.tlm = IDENTITY;
                    None
                }
                "Tf" => {
                    self.font_size = num(1);
                    None
                }
                "TL" => {
                    self.leading = num(0);
                    None
                }
                "Td" => {
                    self.move_line(num(0), num(1));
                    None
                }
                "TD" => {
                    self.leading = -num(1);
                    self.move_line(num(0), num(1));
                    None
                }
                "Tm" => {
                    self.tlm = [num(0), num(1), num(2), num(3), num(4), num(5)];
                    self.tm = self.tlm;
                    None
                }
                "T*" => {
                    self.next_line();
                    None
                }
                "Tj" => self.show(&[operands.first()]),
                "'" => {
                    self.next_line();
                    self.show(&[operands.first()])
                }
                "\"" => {
                    self.next_line();
                    self.show(&[operands.get(2)])
                }
                "TJ" => match operands.first() {
                    Some(Object::Array(items)) => self.show_array(items),
                    _ => None,
                },
                _ => None,
            };

            if found.is_some() {
                return found;
            }
        }
        None
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.tlm = multiply(&translate(tx, ty), &self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn show(&mut self, strings: &[Option<&Object>]) -> Option<TextMatch> {
        let text: String = strings
            .iter()
            .flatten()
            .filter_map(|obj| match obj {
                Object::String(bytes, _) => Some(decode_latin1(bytes)),
                _ => None,
            })
            .collect();
        self.show_text(&text)
    }

    fn show_array(&mut self, items: &[Object]) -> Option<TextMatch> {
        let mut text = String::new();
        for item in items {
            match item {
                Object::String(bytes, _) => text.push_str(&decode_latin1(bytes)),
                other => {
                    if number(other).is_some_and(|n| n <= TJ_SPACE_THRESHOLD) {
                        text.push(' ');
                    }
                }
            }
        }
        self.show_text(&text)
    }

    /// Check one shown run for the needle, then advance the text matrix
    fn show_text(&mut self, text: &str) -> Option<TextMatch> {
        let metrics = StandardFont::Helvetica;
        let found = text.find(self.needle).map(|pos| {
            let trm = multiply(&self.tm, &self.ctm);
            let offset = metrics.approximate_width(&text[..pos], self.font_size);
            let (x, y) = apply(&trm, offset, 0.0);
            TextMatch {
                x,
                y,
                width: metrics.approximate_width(self.needle, self.font_size)
                    * horizontal_scale(&trm),
                size: self.font_size * vertical_scale(&trm),
            }
        });

        let advance = metrics.approximate_width(text, self.font_size);
        self.tm = multiply(&translate(advance, 0.0), &self.tm);
        found
    }
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Find the first occurrence of `needle` in a decoded content stream
pub fn find_text(content: &Content, needle: &str) -> Option<TextMatch> {
    if needle.is_empty() {
        return None;
    }
    TextScanner::new(needle).scan(&content.operations)
}

/// Replace the first occurrence of `edit.old_text` on the page.
///
/// When the text is not found the input is returned unchanged with
/// `replaced == false`. The original glyphs stay in the content stream
/// underneath the cover rectangle.
pub fn edit_text(pdf_bytes: &[u8], edit: &TextEdit) -> Result<EditOutcome> {
    let mut doc = PdfDocument::from_bytes(pdf_bytes)?;
    let index = page_index(&doc, edit.page)?;
    let page_id = doc.require_page(index as u32 + 1)?;

    let raw = doc.inner().get_page_content(page_id)?;
    let content = Content::decode(&raw)?;

    let Some(found) = find_text(&content, &edit.old_text) else {
        tracing::warn!("Text '{}' not found on page {}", edit.old_text, index + 1);
        return Ok(EditOutcome {
            bytes: pdf_bytes.to_vec(),
            replaced: false,
        });
    };

    tracing::debug!(
        "Found '{}' on page {} at ({:.1}, {:.1}), size {:.1}",
        edit.old_text,
        index + 1,
        found.x,
        found.y,
        found.size
    );

    let descent = found.size * 0.25;
    let pad = found.size * 0.1;
    let size = edit
        .size
        .unwrap_or(if found.size > 0.0 { found.size } else { DEFAULT_FONT_SIZE });

    let mut overlay = PageOverlay::new();
    overlay
        .rect(
            found.x - pad,
            found.y - descent,
            found.width + 2.0 * pad,
            found.size * 1.2,
            Color::WHITE,
        )
        .text(
            edit.new_text.clone(),
            found.x,
            found.y,
            edit.font.unwrap_or_default(),
            size,
            edit.color.unwrap_or_default(),
        );

    compose_overlays(&mut doc, BTreeMap::from([(index, overlay)]))?;
    Ok(EditOutcome {
        bytes: doc.to_bytes()?,
        replaced: true,
    })
}
