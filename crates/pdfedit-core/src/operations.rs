//! Overlay plans
//!
//! A plan is a JSON list of drawing operations, each targeting a 1-based
//! page, that are composed onto a document in a single pass.

use crate::error::Result;
use crate::fonts::{Color, StandardFont};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PdfRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextStyle {
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_color")]
    pub color: String,
    /// Font name for text rendering. Will be mapped to PDF standard fonts.
    #[serde(default)]
    pub font_name: Option<String>,
    #[serde(default)]
    pub is_italic: bool,
    #[serde(default)]
    pub is_bold: bool,
}

fn default_font_size() -> f64 {
    12.0
}

fn default_color() -> String {
    "black".to_string()
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: default_font_size(),
            color: default_color(),
            font_name: None,
            is_italic: false,
            is_bold: false,
        }
    }
}

impl TextStyle {
    pub fn standard_font(&self) -> StandardFont {
        let name = self.font_name.as_deref().unwrap_or("Helvetica");
        StandardFont::resolve(name, self.is_bold, self.is_italic)
    }

    pub fn fill_color(&self) -> Result<Color> {
        Color::parse(&self.color)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum OverlayOperation {
    /// Text with its baseline origin at (`x`, `y`)
    AddText {
        page: u32,
        x: f64,
        y: f64,
        text: String,
        #[serde(default)]
        style: TextStyle,
    },
    /// PNG or JPEG read from `path`; missing dimensions keep the aspect ratio
    AddImage {
        page: u32,
        path: PathBuf,
        x: f64,
        y: f64,
        #[serde(default)]
        width: Option<f64>,
        #[serde(default)]
        height: Option<f64>,
    },
    /// Add a white rectangle to cover/redact content
    AddWhiteRect { page: u32, rect: PdfRect },
}

impl OverlayOperation {
    pub fn page(&self) -> u32 {
        match self {
            OverlayOperation::AddText { page, .. } => *page,
            OverlayOperation::AddImage { page, .. } => *page,
            OverlayOperation::AddWhiteRect { page, .. } => *page,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OverlayPlan {
    #[serde(default)]
    operations: Vec<OverlayOperation>,
}

impl OverlayPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, op: OverlayOperation) {
        self.operations.push(op);
    }

    pub fn operations(&self) -> &[OverlayOperation] {
        &self.operations
    }

    pub fn operations_for_page(&self, page: u32) -> Vec<&OverlayOperation> {
        self.operations
            .iter()
            .filter(|op| op.page() == page)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse either `{"operations": [...]}` or a bare `[...]` array
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        if json.trim_start().starts_with('[') {
            let operations = serde_json::from_str(json)?;
            return Ok(Self { operations });
        }
        serde_json::from_str(json)
    }
}

impl FromIterator<OverlayOperation> for OverlayPlan {
    fn from_iter<I: IntoIterator<Item = OverlayOperation>>(iter: I) -> Self {
        Self {
            operations: iter.into_iter().collect(),
        }
    }
}
