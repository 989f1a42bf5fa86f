//! Standard 14 fonts and colors
//!
//! Text overlays only use the PDF standard 14 fonts, which every viewer
//! provides, so nothing has to be embedded. Arbitrary font names are
//! mapped onto the closest standard family.

use crate::error::{PdfEditError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
    Symbol,
    ZapfDingbats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Helvetica,
    Times,
    Courier,
}

impl Default for StandardFont {
    fn default() -> Self {
        StandardFont::Helvetica
    }
}

impl StandardFont {
    /// The `/BaseFont` name
    pub fn base_font(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::HelveticaOblique => "Helvetica-Oblique",
            StandardFont::HelveticaBoldOblique => "Helvetica-BoldOblique",
            StandardFont::TimesRoman => "Times-Roman",
            StandardFont::TimesBold => "Times-Bold",
            StandardFont::TimesItalic => "Times-Italic",
            StandardFont::TimesBoldItalic => "Times-BoldItalic",
            StandardFont::Courier => "Courier",
            StandardFont::CourierBold => "Courier-Bold",
            StandardFont::CourierOblique => "Courier-Oblique",
            StandardFont::CourierBoldOblique => "Courier-BoldOblique",
            StandardFont::Symbol => "Symbol",
            StandardFont::ZapfDingbats => "ZapfDingbats",
        }
    }

    /// Symbolic fonts carry their own encoding
    pub fn is_symbolic(self) -> bool {
        matches!(self, StandardFont::Symbol | StandardFont::ZapfDingbats)
    }

    /// Map any font name onto a standard font.
    ///
    /// Accepts exact base font names ("Times-Bold"), family names ("Arial",
    /// "Times New Roman"), CSS generics ("serif", "monospace") and `.ttf`
    /// paths, which are matched by file stem because TrueType embedding is
    /// not supported. `bold`/`italic` pick the variant unless the name
    /// already names a style.
    pub fn resolve(name: &str, bold: bool, italic: bool) -> StandardFont {
        let name = if name.to_lowercase().ends_with(".ttf") {
            let stem = Path::new(name)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(name);
            tracing::warn!(
                "TrueType font '{}' cannot be embedded; using the closest standard font",
                name
            );
            stem
        } else {
            name
        };

        let lower = name.to_lowercase();

        if lower.contains("symbol") {
            return StandardFont::Symbol;
        }
        if lower.contains("zapf") || lower.contains("dingbat") {
            return StandardFont::ZapfDingbats;
        }

        let family = family_of(&lower);
        let named_bold = lower.contains("bold");
        let named_italic = lower.contains("italic") || lower.contains("oblique");

        Self::variant(family, bold || named_bold, italic || named_italic)
    }

    fn variant(family: Family, bold: bool, italic: bool) -> StandardFont {
        match family {
            Family::Times => match (bold, italic) {
                (true, true) => StandardFont::TimesBoldItalic,
                (true, false) => StandardFont::TimesBold,
                (false, true) => StandardFont::TimesItalic,
                (false, false) => StandardFont::TimesRoman,
            },
            Family::Helvetica => match (bold, italic) {
                (true, true) => StandardFont::HelveticaBoldOblique,
                (true, false) => StandardFont::HelveticaBold,
                (false, true) => StandardFont::HelveticaOblique,
                (false, false) => StandardFont::Helvetica,
            },
            Family::Courier => match (bold, italic) {
                (true, true) => StandardFont::CourierBoldOblique,
                (true, false) => StandardFont::CourierBold,
                (false, true) => StandardFont::CourierOblique,
                (false, false) => StandardFont::Courier,
            },
        }
    }

    fn family(self) -> Option<Family> {
        match self {
            StandardFont::Helvetica
            | StandardFont::HelveticaBold
            | StandardFont::HelveticaOblique
            | StandardFont::HelveticaBoldOblique => Some(Family::Helvetica),
            StandardFont::TimesRoman
            | StandardFont::TimesBold
            | StandardFont::TimesItalic
            | StandardFont::TimesBoldItalic => Some(Family::Times),
            StandardFont::Courier
            | StandardFont::CourierBold
            | StandardFont::CourierOblique
            | StandardFont::CourierBoldOblique => Some(Family::Courier),
            StandardFont::Symbol | StandardFont::ZapfDingbats => None,
        }
    }

    /// Rough advance width of `text` at `size` points.
    ///
    /// Uses an average glyph width per family; good enough to size cover
    /// rectangles, not for typesetting.
    pub fn approximate_width(self, text: &str, size: f64) -> f64 {
        let em = match self.family() {
            Some(Family::Courier) => 0.6,
            Some(Family::Times) => 0.47,
            Some(Family::Helvetica) => 0.52,
            None => 0.6,
        };
        text.chars().count() as f64 * em * size
    }

    /// Encode text for a simple (WinAnsi) font. Characters outside Latin-1
    /// become `?`.
    pub fn encode(self, text: &str) -> Vec<u8> {
        text.chars()
            .map(|c| match c as u32 {
                0x20..=0x7E | 0xA0..=0xFF => c as u32 as u8,
                0x2019 => 0x92,
                0x2018 => 0x91,
                0x201C => 0x93,
                0x201D => 0x94,
                0x2013 => 0x96,
                0x2014 => 0x97,
                0x20AC => 0x80,
                _ => b'?',
            })
            .collect()
    }
}

/// Map font family name to a base family (CSS generics included)
fn family_of(lower: &str) -> Family {
    match lower {
        "serif" => return Family::Times,
        "sans-serif" | "cursive" | "fantasy" => return Family::Helvetica,
        "monospace" => return Family::Courier,
        _ => {}
    }

    if lower.contains("times") || lower.contains("georgia") || lower.contains("garamond") {
        return Family::Times;
    }

    if lower.contains("courier")
        || lower.contains("mono")
        || lower.contains("consolas")
        || lower.contains("monaco")
    {
        return Family::Courier;
    }

    // Arial, Helvetica, "helv" and anything unknown
    Family::Helvetica
}

/// RGB color with components in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parse a color name ("red") or hex string ("#FF0000" / "FF0000")
    pub fn parse(input: &str) -> Result<Self> {
        let lower = input.trim().to_lowercase();
        let named = match lower.as_str() {
            "black" => Some(Color::BLACK),
            "white" => Some(Color::WHITE),
            "red" => Some(Color::rgb(1.0, 0.0, 0.0)),
            "green" => Some(Color::rgb(0.0, 0.5, 0.0)),
            "lime" => Some(Color::rgb(0.0, 1.0, 0.0)),
            "blue" => Some(Color::rgb(0.0, 0.0, 1.0)),
            "yellow" => Some(Color::rgb(1.0, 1.0, 0.0)),
            "gray" | "grey" => Some(Color::rgb(0.5, 0.5, 0.5)),
            "orange" => Some(Color::rgb(1.0, 0.65, 0.0)),
            "purple" => Some(Color::rgb(0.5, 0.0, 0.5)),
            "cyan" => Some(Color::rgb(0.0, 1.0, 1.0)),
            "magenta" => Some(Color::rgb(1.0, 0.0, 1.0)),
            _ => None,
        };
        if let Some(color) = named {
            return Ok(color);
        }

        let hex = lower.trim_start_matches('#');
        if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            let channel = |range: std::ops::Range<usize>| {
                u8::from_str_radix(&hex[range], 16)
                    .map(|v| v as f32 / 255.0)
                    .map_err(|_| PdfEditError::InvalidColor(input.to_string()))
            };
            return Ok(Color::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?));
        }

        Err(PdfEditError::InvalidColor(input.to_string()))
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl std::str::FromStr for Color {
    type Err = PdfEditError;

    fn from_str(s: &str) -> Result<Self> {
        Color::parse(s)
    }
}
