//! Raster images as PDF image XObjects
//!
//! PNG is decoded with `png` (alpha becomes a soft mask), JPEG with `image`.
//! Both end up as 8-bit Flate-compressed samples.

use crate::error::{PdfEditError, Result};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::io::{Cursor, Write};
use std::path::Path;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8, 0xFF];

/// Width used when neither dimension is requested (2 inches).
pub const DEFAULT_IMAGE_WIDTH: f64 = 144.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorSpace {
    Gray,
    Rgb,
}

impl ColorSpace {
    fn name(self) -> &'static str {
        match self {
            ColorSpace::Gray => "DeviceGray",
            ColorSpace::Rgb => "DeviceRGB",
        }
    }
}

/// Decoded image ready to be written into a document
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    width: u32,
    height: u32,
    color_space: ColorSpace,
    samples: Vec<u8>,
    alpha: Option<Vec<u8>>,
}

impl EmbeddedImage {
    /// Decode PNG or JPEG bytes, detected by signature
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.starts_with(PNG_SIGNATURE) {
            Self::from_png(bytes)
        } else if bytes.starts_with(JPEG_SIGNATURE) {
            Self::from_jpeg(bytes)
        } else {
            Err(PdfEditError::Image(
                "Unsupported image format (expected PNG or JPEG)".into(),
            ))
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    fn from_png(bytes: &[u8]) -> Result<Self> {
        let mut decoder = png::Decoder::new(Cursor::new(bytes));
        decoder.set_transformations(png::Transformations::normalize_to_color8());
        let mut reader = decoder
            .read_info()
            .map_err(|e| PdfEditError::Image(e.to_string()))?;

        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader
            .next_frame(&mut buf)
            .map_err(|e| PdfEditError::Image(e.to_string()))?;
        buf.truncate(info.buffer_size());

        let (color_space, channels, has_alpha) = match info.color_type {
            png::ColorType::Grayscale => (ColorSpace::Gray, 1, false),
            png::ColorType::GrayscaleAlpha => (ColorSpace::Gray, 2, true),
            png::ColorType::Rgb => (ColorSpace::Rgb, 3, false),
            png::ColorType::Rgba => (ColorSpace::Rgb, 4, true),
            png::ColorType::Indexed => {
                return Err(PdfEditError::Image("Indexed PNG was not expanded".into()))
            }
        };

        let (samples, alpha) = if has_alpha {
            split_alpha(&buf, channels)
        } else {
            (buf, None)
        };

        Ok(Self {
            width: info.width,
            height: info.height,
            color_space,
            samples,
            alpha,
        })
    }

    fn from_jpeg(bytes: &[u8]) -> Result<Self> {
        let decoded = ::image::load_from_memory_with_format(bytes, ::image::ImageFormat::Jpeg)
            .map_err(|e| PdfEditError::Image(e.to_string()))?;
        let rgb = decoded.to_rgb8();

        Ok(Self {
            width: rgb.width(),
            height: rgb.height(),
            color_space: ColorSpace::Rgb,
            samples: rgb.into_raw(),
            alpha: None,
        })
    }

    /// Pixel dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn has_alpha(&self) -> bool {
        self.alpha.is_some()
    }

    /// Placement size in points, keeping the aspect ratio for any
    /// dimension that is not given.
    pub fn scaled_size(&self, width: Option<f64>, height: Option<f64>) -> (f64, f64) {
        let aspect = if self.width == 0 {
            1.0
        } else {
            self.height as f64 / self.width as f64
        };

        match (width, height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) => (w, w * aspect),
            (None, Some(h)) if aspect > 0.0 => (h / aspect, h),
            (None, Some(h)) => (h, h),
            (None, None) => (DEFAULT_IMAGE_WIDTH, DEFAULT_IMAGE_WIDTH * aspect),
        }
    }

    /// Write the image (and its soft mask) into `doc`
    pub fn add_to_document(&self, doc: &mut Document) -> Result<ObjectId> {
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => self.width as i64,
            "Height" => self.height as i64,
            "ColorSpace" => self.color_space.name(),
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };

        if let Some(alpha) = &self.alpha {
            let mask = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => self.width as i64,
                    "Height" => self.height as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                    "Filter" => "FlateDecode",
                },
                deflate(alpha)?,
            );
            let mask_id = doc.add_object(mask);
            dict.set("SMask", Object::Reference(mask_id));
        }

        let stream = Stream::new(dict, deflate(&self.samples)?);
        Ok(doc.add_object(stream))
    }
}

/// Separate interleaved color+alpha samples. Fully opaque images get no mask.
fn split_alpha(buf: &[u8], channels: usize) -> (Vec<u8>, Option<Vec<u8>>) {
    let color_channels = channels - 1;
    let pixels = buf.len() / channels;
    let mut color = Vec::with_capacity(pixels * color_channels);
    let mut alpha = Vec::with_capacity(pixels);

    for pixel in buf.chunks_exact(channels) {
        color.extend_from_slice(&pixel[..color_channels]);
        alpha.push(pixel[color_channels]);
    }

    if alpha.iter().all(|&a| a == u8::MAX) {
        (color, None)
    } else {
        (color, Some(alpha))
    }
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
