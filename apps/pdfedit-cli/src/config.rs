//! Defaults loaded from `pdfedit.toml`
//!
//! Every section and key is optional. Command-line flags win over the file.

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "pdfedit.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub text: TextConfig,
    pub image: ImageConfig,
    pub signature: SignatureConfig,
    pub blank_page: BlankPageConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextConfig {
    pub font: String,
    pub size: f64,
    pub color: String,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            font: "Helvetica".to_string(),
            size: pdfedit_core::stamp::DEFAULT_FONT_SIZE,
            color: "black".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageConfig {
    pub default_width: f64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            default_width: pdfedit_core::image::DEFAULT_IMAGE_WIDTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SignatureConfig {
    pub width: f64,
    pub margin_x: f64,
    pub margin_y: f64,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            width: pdfedit_core::stamp::DEFAULT_SIGNATURE_WIDTH,
            margin_x: pdfedit_core::stamp::DEFAULT_SIGNATURE_MARGIN,
            margin_y: pdfedit_core::stamp::DEFAULT_SIGNATURE_MARGIN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlankPageConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for BlankPageConfig {
    fn default() -> Self {
        let letter = pdfedit_core::PageSize::LETTER;
        Self {
            width: letter.width,
            height: letter.height,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse configuration from a TOML string
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }

    /// Explicit path if given, else `./pdfedit.toml` if it exists, else defaults
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                tracing::debug!("Using {}", DEFAULT_CONFIG_FILE);
                Self::from_file(DEFAULT_CONFIG_FILE)
            }
            None => Ok(Self::default()),
        }
    }
}
