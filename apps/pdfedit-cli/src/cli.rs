use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Edit PDF documents: stamp text and images, restructure pages, fill forms.
#[derive(Debug, Parser)]
#[command(name = "pdfedit", about, version)]
pub struct Cli {
    /// Configuration file (default: ./pdfedit.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Input and output files shared by most subcommands
#[derive(Debug, clap::Args)]
pub struct InOut {
    /// Path to the input PDF
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Path for the resulting PDF
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: PathBuf,
}

/// Text styling overrides; unset values come from the configuration
#[derive(Debug, clap::Args)]
pub struct TextStyleArgs {
    /// Font name (standard 14 fonts; other names map to the closest one)
    #[arg(long)]
    pub font: Option<String>,

    /// Font size in points
    #[arg(long)]
    pub size: Option<f64>,

    /// Color name or #RRGGBB
    #[arg(long)]
    pub color: Option<String>,

    #[arg(long)]
    pub bold: bool,

    #[arg(long)]
    pub italic: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write text onto a page
    WriteText {
        #[command(flatten)]
        io: InOut,

        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long)]
        x: f64,

        #[arg(long)]
        y: f64,

        /// Text to write; newlines start new lines
        #[arg(long)]
        text: String,

        #[command(flatten)]
        style: TextStyleArgs,
    },

    /// Replace visible text on a page
    EditText {
        #[command(flatten)]
        io: InOut,

        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Text to find
        #[arg(long)]
        old: String,

        /// Replacement text
        #[arg(long)]
        new: String,

        #[command(flatten)]
        style: TextStyleArgs,
    },

    /// Place a PNG or JPEG image onto a page
    AddImage {
        #[command(flatten)]
        io: InOut,

        /// Image file
        #[arg(long)]
        image: PathBuf,

        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long)]
        x: f64,

        #[arg(long)]
        y: f64,

        #[arg(long)]
        width: Option<f64>,

        #[arg(long)]
        height: Option<f64>,
    },

    /// Place a signature image in the bottom-right corner of a page
    Sign {
        #[command(flatten)]
        io: InOut,

        /// Signature image file
        #[arg(long)]
        image: PathBuf,

        /// 1-based page number (default: last page)
        #[arg(long)]
        page: Option<u32>,

        #[arg(long)]
        width: Option<f64>,
    },

    /// Concatenate PDFs in the given order
    Merge {
        /// Input PDFs
        #[arg(value_name = "INPUT", required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        #[arg(short, long, value_name = "OUTPUT")]
        output: PathBuf,
    },

    /// Write selected pages as separate single-page PDFs
    Split {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Page ranges (e.g. '1-3,5'). Default: all pages
        #[arg(long)]
        ranges: Option<String>,

        /// Directory for page_<n>.pdf files
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,
    },

    /// Write selected pages into a single PDF
    Extract {
        #[command(flatten)]
        io: InOut,

        /// Page ranges (e.g. '1-3,5')
        #[arg(long)]
        pages: String,
    },

    /// Rotate pages clockwise
    Rotate {
        #[command(flatten)]
        io: InOut,

        /// Multiple of 90
        #[arg(long, allow_hyphen_values = true)]
        degrees: i64,

        /// Page ranges (e.g. '1-3,5'). Default: all pages
        #[arg(long)]
        pages: Option<String>,
    },

    /// Print the text of selected pages
    ExtractText {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Page ranges (e.g. '1-3,5'). Default: all pages
        #[arg(long)]
        pages: Option<String>,
    },

    /// List form fields
    Fields {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fill form fields from a JSON object of name to value
    FillForm {
        #[command(flatten)]
        io: InOut,

        /// Field values as a JSON object, given inline or as a file path
        #[arg(long)]
        data: String,

        /// Bake values into the page and remove the form
        #[arg(long)]
        flatten: bool,
    },

    /// Bake annotation appearances into the page and remove the form
    Flatten {
        #[command(flatten)]
        io: InOut,
    },

    /// Remove pages
    DeletePages {
        #[command(flatten)]
        io: InOut,

        /// 1-based page numbers
        #[arg(value_name = "PAGE", required = true, num_args = 1..)]
        pages: Vec<u32>,
    },

    /// Rebuild the document from pages in a new order
    ReorderPages {
        #[command(flatten)]
        io: InOut,

        /// 1-based page numbers in their new order
        #[arg(value_name = "PAGE", required = true, num_args = 1..)]
        order: Vec<u32>,
    },

    /// Insert a blank page
    InsertBlankPage {
        #[command(flatten)]
        io: InOut,

        /// Position the new page takes (1-based)
        #[arg(long, default_value_t = 1)]
        at: u32,

        #[arg(long)]
        width: Option<f64>,

        #[arg(long)]
        height: Option<f64>,
    },

    /// Apply a JSON overlay plan
    Apply {
        #[command(flatten)]
        io: InOut,

        /// JSON file with the plan's operations
        #[arg(long)]
        plan: PathBuf,
    },
}
