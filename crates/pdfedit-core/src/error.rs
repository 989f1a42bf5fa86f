use thiserror::Error;

/// Failure to parse a page-range expression such as `"1-3,5"`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageRangeError {
    #[error("Invalid page token '{token}': {reason}")]
    Parse { token: String, reason: &'static str },

    #[error("Invalid page range {start}-{end}: start is after end")]
    InvalidRange { start: u32, end: u32 },
}

#[derive(Error, Debug)]
pub enum PdfEditError {
    #[error("Failed to parse PDF: {0}")]
    Load(String),

    #[error("Failed to save PDF: {0}")]
    Save(String),

    #[error(transparent)]
    Range(#[from] PageRangeError),

    #[error("Page {page} does not exist (document has {page_count} pages)")]
    PageOutOfRange { page: u32, page_count: usize },

    #[error("Rotation must be a multiple of 90 degrees, got {0}")]
    InvalidRotation(i64),

    #[error("Unknown color: {0}")]
    InvalidColor(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("No documents to merge")]
    NoDocuments,

    #[error("No pages selected")]
    NoPagesSelected,

    #[error("PDF operation failed: {0}")]
    Operation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<lopdf::Error> for PdfEditError {
    fn from(e: lopdf::Error) -> Self {
        PdfEditError::Operation(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PdfEditError>;
