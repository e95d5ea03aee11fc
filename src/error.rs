//! Error types for pdfchunk library.

use std::io;
use thiserror::Error;

/// Result type alias for pdfchunk operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while structuring and chunking a PDF.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted and cannot be read.
    #[error("Document is encrypted")]
    Encrypted,

    /// The structured layout-analysis service failed.
    #[error("Layout analysis failed: {0}")]
    UpstreamParse(String),

    /// The structured result covers too few pages of the real document.
    #[error(
        "Layout analysis only returned content up to page {max_parsed_page} \
         out of {page_count}; likely a tier page limit"
    )]
    TierLimitExceeded {
        /// Highest page number seen in the analysis result
        max_parsed_page: u32,
        /// Byte-exact page count of the PDF
        page_count: u32,
    },

    /// The layout-analysis payload could not be decoded.
    #[error("Invalid layout payload: {0}")]
    Layout(String),

    /// The tokenizer could not be loaded.
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Error during rendering (JSON).
    #[error("Rendering error: {0}")]
    Render(String),

    /// Invalid pipeline or chunking options.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Both the structured and the heuristic path failed.
    #[error("Heuristic fallback failed: {heuristic} (structured path: {structured})")]
    FallbackFailed {
        /// Why the structured path was abandoned
        structured: String,
        /// The heuristic failure
        heuristic: Box<Error>,
    },

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Layout(err.to_string())
    }
}
