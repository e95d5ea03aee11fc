//! PDF format detection and page counting.

use crate::error::{Error, Result};
use lopdf::Document as LopdfDocument;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// PDF format information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfFormat {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
}

impl std::fmt::Display for PdfFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

/// Header version plus the byte-exact page count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfInfo {
    pub format: PdfFormat,
    pub page_count: u32,
}

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
const PDF_MAGIC_LEN: usize = 5;
const VERSION_LEN: usize = 3; // e.g., "1.7"

/// Detect PDF format from a file path.
///
/// # Example
/// ```no_run
/// use pdfchunk::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("10-K.pdf").unwrap();
/// println!("PDF version: {}", format.version);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<PdfFormat> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut header = [0u8; 16];
    let n = reader.read(&mut header)?;
    detect_format_from_bytes(&header[..n])
}

/// Detect PDF format from the first bytes of a file.
///
/// Returns `Error::UnknownFormat` when the `%PDF-` magic is missing and
/// `Error::UnsupportedVersion` when the version is not `d.d`.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<PdfFormat> {
    if data.len() < PDF_MAGIC_LEN + VERSION_LEN {
        return Err(Error::UnknownFormat);
    }

    if !data.starts_with(PDF_MAGIC) {
        return Err(Error::UnknownFormat);
    }

    let version_bytes = &data[PDF_MAGIC_LEN..PDF_MAGIC_LEN + VERSION_LEN];
    let version = String::from_utf8_lossy(version_bytes).to_string();

    if !is_valid_version(&version) {
        return Err(Error::UnsupportedVersion(version));
    }

    Ok(PdfFormat { version })
}

fn is_valid_version(version: &str) -> bool {
    let chars: Vec<char> = version.chars().collect();
    chars.len() == 3 && chars[0].is_ascii_digit() && chars[1] == '.' && chars[2].is_ascii_digit()
}

/// Check if bytes start with a valid PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}

/// Count pages from the document's page tree.
///
/// This count does not depend on either extraction path and is the
/// reference for upstream page-coverage checks.
pub fn page_count(data: &[u8]) -> Result<u32> {
    Ok(inspect(data)?.page_count)
}

/// Validate the header and count pages.
pub fn inspect(data: &[u8]) -> Result<PdfInfo> {
    let format = detect_format_from_bytes(data)?;
    let doc = LopdfDocument::load_mem(data)?;
    if doc.is_encrypted() {
        return Err(Error::Encrypted);
    }
    let pages = doc.get_pages().len();
    let page_count = u32::try_from(pages)
        .map_err(|_| Error::PdfParse(format!("page count {} out of range", pages)))?;
    log::debug!("{}: {} pages", format, page_count);
    Ok(PdfInfo { format, page_count })
}
