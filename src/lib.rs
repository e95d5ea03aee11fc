//! # pdfchunk
//!
//! Structure financial PDFs into hierarchical sections and token-bounded,
//! citation-ready chunks.
//!
//! Layout comes from one of two paths. The structured path consumes a
//! layout-analysis result (paragraph roles, tables as flat cell lists,
//! key/value pairs). The heuristic path decodes page content streams and
//! infers headings from font-size statistics. Either way the layout is
//! folded into sections, and sections are sliced into chunks that respect a
//! token budget, keep every table whole and carry page ranges and heading
//! breadcrumbs.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfchunk::{chunk_file, ParseOutcome};
//!
//! fn main() -> pdfchunk::Result<()> {
//!     match chunk_file("10-K.pdf")? {
//!         ParseOutcome::Chunked(doc) => {
//!             for chunk in &doc.chunks {
//!                 println!("[{}] p{}-{} {}", chunk.index, chunk.page_start, chunk.page_end, chunk.breadcrumb());
//!             }
//!         }
//!         ParseOutcome::Empty { page_count, .. } => {
//!             eprintln!("no text found in {} pages", page_count);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Table grids**: merged cells replicated into every covered position
//! - **Two extraction paths**: structured first, heuristic fallback exactly once
//! - **Sections**: two-level hierarchy with an implicit "Introduction"
//! - **Token-aware chunks**: sentence packing with overlap, tiktoken counts
//! - **Parallel batches**: one independent run per document with Rayon

pub mod chunk;
pub mod detect;
pub mod error;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod structure;

// Re-export commonly used types
pub use chunk::{ChunkOptions, Chunker, TiktokenCounter, TokenCounter};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_pdf_bytes, PdfFormat};
pub use error::{Error, Result};
pub use model::{
    Chunk, ChunkMetadata, ContentType, Element, KeyValuePair, NormalizedLayout, Paragraph,
    ParagraphRole, Section, TableBlock, TableCell, TableGrid,
};
pub use parser::{
    AnalyzeResult, HeuristicExtractor, HeuristicOptions, JsonLayoutService, LayoutService,
    LayoutSource, StructuredAdapter, StructuredOptions,
};
pub use pipeline::{ChunkedDocument, ParseOutcome, ParsePath, Pipeline, PipelineOptions};
pub use render::JsonFormat;
pub use structure::{build_sections, summarize_sections, SectionSummary};

use std::path::Path;

/// Chunk a PDF file over the heuristic path with default options.
///
/// # Example
///
/// ```no_run
/// use pdfchunk::chunk_file;
///
/// let outcome = chunk_file("10-K.pdf").unwrap();
/// println!("Path: {}", outcome.path());
/// ```
pub fn chunk_file<P: AsRef<Path>>(path: P) -> Result<ParseOutcome> {
    Pipeline::new(PipelineOptions::default())?.process_path(path)
}

/// Chunk PDF bytes over the heuristic path with default options.
pub fn chunk_bytes(data: &[u8]) -> Result<ParseOutcome> {
    Pipeline::new(PipelineOptions::default())?.process(data)
}

/// Chunk a PDF file using a stored layout-analysis result, falling back to
/// the heuristic path if that result is unusable.
///
/// # Example
///
/// ```no_run
/// use pdfchunk::chunk_file_with_layout;
///
/// let outcome = chunk_file_with_layout("10-K.pdf", "10-K.layout.json").unwrap();
/// if let Some(doc) = outcome.document() {
///     println!("{} chunks", doc.chunks.len());
/// }
/// ```
pub fn chunk_file_with_layout<P: AsRef<Path>, L: AsRef<Path>>(
    path: P,
    layout_json: L,
) -> Result<ParseOutcome> {
    Pipeline::new(PipelineOptions::default())?
        .with_service(JsonLayoutService::from_path(layout_json))
        .process_path(path)
}

/// Chunk a PDF file and render the result as JSON.
///
/// An empty result is reported as `Error::Other`.
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    match chunk_file(path)? {
        ParseOutcome::Chunked(doc) => render::to_json(&doc, format),
        ParseOutcome::Empty { page_count, .. } => Err(Error::Other(format!(
            "no chunks produced from {} pages",
            page_count
        ))),
    }
}
