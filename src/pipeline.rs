//! Parse-path orchestration.
//!
//! A document is first run through the structured path (layout service,
//! section building, chunking). Any failure, including a tier-limited
//! result, re-runs the whole pipeline once over the heuristic path. A
//! heuristic failure after fallback is terminal.

use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::chunk::{ChunkOptions, Chunker, TiktokenCounter, TokenCounter};
use crate::detect;
use crate::error::{Error, Result};
use crate::model::{Chunk, Section};
use crate::parser::{
    HeuristicExtractor, HeuristicOptions, LayoutService, LayoutSource, StructuredAdapter,
    StructuredOptions,
};
use crate::structure::{build_sections, summarize_sections, SectionSummary};

/// Options for the whole pipeline.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Token budgets and tokenizer
    pub chunk: ChunkOptions,

    /// Heading inference and table extraction for the heuristic path
    pub heuristic: HeuristicOptions,

    /// Coverage checks for the structured path
    pub structured: StructuredOptions,

    /// Try the structured path before the heuristic one
    pub structured_enabled: bool,
}

impl PipelineOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set chunking options.
    pub fn with_chunk(mut self, chunk: ChunkOptions) -> Self {
        self.chunk = chunk;
        self
    }

    /// Set heuristic extraction options.
    pub fn with_heuristic(mut self, heuristic: HeuristicOptions) -> Self {
        self.heuristic = heuristic;
        self
    }

    /// Set structured extraction options.
    pub fn with_structured(mut self, structured: StructuredOptions) -> Self {
        self.structured = structured;
        self
    }

    /// Enable or disable the structured path.
    pub fn with_structured_enabled(mut self, enabled: bool) -> Self {
        self.structured_enabled = enabled;
        self
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            chunk: ChunkOptions::default(),
            heuristic: HeuristicOptions::default(),
            structured: StructuredOptions::default(),
            structured_enabled: true,
        }
    }
}

/// Which extraction path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParsePath {
    Structured,
    Heuristic,
}

impl std::fmt::Display for ParsePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParsePath::Structured => f.write_str("structured"),
            ParsePath::Heuristic => f.write_str("heuristic"),
        }
    }
}

/// Sections, summaries and chunks of one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkedDocument {
    /// Path that produced this result
    pub path: ParsePath,

    /// Byte-exact page count
    pub page_count: u32,

    /// Why the structured path was abandoned, if it was
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,

    /// Sections in document order
    pub sections: Vec<Section>,

    /// One entry per distinct heading
    pub summaries: Vec<SectionSummary>,

    /// Chunks with contiguous indices
    pub chunks: Vec<Chunk>,
}

impl ChunkedDocument {
    /// Total tokens across all chunks.
    pub fn total_tokens(&self) -> usize {
        self.chunks.iter().map(|c| c.token_count).sum()
    }
}

/// Result of processing one document.
#[derive(Debug, Clone)]
pub enum ParseOutcome {
    /// At least one chunk was produced.
    Chunked(ChunkedDocument),

    /// The winning path produced no chunks. Callers usually mark such a
    /// document as failed.
    Empty {
        path: ParsePath,
        page_count: u32,
    },
}

impl ParseOutcome {
    /// Path that produced the outcome.
    pub fn path(&self) -> ParsePath {
        match self {
            ParseOutcome::Chunked(doc) => doc.path,
            ParseOutcome::Empty { path, .. } => *path,
        }
    }

    /// Check if no chunks were produced.
    pub fn is_empty(&self) -> bool {
        matches!(self, ParseOutcome::Empty { .. })
    }

    pub fn document(&self) -> Option<&ChunkedDocument> {
        match self {
            ParseOutcome::Chunked(doc) => Some(doc),
            ParseOutcome::Empty { .. } => None,
        }
    }

    pub fn into_document(self) -> Option<ChunkedDocument> {
        match self {
            ParseOutcome::Chunked(doc) => Some(doc),
            ParseOutcome::Empty { .. } => None,
        }
    }
}

/// Structured-then-heuristic document pipeline.
///
/// # Example
/// ```no_run
/// use pdfchunk::parser::JsonLayoutService;
/// use pdfchunk::{Pipeline, PipelineOptions};
///
/// let pipeline = Pipeline::new(PipelineOptions::default())?
///     .with_service(JsonLayoutService::from_path("10-K.layout.json"));
/// let outcome = pipeline.process_path("10-K.pdf")?;
/// if let Some(doc) = outcome.document() {
///     println!("{} chunks via {}", doc.chunks.len(), doc.path);
/// }
/// # Ok::<(), pdfchunk::Error>(())
/// ```
pub struct Pipeline<T = TiktokenCounter> {
    options: PipelineOptions,
    chunker: Chunker<T>,
    structured: Option<Box<dyn LayoutSource>>,
    heuristic: Box<dyn LayoutSource>,
}

impl Pipeline<TiktokenCounter> {
    /// Pipeline counting tokens with the tokenizer named in `options.chunk`.
    ///
    /// No structured source is configured; add one with
    /// [`with_service`](Self::with_service).
    pub fn new(options: PipelineOptions) -> Result<Self> {
        let chunker = Chunker::from_options(options.chunk.clone())?;
        Ok(Self::assemble(chunker, options))
    }
}

impl<T: TokenCounter> Pipeline<T> {
    /// Pipeline counting tokens with a custom counter.
    pub fn with_counter(counter: T, options: PipelineOptions) -> Result<Self> {
        let chunker = Chunker::with_counter(counter, options.chunk.clone())?;
        Ok(Self::assemble(chunker, options))
    }

    fn assemble(chunker: Chunker<T>, options: PipelineOptions) -> Self {
        let heuristic = Box::new(HeuristicExtractor::new(options.heuristic.clone()));
        Self {
            options,
            chunker,
            structured: None,
            heuristic,
        }
    }

    /// Use `service` for the structured path.
    pub fn with_service<S: LayoutService + 'static>(self, service: S) -> Self {
        let adapter = StructuredAdapter::with_options(service, self.options.structured.clone());
        self.with_structured_source(adapter)
    }

    /// Replace the structured layout source.
    pub fn with_structured_source(mut self, source: impl LayoutSource + 'static) -> Self {
        self.structured = Some(Box::new(source));
        self
    }

    /// Replace the heuristic layout source.
    pub fn with_heuristic_source(mut self, source: impl LayoutSource + 'static) -> Self {
        self.heuristic = Box::new(source);
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn chunker(&self) -> &Chunker<T> {
        &self.chunker
    }

    /// Process a PDF file.
    pub fn process_path<P: AsRef<Path>>(&self, path: P) -> Result<ParseOutcome> {
        let data = std::fs::read(path.as_ref())?;
        self.process(&data)
    }

    /// Process PDF bytes, counting pages from the page tree first.
    pub fn process(&self, pdf: &[u8]) -> Result<ParseOutcome> {
        let page_count = detect::page_count(pdf)?;
        self.process_with_page_count(pdf, page_count)
    }

    /// Process PDF bytes with a page count computed by the caller.
    pub fn process_with_page_count(&self, pdf: &[u8], page_count: u32) -> Result<ParseOutcome> {
        let structured = if self.options.structured_enabled {
            self.structured.as_deref()
        } else {
            None
        };

        let document = match structured {
            Some(source) => match self.run(source, ParsePath::Structured, pdf, page_count) {
                Ok(doc) => doc,
                Err(err) => {
                    log::warn!(
                        "Structured parsing failed, falling back to heuristic: {}",
                        err
                    );
                    let mut doc = self
                        .run(self.heuristic.as_ref(), ParsePath::Heuristic, pdf, page_count)
                        .map_err(|heuristic| Error::FallbackFailed {
                            structured: err.to_string(),
                            heuristic: Box::new(heuristic),
                        })?;
                    doc.fallback_reason = Some(err.to_string());
                    doc
                }
            },
            None => self.run(self.heuristic.as_ref(), ParsePath::Heuristic, pdf, page_count)?,
        };

        if document.chunks.is_empty() {
            log::warn!("No chunks produced on the {} path", document.path);
            return Ok(ParseOutcome::Empty {
                path: document.path,
                page_count,
            });
        }

        log::info!(
            "Chunked {} pages via {} path: {} sections, {} chunks, {} tokens",
            page_count,
            document.path,
            document.sections.len(),
            document.chunks.len(),
            document.total_tokens()
        );
        Ok(ParseOutcome::Chunked(document))
    }

    /// Process files in parallel, one independent run per file.
    pub fn process_many<P: AsRef<Path> + Sync>(&self, paths: &[P]) -> Vec<Result<ParseOutcome>> {
        paths.par_iter().map(|path| self.process_path(path)).collect()
    }

    fn run(
        &self,
        source: &dyn LayoutSource,
        path: ParsePath,
        pdf: &[u8],
        page_count: u32,
    ) -> Result<ChunkedDocument> {
        let layout = source.extract(pdf, page_count)?;
        let sections = build_sections(&layout);
        let summaries = summarize_sections(&sections);
        let chunks = self.chunker.chunk(&sections, &layout.key_value_pairs);
        log::debug!(
            "{} path: {} paragraphs, {} tables, {} sections, {} chunks",
            source.name(),
            layout.paragraphs.len(),
            layout.tables.len(),
            sections.len(),
            chunks.len()
        );

        Ok(ChunkedDocument {
            path,
            page_count,
            fallback_reason: None,
            sections,
            summaries,
            chunks,
        })
    }
}

impl<T> std::fmt::Debug for Pipeline<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("options", &self.options)
            .field("structured", &self.structured.as_ref().map(|s| s.name().to_string()))
            .field("heuristic", &self.heuristic.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NormalizedLayout, Paragraph};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    type WordCount = fn(&str) -> usize;

    fn words(text: &str) -> usize {
        text.split_whitespace().count()
    }

    /// Returns a fixed layout or a fixed error, counting calls.
    struct FakeSource {
        name: &'static str,
        layout: Option<NormalizedLayout>,
        fail_with: fn() -> Error,
        calls: Arc<AtomicUsize>,
    }

    impl FakeSource {
        fn ok(name: &'static str, layout: NormalizedLayout) -> Self {
            Self {
                name,
                layout: Some(layout),
                fail_with: || Error::Other("unused".to_string()),
                calls: Arc::default(),
            }
        }

        fn failing(name: &'static str, fail_with: fn() -> Error) -> Self {
            Self {
                name,
                layout: None,
                fail_with,
                calls: Arc::default(),
            }
        }
    }

    impl LayoutSource for FakeSource {
        fn name(&self) -> &str {
            self.name
        }

        fn extract(&self, _pdf: &[u8], page_count: u32) -> Result<NormalizedLayout> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.layout {
                Some(layout) => Ok(NormalizedLayout {
                    page_count,
                    ..layout.clone()
                }),
                None => Err((self.fail_with)()),
            }
        }
    }

    fn layout(text: &str) -> NormalizedLayout {
        let mut layout = NormalizedLayout::new(1);
        layout.paragraphs.push(Paragraph::title("Annual Report", 1));
        layout.paragraphs.push(Paragraph::body(text, 1));
        layout
    }

    fn pipeline() -> Pipeline<WordCount> {
        Pipeline::with_counter(words as WordCount, PipelineOptions::default()).unwrap()
    }

    #[test]
    fn test_structured_success() {
        let p = pipeline()
            .with_structured_source(FakeSource::ok("structured", layout("From structured.")))
            .with_heuristic_source(FakeSource::ok("heuristic", layout("From heuristic.")));

        let outcome = p.process_with_page_count(b"%PDF-1.7", 1).unwrap();
        let doc = outcome.document().unwrap();
        assert_eq!(doc.path, ParsePath::Structured);
        assert!(doc.fallback_reason.is_none());
        assert_eq!(doc.chunks[0].text, "From structured.");
        assert_eq!(doc.summaries.len(), 1);
    }

    #[test]
    fn test_fallback_on_structured_error() {
        let heuristic = FakeSource::ok("heuristic", layout("From heuristic."));
        let calls = heuristic.calls.clone();
        let p = pipeline()
            .with_structured_source(FakeSource::failing("structured", || {
                Error::UpstreamParse("service unavailable".to_string())
            }))
            .with_heuristic_source(heuristic);

        let outcome = p.process_with_page_count(b"%PDF-1.7", 1).unwrap();
        assert_eq!(outcome.path(), ParsePath::Heuristic);
        let doc = outcome.into_document().unwrap();
        assert_eq!(doc.chunks[0].text, "From heuristic.");
        assert!(doc.fallback_reason.unwrap().contains("service unavailable"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fallback_on_tier_limit() {
        let p = pipeline()
            .with_structured_source(FakeSource::failing("structured", || {
                Error::TierLimitExceeded {
                    max_parsed_page: 2,
                    page_count: 10,
                }
            }))
            .with_heuristic_source(FakeSource::ok("heuristic", layout("Full text.")));

        let outcome = p.process_with_page_count(b"%PDF-1.7", 10).unwrap();
        assert_eq!(outcome.path(), ParsePath::Heuristic);
    }

    #[test]
    fn test_heuristic_failure_after_fallback_is_fatal() {
        let p = pipeline()
            .with_structured_source(FakeSource::failing("structured", || {
                Error::UpstreamParse("timeout".to_string())
            }))
            .with_heuristic_source(FakeSource::failing("heuristic", || {
                Error::PdfParse("bad xref".to_string())
            }));

        let err = p.process_with_page_count(b"%PDF-1.7", 3).unwrap_err();
        match err {
            Error::FallbackFailed {
                structured,
                heuristic,
            } => {
                assert!(structured.contains("timeout"));
                assert!(matches!(*heuristic, Error::PdfParse(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_disabled_structured_path_is_skipped() {
        let structured = FakeSource::ok("structured", layout("From structured."));
        let calls = structured.calls.clone();
        let options = PipelineOptions::default().with_structured_enabled(false);
        let p = Pipeline::with_counter(words as WordCount, options)
            .unwrap()
            .with_structured_source(structured)
            .with_heuristic_source(FakeSource::failing("heuristic", || {
                Error::PdfParse("bad xref".to_string())
            }));

        // Without a structured attempt the heuristic error is returned as is.
        let err = p.process_with_page_count(b"%PDF-1.7", 1).unwrap_err();
        assert!(matches!(err, Error::PdfParse(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_outcome() {
        let p = pipeline().with_heuristic_source(FakeSource::ok("heuristic", NormalizedLayout::new(1)));
        let outcome = p.process_with_page_count(b"%PDF-1.7", 4).unwrap();
        assert!(outcome.is_empty());
        assert!(matches!(
            outcome,
            ParseOutcome::Empty {
                path: ParsePath::Heuristic,
                page_count: 4
            }
        ));
    }

    #[test]
    fn test_structured_empty_does_not_fall_back() {
        let heuristic = FakeSource::ok("heuristic", layout("From heuristic."));
        let calls = heuristic.calls.clone();
        let p = pipeline()
            .with_structured_source(FakeSource::ok("structured", NormalizedLayout::new(1)))
            .with_heuristic_source(heuristic);

        let outcome = p.process_with_page_count(b"%PDF-1.7", 1).unwrap();
        assert_eq!(outcome.path(), ParsePath::Structured);
        assert!(outcome.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_process_rejects_non_pdf() {
        let err = pipeline().process(b"not a pdf").unwrap_err();
        assert!(matches!(err, Error::UnknownFormat));
    }

    #[test]
    fn test_invalid_chunk_options() {
        let options = PipelineOptions::default()
            .with_chunk(ChunkOptions::new().with_max_tokens(8).with_overlap_tokens(8));
        assert!(Pipeline::with_counter(words as WordCount, options).is_err());
    }
}
