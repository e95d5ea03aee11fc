//! Structured extraction from a layout-analysis result.

use std::path::{Path, PathBuf};

use super::analyze::{first_page, AnalyzeResult, AnalyzedCell, AnalyzedTable};
use super::source::LayoutSource;
use crate::error::{Error, Result};
use crate::model::{
    KeyValuePair, NormalizedLayout, Paragraph, ParagraphRole, TableBlock, TableCell, TableGrid,
};

/// A layout-analysis backend.
pub trait LayoutService: Send + Sync {
    /// Analyze `pdf`, requesting pages `1..=page_count`.
    fn analyze(&self, pdf: &[u8], page_count: u32) -> Result<AnalyzeResult>;
}

impl<F> LayoutService for F
where
    F: Fn(&[u8], u32) -> Result<AnalyzeResult> + Send + Sync,
{
    fn analyze(&self, pdf: &[u8], page_count: u32) -> Result<AnalyzeResult> {
        self(pdf, page_count)
    }
}

/// Serves a pre-fetched analysis result stored as JSON.
///
/// The JSON is read and decoded on every call to `analyze`, so a missing
/// file or malformed payload fails the structured path rather than
/// construction.
#[derive(Debug, Clone)]
pub struct JsonLayoutService {
    source: JsonSource,
}

#[derive(Debug, Clone)]
enum JsonSource {
    Text(String),
    File(PathBuf),
}

impl JsonLayoutService {
    /// Serve the result held in `json`.
    pub fn from_json(json: impl Into<String>) -> Self {
        Self {
            source: JsonSource::Text(json.into()),
        }
    }

    /// Serve the result stored at `path`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            source: JsonSource::File(path.as_ref().to_path_buf()),
        }
    }
}

impl LayoutService for JsonLayoutService {
    fn analyze(&self, _pdf: &[u8], _page_count: u32) -> Result<AnalyzeResult> {
        match &self.source {
            JsonSource::Text(json) => AnalyzeResult::from_json(json),
            JsonSource::File(path) => {
                let json = std::fs::read_to_string(path)?;
                AnalyzeResult::from_json(&json)
            }
        }
    }
}

/// Options for the structured path.
#[derive(Debug, Clone)]
pub struct StructuredOptions {
    /// Minimum fraction of the real page count the result must reach
    pub min_coverage: f64,

    /// Documents with at most this many pages skip the coverage check
    pub min_pages_for_coverage_check: u32,
}

impl StructuredOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set minimum coverage.
    pub fn with_min_coverage(mut self, coverage: f64) -> Self {
        self.min_coverage = coverage;
        self
    }

    /// Set the page count at or below which coverage is not checked.
    pub fn with_min_pages_for_coverage_check(mut self, pages: u32) -> Self {
        self.min_pages_for_coverage_check = pages;
        self
    }
}

impl Default for StructuredOptions {
    fn default() -> Self {
        Self {
            min_coverage: 0.5,
            min_pages_for_coverage_check: 2,
        }
    }
}

/// Structured layout source: a [`LayoutService`] plus normalization.
#[derive(Debug, Clone)]
pub struct StructuredAdapter<S> {
    service: S,
    options: StructuredOptions,
}

impl<S: LayoutService> StructuredAdapter<S> {
    /// Wrap a service with default options.
    pub fn new(service: S) -> Self {
        Self::with_options(service, StructuredOptions::default())
    }

    /// Wrap a service with explicit options.
    pub fn with_options(service: S, options: StructuredOptions) -> Self {
        Self { service, options }
    }
}

impl<S: LayoutService> LayoutSource for StructuredAdapter<S> {
    fn name(&self) -> &str {
        "structured"
    }

    fn extract(&self, pdf: &[u8], page_count: u32) -> Result<NormalizedLayout> {
        let result = self.service.analyze(pdf, page_count)?;
        normalize(&result, page_count, &self.options)
    }
}

/// Map an analysis result onto the normalized layout.
///
/// Fails with [`Error::TierLimitExceeded`] when the result stops well short
/// of the real page count.
pub fn normalize(
    result: &AnalyzeResult,
    page_count: u32,
    options: &StructuredOptions,
) -> Result<NormalizedLayout> {
    let processed = result.processed_pages();
    if processed < page_count {
        log::warn!(
            "Layout analysis processed {}/{} pages; the service may be page-limited",
            processed,
            page_count
        );
    }

    let mut layout = NormalizedLayout::new(page_count);

    layout.paragraphs = result
        .paragraphs
        .iter()
        .map(|p| {
            Paragraph::new(
                p.content.clone(),
                ParagraphRole::from_upstream(p.role.as_deref()),
                first_page(&p.bounding_regions),
            )
        })
        .collect();

    layout.tables = result.tables.iter().map(table_block).collect();

    layout.key_value_pairs = result
        .key_value_pairs
        .iter()
        .map(|kv| {
            let (key, page) = match &kv.key {
                Some(key) => (key.content.clone(), first_page(&key.bounding_regions)),
                None => (String::new(), 1),
            };
            let value = kv.value.as_ref().map(|v| v.content.clone()).unwrap_or_default();
            KeyValuePair::new(key, value, page)
        })
        .collect();

    let max_parsed_page = layout.max_page();
    if page_count > options.min_pages_for_coverage_check
        && f64::from(max_parsed_page) < f64::from(page_count) * options.min_coverage
    {
        return Err(Error::TierLimitExceeded {
            max_parsed_page,
            page_count,
        });
    }

    log::info!(
        "Layout analysis parsed: {} paragraphs, {} tables, {} key/value pairs, {} pages \
         (processed {}, content up to page {})",
        layout.paragraphs.len(),
        layout.tables.len(),
        layout.key_value_pairs.len(),
        page_count,
        processed,
        max_parsed_page
    );

    Ok(layout)
}

fn table_block(table: &AnalyzedTable) -> TableBlock {
    let cells: Vec<TableCell> = table.cells.iter().map(TableCell::from).collect();
    let grid = TableGrid::reconstruct(table.row_count, table.column_count, &cells);

    let pages = table.bounding_regions.iter().map(|r| r.page_number.max(1));
    let page_start = pages.clone().min().unwrap_or(1);
    let page_end = pages.max().unwrap_or(1);

    let caption = table
        .caption
        .as_ref()
        .map(|c| c.content.clone())
        .unwrap_or_default();

    TableBlock::new(grid.to_markdown(), page_start, page_end)
        .with_dimensions(table.row_count, table.column_count)
        .with_caption(caption)
}

impl From<&AnalyzedCell> for TableCell {
    fn from(cell: &AnalyzedCell) -> Self {
        TableCell::new(cell.row_index, cell.column_index, cell.content.clone())
            .row_span(cell.row_span.unwrap_or(1))
            .column_span(cell.column_span.unwrap_or(1))
    }
}
