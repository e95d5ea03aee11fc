//! Heuristic extraction from raw character layout.
//!
//! Headings are inferred from font-size statistics: a line whose average
//! size stands well above the document median (or is bold and close to the
//! threshold) is a heading.

use std::collections::BTreeMap;

use super::char_layout::{line_text, CharLayoutProvider, LayoutChar, LopdfCharLayout, PageLayout};
use super::cleanup::{clean_line, is_bare_page_number, is_page_label};
use super::source::LayoutSource;
use crate::error::Result;
use crate::model::{DetectedHeading, NormalizedLayout, Paragraph, ParagraphRole, TableBlock};
use crate::render::markdown::render_table_rows;

/// Options for heading inference and table extraction.
#[derive(Debug, Clone)]
pub struct HeuristicOptions {
    /// Heading threshold as a multiple of the median font size
    pub heading_ratio: f32,

    /// Bold lines qualify at this fraction of the threshold
    pub bold_ratio: f32,

    /// Headings at or above this multiple of the threshold are level 1
    pub level1_ratio: f32,

    /// Threshold used when the document has no sized text
    pub default_threshold: f32,

    /// Fraction of the page height at the top and bottom where a bare
    /// number is read as a page number
    pub margin_band: f32,

    /// Whether to extract tables
    pub extract_tables: bool,
}

impl HeuristicOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set heading ratio.
    pub fn with_heading_ratio(mut self, ratio: f32) -> Self {
        self.heading_ratio = ratio;
        self
    }

    /// Set the margin band for page-number detection.
    pub fn with_margin_band(mut self, band: f32) -> Self {
        self.margin_band = band;
        self
    }

    /// Enable or disable table extraction.
    pub fn with_tables(mut self, extract: bool) -> Self {
        self.extract_tables = extract;
        self
    }
}

impl Default for HeuristicOptions {
    fn default() -> Self {
        Self {
            heading_ratio: 1.3,
            bold_ratio: 0.9,
            level1_ratio: 1.15,
            default_threshold: 14.0,
            margin_band: 0.1,
            extract_tables: true,
        }
    }
}

/// Heuristic layout source over a [`CharLayoutProvider`].
#[derive(Debug, Clone)]
pub struct HeuristicExtractor<P = LopdfCharLayout> {
    provider: P,
    options: HeuristicOptions,
}

impl HeuristicExtractor<LopdfCharLayout> {
    /// Extractor over `lopdf` content streams.
    pub fn new(options: HeuristicOptions) -> Self {
        let provider = LopdfCharLayout::new().with_tables(options.extract_tables);
        Self { provider, options }
    }
}

impl Default for HeuristicExtractor<LopdfCharLayout> {
    fn default() -> Self {
        Self::new(HeuristicOptions::default())
    }
}

impl<P: CharLayoutProvider> HeuristicExtractor<P> {
    /// Extractor over a custom layout provider.
    pub fn with_provider(provider: P, options: HeuristicOptions) -> Self {
        Self { provider, options }
    }

    /// Normalize already-decoded pages.
    pub fn normalize_pages(&self, pages: &[PageLayout], page_count: u32) -> NormalizedLayout {
        let threshold = self.heading_threshold(pages);
        log::debug!("Heading threshold: {:.2}pt", threshold);

        let mut layout = NormalizedLayout::new(page_count);

        for page in pages {
            let page_number = page.page_number.max(1);

            if self.options.extract_tables {
                for rows in &page.tables {
                    if let Some(table) = table_block(rows, page_number) {
                        layout.tables.push(table);
                    }
                }
            }

            for line in group_lines(&page.chars) {
                let text = clean_line(&line_text(&line));
                if text.is_empty() {
                    continue;
                }
                if self.is_page_furniture(&text, &line, page) {
                    layout
                        .paragraphs
                        .push(Paragraph::new(text, ParagraphRole::PageNumber, page_number));
                    continue;
                }

                let avg_size = weighted_mean_size(&line);
                let bold = line.iter().any(|c| c.is_bold());
                if let Some(level) = self.heading_level(avg_size, bold, threshold) {
                    layout.headings.push(DetectedHeading {
                        text: text.clone(),
                        level,
                        page: page_number,
                        font_size: avg_size,
                    });
                }
                layout.paragraphs.push(Paragraph::body(text, page_number));
            }
        }

        log::debug!(
            "Heuristic extraction: {} lines, {} headings, {} tables",
            layout.paragraphs.len(),
            layout.headings.len(),
            layout.tables.len()
        );
        layout
    }

    /// Page labels always count; a bare number only in the margin band or
    /// when it matches the page it is printed on.
    fn is_page_furniture(&self, text: &str, line: &[&LayoutChar], page: &PageLayout) -> bool {
        if is_page_label(text) {
            return true;
        }
        if !is_bare_page_number(text) {
            return false;
        }
        if text.trim().parse::<u32>().ok() == Some(page.page_number) {
            return true;
        }
        if page.height <= 0.0 {
            return false;
        }
        let band = page.height * self.options.margin_band;
        let top = line.iter().map(|c| c.top).fold(f32::INFINITY, f32::min);
        top <= band || top >= page.height - band
    }

    /// Median character size times the heading ratio.
    fn heading_threshold(&self, pages: &[PageLayout]) -> f32 {
        let mut sizes: Vec<f32> = pages
            .iter()
            .flat_map(|p| p.chars.iter())
            .filter(|c| c.size > 0.0)
            .flat_map(|c| std::iter::repeat(c.size).take(c.char_count()))
            .collect();
        match median(&mut sizes) {
            Some(m) => m * self.options.heading_ratio,
            None => self.options.default_threshold,
        }
    }

    fn heading_level(&self, avg_size: f32, bold: bool, threshold: f32) -> Option<u8> {
        let qualifies =
            avg_size >= threshold || (bold && avg_size >= threshold * self.options.bold_ratio);
        if !qualifies {
            return None;
        }
        Some(if avg_size >= threshold * self.options.level1_ratio { 1 } else { 2 })
    }
}

impl<P: CharLayoutProvider> LayoutSource for HeuristicExtractor<P> {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn extract(&self, pdf: &[u8], page_count: u32) -> Result<NormalizedLayout> {
        let pages = self.provider.pages(pdf)?;
        Ok(self.normalize_pages(&pages, page_count))
    }
}

/// Group runs into lines keyed by `top` rounded to one decimal, top-down.
fn group_lines(chars: &[LayoutChar]) -> Vec<Vec<&LayoutChar>> {
    let mut lines: BTreeMap<i64, Vec<&LayoutChar>> = BTreeMap::new();
    for c in chars {
        let key = (f64::from(c.top) * 10.0).round() as i64;
        lines.entry(key).or_default().push(c);
    }
    lines.into_values().collect()
}

/// Mean size over the characters of a line (runs weighted by length).
fn weighted_mean_size(line: &[&LayoutChar]) -> f32 {
    let (total, count) = line
        .iter()
        .filter(|c| c.size > 0.0)
        .fold((0.0f32, 0usize), |(total, count), c| {
            let n = c.char_count();
            (total + c.size * n as f32, count + n)
        });
    if count == 0 {
        0.0
    } else {
        total / count as f32
    }
}

fn median(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f32::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

/// Render a detected table; the first row is the header. Tables without a
/// header row are dropped.
fn table_block(rows: &[Vec<Option<String>>], page: u32) -> Option<TableBlock> {
    if rows.first().map_or(true, |header| header.is_empty()) {
        return None;
    }
    let cells: Vec<Vec<&str>> = rows
        .iter()
        .map(|row| row.iter().map(|c| c.as_deref().unwrap_or("")).collect())
        .collect();
    let markdown = render_table_rows(&cells);
    if markdown.is_empty() {
        return None;
    }
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    Some(TableBlock::new(markdown, page, page).with_dimensions(rows.len(), columns))
}
