//! Table types and grid reconstruction.

use serde::{Deserialize, Serialize};

use crate::render::markdown::render_table_rows;

/// A sparse table cell as reported by layout analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCell {
    /// Anchor row (0-indexed)
    pub row_index: usize,

    /// Anchor column (0-indexed)
    pub column_index: usize,

    /// Cell text
    pub content: String,

    /// Number of rows this cell spans
    pub row_span: usize,

    /// Number of columns this cell spans
    pub column_span: usize,
}

impl TableCell {
    /// Create a single-slot cell.
    pub fn new(row_index: usize, column_index: usize, content: impl Into<String>) -> Self {
        Self {
            row_index,
            column_index,
            content: content.into(),
            row_span: 1,
            column_span: 1,
        }
    }

    /// Set row span and return self.
    pub fn row_span(mut self, span: usize) -> Self {
        self.row_span = span;
        self
    }

    /// Set column span and return self.
    pub fn column_span(mut self, span: usize) -> Self {
        self.column_span = span;
        self
    }

    /// Content with line breaks collapsed to single spaces, trimmed.
    fn normalized_content(&self) -> String {
        self.content.replace('\n', " ").trim().to_string()
    }
}

/// A dense `row_count × column_count` grid rebuilt from sparse cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableGrid {
    rows: Vec<Vec<String>>,
}

impl TableGrid {
    /// Rebuild the grid, replicating merged-cell content over its full span.
    ///
    /// Slots outside the declared bounds are ignored. A zero-sized grid has
    /// no rows at all.
    pub fn reconstruct(row_count: usize, column_count: usize, cells: &[TableCell]) -> Self {
        if row_count == 0 || column_count == 0 {
            return Self::default();
        }

        let mut rows = vec![vec![String::new(); column_count]; row_count];

        for cell in cells {
            let content = cell.normalized_content();
            let row_span = cell.row_span.max(1);
            let column_span = cell.column_span.max(1);

            for r in cell.row_index..cell.row_index.saturating_add(row_span) {
                if r >= row_count {
                    break;
                }
                for c in cell.column_index..cell.column_index.saturating_add(column_span) {
                    if c >= column_count {
                        break;
                    }
                    rows[r][c] = content.clone();
                }
            }
        }

        Self { rows }
    }

    /// Rows of the grid; row 0 is the header.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Get the text at a grid position.
    pub fn get(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    /// Check if the grid has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as a markdown table; an empty grid renders as `""`.
    pub fn to_markdown(&self) -> String {
        render_table_rows(&self.rows)
    }
}

/// A table placed in the document flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableBlock {
    /// Markdown rendering of the table grid
    pub grid_markdown: String,

    /// First page the table touches
    pub page_start: u32,

    /// Last page the table touches
    pub page_end: u32,

    /// Declared number of rows
    pub row_count: usize,

    /// Declared number of columns
    pub column_count: usize,

    /// Caption text (may be empty)
    pub caption: String,
}

impl TableBlock {
    /// Create a table block. Page bounds are reordered if given reversed.
    pub fn new(grid_markdown: impl Into<String>, page_start: u32, page_end: u32) -> Self {
        let (page_start, page_end) = if page_start <= page_end {
            (page_start, page_end)
        } else {
            (page_end, page_start)
        };
        Self {
            grid_markdown: grid_markdown.into(),
            page_start: page_start.max(1),
            page_end: page_end.max(1),
            row_count: 0,
            column_count: 0,
            caption: String::new(),
        }
    }

    /// Set declared dimensions and return self.
    pub fn with_dimensions(mut self, row_count: usize, column_count: usize) -> Self {
        self.row_count = row_count;
        self.column_count = column_count;
        self
    }

    /// Set caption and return self.
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }

    /// Text as it enters a table chunk: caption, blank line, markdown.
    pub fn chunk_text(&self) -> String {
        if self.caption.is_empty() {
            self.grid_markdown.clone()
        } else {
            format!("{}\n\n{}", self.caption, self.grid_markdown)
        }
    }
}
