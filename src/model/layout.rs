//! The normalized layout shared by both extraction paths.

use serde::{Deserialize, Serialize};

use super::{Paragraph, TableBlock};

/// A key/value pair found by layout analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValuePair {
    pub key: String,
    pub value: String,
    /// Page of the key (1-indexed)
    pub page: u32,
}

impl KeyValuePair {
    pub fn new(key: impl Into<String>, value: impl Into<String>, page: u32) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            page: page.max(1),
        }
    }
}

/// A heading line inferred from font statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedHeading {
    /// Exact line text
    pub text: String,
    /// 1 or 2
    pub level: u8,
    /// Page the line sits on
    pub page: u32,
    /// Average font size of the line
    pub font_size: f32,
}

/// Paragraphs, tables and key/value pairs in document order.
///
/// Structured extraction tags heading paragraphs with a role. Heuristic
/// extraction leaves every line as body text and lists heading lines in
/// `headings` instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedLayout {
    /// Paragraphs in reading order
    pub paragraphs: Vec<Paragraph>,

    /// Tables in reading order
    pub tables: Vec<TableBlock>,

    /// Key/value pairs
    pub key_value_pairs: Vec<KeyValuePair>,

    /// Byte-exact page count of the source PDF
    pub page_count: u32,

    /// Font-inferred headings (heuristic path only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headings: Vec<DetectedHeading>,
}

impl NormalizedLayout {
    pub fn new(page_count: u32) -> Self {
        Self {
            page_count,
            ..Default::default()
        }
    }

    /// Check if nothing was extracted.
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty() && self.tables.is_empty() && self.key_value_pairs.is_empty()
    }

    /// Highest page number seen across paragraphs and tables, 0 if none.
    pub fn max_page(&self) -> u32 {
        let paragraphs = self.paragraphs.iter().map(|p| p.page);
        let tables = self.tables.iter().map(|t| t.page_end);
        paragraphs.chain(tables).max().unwrap_or(0)
    }
}
