//! Serde model of a structured layout-analysis result.
//!
//! Field names follow the camelCase JSON emitted by layout-analysis
//! services (`boundingRegions`, `rowCount`, `keyValuePairs`, ...). Anything
//! not listed here is ignored on decode.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Root of an analysis result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzeResult {
    pub pages: Vec<AnalyzedPage>,
    pub paragraphs: Vec<AnalyzedParagraph>,
    pub tables: Vec<AnalyzedTable>,
    pub key_value_pairs: Vec<AnalyzedKeyValuePair>,
}

impl AnalyzeResult {
    /// Decode from JSON.
    ///
    /// Accepts either the bare result or the operation envelope
    /// `{"status": ..., "analyzeResult": {...}}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut value: serde_json::Value = serde_json::from_str(json)?;
        if let Some(status) = value.get("status").and_then(|s| s.as_str()) {
            if !status.eq_ignore_ascii_case("succeeded") {
                return Err(Error::UpstreamParse(format!(
                    "analysis operation status is '{}'",
                    status
                )));
            }
        }
        if let Some(inner) = value.get_mut("analyzeResult") {
            let inner = inner.take();
            return Ok(serde_json::from_value(inner)?);
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Number of pages the service reports having processed.
    pub fn processed_pages(&self) -> u32 {
        self.pages.len() as u32
    }
}

/// A processed page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzedPage {
    pub page_number: u32,
    pub width: Option<f32>,
    pub height: Option<f32>,
}

/// Where an element sits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoundingRegion {
    pub page_number: u32,
    pub polygon: Vec<f32>,
}

/// First region's page, or 1 when there is none.
pub(crate) fn first_page(regions: &[BoundingRegion]) -> u32 {
    regions.first().map(|r| r.page_number.max(1)).unwrap_or(1)
}

/// A paragraph with an optional role string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzedParagraph {
    pub content: String,
    pub role: Option<String>,
    pub bounding_regions: Vec<BoundingRegion>,
}

/// A table with a flat cell list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzedTable {
    pub row_count: usize,
    pub column_count: usize,
    pub cells: Vec<AnalyzedCell>,
    pub bounding_regions: Vec<BoundingRegion>,
    pub caption: Option<AnalyzedCaption>,
}

/// One sparse cell. Missing spans mean 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzedCell {
    pub row_index: usize,
    pub column_index: usize,
    pub content: String,
    pub row_span: Option<usize>,
    pub column_span: Option<usize>,
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzedCaption {
    pub content: String,
}

/// A key/value pair. Either side may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzedKeyValuePair {
    pub key: Option<AnalyzedElement>,
    pub value: Option<AnalyzedElement>,
}

/// Text content with location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzedElement {
    pub content: String,
    pub bounding_regions: Vec<BoundingRegion>,
}
