//! JSON rendering for chunked documents.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::pipeline::ChunkedDocument;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert a chunked document to JSON.
pub fn to_json(doc: &ChunkedDocument, format: JsonFormat) -> Result<String> {
    serialize(doc, format)
}

/// One compact [`ChunkMetadata`](crate::model::ChunkMetadata) record per
/// line, ready for vector-store upsert.
pub fn to_metadata_lines(doc: &ChunkedDocument, document_id: &str) -> Result<String> {
    let mut out = String::new();
    for chunk in &doc.chunks {
        out.push_str(&serialize(&chunk.metadata(document_id), JsonFormat::Compact)?);
        out.push('\n');
    }
    Ok(out)
}

fn serialize<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}
