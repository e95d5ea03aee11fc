//! Chunks: the retrieval-ready output units.

use serde::{Deserialize, Serialize};

/// What a chunk carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Running text (or the key information block)
    #[default]
    Text,
    /// One whole table
    Table,
}

impl ContentType {
    /// Lowercase name as stored in chunk metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Table => "table",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A token-bounded unit of text, or a whole table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Display text
    pub text: String,

    /// Position in the document's chunk list (0-based, contiguous)
    pub index: usize,

    /// Heading of the owning section
    pub section_heading: String,

    /// Level of the owning section
    pub section_level: u8,

    /// Nearest preceding level-1 heading for level-2 sections, else empty
    pub parent_section: String,

    /// Text or table
    pub content_type: ContentType,

    /// First page attributed to this chunk
    pub page_start: u32,

    /// Last page attributed to this chunk
    pub page_end: u32,

    /// Token count of `text`
    pub token_count: usize,

    /// Alternate embedding input; empty means "embed `text`"
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub embedding_text: String,
}

impl Chunk {
    /// Text handed to the embedding model.
    pub fn embedding_input(&self) -> &str {
        if self.embedding_text.is_empty() {
            &self.text
        } else {
            &self.embedding_text
        }
    }

    /// `parent > heading`, or `heading` alone when there is no parent.
    pub fn breadcrumb(&self) -> String {
        breadcrumb(&self.parent_section, &self.section_heading)
    }

    /// Metadata record stored next to the vector.
    pub fn metadata(&self, document_id: &str) -> ChunkMetadata {
        ChunkMetadata {
            document_id: document_id.to_string(),
            chunk_index: self.index,
            section_heading: self.section_heading.clone(),
            section_level: self.section_level,
            parent_section: self.parent_section.clone(),
            content_type: self.content_type,
            page_start: self.page_start,
            page_end: self.page_end,
            chunk_text: self.text.clone(),
            token_count: self.token_count,
        }
    }
}

/// Join a parent heading and a heading with `" > "`, skipping empty parts.
pub fn breadcrumb(parent: &str, heading: &str) -> String {
    [parent, heading]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" > ")
}

/// Per-chunk metadata for vector-store upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub document_id: String,
    pub chunk_index: usize,
    pub section_heading: String,
    pub section_level: u8,
    pub parent_section: String,
    pub content_type: ContentType,
    pub page_start: u32,
    pub page_end: u32,
    pub chunk_text: String,
    pub token_count: usize,
}
