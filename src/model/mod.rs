//! Data model for structured documents and chunks.
//!
//! Both extraction paths normalize into [`NormalizedLayout`]; the section
//! builder turns that into [`Section`]s and the chunker into [`Chunk`]s.

mod chunk;
mod layout;
mod paragraph;
mod section;
mod table;

pub use chunk::{breadcrumb, Chunk, ChunkMetadata, ContentType};
pub use layout::{DetectedHeading, KeyValuePair, NormalizedLayout};
pub use paragraph::{Paragraph, ParagraphRole};
pub use section::{Element, Section};
pub use table::{TableBlock, TableCell, TableGrid};
