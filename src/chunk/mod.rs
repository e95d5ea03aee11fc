//! Token-aware chunking.
//!
//! Sections become chunks in reading order: running text is accumulated and
//! split on sentence boundaries once it exceeds the token budget, while each
//! table becomes exactly one chunk. Key/value pairs are collected into a
//! final "Key Information" chunk.

mod chunker;
mod options;
mod sentence;
mod tokenizer;

pub use chunker::{sub_chunk_pages, Chunker, KEY_INFORMATION_HEADING};
pub use options::ChunkOptions;
pub use sentence::{pack_sentences, split_sentences};
pub use tokenizer::{TiktokenCounter, TokenCounter};
