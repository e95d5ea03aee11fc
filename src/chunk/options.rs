//! Chunking options.

use crate::error::{Error, Result};

/// Options for token-bounded chunking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOptions {
    /// Upper bound on tokens per text chunk
    pub max_tokens: usize,

    /// Token budget for sentences carried into the next chunk
    pub overlap_tokens: usize,

    /// Model whose tokenizer counts tokens (e.g. "gpt-4o")
    pub tokenizer_model: String,
}

impl ChunkOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set max tokens per chunk.
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set overlap tokens.
    pub fn with_overlap_tokens(mut self, overlap_tokens: usize) -> Self {
        self.overlap_tokens = overlap_tokens;
        self
    }

    /// Set the tokenizer model.
    pub fn with_tokenizer_model(mut self, model: impl Into<String>) -> Self {
        self.tokenizer_model = model.into();
        self
    }

    /// Reject a zero budget or an overlap that leaves no room for new text.
    pub fn validate(&self) -> Result<()> {
        if self.max_tokens == 0 {
            return Err(Error::InvalidOptions("max_tokens must be positive".to_string()));
        }
        if self.overlap_tokens >= self.max_tokens {
            return Err(Error::InvalidOptions(format!(
                "overlap_tokens ({}) must be smaller than max_tokens ({})",
                self.overlap_tokens, self.max_tokens
            )));
        }
        Ok(())
    }
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            overlap_tokens: 64,
            tokenizer_model: "gpt-4o".to_string(),
        }
    }
}
