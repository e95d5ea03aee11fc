//! Token counting.

use tiktoken_rs::CoreBPE;

use crate::error::{Error, Result};

/// Counts tokens the way the downstream model does.
pub trait TokenCounter: Send + Sync {
    /// Number of tokens in `text`.
    fn count(&self, text: &str) -> usize;
}

impl<F> TokenCounter for F
where
    F: Fn(&str) -> usize + Send + Sync,
{
    fn count(&self, text: &str) -> usize {
        self(text)
    }
}

/// BPE token counter from `tiktoken-rs`.
pub struct TiktokenCounter {
    model: String,
    bpe: CoreBPE,
}

impl TiktokenCounter {
    /// Load the encoding used by `model` (e.g. "gpt-4o" uses `o200k_base`).
    pub fn for_model(model: &str) -> Result<Self> {
        let bpe = tiktoken_rs::get_bpe_from_model(model)
            .map_err(|e| Error::Tokenizer(format!("no encoding for model '{}': {}", model, e)))?;
        log::debug!("Loaded tokenizer for model {}", model);
        Ok(Self {
            model: model.to_string(),
            bpe,
        })
    }

    /// Model name the encoding was chosen for.
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

impl std::fmt::Debug for TiktokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiktokenCounter")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}
