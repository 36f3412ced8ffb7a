//! Token counting backed by cached tiktoken vocabularies.
//!
//! The splitter calls the counter many times per document, so vocabularies
//! are loaded once per encoding id and shared process-wide. The
//! [`TokenCounter`] handle itself is an explicitly constructed value: clone
//! it freely (it is an `Arc` under the hood) and inject it wherever a
//! counting function is needed, including isolated test instances.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tiktoken_rs::{CoreBPE, cl100k_base, o200k_base, p50k_base, r50k_base};

use crate::types::ChunkError;

/// Default subword vocabulary, shared by most modern embedding models.
pub const DEFAULT_ENCODING: &str = "cl100k_base";

static VOCABULARIES: Lazy<RwLock<FxHashMap<String, Arc<CoreBPE>>>> =
    Lazy::new(|| RwLock::new(FxHashMap::default()));

/// Deterministic, total token counter for a fixed subword vocabulary.
#[derive(Clone)]
pub struct TokenCounter {
    encoding: String,
    bpe: Arc<CoreBPE>,
}

impl TokenCounter {
    /// Build a counter for the given encoding id, loading the vocabulary on
    /// first use and reusing the process-wide cached copy afterwards.
    pub fn new(encoding: &str) -> Result<Self, ChunkError> {
        if let Some(bpe) = VOCABULARIES.read().get(encoding) {
            return Ok(Self {
                encoding: encoding.to_string(),
                bpe: Arc::clone(bpe),
            });
        }

        let loaded = match encoding {
            "cl100k_base" => cl100k_base(),
            "o200k_base" => o200k_base(),
            "p50k_base" => p50k_base(),
            "r50k_base" | "gpt2" => r50k_base(),
            other => return Err(ChunkError::UnknownEncoding(other.to_string())),
        }
        .map_err(|err| ChunkError::Vocabulary {
            encoding: encoding.to_string(),
            message: err.to_string(),
        })?;

        let bpe = VOCABULARIES
            .write()
            .entry(encoding.to_string())
            .or_insert_with(|| Arc::new(loaded))
            .clone();

        Ok(Self {
            encoding: encoding.to_string(),
            bpe,
        })
    }

    /// Counter for the default `cl100k_base` vocabulary.
    pub fn cl100k() -> Result<Self, ChunkError> {
        Self::new(DEFAULT_ENCODING)
    }

    /// The encoding id this counter was built for.
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Number of tokens in `text`.
    ///
    /// Special-token sequences (`<|endoftext|>` and friends) are encoded as
    /// ordinary text rather than rejected, so counting never fails.
    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

impl fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCounter")
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_plain_text() {
        let counter = TokenCounter::cl100k().unwrap();
        assert!(counter.count("hello world") >= 2);
        assert_eq!(counter.count(""), 0);
    }

    #[test]
    fn special_token_sequences_are_ordinary_text() {
        let counter = TokenCounter::cl100k().unwrap();
        let n = counter.count("before <|endoftext|> after");
        assert!(n > counter.count("before  after"));
    }

    #[test]
    fn vocabulary_cache_is_shared_across_handles() {
        let a = TokenCounter::cl100k().unwrap();
        let b = TokenCounter::cl100k().unwrap();
        assert!(Arc::ptr_eq(&a.bpe, &b.bpe));
    }

    #[test]
    fn unknown_encoding_is_rejected() {
        assert!(matches!(
            TokenCounter::new("base64"),
            Err(ChunkError::UnknownEncoding(_))
        ));
    }
}
