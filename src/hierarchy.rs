//! Small-to-big chunk hierarchy.
//!
//! Retrieval matches small, focused chunks; generation wants the wider
//! context around the match. Each parent span is re-split with a smaller
//! budget, and every resulting small chunk carries a verbatim copy of its
//! parent's full text so callers can reconstruct the context without
//! re-fetching the source document.

use crate::config::adaptive_overlap;
use crate::splitter::TokenSplitter;
use crate::tokenizer::TokenCounter;
use crate::types::ChunkError;

/// A top-tier span produced by the parent splitter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParentChunk {
    /// Ordinal position within the document.
    pub index: usize,
    pub text: String,
    pub token_count: usize,
}

/// A second-tier span cut from one parent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmallChunk {
    /// Ordinal of the parent this was cut from.
    pub parent_index: usize,
    /// Position within that parent, contiguous from 0.
    pub local_index: usize,
    pub text: String,
    pub token_count: usize,
    /// Byte-identical copy of the parent's text.
    pub parent_text: String,
    pub parent_token_count: usize,
}

/// Split document text into parent chunks.
pub fn split_parents(splitter: &TokenSplitter, counter: &TokenCounter, text: &str) -> Vec<ParentChunk> {
    splitter
        .split(text)
        .into_iter()
        .enumerate()
        .map(|(index, text)| {
            let token_count = counter.count(&text);
            ParentChunk {
                index,
                text,
                token_count,
            }
        })
        .collect()
}

/// Re-split each parent with the small budget and adaptive overlap.
///
/// A parent that already fits the small budget yields exactly one small
/// chunk equal to itself.
pub fn build_small_chunks(
    counter: &TokenCounter,
    parents: &[ParentChunk],
    small_target: usize,
) -> Result<Vec<SmallChunk>, ChunkError> {
    let small_overlap = adaptive_overlap(small_target);
    let splitter = TokenSplitter::new(counter.clone(), small_target, small_overlap)?;

    let mut small_chunks = Vec::new();
    for parent in parents {
        for (local_index, text) in splitter.split(&parent.text).into_iter().enumerate() {
            let token_count = counter.count(&text);
            small_chunks.push(SmallChunk {
                parent_index: parent.index,
                local_index,
                text,
                token_count,
                parent_text: parent.text.clone(),
                parent_token_count: parent.token_count,
            });
        }
    }
    Ok(small_chunks)
}
