//! Core data types shared across the chunking pipeline.

use serde::{Deserialize, Serialize};

/// String-keyed metadata attached to documents and chunks.
///
/// By contract the values are restricted to strings, numbers, booleans, or
/// lists thereof, so any persistence layer can store them unchanged.
pub type MetadataMap = serde_json::Map<String, serde_json::Value>;

/// An extracted document handed to the chunking pipeline.
///
/// The text has already been pulled out of its source format by an upstream
/// extractor; `metadata` carries at least a `source` filename plus whatever
/// structural fields the extractor recovered (section headings, control ids,
/// page numbers, ...).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceDocument {
    pub text: String,
    pub metadata: MetadataMap,
}

impl SourceDocument {
    /// Create a new source document.
    pub fn new(text: impl Into<String>, metadata: MetadataMap) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }

    /// The `source` filename recorded in metadata, or `""` when absent.
    pub fn source(&self) -> &str {
        self.metadata
            .get("source")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("")
    }
}

/// A retrieval-ready chunk emitted by the pipeline.
///
/// `text` carries the context prefix (when one was built) followed by the
/// chunk content; `metadata` extends the source document's metadata with
/// `document_type`, `chunk_index`, `is_small_chunk`, `token_count`, the
/// parent back-reference fields for small chunks, and the hypothetical
/// question fields when enhancement ran.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmittedChunk {
    pub text: String,
    pub metadata: MetadataMap,
}

impl EmittedChunk {
    pub fn new(text: impl Into<String>, metadata: MetadataMap) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }

    /// Zero-based position of this chunk within its document's output.
    pub fn chunk_index(&self) -> Option<usize> {
        self.metadata
            .get("chunk_index")
            .and_then(serde_json::Value::as_u64)
            .map(|v| v as usize)
    }

    /// Token count as measured by the pipeline's counter.
    pub fn token_count(&self) -> Option<usize> {
        self.metadata
            .get("token_count")
            .and_then(serde_json::Value::as_u64)
            .map(|v| v as usize)
    }

    /// Whether this chunk is the small tier of a small-to-big pair.
    pub fn is_small_chunk(&self) -> bool {
        self.metadata
            .get("is_small_chunk")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }
}

/// Errors produced while configuring or running the chunking pipeline.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChunkError {
    /// The token vocabulary for the requested encoding could not be loaded.
    #[error("vocabulary '{encoding}' failed to load: {message}")]
    Vocabulary { encoding: String, message: String },

    /// The requested encoding id is not in the closed set of known encodings.
    #[error("unknown token encoding '{0}'")]
    UnknownEncoding(String),

    /// A splitter was configured with `overlap >= target`, which would stall
    /// forward progress.
    #[error("overlap of {overlap} tokens must be smaller than the {target}-token target")]
    OverlapExceedsTarget { overlap: usize, target: usize },

    /// A splitter was configured with a zero token budget.
    #[error("target token budget must be greater than zero")]
    ZeroTarget,

    /// A batch worker task failed outside the pipeline itself (e.g. a panic).
    #[error("document worker failed: {0}")]
    Worker(String),
}
