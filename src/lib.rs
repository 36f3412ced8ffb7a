//! Document-aware token chunking for RAG ingestion pipelines.
//!
//! ```text
//! (text, metadata) ──► doctype::classify ──► config::ChunkingRegistry
//!                                                     │
//!                 splitter::TokenSplitter ◄───────────┘
//!                         │
//!                         ├─► hierarchy::build_small_chunks (small-to-big)
//!                         │
//! context prefix ──► pipeline::DocumentChunker ──► questions::enhance_chunk
//!                         │
//! batches ──► batch::BatchOrchestrator ──► BatchOutcome ──► downstream stores
//! ```
//!
//! The crate turns extracted document text into retrieval-ready chunks:
//! token-bounded spans cut along semantic boundaries with a configurable
//! overlap, optionally arranged in a two-tier small-to-big hierarchy where
//! the small chunk is matched for relevance and its parent supplies the full
//! context. Chunk sizing is selected per document type, every chunk gets a
//! synthesized context prefix, and deterministic hypothetical questions are
//! attached to improve retrieval matching.
//!
//! Extraction, embedding, and vector storage are external collaborators:
//! upstream supplies [`types::SourceDocument`] values, downstream persists
//! the emitted [`types::EmittedChunk`] lists unchanged.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use chunkmill::batch::BatchOrchestrator;
//! use chunkmill::pipeline::DocumentChunker;
//! use chunkmill::types::{MetadataMap, SourceDocument};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), chunkmill::types::ChunkError> {
//! let chunker = DocumentChunker::builder().build()?;
//! let orchestrator = BatchOrchestrator::new(chunker);
//!
//! let mut metadata = MetadataMap::new();
//! metadata.insert("source".into(), json!("800-53_catalog.pdf"));
//! let documents = vec![SourceDocument::new("AC-3: Access Enforcement ...", metadata)];
//!
//! let outcome = orchestrator.chunk_batch(documents, true).await;
//! for failure in &outcome.failures {
//!     eprintln!("{} produced no chunks: {}", failure.source, failure.error);
//! }
//! let chunks = outcome.into_chunks();
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod context;
pub mod doctype;
pub mod hierarchy;
pub mod pipeline;
pub mod questions;
pub mod splitter;
pub mod tokenizer;
pub mod types;

pub use batch::{BatchOrchestrator, BatchOutcome, DocumentFailure};
pub use config::{ChunkingConfig, ChunkingRegistry};
pub use context::build_context_prefix;
pub use doctype::{DocumentFamily, DocumentType, classify};
pub use hierarchy::{ParentChunk, SmallChunk};
pub use pipeline::{DocumentChunker, DocumentChunkerBuilder};
pub use questions::{QuestionGenerator, QuestionVocabulary};
pub use splitter::TokenSplitter;
pub use tokenizer::{DEFAULT_ENCODING, TokenCounter};
pub use types::{ChunkError, EmittedChunk, MetadataMap, SourceDocument};
