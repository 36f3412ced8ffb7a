//! Batch orchestration with bounded parallelism and failure isolation.
//!
//! Documents fan out across a worker pool sized to the smaller of the batch
//! and the host's available parallelism. Each document runs the full
//! pipeline independently; one document's failure (including a worker panic)
//! is recovered at this boundary, logged, and reported in the outcome — it
//! never aborts sibling documents, and the batch call itself never fails.
//!
//! Cross-document ordering of the flattened chunk list is not guaranteed
//! under parallel execution; `chunk_index` ordering within each document is
//! always correct.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

use crate::pipeline::DocumentChunker;
use crate::types::{ChunkError, EmittedChunk, SourceDocument};

/// One document that produced no chunks because its pipeline failed.
#[derive(Clone, Debug)]
pub struct DocumentFailure {
    /// The `source` filename from the document's metadata.
    pub source: String,
    pub error: ChunkError,
}

/// Result of a batch run: the flattened chunk list plus an explicit record
/// of every document whose pipeline failed.
#[derive(Clone, Debug, Default)]
pub struct BatchOutcome {
    pub chunks: Vec<EmittedChunk>,
    pub failures: Vec<DocumentFailure>,
}

impl BatchOutcome {
    /// Number of chunks across all successful documents.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// `true` when every document's pipeline succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Consume the outcome, keeping only the flattened chunk list.
    pub fn into_chunks(self) -> Vec<EmittedChunk> {
        self.chunks
    }
}

/// Fans document batches across the per-document pipeline.
#[derive(Clone, Debug)]
pub struct BatchOrchestrator {
    chunker: Arc<DocumentChunker>,
}

impl BatchOrchestrator {
    pub fn new(chunker: DocumentChunker) -> Self {
        Self {
            chunker: Arc::new(chunker),
        }
    }

    /// Share an existing chunker across orchestrators.
    pub fn from_arc(chunker: Arc<DocumentChunker>) -> Self {
        Self { chunker }
    }

    /// Chunk a batch of documents.
    ///
    /// Zero documents yield an empty outcome; a single document runs
    /// synchronously; larger batches fan out across a bounded worker pool
    /// when `parallel` is set.
    pub async fn chunk_batch(
        &self,
        documents: Vec<SourceDocument>,
        parallel: bool,
    ) -> BatchOutcome {
        if documents.is_empty() {
            return BatchOutcome::default();
        }
        if documents.len() == 1 || !parallel {
            return self.chunk_sequential(documents);
        }
        self.chunk_parallel(documents).await
    }

    fn chunk_sequential(&self, documents: Vec<SourceDocument>) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for document in documents {
            match self.chunker.chunk_document(&document) {
                Ok(chunks) => outcome.chunks.extend(chunks),
                Err(error) => record_failure(&mut outcome, document.source().to_string(), error),
            }
        }
        outcome
    }

    async fn chunk_parallel(&self, documents: Vec<SourceDocument>) -> BatchOutcome {
        let workers = documents.len().min(available_parallelism());
        let semaphore = Arc::new(Semaphore::new(workers));
        let mut tasks: JoinSet<(String, Result<Vec<EmittedChunk>, ChunkError>)> = JoinSet::new();

        for document in documents {
            let chunker = Arc::clone(&self.chunker);
            let semaphore = Arc::clone(&semaphore);
            let source = document.source().to_string();
            tasks.spawn(async move {
                // Semaphore is never closed; acquire fails only on close.
                let _permit = semaphore.acquire_owned().await.ok();
                let result = tokio::task::spawn_blocking(move || chunker.chunk_document(&document))
                    .await
                    .unwrap_or_else(|join_error| Err(ChunkError::Worker(join_error.to_string())));
                (source, result)
            });
        }

        // Collection barrier: completion order, not submission order.
        let mut outcome = BatchOutcome::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(chunks))) => outcome.chunks.extend(chunks),
                Ok((source, Err(error))) => record_failure(&mut outcome, source, error),
                Err(join_error) => record_failure(
                    &mut outcome,
                    String::new(),
                    ChunkError::Worker(join_error.to_string()),
                ),
            }
        }
        outcome
    }
}

fn record_failure(outcome: &mut BatchOutcome, source: String, error: ChunkError) {
    warn!(
        source,
        %error,
        "document pipeline failed; emitting no chunks for this document"
    );
    outcome.failures.push(DocumentFailure { source, error });
}

fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
