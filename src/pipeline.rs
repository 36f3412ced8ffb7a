//! Per-document chunking pipeline.
//!
//! One document flows strictly sequentially through classify → configure →
//! split → hierarchy → prefix → enhance, emitting an ordered chunk list with
//! contiguous `chunk_index` values. The pipeline performs no I/O; its only
//! external dependency is the token vocabulary held by the injected
//! [`TokenCounter`].

use serde_json::json;
use tracing::debug;

use crate::config::ChunkingRegistry;
use crate::context::{build_context_prefix, prepend_prefix};
use crate::doctype::{DocumentType, classify};
use crate::hierarchy::{build_small_chunks, split_parents};
use crate::questions::{QuestionGenerator, QuestionVocabulary, enhance_chunk};
use crate::splitter::TokenSplitter;
use crate::tokenizer::TokenCounter;
use crate::types::{ChunkError, EmittedChunk, MetadataMap, SourceDocument};

/// Document-aware chunker: the full single-document pipeline.
///
/// Construct one via [`DocumentChunker::builder`] and share it across a
/// batch; it is cheap to clone and holds no mutable state.
///
/// # Examples
///
/// ```rust,no_run
/// use chunkmill::pipeline::DocumentChunker;
/// use chunkmill::types::{MetadataMap, SourceDocument};
/// use serde_json::json;
///
/// let chunker = DocumentChunker::builder().build()?;
/// let mut metadata = MetadataMap::new();
/// metadata.insert("source".into(), json!("800-53_catalog.pdf"));
/// let chunks = chunker.chunk_document(&SourceDocument::new("control text", metadata))?;
/// # Ok::<(), chunkmill::types::ChunkError>(())
/// ```
#[derive(Clone, Debug)]
pub struct DocumentChunker {
    counter: TokenCounter,
    registry: ChunkingRegistry,
    questions: QuestionGenerator,
    hierarchy_enabled: bool,
    questions_enabled: bool,
}

impl DocumentChunker {
    /// Create a new builder.
    pub fn builder() -> DocumentChunkerBuilder {
        DocumentChunkerBuilder::default()
    }

    pub fn token_counter(&self) -> &TokenCounter {
        &self.counter
    }

    /// Run the full pipeline for one document.
    ///
    /// Whitespace-only documents emit no chunks. The returned chunks carry
    /// contiguous 0-based `chunk_index` values in document order.
    pub fn chunk_document(&self, document: &SourceDocument) -> Result<Vec<EmittedChunk>, ChunkError> {
        let source = document.source();
        let doc_type = classify(source, &document.metadata);
        let config = self.registry.config_for(doc_type);
        config.validate()?;

        if document.text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let prefix = build_context_prefix(&document.metadata, doc_type);
        let mut base = document.metadata.clone();
        base.insert("document_type".to_string(), json!(doc_type.tag()));
        if !prefix.is_empty() {
            base.insert("context_prefix".to_string(), json!(prefix.clone()));
        }

        let total_tokens = self.counter.count(&document.text);

        // Short atomic units (e.g. a single control) stay whole.
        if config.suppress_split_if_fits && total_tokens <= config.target_tokens {
            let mut metadata = base.clone();
            metadata.insert("chunk_index".to_string(), json!(0));
            metadata.insert("is_small_chunk".to_string(), json!(false));
            metadata.insert("token_count".to_string(), json!(total_tokens));
            let chunk = EmittedChunk::new(prepend_prefix(&prefix, &document.text), metadata);
            return Ok(self.maybe_enhance(vec![chunk], doc_type));
        }

        let splitter =
            TokenSplitter::new(self.counter.clone(), config.target_tokens, config.overlap_tokens)?;
        let parents = split_parents(&splitter, &self.counter, &document.text);

        let mut chunks = Vec::new();
        if self.hierarchy_enabled && config.hierarchy_enabled && parents.len() > 1 {
            let small_chunks =
                build_small_chunks(&self.counter, &parents, config.small_target_tokens)?;
            for small in small_chunks {
                let mut metadata = base.clone();
                metadata.insert("chunk_index".to_string(), json!(chunks.len()));
                metadata.insert(
                    "parent_chunk_id".to_string(),
                    json!(format!("parent_{}", small.parent_index)),
                );
                metadata.insert("parent_chunk_index".to_string(), json!(small.parent_index));
                metadata.insert("small_chunk_index".to_string(), json!(small.local_index));
                metadata.insert("is_small_chunk".to_string(), json!(true));
                metadata.insert("token_count".to_string(), json!(small.token_count));
                metadata.insert("parent_token_count".to_string(), json!(small.parent_token_count));
                metadata.insert("parent_text".to_string(), json!(small.parent_text));
                chunks.push(EmittedChunk::new(prepend_prefix(&prefix, &small.text), metadata));
            }
        } else {
            for parent in parents {
                let mut metadata = base.clone();
                metadata.insert("chunk_index".to_string(), json!(parent.index));
                metadata.insert("is_small_chunk".to_string(), json!(false));
                metadata.insert("token_count".to_string(), json!(parent.token_count));
                chunks.push(EmittedChunk::new(prepend_prefix(&prefix, &parent.text), metadata));
            }
        }

        debug!(
            source,
            document_type = %doc_type,
            chunk_count = chunks.len(),
            total_tokens,
            "document chunked"
        );

        Ok(self.maybe_enhance(chunks, doc_type))
    }

    fn maybe_enhance(&self, chunks: Vec<EmittedChunk>, doc_type: DocumentType) -> Vec<EmittedChunk> {
        if !self.questions_enabled {
            return chunks;
        }
        chunks
            .into_iter()
            .map(|chunk| enhance_chunk(&self.questions, chunk, doc_type))
            .collect()
    }
}

/// Builder for [`DocumentChunker`].
#[derive(Debug, Default)]
pub struct DocumentChunkerBuilder {
    counter: Option<TokenCounter>,
    registry: Option<ChunkingRegistry>,
    vocabulary: Option<QuestionVocabulary>,
    hierarchy_enabled: Option<bool>,
    questions_enabled: Option<bool>,
}

impl DocumentChunkerBuilder {
    /// Inject a token counter. Defaults to the cached `cl100k_base` counter.
    #[must_use]
    pub fn token_counter(mut self, counter: TokenCounter) -> Self {
        self.counter = Some(counter);
        self
    }

    /// Use a custom configuration registry.
    #[must_use]
    pub fn registry(mut self, registry: ChunkingRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Use a custom question term vocabulary.
    #[must_use]
    pub fn question_vocabulary(mut self, vocabulary: QuestionVocabulary) -> Self {
        self.vocabulary = Some(vocabulary);
        self
    }

    /// Enable or disable the small-to-big hierarchy. Defaults to `true`.
    #[must_use]
    pub fn hierarchy(mut self, enabled: bool) -> Self {
        self.hierarchy_enabled = Some(enabled);
        self
    }

    /// Enable or disable hypothetical question metadata. Defaults to `true`.
    #[must_use]
    pub fn questions(mut self, enabled: bool) -> Self {
        self.questions_enabled = Some(enabled);
        self
    }

    /// Build the chunker, loading the default vocabulary when no counter was
    /// injected.
    pub fn build(self) -> Result<DocumentChunker, ChunkError> {
        let counter = match self.counter {
            Some(counter) => counter,
            None => TokenCounter::cl100k()?,
        };
        Ok(DocumentChunker {
            counter,
            registry: self.registry.unwrap_or_default(),
            questions: QuestionGenerator::new(self.vocabulary.unwrap_or_default()),
            hierarchy_enabled: self.hierarchy_enabled.unwrap_or(true),
            questions_enabled: self.questions_enabled.unwrap_or(true),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chunker() -> DocumentChunker {
        DocumentChunker::builder().build().expect("chunker builds")
    }

    fn doc(source: &str, text: &str) -> SourceDocument {
        let mut metadata = MetadataMap::new();
        metadata.insert("source".into(), json!(source));
        SourceDocument::new(text, metadata)
    }

    fn long_text(sentences: usize) -> String {
        (0..sentences)
            .map(|i| {
                format!("Paragraph {i} describes the enforcement of access control policy across all organizational systems and interconnected services. ")
            })
            .collect()
    }

    #[test]
    fn whitespace_document_emits_nothing() {
        let chunks = chunker().chunk_document(&doc("notes.md", "   \n ")).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn small_control_stays_whole_under_suppress_split() {
        let document = doc("800-53_catalog.pdf", "AC-1 requires an access control policy.");
        let chunks = chunker().chunk_document(&document).unwrap();
        assert_eq!(chunks.len(), 1);
        let chunk = &chunks[0];
        assert_eq!(chunk.chunk_index(), Some(0));
        assert!(!chunk.is_small_chunk());
        assert_eq!(chunk.metadata["document_type"], json!("800-53_catalog"));
        assert!(chunk.text.starts_with("NIST SP 800-53 Rev. 5 Control Catalog\n\n"));
    }

    #[test]
    fn chunk_indexes_are_contiguous() {
        let document = doc("segmentation_guide.md", &long_text(120));
        let chunks = chunker().chunk_document(&document).unwrap();
        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index(), Some(i));
        }
    }

    #[test]
    fn hierarchy_small_chunks_carry_parent_backreferences() {
        let document = doc("segmentation_guide.md", &long_text(120));
        let chunks = chunker().chunk_document(&document).unwrap();
        assert!(chunks.iter().all(EmittedChunk::is_small_chunk));
        let first = &chunks[0];
        assert_eq!(first.metadata["parent_chunk_id"], json!("parent_0"));
        assert_eq!(first.metadata["parent_chunk_index"], json!(0));
        assert_eq!(first.metadata["small_chunk_index"], json!(0));
        let parent_text = first.metadata["parent_text"].as_str().unwrap();
        // The prefix lives only on the small chunk's own text.
        assert!(!parent_text.contains("Network Segmentation Strategies"));
        assert!(first.text.contains("Network Segmentation Strategies"));
    }

    #[test]
    fn hierarchy_disabled_emits_parents_directly() {
        let chunker = DocumentChunker::builder().hierarchy(false).build().unwrap();
        let document = doc("segmentation_guide.md", &long_text(120));
        let chunks = chunker.chunk_document(&document).unwrap();
        assert!(chunks.iter().all(|c| !c.is_small_chunk()));
        assert!(chunks.iter().all(|c| !c.metadata.contains_key("parent_text")));
    }

    #[test]
    fn questions_disabled_leaves_metadata_unenhanced() {
        let chunker = DocumentChunker::builder().questions(false).build().unwrap();
        let document = doc("800-171.pdf", "The requirement must be satisfied.");
        let chunks = chunker.chunk_document(&document).unwrap();
        assert!(chunks.iter().all(|c| !c.metadata.contains_key("hypothetical_questions")));
    }

    #[test]
    fn invalid_override_fails_the_document() {
        use crate::config::{ChunkingConfig, ChunkingRegistry};
        use crate::doctype::DocumentType;

        let registry = ChunkingRegistry::new().with_override(
            DocumentType::QueryPatterns,
            ChunkingConfig {
                target_tokens: 100,
                overlap_tokens: 150,
                hierarchy_enabled: false,
                small_target_tokens: 64,
                suppress_split_if_fits: false,
            },
        );
        let chunker = DocumentChunker::builder().registry(registry).build().unwrap();
        let err = chunker
            .chunk_document(&doc("query_patterns.csv", "Is this valid?"))
            .unwrap_err();
        assert!(matches!(err, ChunkError::OverlapExceedsTarget { .. }));
    }
}
