//! Per-document-type chunk sizing.
//!
//! Each document type carries hand-tuned target/overlap/small-chunk budgets:
//! control catalogs use narrower windows than narrative guides, query
//! patterns skip the hierarchy entirely. The registry always resolves — the
//! built-in table covers every [`DocumentType`] — and accepts per-tag
//! overrides as plain data.

use serde::{Deserialize, Serialize};
use rustc_hash::FxHashMap;

use crate::doctype::DocumentType;
use crate::types::ChunkError;

/// Floor for the adaptive small-chunk overlap, in tokens.
const MIN_SMALL_OVERLAP: usize = 20;

/// Chunk sizing for one document type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Token budget for parent chunks.
    pub target_tokens: usize,
    /// Tokens shared between consecutive parent chunks.
    pub overlap_tokens: usize,
    /// Whether to build the small-to-big hierarchy.
    pub hierarchy_enabled: bool,
    /// Token budget for small chunks when the hierarchy is built.
    pub small_target_tokens: usize,
    /// Emit the whole text as a single chunk when it already fits the
    /// target. Used for short atomic units such as a single control.
    pub suppress_split_if_fits: bool,
}

impl ChunkingConfig {
    /// Reject budgets the splitter cannot make progress with.
    pub fn validate(&self) -> Result<(), ChunkError> {
        if self.target_tokens == 0 {
            return Err(ChunkError::ZeroTarget);
        }
        if self.overlap_tokens >= self.target_tokens {
            return Err(ChunkError::OverlapExceedsTarget {
                overlap: self.overlap_tokens,
                target: self.target_tokens,
            });
        }
        Ok(())
    }

    /// Adaptive overlap for the small tier: 20% of the small budget with a
    /// 20-token floor, capped at half the budget.
    pub fn small_overlap_tokens(&self) -> usize {
        adaptive_overlap(self.small_target_tokens)
    }
}

/// Overlap sized proportionally to a chunk budget.
pub fn adaptive_overlap(target_tokens: usize) -> usize {
    let overlap = MIN_SMALL_OVERLAP.max((target_tokens as f64 * 0.2).round() as usize);
    overlap.min(target_tokens / 2)
}

fn builtin(tag: DocumentType) -> ChunkingConfig {
    match tag {
        DocumentType::Sp80053Catalog
        | DocumentType::Sp80053Xml
        | DocumentType::Sp80053aAssessment
        | DocumentType::Sp800171
        | DocumentType::Fedramp => ChunkingConfig {
            target_tokens: 384,
            overlap_tokens: 77,
            hierarchy_enabled: true,
            small_target_tokens: 256,
            suppress_split_if_fits: true,
        },
        DocumentType::Cmmc => ChunkingConfig {
            target_tokens: 384,
            overlap_tokens: 77,
            hierarchy_enabled: true,
            small_target_tokens: 256,
            suppress_split_if_fits: false,
        },
        DocumentType::Sp80037Rmf | DocumentType::Csf2 => ChunkingConfig {
            target_tokens: 400,
            overlap_tokens: 80,
            hierarchy_enabled: true,
            small_target_tokens: 256,
            suppress_split_if_fits: false,
        },
        DocumentType::DodSrg => ChunkingConfig {
            target_tokens: 450,
            overlap_tokens: 90,
            hierarchy_enabled: true,
            small_target_tokens: 300,
            suppress_split_if_fits: false,
        },
        DocumentType::SecurityPattern
        | DocumentType::PositioningGuide
        | DocumentType::ZoneGuide
        | DocumentType::GroupingGuide
        | DocumentType::SegmentationGuide => ChunkingConfig {
            target_tokens: 450,
            overlap_tokens: 90,
            hierarchy_enabled: true,
            small_target_tokens: 300,
            suppress_split_if_fits: false,
        },
        DocumentType::QueryPatterns => ChunkingConfig {
            target_tokens: 300,
            overlap_tokens: 60,
            hierarchy_enabled: false,
            small_target_tokens: 256,
            suppress_split_if_fits: false,
        },
        DocumentType::Default => ChunkingConfig {
            target_tokens: 512,
            overlap_tokens: 102,
            hierarchy_enabled: true,
            small_target_tokens: 256,
            suppress_split_if_fits: false,
        },
    }
}

/// Total mapping from document type to chunk sizing.
///
/// Overrides are stored as given; the pipeline validates a config right
/// before splitting, so an invalid override surfaces as that document's
/// failure rather than a panic or a silently clamped value.
#[derive(Clone, Debug, Default)]
pub struct ChunkingRegistry {
    overrides: FxHashMap<DocumentType, ChunkingConfig>,
}

impl ChunkingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the built-in sizing for one tag.
    #[must_use]
    pub fn with_override(mut self, tag: DocumentType, config: ChunkingConfig) -> Self {
        self.overrides.insert(tag, config);
        self
    }

    /// Resolve the sizing for a tag. Never fails; every tag has a built-in
    /// entry.
    pub fn config_for(&self, tag: DocumentType) -> ChunkingConfig {
        self.overrides.get(&tag).copied().unwrap_or_else(|| builtin(tag))
    }
}
