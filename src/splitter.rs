//! Recursive token-bounded splitting.
//!
//! The splitter walks a fixed separator ladder from coarse to fine:
//! paragraph breaks, line breaks, sentence punctuation, whitespace, and
//! finally individual graphemes. Text is decomposed into atomic pieces that
//! each fit the token budget (recursing into the next-finer tier when a
//! piece is still too large), then the pieces are greedily merged back into
//! spans, seeding each new span with the trailing pieces of the previous one
//! to form the overlap.
//!
//! The decomposition runs on an explicit worklist of `(unit, tier)` pairs
//! rather than language recursion, so stack depth stays bounded and each
//! tier's backoff is observable on its own. Fragments keep their trailing
//! separator, which makes span assembly a pure concatenation: nothing is
//! dropped at a cut, only trimmed at span edges.

use unicode_segmentation::UnicodeSegmentation;

use crate::tokenizer::TokenCounter;
use crate::types::ChunkError;

/// Separator ladder, coarse to fine. Graphemes form the implicit final tier.
pub const SEPARATORS: [&str; 6] = ["\n\n", "\n", ". ", "! ", "? ", " "];

/// An atomic unit of text together with its token cost.
#[derive(Clone, Debug)]
struct Piece {
    text: String,
    tokens: usize,
}

/// Token-budgeted splitter for one (target, overlap) pair.
#[derive(Clone, Debug)]
pub struct TokenSplitter {
    counter: TokenCounter,
    target: usize,
    overlap: usize,
}

impl TokenSplitter {
    /// Build a splitter, rejecting budgets that cannot make progress.
    pub fn new(counter: TokenCounter, target: usize, overlap: usize) -> Result<Self, ChunkError> {
        if target == 0 {
            return Err(ChunkError::ZeroTarget);
        }
        if overlap >= target {
            return Err(ChunkError::OverlapExceedsTarget { overlap, target });
        }
        Ok(Self {
            counter,
            target,
            overlap,
        })
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split text into ordered spans of at most `target` tokens each (where
    /// structurally achievable), consecutive spans sharing roughly `overlap`
    /// tokens.
    ///
    /// Empty or whitespace-only input yields no spans. Input that already
    /// fits the budget yields exactly one trimmed span with no overlap
    /// applied.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        if self.counter.count(text) <= self.target {
            return vec![text.trim().to_string()];
        }
        let pieces = self.decompose(text);
        self.merge(pieces)
    }

    /// Break text into pieces that each fit the budget, backing off to finer
    /// separators only for units that are still too large.
    fn decompose(&self, text: &str) -> Vec<Piece> {
        let mut pieces = Vec::new();
        // Depth-first, left to right: children are pushed in reverse so the
        // leftmost unit is always processed next.
        let mut worklist: Vec<(String, usize)> = vec![(text.to_string(), 0)];

        while let Some((unit, tier)) = worklist.pop() {
            let tokens = self.counter.count(&unit);
            if tokens <= self.target || tier > SEPARATORS.len() {
                // Fits, or nothing finer than a grapheme exists: emit as-is.
                pieces.push(Piece { text: unit, tokens });
                continue;
            }

            let fragments = split_keeping_separator(&unit, tier);
            if fragments.len() <= 1 {
                // Separator absent at this tier; try the next one down.
                worklist.push((unit, tier + 1));
                continue;
            }
            for fragment in fragments.into_iter().rev() {
                worklist.push((fragment, tier + 1));
            }
        }

        pieces
    }

    /// Greedily accumulate pieces into spans under the token budget.
    fn merge(&self, pieces: Vec<Piece>) -> Vec<String> {
        let mut spans = Vec::new();
        let mut buffer: Vec<Piece> = Vec::new();
        let mut buffered = 0usize;

        for piece in pieces {
            if !buffer.is_empty() && buffered + piece.tokens > self.target {
                if let Some(span) = close_span(&buffer) {
                    spans.push(span);
                }
                let (seed, seed_tokens) = self.overlap_seed(&buffer);
                buffer = seed;
                buffered = seed_tokens;
                // Shed seed pieces from the front when the incoming piece
                // would still overflow the budget.
                while !buffer.is_empty() && buffered + piece.tokens > self.target {
                    let evicted = buffer.remove(0);
                    buffered -= evicted.tokens;
                }
            }
            buffered += piece.tokens;
            buffer.push(piece);
        }

        if let Some(span) = close_span(&buffer) {
            spans.push(span);
        }
        spans
    }

    /// Trailing pieces of the closed span whose summed token count fits the
    /// overlap budget. They seed the next span.
    fn overlap_seed(&self, buffer: &[Piece]) -> (Vec<Piece>, usize) {
        if self.overlap == 0 {
            return (Vec::new(), 0);
        }
        let mut seed: Vec<Piece> = Vec::new();
        let mut tokens = 0usize;
        for piece in buffer.iter().rev() {
            if tokens + piece.tokens > self.overlap {
                break;
            }
            tokens += piece.tokens;
            seed.push(piece.clone());
        }
        seed.reverse();
        (seed, tokens)
    }
}

fn close_span(buffer: &[Piece]) -> Option<String> {
    let text: String = buffer.iter().map(|p| p.text.as_str()).collect();
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Split on the tier's separator, each fragment retaining its trailing
/// separator. The tier past the end of [`SEPARATORS`] splits into graphemes.
fn split_keeping_separator(text: &str, tier: usize) -> Vec<String> {
    if tier >= SEPARATORS.len() {
        return text.graphemes(true).map(str::to_string).collect();
    }
    let separator = SEPARATORS[tier];
    let mut fragments = Vec::new();
    let mut rest = text;
    while let Some(position) = rest.find(separator) {
        let end = position + separator.len();
        fragments.push(rest[..end].to_string());
        rest = &rest[end..];
    }
    if !rest.is_empty() {
        fragments.push(rest.to_string());
    }
    fragments
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn counter() -> TokenCounter {
        TokenCounter::cl100k().expect("vocabulary loads")
    }

    fn strip_whitespace(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn rejects_stalled_budgets() {
        assert!(matches!(
            TokenSplitter::new(counter(), 0, 0),
            Err(ChunkError::ZeroTarget)
        ));
        assert!(matches!(
            TokenSplitter::new(counter(), 100, 100),
            Err(ChunkError::OverlapExceedsTarget { .. })
        ));
    }

    #[test]
    fn empty_text_yields_no_spans() {
        let splitter = TokenSplitter::new(counter(), 64, 8).unwrap();
        assert!(splitter.split("").is_empty());
        assert!(splitter.split("   \n\n  ").is_empty());
    }

    #[test]
    fn small_text_yields_one_trimmed_span() {
        let splitter = TokenSplitter::new(counter(), 64, 8).unwrap();
        let spans = splitter.split("  one small paragraph of text  ");
        assert_eq!(spans, vec!["one small paragraph of text".to_string()]);
    }

    #[test]
    fn spans_respect_the_token_budget() {
        let c = counter();
        let text = (0..40)
            .map(|i| format!("Sentence number {i} talks about network segmentation policy. "))
            .collect::<String>();
        let splitter = TokenSplitter::new(c.clone(), 64, 12).unwrap();
        let spans = splitter.split(&text);
        assert!(spans.len() > 1);
        for span in &spans {
            assert!(
                c.count(span) <= 64,
                "span exceeded budget: {} tokens",
                c.count(span)
            );
        }
    }

    #[test]
    fn paragraph_boundaries_are_preferred() {
        let c = counter();
        let paragraph = "Alpha beta gamma delta epsilon zeta eta theta.";
        let text = format!("{paragraph}\n\n{paragraph}\n\n{paragraph}");
        let budget = c.count(paragraph) + 2;
        let splitter = TokenSplitter::new(c, budget, 0).unwrap();
        let spans = splitter.split(&text);
        assert_eq!(spans.len(), 3);
        for span in &spans {
            assert_eq!(span.trim(), paragraph);
        }
    }

    #[test]
    fn consecutive_spans_share_an_overlap() {
        let c = counter();
        let text = (0..60)
            .map(|i| format!("Requirement {i} covers boundary protection and access control enforcement. "))
            .collect::<String>();
        let splitter = TokenSplitter::new(c, 80, 20).unwrap();
        let spans = splitter.split(&text);
        assert!(spans.len() >= 2);
        for pair in spans.windows(2) {
            // The next span starts with trailing sentences of the previous one.
            let head: String = pair[1].chars().take(30).collect();
            assert!(
                pair[0].contains(head.trim_end()),
                "no overlap between consecutive spans"
            );
        }
    }

    #[test]
    fn unbroken_text_falls_back_to_fine_tiers() {
        let c = counter();
        // No separators at all: a single long token run.
        let text = "x".repeat(2000);
        let splitter = TokenSplitter::new(c.clone(), 32, 0).unwrap();
        let spans = splitter.split(&text);
        assert!(spans.len() > 1);
        for span in &spans {
            assert!(c.count(span) <= 32);
        }
        assert_eq!(strip_whitespace(&spans.concat()), text);
    }

    #[test]
    fn reconstruction_loses_nothing_without_overlap() {
        let c = counter();
        let text = "First paragraph here.\n\nSecond paragraph follows. It has two sentences.\n\nThird one closes the document.";
        let splitter = TokenSplitter::new(c, 12, 0).unwrap();
        let spans = splitter.split(text);
        assert_eq!(
            strip_whitespace(&spans.concat()),
            strip_whitespace(text)
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_spans_cover_input_without_overlap(
            words in proptest::collection::vec("[a-zA-Z]{1,10}", 1..120),
            target in 4usize..48,
        ) {
            let text = words.join(" ");
            let c = counter();
            let splitter = TokenSplitter::new(c, target, 0).unwrap();
            let spans = splitter.split(&text);
            prop_assert_eq!(
                strip_whitespace(&spans.concat()),
                strip_whitespace(&text)
            );
        }
    }
}
