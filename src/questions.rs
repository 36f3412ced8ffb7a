//! Hypothetical question metadata.
//!
//! Each chunk gets up to three synthetic questions that a user plausibly
//! answers with this chunk; embedding them alongside the content improves
//! retrieval matching for question-shaped queries. Generation is rule-based
//! and deterministic — the same chunk and tag always yield the same list —
//! keyed by the closed [`DocumentFamily`] so every type has exactly one
//! strategy.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::doctype::{DocumentFamily, DocumentType};
use crate::types::{EmittedChunk, MetadataMap};

/// Cap on questions attached to one chunk.
pub const MAX_QUESTIONS: usize = 3;

static CAPITALIZED_PHRASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)+\b").expect("valid regex"));
static ACRONYM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z]{2,6}\b").expect("valid regex"));

/// Architecture/security terms recognized in pattern and guide documents.
///
/// Externally overridable data: replace the list to tune question generation
/// for a different corpus.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuestionVocabulary {
    pub pattern_terms: Vec<String>,
}

impl Default for QuestionVocabulary {
    fn default() -> Self {
        Self {
            pattern_terms: [
                "zero trust",
                "dmz",
                "defense in depth",
                "segmentation",
                "micro-segmentation",
                "network isolation",
                "perimeter security",
                "firewall",
                "intrusion detection",
                "intrusion prevention",
                "load balancer",
                "proxy",
                "gateway",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
        }
    }
}

/// Rule-based question generator.
#[derive(Clone, Debug, Default)]
pub struct QuestionGenerator {
    vocabulary: QuestionVocabulary,
}

impl QuestionGenerator {
    pub fn new(vocabulary: QuestionVocabulary) -> Self {
        Self { vocabulary }
    }

    /// Generate up to [`MAX_QUESTIONS`] deduplicated questions for a chunk.
    pub fn generate(
        &self,
        text: &str,
        metadata: &MetadataMap,
        doc_type: DocumentType,
    ) -> Vec<String> {
        let raw = match doc_type.family() {
            DocumentFamily::Control => control_questions(text, metadata),
            DocumentFamily::PatternGuide => self.pattern_questions(text, doc_type),
            DocumentFamily::Framework => framework_questions(metadata, doc_type),
            DocumentFamily::QueryPattern => query_pattern_questions(text),
            DocumentFamily::Generic => generic_questions(text, metadata),
        };
        dedup_capped(raw)
    }

    fn pattern_questions(&self, text: &str, doc_type: DocumentType) -> Vec<String> {
        let mut questions = Vec::new();
        let lowered = text.to_lowercase();

        match doc_type {
            DocumentType::SecurityPattern => {
                let keywords = self.key_terms(text);
                for keyword in keywords.iter().take(2) {
                    questions.push(format!("How do I implement {keyword}?"));
                    questions.push(format!("What are the best practices for {keyword}?"));
                }
                questions.push("What security patterns should I use?".to_string());
                if lowered.contains("zero trust") {
                    questions.push("How do I implement zero trust architecture?".to_string());
                }
                if lowered.contains("dmz") {
                    questions.push("How should I configure my DMZ?".to_string());
                }
            }
            DocumentType::PositioningGuide => {
                questions.push("Where should I position security devices?".to_string());
                questions.push("What are the best practices for device placement?".to_string());
            }
            DocumentType::ZoneGuide => {
                questions.push("How should I segment network zones?".to_string());
                questions.push("What are the security zone requirements?".to_string());
            }
            DocumentType::GroupingGuide => {
                questions.push("How should I group devices?".to_string());
                questions.push("What are device grouping best practices?".to_string());
            }
            DocumentType::SegmentationGuide => {
                questions.push("How do I segment my network?".to_string());
                questions.push("What are network segmentation strategies?".to_string());
            }
            _ => {}
        }
        questions
    }

    /// Vocabulary terms found in the text, then capitalized phrases, then
    /// acronyms; at most five.
    fn key_terms(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let mut terms: Vec<String> = self
            .vocabulary
            .pattern_terms
            .iter()
            .filter(|term| lowered.contains(term.as_str()))
            .cloned()
            .collect();
        terms.extend(extracted_terms(text));
        terms.truncate(5);
        terms
    }
}

fn metadata_str<'a>(metadata: &'a MetadataMap, key: &str) -> Option<&'a str> {
    metadata
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn control_questions(text: &str, metadata: &MetadataMap) -> Vec<String> {
    let mut questions = Vec::new();
    let control_id = metadata_str(metadata, "control_id");
    let lowered = text.to_lowercase();

    if let Some(id) = control_id {
        questions.push(format!("What is the purpose of control {id}?"));
        questions.push(format!("What are the requirements for {id}?"));

        if let Some(name) = metadata_str(metadata, "control_name") {
            questions.push(format!("How do I implement {name}?"));
            questions.push(format!("What does {name} require?"));
        }
        if let Some(enhancement) = metadata_str(metadata, "enhancement_number") {
            questions.push(format!("What does enhancement {enhancement} of {id} add?"));
        }
        if metadata_str(metadata, "source")
            .is_some_and(|source| source.to_lowercase().contains("assessment"))
        {
            questions.push(format!("How do you assess {id}?"));
            questions.push(format!("What are the assessment procedures for {id}?"));
        }
    }

    if let Some(family) = metadata_str(metadata, "family") {
        questions.push(format!("What are the {family} family requirements?"));
    }

    if lowered.contains("baseline") {
        let subject = control_id.unwrap_or("this control");
        questions.push(format!("What baseline applies to {subject}?"));
    }
    if ["shall", "must", "required"].iter().any(|w| lowered.contains(w)) {
        let subject = control_id.unwrap_or("this");
        questions.push(format!("What are the mandatory requirements for {subject}?"));
    }

    questions
}

fn framework_questions(metadata: &MetadataMap, doc_type: DocumentType) -> Vec<String> {
    let mut questions = Vec::new();
    match doc_type {
        DocumentType::Sp80037Rmf => {
            if let Some(task) = metadata_str(metadata, "task_id") {
                questions.push(format!("What is task {task} in the RMF?"));
                questions.push(format!("How do I complete task {task}?"));
            }
            if let Some(step) = metadata_str(metadata, "step") {
                questions.push(format!("What are the requirements for RMF step {step}?"));
            }
            questions.push("What are the RMF steps?".to_string());
            questions.push("How do I implement the Risk Management Framework?".to_string());
        }
        DocumentType::Csf2 => {
            if let Some(function) = metadata_str(metadata, "function") {
                questions.push(format!("What is the {function} function in the CSF?"));
            }
            if let Some(category) = metadata_str(metadata, "category") {
                questions.push(format!("What are the {category} requirements?"));
            }
            questions.push("What are the Cybersecurity Framework requirements?".to_string());
        }
        _ => {}
    }
    questions
}

fn query_pattern_questions(text: &str) -> Vec<String> {
    if text.contains('?') {
        // The source is already question-shaped: reuse it verbatim.
        return text
            .split('?')
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("{q}?"))
            .take(MAX_QUESTIONS)
            .collect();
    }
    vec![
        "What are common questions about compliance?".to_string(),
        "What should I ask about security requirements?".to_string(),
    ]
}

fn generic_questions(text: &str, metadata: &MetadataMap) -> Vec<String> {
    let mut questions = Vec::new();
    let lowered = text.to_lowercase();

    let terms = extracted_terms(text);
    if let Some(primary) = terms.first() {
        questions.push(format!("What is {primary}?"));
        questions.push(format!("How does {primary} work?"));
        questions.push(format!("What are the requirements for {primary}?"));
    }

    if ["requirement", "must", "shall"].iter().any(|w| lowered.contains(w)) {
        questions.push("What are the requirements?".to_string());
    }
    if ["implement", "deploy", "configure"].iter().any(|w| lowered.contains(w)) {
        questions.push("How do I implement this?".to_string());
    }
    if lowered.contains("assess") || lowered.contains("evaluate") {
        questions.push("How do I assess this?".to_string());
    }
    if let Some(section) = metadata_str(metadata, "section_heading") {
        questions.push(format!("What is covered in {section}?"));
    }

    questions
}

/// Capitalized multi-word phrases followed by acronyms, three of each at most.
fn extracted_terms(text: &str) -> Vec<String> {
    let mut terms: Vec<String> = CAPITALIZED_PHRASE
        .find_iter(text)
        .take(3)
        .map(|m| m.as_str().to_string())
        .collect();
    terms.extend(ACRONYM.find_iter(text).take(3).map(|m| m.as_str().to_string()));
    terms
}

/// First occurrence wins; at most [`MAX_QUESTIONS`] survive.
fn dedup_capped(raw: Vec<String>) -> Vec<String> {
    let mut questions: Vec<String> = Vec::with_capacity(MAX_QUESTIONS);
    for question in raw {
        if !questions.contains(&question) {
            questions.push(question);
            if questions.len() == MAX_QUESTIONS {
                break;
            }
        }
    }
    questions
}

/// Append question metadata to a chunk.
///
/// Existing fields are never altered; chunks that yield no questions pass
/// through untouched.
pub fn enhance_chunk(
    generator: &QuestionGenerator,
    mut chunk: EmittedChunk,
    doc_type: DocumentType,
) -> EmittedChunk {
    let questions = generator.generate(&chunk.text, &chunk.metadata, doc_type);
    if questions.is_empty() {
        return chunk;
    }
    chunk
        .metadata
        .insert("question_count".to_string(), json!(questions.len()));
    chunk
        .metadata
        .insert("questions_text".to_string(), json!(questions.join(" ")));
    chunk
        .metadata
        .insert("hypothetical_questions".to_string(), json!(questions));
    chunk
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(pairs: &[(&str, &str)]) -> MetadataMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), json!(v)))
            .collect()
    }

    #[test]
    fn control_questions_reference_id_and_name() {
        let generator = QuestionGenerator::default();
        let metadata = meta(&[
            ("control_id", "AC-3"),
            ("control_name", "Access Enforcement"),
            ("family", "AC"),
        ]);
        let questions = generator.generate(
            "The system shall enforce approved authorizations.",
            &metadata,
            DocumentType::Sp80053Catalog,
        );
        assert!(questions.len() <= MAX_QUESTIONS);
        assert!(questions.iter().any(|q| q.contains("AC-3")));
        assert!(questions.iter().any(|q| q.contains("Access Enforcement")));
        let mut deduped = questions.clone();
        deduped.dedup();
        assert_eq!(deduped, questions);
    }

    #[test]
    fn assessment_sources_get_assessment_phrasing() {
        let generator = QuestionGenerator::default();
        let metadata = meta(&[
            ("control_id", "CA-2"),
            ("source", "800-53a_assessment.pdf"),
        ]);
        // With no control_name, the assessment templates fit under the cap.
        let questions = generator.generate("Examine records.", &metadata, DocumentType::Sp80053aAssessment);
        assert!(questions.iter().any(|q| q.contains("assess CA-2")));
    }

    #[test]
    fn pattern_guides_use_the_term_vocabulary() {
        let generator = QuestionGenerator::default();
        let questions = generator.generate(
            "Place a firewall at the perimeter and require zero trust verification.",
            &MetadataMap::new(),
            DocumentType::SecurityPattern,
        );
        assert!(questions.iter().any(|q| q.contains("zero trust") || q.contains("firewall")));
        assert!(questions.len() <= MAX_QUESTIONS);
    }

    #[test]
    fn query_patterns_reuse_existing_questions_verbatim() {
        let generator = QuestionGenerator::default();
        let text = "What controls apply to email? How do I encrypt data at rest? Is MFA required? Do I need logging?";
        let questions = generator.generate(text, &MetadataMap::new(), DocumentType::QueryPatterns);
        assert_eq!(
            questions,
            vec![
                "What controls apply to email?".to_string(),
                "How do I encrypt data at rest?".to_string(),
                "Is MFA required?".to_string(),
            ]
        );
    }

    #[test]
    fn generic_questions_come_from_key_terms_and_keywords() {
        let generator = QuestionGenerator::default();
        let questions = generator.generate(
            "Continuous Monitoring must be configured for all systems.",
            &MetadataMap::new(),
            DocumentType::Default,
        );
        assert!(questions.iter().any(|q| q.contains("Continuous Monitoring")));
        assert!(questions.len() <= MAX_QUESTIONS);
    }

    #[test]
    fn generation_is_deterministic() {
        let generator = QuestionGenerator::default();
        let metadata = meta(&[("control_id", "SC-7")]);
        let text = "Boundary protection shall be employed.";
        let first = generator.generate(text, &metadata, DocumentType::Sp800171);
        let second = generator.generate(text, &metadata, DocumentType::Sp800171);
        assert_eq!(first, second);
    }

    #[test]
    fn enhancement_appends_without_altering_existing_fields() {
        let generator = QuestionGenerator::default();
        let mut metadata = meta(&[("control_id", "AU-2")]);
        metadata.insert("chunk_index".into(), json!(0));
        let chunk = EmittedChunk::new("Audit events shall be defined.", metadata.clone());
        let enhanced = enhance_chunk(&generator, chunk, DocumentType::Sp80053Catalog);
        assert_eq!(enhanced.metadata.get("chunk_index"), Some(&json!(0)));
        assert_eq!(enhanced.metadata.get("control_id"), metadata.get("control_id"));
        let count = enhanced.metadata["question_count"].as_u64().unwrap() as usize;
        let list = enhanced.metadata["hypothetical_questions"].as_array().unwrap();
        assert_eq!(count, list.len());
        assert!(count <= MAX_QUESTIONS);
        assert!(enhanced.metadata.contains_key("questions_text"));
    }

    #[test]
    fn chunks_without_questions_pass_through() {
        let generator = QuestionGenerator::default();
        let chunk = EmittedChunk::new("lowercase text with no triggers", MetadataMap::new());
        let enhanced = enhance_chunk(&generator, chunk.clone(), DocumentType::Default);
        assert_eq!(enhanced, chunk);
    }
}
