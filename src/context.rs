//! Context prefix synthesis.
//!
//! A chunk cut from the middle of a large document loses its surroundings;
//! the prefix restores enough of them for a downstream reader (or embedding
//! model) to orient itself. Fields are assembled in a fixed order and joined
//! with `" | "`, skipping absent values without leaving gaps.

use serde_json::Value;

use crate::doctype::DocumentType;
use crate::types::MetadataMap;

fn scalar(metadata: &MetadataMap, key: &str) -> Option<String> {
    match metadata.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => {
            // Zero page/sheet numbers carry no information.
            if n.as_u64() == Some(0) || n.as_i64() == Some(0) {
                None
            } else {
                Some(n.to_string())
            }
        }
        _ => None,
    }
}

/// Build the pipe-separated context label for a chunk.
///
/// Pure and total; returns the bare document label when no structural
/// metadata is recognized.
pub fn build_context_prefix(metadata: &MetadataMap, doc_type: DocumentType) -> String {
    let mut parts: Vec<String> = vec![doc_type.display_name().to_string()];

    if let Some(section) = scalar(metadata, "section_heading") {
        parts.push(format!("Section: {section}"));
    }

    if let Some(control_id) = scalar(metadata, "control_id") {
        let mut control = format!("Control {control_id}");
        if let Some(name) = scalar(metadata, "control_name") {
            control.push_str(&format!(" - {name}"));
        }
        if let Some(family) = scalar(metadata, "family") {
            control.push_str(&format!(" (Family {family})"));
        }
        if let Some(enhancement) = scalar(metadata, "enhancement_number") {
            control.push_str(&format!(" Enhancement {enhancement}"));
        }
        parts.push(control);
    }

    if let Some(task) = scalar(metadata, "task_id") {
        parts.push(format!("Task: {task}"));
    }
    if let Some(step) = scalar(metadata, "step") {
        parts.push(format!("Step: {step}"));
    }

    if let Some(function) = scalar(metadata, "function") {
        parts.push(format!("Function: {function}"));
    }
    if let Some(category) = scalar(metadata, "category") {
        parts.push(format!("Category: {category}"));
    }

    if let Some(level) = scalar(metadata, "impact_level") {
        parts.push(format!("Impact Level: {level}"));
    }
    if let Some(baseline) = scalar(metadata, "baseline_level") {
        parts.push(format!("Baseline: {baseline}"));
    }

    if let Some(page) = scalar(metadata, "page") {
        parts.push(format!("Page {page}"));
    }
    if let Some(sheet) = scalar(metadata, "sheet") {
        parts.push(format!("Sheet: {sheet}"));
    }

    parts.join(" | ")
}

/// Prepend a prefix to chunk content, blank-line separated.
///
/// Whitespace-only content stays empty; an empty prefix leaves the content
/// untouched.
pub fn prepend_prefix(prefix: &str, content: &str) -> String {
    let content = content.trim();
    if content.is_empty() {
        return String::new();
    }
    if prefix.is_empty() {
        return content.to_string();
    }
    format!("{prefix}\n\n{content}")
}
