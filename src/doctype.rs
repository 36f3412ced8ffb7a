//! Document type classification over a closed tag set.
//!
//! The classifier maps a filename plus side metadata to one of the known
//! document types. Rule order is load-bearing: document-specific filename
//! substrings run before generic ones, an explicit `document_type` metadata
//! field runs next, filename keywords last. Reordering changes which
//! configuration a borderline file receives, so the order below is fixed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::MetadataMap;

/// Closed set of recognized document types.
///
/// Serialized tags match the wire strings recorded in chunk metadata
/// (`document_type`), e.g. `"800-53_catalog"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    #[serde(rename = "800-53_catalog")]
    Sp80053Catalog,
    #[serde(rename = "800-53_xml")]
    Sp80053Xml,
    #[serde(rename = "800-53a_assessment")]
    Sp80053aAssessment,
    #[serde(rename = "800-37_rmf")]
    Sp80037Rmf,
    #[serde(rename = "csf_2.0")]
    Csf2,
    #[serde(rename = "800-171")]
    Sp800171,
    #[serde(rename = "fedramp")]
    Fedramp,
    #[serde(rename = "dod_srg")]
    DodSrg,
    #[serde(rename = "cmmc")]
    Cmmc,
    #[serde(rename = "security_pattern")]
    SecurityPattern,
    #[serde(rename = "positioning_guide")]
    PositioningGuide,
    #[serde(rename = "zone_guide")]
    ZoneGuide,
    #[serde(rename = "grouping_guide")]
    GroupingGuide,
    #[serde(rename = "segmentation_guide")]
    SegmentationGuide,
    #[serde(rename = "query_patterns")]
    QueryPatterns,
    #[serde(rename = "default")]
    Default,
}

/// Families that share a question-generation strategy.
///
/// Keeping this a closed enum (rather than string comparisons at each call
/// site) makes "total function over a closed set" checkable by the compiler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentFamily {
    /// Per-control catalogs and baselines (800-53, 800-171, FedRAMP, ...).
    Control,
    /// Security patterns and placement/zone/grouping/segmentation guides.
    PatternGuide,
    /// Task- or function-structured frameworks (RMF, CSF).
    Framework,
    /// Pre-written query patterns, already question-shaped.
    QueryPattern,
    /// Everything else.
    Generic,
}

impl DocumentType {
    /// Every known type, in declaration order.
    pub const ALL: [DocumentType; 16] = [
        DocumentType::Sp80053Catalog,
        DocumentType::Sp80053Xml,
        DocumentType::Sp80053aAssessment,
        DocumentType::Sp80037Rmf,
        DocumentType::Csf2,
        DocumentType::Sp800171,
        DocumentType::Fedramp,
        DocumentType::DodSrg,
        DocumentType::Cmmc,
        DocumentType::SecurityPattern,
        DocumentType::PositioningGuide,
        DocumentType::ZoneGuide,
        DocumentType::GroupingGuide,
        DocumentType::SegmentationGuide,
        DocumentType::QueryPatterns,
        DocumentType::Default,
    ];

    /// The wire tag recorded in chunk metadata.
    pub fn tag(&self) -> &'static str {
        match self {
            DocumentType::Sp80053Catalog => "800-53_catalog",
            DocumentType::Sp80053Xml => "800-53_xml",
            DocumentType::Sp80053aAssessment => "800-53a_assessment",
            DocumentType::Sp80037Rmf => "800-37_rmf",
            DocumentType::Csf2 => "csf_2.0",
            DocumentType::Sp800171 => "800-171",
            DocumentType::Fedramp => "fedramp",
            DocumentType::DodSrg => "dod_srg",
            DocumentType::Cmmc => "cmmc",
            DocumentType::SecurityPattern => "security_pattern",
            DocumentType::PositioningGuide => "positioning_guide",
            DocumentType::ZoneGuide => "zone_guide",
            DocumentType::GroupingGuide => "grouping_guide",
            DocumentType::SegmentationGuide => "segmentation_guide",
            DocumentType::QueryPatterns => "query_patterns",
            DocumentType::Default => "default",
        }
    }

    /// Parse a wire tag back into a type.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.tag() == tag)
    }

    /// Human-readable label used as the leading part of the context prefix.
    pub fn display_name(&self) -> &'static str {
        match self {
            DocumentType::Sp80053Catalog => "NIST SP 800-53 Rev. 5 Control Catalog",
            DocumentType::Sp80053Xml => "NIST SP 800-53 Rev. 5 Control Catalog (XML)",
            DocumentType::Sp80053aAssessment => "NIST SP 800-53A Rev. 5 Assessment Procedures",
            DocumentType::Sp80037Rmf => "NIST SP 800-37 Rev. 2 RMF Lifecycle",
            DocumentType::Csf2 => "NIST Cybersecurity Framework 2.0",
            DocumentType::Sp800171 => "NIST SP 800-171 Rev. 3 (CUI Requirements)",
            DocumentType::Fedramp => "FedRAMP Security Baseline",
            DocumentType::DodSrg => "DoD Cloud SRG (IL2-IL6)",
            DocumentType::Cmmc => "CMMC (Cybersecurity Maturity Model Certification)",
            DocumentType::SecurityPattern => "Security Pattern Documentation",
            DocumentType::PositioningGuide => "Device Positioning Best Practices",
            DocumentType::ZoneGuide => "Security Zone Relationships",
            DocumentType::GroupingGuide => "Device Grouping Patterns",
            DocumentType::SegmentationGuide => "Network Segmentation Strategies",
            DocumentType::QueryPatterns => "Query Patterns and Common Greetings",
            DocumentType::Default => "Source Document",
        }
    }

    /// The question-generation family this type belongs to.
    pub fn family(&self) -> DocumentFamily {
        match self {
            DocumentType::Sp80053Catalog
            | DocumentType::Sp80053Xml
            | DocumentType::Sp80053aAssessment
            | DocumentType::Sp800171
            | DocumentType::Fedramp
            | DocumentType::Cmmc
            | DocumentType::DodSrg => DocumentFamily::Control,
            DocumentType::SecurityPattern
            | DocumentType::PositioningGuide
            | DocumentType::ZoneGuide
            | DocumentType::GroupingGuide
            | DocumentType::SegmentationGuide => DocumentFamily::PatternGuide,
            DocumentType::Sp80037Rmf | DocumentType::Csf2 => DocumentFamily::Framework,
            DocumentType::QueryPatterns => DocumentFamily::QueryPattern,
            DocumentType::Default => DocumentFamily::Generic,
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

fn metadata_str<'a>(metadata: &'a MetadataMap, key: &str) -> Option<&'a str> {
    metadata.get(key).and_then(serde_json::Value::as_str)
}

/// Classify a document from its filename and side metadata.
///
/// Pure and total: always returns a tag from the closed set, falling back to
/// [`DocumentType::Default`]. First match wins.
pub fn classify(filename: &str, metadata: &MetadataMap) -> DocumentType {
    let name = filename.to_lowercase();

    // Document-specific filename rules take precedence over everything else.
    if name.contains("800-53") && metadata_str(metadata, "file_type") == Some("xml") {
        return DocumentType::Sp80053Xml;
    }
    if name.contains("800-53") && name.contains("catalog") {
        return DocumentType::Sp80053Catalog;
    }
    if name.contains("800-53a") || name.contains("assessment") {
        return DocumentType::Sp80053aAssessment;
    }
    if name.contains("800-37") || name.contains("rmf") {
        return DocumentType::Sp80037Rmf;
    }
    if name.contains("csf") || name.contains("cybersecurity framework") {
        return DocumentType::Csf2;
    }
    if name.contains("800-171") {
        return DocumentType::Sp800171;
    }
    if name.contains("fedramp") {
        return DocumentType::Fedramp;
    }
    if name.contains("cmmc") {
        return DocumentType::Cmmc;
    }
    if name.contains("srg") || name.contains("dod") {
        return DocumentType::DodSrg;
    }

    // An explicit type recorded by the extractor wins over generic keywords.
    if let Some(tag) = metadata_str(metadata, "document_type") {
        match tag {
            "800-53_xml" => return DocumentType::Sp80053Xml,
            "security_pattern" => return DocumentType::SecurityPattern,
            "positioning_guide" => return DocumentType::PositioningGuide,
            "zone_guide" => return DocumentType::ZoneGuide,
            "grouping_guide" => return DocumentType::GroupingGuide,
            "segmentation_guide" => return DocumentType::SegmentationGuide,
            _ => {}
        }
    }

    // Filename keyword fallback.
    if name.contains("security_pattern") {
        DocumentType::SecurityPattern
    } else if name.contains("positioning") {
        DocumentType::PositioningGuide
    } else if name.contains("zone") {
        DocumentType::ZoneGuide
    } else if name.contains("grouping") {
        DocumentType::GroupingGuide
    } else if name.contains("segmentation") {
        DocumentType::SegmentationGuide
    } else if name.contains("query_pattern") || name.contains("greeting") {
        DocumentType::QueryPatterns
    } else {
        DocumentType::Default
    }
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
    fn xml_metadata_outranks_catalog_substring() {
        let m = meta(&[("file_type", "xml")]);
        assert_eq!(
            classify("NIST_800-53_catalog.xml", &m),
            DocumentType::Sp80053Xml
        );
        assert_eq!(
            classify("NIST_800-53_catalog.pdf", &MetadataMap::new()),
            DocumentType::Sp80053Catalog
        );
    }

    #[test]
    fn assessment_substring_matches_before_rmf() {
        assert_eq!(
            classify("800-53a_assessment_procedures.pdf", &MetadataMap::new()),
            DocumentType::Sp80053aAssessment
        );
        assert_eq!(
            classify("rmf_assessment_guide.pdf", &MetadataMap::new()),
            DocumentType::Sp80053aAssessment
        );
    }

    #[test]
    fn explicit_metadata_type_beats_filename_keywords() {
        let m = meta(&[("document_type", "zone_guide")]);
        assert_eq!(classify("segmentation_tips.md", &m), DocumentType::ZoneGuide);
    }

    #[test]
    fn filename_keywords_apply_when_nothing_else_matches() {
        assert_eq!(
            classify("device_positioning.md", &MetadataMap::new()),
            DocumentType::PositioningGuide
        );
        assert_eq!(
            classify("common_greetings.csv", &MetadataMap::new()),
            DocumentType::QueryPatterns
        );
    }

    #[test]
    fn unknown_inputs_fall_back_to_default() {
        assert_eq!(
            classify("", &MetadataMap::new()),
            DocumentType::Default
        );
        assert_eq!(
            classify("quarterly_report.xlsx", &MetadataMap::new()),
            DocumentType::Default
        );
    }

    #[test]
    fn tags_round_trip() {
        for ty in DocumentType::ALL {
            assert_eq!(DocumentType::from_tag(ty.tag()), Some(ty));
        }
    }
}
