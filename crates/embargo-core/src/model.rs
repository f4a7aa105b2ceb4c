//! Core data model for the sanctions pipeline.
//!
//! # Overview
//!
//! Three persisted record kinds flow through the batch pipeline:
//!
//! - [`Entity`]: one sanctions-entity record from the upstream feed.
//! - [`Dataset`]: one source feed with publisher metadata.
//! - [`RelationRow`]: one derived fact linking an entity to a target country
//!   via a contributing dataset's publisher country.
//!
//! Entities and datasets are append-only: batch ingestion creates them and
//! nothing in this crate updates them afterwards. The relation-row set is
//! fully recomputed by [`crate::extract`] whenever ingestion changes.
//!
//! Timestamps are kept as the upstream ISO-8601 text (`first_seen`,
//! `last_seen`, `last_change` are mutually independent; the source does not
//! guarantee any ordering between them). Date-range filters compare the text
//! lexicographically, which is sound for ISO-8601 values.

use chrono::NaiveDate;

/// Longest caption stored verbatim. Longer captions are truncated to
/// [`CAPTION_KEEP_CHARS`] characters plus an ellipsis marker.
pub const CAPTION_MAX_CHARS: usize = 255;

/// Characters kept from an over-long caption before the ellipsis.
pub const CAPTION_KEEP_CHARS: usize = 253;

/// A sanctions-entity record as stored.
///
/// `properties` and `referents` are opaque JSON from the upstream feed;
/// the extractor only inspects the `country` and `jurisdiction` property
/// values. `industry` is populated by an out-of-band enrichment and is
/// absent for freshly ingested entities.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: String,
    pub caption: String,
    pub schema: String,
    pub properties: serde_json::Value,
    pub referents: serde_json::Value,
    pub datasets: Vec<String>,
    pub first_seen: Option<String>,
    pub last_seen: Option<String>,
    pub last_change: Option<String>,
    pub target: bool,
    pub industry: Option<String>,
}

/// A source feed from the dataset catalogue.
///
/// `publisher` is the opaque publisher mapping from the catalogue; the
/// extractor reads its `country` field. Datasets with `dataset_type`
/// `"external"` never contribute relation rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub name: String,
    pub title: String,
    pub url: Option<String>,
    pub index_url: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub publisher: Option<serde_json::Value>,
    pub dataset_type: String,
}

impl Dataset {
    /// Publisher country code, if the publisher mapping carries one.
    #[must_use]
    pub fn publisher_country(&self) -> Option<&str> {
        self.publisher
            .as_ref()
            .and_then(|p| p.get("country"))
            .and_then(serde_json::Value::as_str)
    }

    /// Whether this dataset contributes relation rows at all.
    #[must_use]
    pub fn contributes_relations(&self) -> bool {
        self.dataset_type != "external"
    }
}

/// One derived relation fact, persisted in `relation_rows`.
///
/// Multiple rows may share an entity id (one per target country and
/// contributing dataset); downstream edge weights deduplicate by entity id
/// per (source, target) country pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationRow {
    pub id: String,
    pub caption: String,
    pub schema: String,
    pub target_country: String,
    pub source_country: String,
    pub first_seen: Option<String>,
    pub last_seen: Option<String>,
    pub last_change: Option<String>,
    pub target: bool,
    pub industry: Option<String>,
}

/// Caller-supplied restriction on the relation-row set.
///
/// Every field is optional; `None` means "no restriction". Date bounds are
/// inclusive and compare against `first_seen`. When `countries` is present
/// it restricts the induced subgraph: **both** endpoints of a relation must
/// be in the list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationFilter {
    pub schema: Option<String>,
    pub industry: Option<String>,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    pub countries: Option<Vec<String>>,
}

impl RelationFilter {
    /// `true` when no field restricts anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Apply the caption storage rule: captions up to [`CAPTION_MAX_CHARS`]
/// characters are kept verbatim, longer ones are cut to
/// [`CAPTION_KEEP_CHARS`] characters with an ellipsis marker appended.
///
/// Counts characters, not bytes, so multibyte captions are never split
/// mid-codepoint.
#[must_use]
pub fn truncate_caption(raw: &str) -> String {
    if raw.chars().count() <= CAPTION_MAX_CHARS {
        return raw.to_string();
    }

    let mut caption: String = raw.chars().take(CAPTION_KEEP_CHARS).collect();
    caption.push_str("...");
    caption
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_caption_kept_verbatim() {
        assert_eq!(truncate_caption("ACME Trading"), "ACME Trading");
    }

    #[test]
    fn caption_at_limit_kept_verbatim() {
        let caption = "x".repeat(CAPTION_MAX_CHARS);
        assert_eq!(truncate_caption(&caption), caption);
    }

    #[test]
    fn caption_over_limit_truncated_with_marker() {
        let caption = "x".repeat(CAPTION_MAX_CHARS + 1);
        let stored = truncate_caption(&caption);
        assert_eq!(stored.chars().count(), CAPTION_KEEP_CHARS + 3);
        assert!(stored.ends_with("..."));
        assert!(stored.starts_with("xxx"));
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        // 300 two-byte characters; byte-based slicing would panic or split
        // a codepoint.
        let caption = "é".repeat(300);
        let stored = truncate_caption(&caption);
        assert_eq!(stored.chars().count(), CAPTION_KEEP_CHARS + 3);
        assert!(stored.ends_with("..."));
    }

    #[test]
    fn publisher_country_reads_mapping() {
        let dataset = Dataset {
            name: "us_ofac_sdn".to_string(),
            title: "US OFAC SDN".to_string(),
            url: None,
            index_url: None,
            summary: None,
            description: None,
            publisher: Some(serde_json::json!({"name": "OFAC", "country": "us"})),
            dataset_type: "source".to_string(),
        };
        assert_eq!(dataset.publisher_country(), Some("us"));
        assert!(dataset.contributes_relations());
    }

    #[test]
    fn external_dataset_does_not_contribute() {
        let dataset = Dataset {
            name: "wikidata".to_string(),
            title: "Wikidata".to_string(),
            url: None,
            index_url: None,
            summary: None,
            description: None,
            publisher: Some(serde_json::json!({"country": "us"})),
            dataset_type: "external".to_string(),
        };
        assert!(!dataset.contributes_relations());
    }

    #[test]
    fn missing_publisher_yields_no_country() {
        let dataset = Dataset {
            name: "unknown".to_string(),
            title: "Unknown".to_string(),
            url: None,
            index_url: None,
            summary: None,
            description: None,
            publisher: None,
            dataset_type: "source".to_string(),
        };
        assert_eq!(dataset.publisher_country(), None);
    }

    #[test]
    fn default_filter_is_empty() {
        assert!(RelationFilter::default().is_empty());
        let filter = RelationFilter {
            schema: Some("Company".to_string()),
            ..RelationFilter::default()
        };
        assert!(!filter.is_empty());
    }
}
