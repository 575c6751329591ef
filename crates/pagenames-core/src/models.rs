//! Core data models used throughout pagenames.
//!
//! These types represent the page records read from the inbound stream, the
//! name occurrences persisted to the relational store, and the per-item
//! classification summary derived from them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One scanned page as delivered by the inbound stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Barcode of the item (volume) the page belongs to.
    pub item_barcode: String,
    /// Names recognized on the page, in text order.
    #[serde(default)]
    pub names: Vec<NameOccurrence>,
}

/// A recognized scientific name on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameOccurrence {
    /// Matched name text as it will be identified in the store.
    pub name: String,
    /// Identifier of the data source the name was verified against.
    pub data_source_id: i32,
    /// Pipe-delimited classification, e.g. `Animalia|Insecta|Lepidoptera`.
    #[serde(default)]
    pub classification_path: String,
    pub offset_start: u32,
    pub offset_end: u32,
    /// Confidence that the string is a scientific name.
    #[serde(default)]
    pub odds: f64,
    #[serde(default)]
    pub annotation: String,
    #[serde(default)]
    pub annotation_type: AnnotationType,
}

/// Nomenclatural annotation attached to a name occurrence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnnotationType {
    #[default]
    NoAnnot,
    SpNov,
    CombNov,
    SubspNov,
}

impl AnnotationType {
    /// Integer code stored in the `annotation_type` column.
    pub fn code(self) -> i64 {
        match self {
            AnnotationType::NoAnnot => 0,
            AnnotationType::SpNov => 1,
            AnnotationType::CombNov => 2,
            AnnotationType::SubspNov => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(AnnotationType::NoAnnot),
            1 => Some(AnnotationType::SpNov),
            2 => Some(AnnotationType::CombNov),
            3 => Some(AnnotationType::SubspNov),
            _ => None,
        }
    }
}

/// A name occurrence resolved to a stored page, ready for bulk load.
#[derive(Debug, Clone, PartialEq)]
pub struct PageNameString {
    pub page_id: i64,
    pub name_string_id: Uuid,
    pub offset_start: u32,
    pub offset_end: u32,
    pub odds: f64,
    pub annotation: String,
    pub annotation_type: AnnotationType,
}

impl PageNameString {
    pub fn from_occurrence(page_id: i64, occurrence: &NameOccurrence) -> Self {
        Self {
            page_id,
            name_string_id: name_string_id(&occurrence.name),
            offset_start: occurrence.offset_start,
            offset_end: occurrence.offset_end,
            odds: occurrence.odds,
            annotation: occurrence.annotation.clone(),
            annotation_type: occurrence.annotation_type,
        }
    }
}

/// An item row as needed by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: i64,
    pub barcode: String,
}

/// Classification summary stored on an item.
///
/// A default value is the "reset" state: all counters zero, all labels empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemSummary {
    /// Number of distinct classification paths seen on the item.
    pub paths_total: u32,
    pub animalia_num: u32,
    pub plantae_num: u32,
    pub fungi_num: u32,
    pub bacteria_num: u32,
    pub majority_kingdom: String,
    /// Share of voting paths that agree with `majority_kingdom`, 0..=100.
    pub kingdom_percentage: u32,
    /// Deepest rank value that still holds a majority across all paths.
    pub context: String,
}

/// Namespace for name-string identifiers: UUIDv5 of `globalnames.org`
/// in the DNS namespace.
pub fn name_namespace() -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, b"globalnames.org")
}

/// Deterministic identifier for a name string.
pub fn name_string_id(name: &str) -> Uuid {
    Uuid::new_v5(&name_namespace(), name.as_bytes())
}
