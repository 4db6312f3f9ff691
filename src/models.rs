//! Core data models for origin comparison.
//!
//! This module contains the field enumeration, tag values, the per-field
//! comparison table and the per-task context shared by the comparator and
//! the reporter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ============================================================================
// Field Keys
// ============================================================================

/// Album-level fields the plugin knows how to extract and compare.
/// Declaration order is the display order of the comparison table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKey {
    Media,
    Year,
    Country,
    Label,
    Catalognum,
    Albumdisambig,
}

impl FieldKey {
    pub const COUNT: usize = 6;

    pub const ALL: [FieldKey; FieldKey::COUNT] = [
        FieldKey::Media,
        FieldKey::Year,
        FieldKey::Country,
        FieldKey::Label,
        FieldKey::Catalognum,
        FieldKey::Albumdisambig,
    ];

    /// Fields whose mismatch blocks automatic overwrite.
    pub const CONFLICT_FIELDS: [FieldKey; 2] = [FieldKey::Catalognum, FieldKey::Media];

    /// Name used by the host for this field (config keys, item fields).
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKey::Media => "media",
            FieldKey::Year => "year",
            FieldKey::Country => "country",
            FieldKey::Label => "label",
            FieldKey::Catalognum => "catalognum",
            FieldKey::Albumdisambig => "albumdisambig",
        }
    }

    /// Human-readable label shown in the comparison table.
    pub fn label(self) -> &'static str {
        match self {
            FieldKey::Media => "Media",
            FieldKey::Year => "Edition year",
            FieldKey::Country => "Country",
            FieldKey::Label => "Record label",
            FieldKey::Catalognum => "Catalog number",
            FieldKey::Albumdisambig => "Edition",
        }
    }

    pub fn is_conflict_field(self) -> bool {
        FieldKey::CONFLICT_FIELDS.contains(&self)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FieldKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

// ============================================================================
// Field Values
// ============================================================================

/// Value stored on a track for one field.
/// `year` is written as a number, everything else as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(u32),
    Text(String),
}

impl FieldValue {
    /// Empty text counts as unset, mirroring how the host treats blank tags.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Number(_) => false,
            FieldValue::Text(s) => s.is_empty(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        FieldValue::Number(n)
    }
}

// ============================================================================
// Comparison Table
// ============================================================================

/// One row of the comparison table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagCompareEntry {
    pub tagged: String,
    pub origin: String,
    pub active: bool, // true iff the field may be overwritten from origin data
}

/// Per-field comparison of tagged vs. origin values, one entry per `FieldKey`
/// in declaration order regardless of the order values were filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagCompare {
    entries: [TagCompareEntry; FieldKey::COUNT],
}

impl TagCompare {
    pub fn get(&self, key: FieldKey) -> &TagCompareEntry {
        &self.entries[key.index()]
    }

    pub fn get_mut(&mut self, key: FieldKey) -> &mut TagCompareEntry {
        &mut self.entries[key.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &TagCompareEntry)> {
        FieldKey::ALL.iter().copied().zip(self.entries.iter())
    }
}

// ============================================================================
// Task Context
// ============================================================================

/// Where a task ended up after the comparison pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// No file matched the origin pattern; nothing was compared.
    NoOrigin,
    /// Origin data was read and compared against the tagged values.
    Compared {
        tag_compare: TagCompare,
        conflict: bool,
        applied: bool, // origin values were written to the items
    },
}

/// State carried from task start to candidate choice for one import task.
/// Each task owns its context; contexts are never shared between tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskContext {
    pub origin_path: PathBuf,
    pub outcome: TaskOutcome,
}

impl TaskContext {
    pub fn missing(origin_path: PathBuf) -> Self {
        Self {
            origin_path,
            outcome: TaskOutcome::NoOrigin,
        }
    }

    pub fn origin_path(&self) -> &Path {
        &self.origin_path
    }

    pub fn missing_origin(&self) -> bool {
        matches!(self.outcome, TaskOutcome::NoOrigin)
    }

    pub fn conflict(&self) -> bool {
        matches!(self.outcome, TaskOutcome::Compared { conflict: true, .. })
    }

    pub fn applied(&self) -> bool {
        matches!(self.outcome, TaskOutcome::Compared { applied: true, .. })
    }

    pub fn tag_compare(&self) -> Option<&TagCompare> {
        match &self.outcome {
            TaskOutcome::NoOrigin => None,
            TaskOutcome::Compared { tag_compare, .. } => Some(tag_compare),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_order_and_labels() {
        let labels: Vec<&str> = FieldKey::ALL.iter().map(|k| k.label()).collect();
        assert_eq!(
            labels,
            vec!["Media", "Edition year", "Country", "Record label", "Catalog number", "Edition"]
        );
    }

    #[test]
    fn test_field_key_parse() {
        assert_eq!("catalognum".parse::<FieldKey>(), Ok(FieldKey::Catalognum));
        assert_eq!("albumdisambig".parse::<FieldKey>(), Ok(FieldKey::Albumdisambig));
        assert!("title".parse::<FieldKey>().is_err());
    }

    #[test]
    fn test_conflict_fields() {
        assert!(FieldKey::Media.is_conflict_field());
        assert!(FieldKey::Catalognum.is_conflict_field());
        assert!(!FieldKey::Label.is_conflict_field());
        assert!(!FieldKey::Year.is_conflict_field());
    }

    #[test]
    fn test_tag_compare_iterates_in_field_order() {
        let mut compare = TagCompare::default();
        compare.get_mut(FieldKey::Albumdisambig).origin = "Deluxe".to_string();
        compare.get_mut(FieldKey::Media).origin = "CD".to_string();

        let keys: Vec<FieldKey> = compare.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, FieldKey::ALL.to_vec());
        assert_eq!(compare.get(FieldKey::Media).origin, "CD");
    }

    #[test]
    fn test_field_value_untagged_serde() {
        let year: FieldValue = serde_json::from_str("2001").unwrap();
        assert_eq!(year, FieldValue::Number(2001));
        let media: FieldValue = serde_json::from_str("\"CD\"").unwrap();
        assert_eq!(media, FieldValue::Text("CD".to_string()));
        assert!(FieldValue::Text(String::new()).is_empty());
        assert!(!FieldValue::Number(0).is_empty());
    }

    #[test]
    fn test_missing_context() {
        let ctx = TaskContext::missing(PathBuf::from("/music/album/origin.yaml"));
        assert!(ctx.missing_origin());
        assert!(!ctx.conflict());
        assert!(ctx.tag_compare().is_none());
    }
}
