//! Host-facing surface: import tasks, track items and their current metadata.
//!
//! The host owns the import pipeline and the on-disk tags. The plugin only
//! needs to know which paths a task covers, what each item currently holds
//! for the six origin fields, and how to set or delete one of them.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::models::{FieldKey, FieldValue};

// ============================================================================
// Traits
// ============================================================================

/// One track of an import task.
pub trait TrackItem {
    fn get(&self, key: FieldKey) -> Option<&FieldValue>;
    fn set(&mut self, key: FieldKey, value: FieldValue);
    fn remove(&mut self, key: FieldKey);

    /// True when the field holds a non-empty value.
    fn has(&self, key: FieldKey) -> bool {
        self.get(key).is_some_and(|v| !v.is_empty())
    }
}

/// An in-flight import of one album (possibly spanning several disc directories).
pub trait ImportTask {
    type Item: TrackItem;

    /// Directories (or files) the task was created from.
    fn paths(&self) -> Vec<PathBuf>;
    fn items(&self) -> &[Self::Item];
    fn items_mut(&mut self) -> &mut [Self::Item];
}

// ============================================================================
// Consensus
// ============================================================================

/// Most likely current value of every field across the task's items.
/// Each field takes the value most items agree on; ties go to the value seen first.
/// Fields no item carries come out empty.
pub fn current_metadata<I: TrackItem>(items: &[I]) -> BTreeMap<FieldKey, String> {
    FieldKey::ALL
        .iter()
        .map(|&key| {
            let mut counts: FxHashMap<String, (usize, usize)> = FxHashMap::default(); // value -> (count, first seen)
            for (idx, item) in items.iter().enumerate() {
                let value = item.get(key).map(|v| v.to_string()).unwrap_or_default();
                counts.entry(value).or_insert((0, idx)).0 += 1;
            }
            let likely = counts
                .into_iter()
                .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
                    count_a.cmp(count_b).then(first_b.cmp(first_a))
                })
                .map(|(value, _)| value)
                .unwrap_or_default();
            (key, likely)
        })
        .collect()
}

/// Deepest directory shared by every path; multi-disc imports share one origin file.
pub fn common_base(paths: &[PathBuf]) -> Option<PathBuf> {
    let (first, rest) = paths.split_first()?;
    let mut base: Vec<_> = first.components().collect();
    for path in rest {
        let shared = base
            .iter()
            .zip(path.components())
            .take_while(|(a, b)| **a == *b)
            .count();
        base.truncate(shared);
    }
    if base.is_empty() {
        return None;
    }
    Some(base.iter().collect())
}

// ============================================================================
// Serde-backed implementation
// ============================================================================

/// Track with its current tags, as listed in an import manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub path: PathBuf,
    #[serde(default)]
    pub tags: BTreeMap<FieldKey, FieldValue>,
}

impl TrackRecord {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tags: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: FieldKey, value: impl Into<FieldValue>) -> Self {
        self.tags.insert(key, value.into());
        self
    }
}

impl TrackItem for TrackRecord {
    fn get(&self, key: FieldKey) -> Option<&FieldValue> {
        self.tags.get(&key)
    }

    fn set(&mut self, key: FieldKey, value: FieldValue) {
        self.tags.insert(key, value);
    }

    fn remove(&mut self, key: FieldKey) {
        self.tags.remove(&key);
    }
}

/// Album import task read from a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumTask {
    /// Explicit task paths; defaults to the directories holding the items
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<PathBuf>,
    pub items: Vec<TrackRecord>,
}

impl ImportTask for AlbumTask {
    type Item = TrackRecord;

    fn paths(&self) -> Vec<PathBuf> {
        if !self.paths.is_empty() {
            return self.paths.clone();
        }
        let mut dirs: Vec<PathBuf> = Vec::new();
        for item in &self.items {
            let dir = item.path.parent().unwrap_or(Path::new("")).to_path_buf();
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        dirs
    }

    fn items(&self) -> &[TrackRecord] {
        &self.items
    }

    fn items_mut(&mut self) -> &mut [TrackRecord] {
        &mut self.items
    }
}

/// A batch of album tasks, the input and output format of the CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub tasks: Vec<AlbumTask>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_metadata_majority() {
        let items = vec![
            TrackRecord::new("/a/1.flac").with(FieldKey::Media, "CD").with(FieldKey::Year, 2001u32),
            TrackRecord::new("/a/2.flac").with(FieldKey::Media, "Vinyl").with(FieldKey::Year, 2001u32),
            TrackRecord::new("/a/3.flac").with(FieldKey::Media, "Vinyl"),
        ];
        let likely = current_metadata(&items);
        assert_eq!(likely[&FieldKey::Media], "Vinyl");
        assert_eq!(likely[&FieldKey::Year], "2001");
        assert_eq!(likely[&FieldKey::Label], "");
        assert_eq!(likely.len(), FieldKey::COUNT);
    }

    #[test]
    fn test_current_metadata_tie_goes_to_first_seen() {
        let items = vec![
            TrackRecord::new("/a/1.flac").with(FieldKey::Label, "Warp"),
            TrackRecord::new("/a/2.flac").with(FieldKey::Label, "Sony"),
        ];
        assert_eq!(current_metadata(&items)[&FieldKey::Label], "Warp");
    }

    #[test]
    fn test_current_metadata_no_items() {
        let items: Vec<TrackRecord> = Vec::new();
        assert!(current_metadata(&items).values().all(|v| v.is_empty()));
    }

    #[test]
    fn test_common_base_multi_disc() {
        let paths = vec![
            PathBuf::from("/music/Album/CD1"),
            PathBuf::from("/music/Album/CD2"),
        ];
        assert_eq!(common_base(&paths), Some(PathBuf::from("/music/Album")));
    }

    #[test]
    fn test_common_base_single_and_empty() {
        assert_eq!(
            common_base(&[PathBuf::from("/music/Album")]),
            Some(PathBuf::from("/music/Album"))
        );
        assert_eq!(common_base(&[]), None);
    }

    #[test]
    fn test_common_base_is_component_wise() {
        let paths = vec![PathBuf::from("/music/Album 1"), PathBuf::from("/music/Album 2")];
        assert_eq!(common_base(&paths), Some(PathBuf::from("/music")));
    }

    #[test]
    fn test_task_paths_default_to_item_dirs() {
        let task = AlbumTask {
            paths: Vec::new(),
            items: vec![
                TrackRecord::new("/music/Album/CD1/01.flac"),
                TrackRecord::new("/music/Album/CD1/02.flac"),
                TrackRecord::new("/music/Album/CD2/01.flac"),
            ],
        };
        assert_eq!(
            task.paths(),
            vec![PathBuf::from("/music/Album/CD1"), PathBuf::from("/music/Album/CD2")]
        );
    }

    #[test]
    fn test_manifest_deserialize() {
        let manifest: Manifest = serde_json::from_str(
            r#"{"tasks": [{"items": [{"path": "/a/01.flac", "tags": {"media": "CD", "year": 1999}}]}]}"#,
        )
        .unwrap();
        let item = &manifest.tasks[0].items[0];
        assert_eq!(item.get(FieldKey::Media), Some(&FieldValue::Text("CD".to_string())));
        assert_eq!(item.get(FieldKey::Year), Some(&FieldValue::Number(1999)));
        assert!(item.has(FieldKey::Media));
        assert!(!item.has(FieldKey::Label));
    }
}
