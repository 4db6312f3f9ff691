//! Origin lookup, comparison and item updates for one import task.
//!
//! `OriginQuery` holds the resolved configuration and exposes the two host
//! entry points: `import_task_start`, which does all file I/O and mutation,
//! and `before_choose_candidate`, which only formats the stored result.

use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

use crate::config::{HostConfig, PluginConfig};
use crate::error::{ConfigError, OriginError, Result};
use crate::host::{common_base, current_metadata, ImportTask, TrackItem};
use crate::matcher::OriginDocument;
use crate::models::{FieldKey, TagCompare, TagCompareEntry, TaskContext, TaskOutcome};
use crate::normalize::{comparable_value, item_value, sanitize_value};
use crate::report::{self, Highlighter, ReportLine};

/// Result of comparing tagged values against one origin document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub tag_compare: TagCompare,
    pub conflict: bool,
}

pub struct OriginQuery {
    config: PluginConfig,
}

impl OriginQuery {
    pub fn new(config: PluginConfig) -> Self {
        Self { config }
    }

    /// Resolve the host configuration, or log why the plugin is disabled.
    pub fn load(host: &HostConfig) -> Option<Self> {
        match PluginConfig::resolve(host) {
            Ok(config) => Some(Self::new(config)),
            Err(err) => {
                log_disabled(&err);
                None
            }
        }
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    // ========================================================================
    // Task start
    // ========================================================================

    /// Locate the origin file for a task, compare it with the current tags and,
    /// when there is no conflict (or origin data is preferred), write the
    /// permitted fields onto every item.
    ///
    /// A missing origin file is not an error; read and parse failures are.
    pub fn import_task_start<T: ImportTask>(&self, task: &mut T) -> Result<TaskContext> {
        let base = common_base(&task.paths()).ok_or(OriginError::NoPaths)?;

        let Some(origin_path) = self.find_origin(&base)? else {
            debug!("No origin file matching {} in {}", self.config.origin_file, base.display());
            return Ok(TaskContext::missing(base.join(&self.config.origin_file)));
        };

        let tagged = current_metadata(task.items());
        let document = OriginDocument::load(&origin_path, self.config.origin_kind)?;
        let Comparison {
            mut tag_compare,
            conflict,
        } = self.compare(&tagged, &document);

        let applied = !conflict || self.config.use_origin_on_conflict;
        if applied {
            for item in task.items_mut() {
                self.apply(item, &mut tag_compare);
            }
        }

        Ok(TaskContext {
            origin_path,
            outcome: TaskOutcome::Compared {
                tag_compare,
                conflict,
                applied,
            },
        })
    }

    /// First file (in lexicographic order) matching the origin pattern under `base`.
    pub fn find_origin(&self, base: &Path) -> Result<Option<PathBuf>> {
        let base_str = base
            .to_str()
            .ok_or_else(|| OriginError::NonUtf8Path(base.to_path_buf()))?;
        let escaped = PathBuf::from(Pattern::escape(base_str)).join(&self.config.origin_file);
        let pattern = escaped.to_string_lossy().into_owned();

        // Hidden files (e.g. AppleDouble `._origin.yaml` sidecars) only match a literal leading dot
        let options = MatchOptions {
            require_literal_leading_dot: true,
            ..MatchOptions::default()
        };
        let paths = glob::glob_with(&pattern, options).map_err(|source| OriginError::Glob {
            pattern: pattern.clone(),
            source,
        })?;
        let mut found = Vec::new();
        for entry in paths {
            let path = entry.map_err(|e| {
                let path = e.path().to_path_buf();
                OriginError::Io {
                    path,
                    source: e.into_error(),
                }
            })?;
            found.push(path);
        }
        found.sort();
        Ok(found.into_iter().next())
    }

    /// Build the comparison table for the given tagged values and origin document.
    /// Pure: the same inputs always give the same table and conflict flag.
    pub fn compare(
        &self,
        tagged: &std::collections::BTreeMap<FieldKey, String>,
        document: &OriginDocument,
    ) -> Comparison {
        let mut tag_compare = TagCompare::default();
        for key in FieldKey::ALL {
            *tag_compare.get_mut(key) = TagCompareEntry {
                tagged: tagged.get(&key).cloned().unwrap_or_default(),
                origin: String::new(),
                active: self.config.is_writable(key),
            };
        }

        let mut conflict = false;
        for (key, raw) in document.matches(&self.config.tag_patterns) {
            let entry = tag_compare.get_mut(key);
            if !entry.origin.is_empty() {
                continue;
            }
            entry.origin = sanitize_value(key, &raw);

            if !key.is_conflict_field() || entry.tagged.is_empty() || entry.origin.is_empty() {
                continue;
            }
            if comparable_value(key, &entry.tagged) != comparable_value(key, &entry.origin) {
                debug!(
                    "Conflict on {}: tagged \"{}\", origin \"{}\"",
                    key, entry.tagged, entry.origin
                );
                conflict = true;
            }
        }

        Comparison {
            tag_compare,
            conflict,
        }
    }

    /// Write origin values onto one item, then drop its media when a catalog
    /// number is also present (unless configured to keep it).
    fn apply<I: TrackItem>(&self, item: &mut I, tag_compare: &mut TagCompare) {
        for key in FieldKey::ALL {
            if !self.config.is_writable(key) {
                continue;
            }
            let origin = &tag_compare.get(key).origin;
            // An empty year (absent, or "0" in the file) is never written.
            // Other fields take the empty value, clearing the tag.
            if key == FieldKey::Year && origin.is_empty() {
                continue;
            }
            match item_value(key, origin) {
                Some(value) => item.set(key, value),
                None => item.remove(key),
            }
        }

        // The host's matcher weighs media heavily, above an exact catalog number, and
        // media for uploaded releases is often mislabeled (Enhanced CD and SACD end up as CD).
        if !self.config.preserve_media_with_catalognum
            && item.has(FieldKey::Media)
            && item.has(FieldKey::Catalognum)
        {
            item.remove(FieldKey::Media);
            tag_compare.get_mut(FieldKey::Media).active = false;
        }
    }

    // ========================================================================
    // Candidate choice
    // ========================================================================

    /// Render and log the report for a task started earlier.
    pub fn before_choose_candidate(
        &self,
        ctx: &TaskContext,
        highlighter: &dyn Highlighter,
    ) -> Vec<ReportLine> {
        let lines = report::render(ctx, self.config.use_origin_on_conflict, highlighter);
        report::emit(&lines);
        lines
    }
}

fn log_disabled(err: &ConfigError) {
    error!("{}", err);
    error!("Plugin disabled.");
}
