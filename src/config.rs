//! Plugin configuration.
//!
//! The host configuration is a YAML document with one section per plugin.
//! It is deserialized into `HostConfig` and then resolved once, at startup,
//! into an immutable `PluginConfig`. Every problem found while resolving is a
//! `ConfigError`, which disables the plugin for the run.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::ConfigError;
use crate::matcher::{OriginKind, TagPattern};
use crate::models::FieldKey;

/// Metadata sources whose `extra_tags` can grant write access, in priority order.
pub const SUPPORTED_METADATA_SOURCES: [&str; 2] = ["musicbrainz", "discogs"];

// ============================================================================
// Raw host configuration
// ============================================================================

/// Section of another metadata plugin; only `extra_tags` is read.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    pub extra_tags: Option<Vec<String>>,
}

/// The `originquery` section as written by the user.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PluginSection {
    pub origin_file: Option<String>,
    pub origin_type: Option<String>,
    pub tag_patterns: Option<serde_yaml::Value>, // validated during resolution
    #[serde(deserialize_with = "deserialize_flag")]
    pub use_origin_on_conflict: bool,
    #[serde(deserialize_with = "deserialize_flag")]
    pub preserve_media_with_catalognum: bool,
}

/// Host configs are often written with YAML 1.1 booleans ("yes", "no", "on", "off"),
/// which serde_yaml reads as strings.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Word(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Word(word) => match word.to_ascii_lowercase().as_str() {
            "yes" | "on" | "true" | "y" => Ok(true),
            "no" | "off" | "false" | "n" => Ok(false),
            _ => Err(serde::de::Error::custom(format!(
                "expected a boolean, got \"{}\"",
                word
            ))),
        },
    }
}

/// The parts of the host configuration this plugin reads. Other sections are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub musicbrainz: Option<SourceSection>,
    pub discogs: Option<SourceSection>,
    pub originquery: PluginSection,
}

impl HostConfig {
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not a mapping
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    fn source(&self, name: &str) -> Option<&SourceSection> {
        match name {
            "musicbrainz" => self.musicbrainz.as_ref(),
            "discogs" => self.discogs.as_ref(),
            _ => None,
        }
    }
}

// ============================================================================
// Resolved configuration
// ============================================================================

/// Immutable configuration produced once at startup.
#[derive(Debug, Clone)]
pub struct PluginConfig {
    /// Metadata source that supplied `extra_tags`
    pub extra_tags_source: &'static str,
    /// Field names the plugin may overwrite, as configured (may name fields it never matches)
    pub extra_tags: Vec<String>,
    /// Glob pattern for the origin file, relative to the album directory
    pub origin_file: String,
    pub origin_kind: OriginKind,
    /// Compiled patterns in configuration order
    pub tag_patterns: Vec<(FieldKey, TagPattern)>,
    pub use_origin_on_conflict: bool,
    pub preserve_media_with_catalognum: bool,
}

impl PluginConfig {
    /// Resolve the host configuration.
    ///
    /// Checks, in order: an extra-tags source exists, `tag_patterns` is a
    /// mapping, `origin_file` is a valid glob, `origin_type` is valid, and every
    /// pattern names a known field and compiles for the document type.
    pub fn resolve(host: &HostConfig) -> Result<Self, ConfigError> {
        let (extra_tags_source, extra_tags) = resolve_extra_tags(host)?;
        info!("Using extra tags from: {}", extra_tags_source);
        info!("Available extra tags: {}", extra_tags.join(", "));

        let section = &host.originquery;
        let patterns = match &section.tag_patterns {
            Some(serde_yaml::Value::Mapping(mapping)) => mapping,
            _ => return Err(ConfigError::PatternsNotMapping),
        };

        let origin_file = section
            .origin_file
            .clone()
            .filter(|f| !f.trim().is_empty())
            .ok_or(ConfigError::MissingOriginFile)?;
        glob::Pattern::new(&origin_file).map_err(|e| ConfigError::InvalidOriginFile {
            pattern: origin_file.clone(),
            reason: e.to_string(),
        })?;

        let origin_kind = match &section.origin_type {
            Some(declared) => declared
                .parse::<OriginKind>()
                .map_err(|_| ConfigError::InvalidOriginType(declared.clone()))?,
            None => OriginKind::infer(Path::new(&origin_file)),
        };

        let mut tag_patterns = Vec::with_capacity(patterns.len());
        for (key, pattern) in patterns {
            let key = match key {
                serde_yaml::Value::String(s) => s.as_str(),
                _ => return Err(ConfigError::PatternsNotMapping),
            };
            let field: FieldKey = key
                .parse()
                .map_err(|_| ConfigError::UnknownKey(key.to_string()))?;
            let pattern = match pattern {
                serde_yaml::Value::String(s) => s.as_str(),
                _ => return Err(ConfigError::PatternsNotMapping),
            };
            tag_patterns.push((field, TagPattern::compile(field, pattern, origin_kind)?));
        }

        Ok(Self {
            extra_tags_source,
            extra_tags,
            origin_file,
            origin_kind,
            tag_patterns,
            use_origin_on_conflict: section.use_origin_on_conflict,
            preserve_media_with_catalognum: section.preserve_media_with_catalognum,
        })
    }

    /// Whether the plugin may overwrite this field on imported items.
    pub fn is_writable(&self, key: FieldKey) -> bool {
        self.extra_tags.iter().any(|tag| tag == key.as_str())
    }
}

/// Pick the first supported source that declares a non-empty `extra_tags` list.
fn resolve_extra_tags(host: &HostConfig) -> Result<(&'static str, Vec<String>), ConfigError> {
    SUPPORTED_METADATA_SOURCES
        .iter()
        .find_map(|&name| {
            host.source(name)
                .and_then(|section| section.extra_tags.as_ref())
                .filter(|tags| !tags.is_empty())
                .map(|tags| (name, tags.clone()))
        })
        .ok_or_else(|| ConfigError::NoExtraTags {
            sources: SUPPORTED_METADATA_SOURCES.join(", "),
        })
}
