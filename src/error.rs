//! Error types.
//!
//! `ConfigError` is raised while resolving the plugin configuration and
//! disables the plugin for the whole run. `OriginError` is scoped to a single
//! import task.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "Config error: No extra tags found from supported metadata sources ({sources}). \
         At least one source must have extra_tags configured."
    )]
    NoExtraTags { sources: String },

    #[error(
        "Config error: originquery.tag_patterns must be set to a dictionary of key -> pattern mappings."
    )]
    PatternsNotMapping,

    #[error("Config error: unknown key \"{0}\"")]
    UnknownKey(String),

    #[error("Config error: originquery.origin_file not set.")]
    MissingOriginFile,

    #[error("Config error: originquery.origin_file \"{pattern}\" is not a valid file pattern ({reason}).")]
    InvalidOriginFile { pattern: String, reason: String },

    #[error("Config error: originquery.origin_type must be one of yaml, json, text (got \"{0}\").")]
    InvalidOriginType(String),

    #[error(
        "Config error: invalid tag pattern for \"{key}\". \"{pattern}\" is not a valid JSON path ({reason})."
    )]
    InvalidPath {
        key: String,
        pattern: String,
        reason: String,
    },

    #[error(
        "Config error: invalid tag pattern for \"{key}\". \"{pattern}\" is not a valid regex ({reason})."
    )]
    InvalidRegex {
        key: String,
        pattern: String,
        reason: String,
    },

    #[error(
        "Config error: invalid tag pattern for \"{key}\". \"{pattern}\" must have exactly one capture group."
    )]
    CaptureGroups { key: String, pattern: String },

    #[error("Config error: could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum OriginError {
    #[error("import task has no paths")]
    NoPaths,

    #[error("album path {0} is not valid UTF-8")]
    NonUtf8Path(PathBuf),

    #[error("invalid origin file pattern {pattern}: {source}")]
    Glob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("failed to read origin file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in origin file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed YAML in origin file {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

pub type Result<T, E = OriginError> = std::result::Result<T, E>;
