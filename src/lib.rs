//! Origin file comparison for album imports - shared modules for all binaries.

pub mod compare;
pub mod config;
pub mod error;
pub mod host;
pub mod matcher;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod report;
pub mod safety;

pub use compare::OriginQuery;
pub use config::{HostConfig, PluginConfig};
pub use error::{ConfigError, OriginError};
pub use models::{FieldKey, FieldValue, TagCompare, TagCompareEntry, TaskContext};
