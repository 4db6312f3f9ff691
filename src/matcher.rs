//! Origin document loading and per-field pattern matching.
//!
//! Text origin files are scanned line by line with one regex per field.
//! JSON and YAML files are parsed into a single `serde_json::Value` tree and
//! queried with JSONPath, so both formats share one query engine.

use regex::Regex;
use serde_json::Value;
use serde_json_path::JsonPath;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{ConfigError, OriginError, Result};
use crate::models::FieldKey;

// ============================================================================
// Document Types
// ============================================================================

/// Format of the origin file, chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginKind {
    Text,
    Json,
    Yaml,
}

impl OriginKind {
    /// Infer the format from the origin file name: .json, .yaml/.yml, anything else is text.
    pub fn infer(origin_file: &Path) -> Self {
        let ext = origin_file
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("json") => OriginKind::Json,
            Some("yaml") | Some("yml") => OriginKind::Yaml,
            _ => OriginKind::Text,
        }
    }

    pub fn is_tree(self) -> bool {
        matches!(self, OriginKind::Json | OriginKind::Yaml)
    }
}

impl FromStr for OriginKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OriginKind::Text),
            "json" => Ok(OriginKind::Json),
            "yaml" => Ok(OriginKind::Yaml),
            other => Err(other.to_string()),
        }
    }
}

// ============================================================================
// Patterns
// ============================================================================

/// Compiled pattern for one field.
#[derive(Debug, Clone)]
pub enum TagPattern {
    /// JSONPath query into a JSON/YAML tree
    Path(JsonPath),
    /// Regex with exactly one capture group, matched at the start of each line
    Line(Regex),
}

impl TagPattern {
    /// Compile a configured pattern for the given document type.
    /// Errors here disable the plugin, so nothing can fail at match time.
    pub fn compile(key: FieldKey, pattern: &str, kind: OriginKind) -> std::result::Result<Self, ConfigError> {
        if kind.is_tree() {
            return JsonPath::parse(&rooted_path(pattern))
                .map(TagPattern::Path)
                .map_err(|e| ConfigError::InvalidPath {
                    key: key.to_string(),
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                });
        }

        let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidRegex {
            key: key.to_string(),
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        // captures_len counts the implicit whole-match group
        if regex.captures_len() != 2 {
            return Err(ConfigError::CaptureGroups {
                key: key.to_string(),
                pattern: pattern.to_string(),
            });
        }
        Ok(TagPattern::Line(regex))
    }
}

/// Queries written relative to the document ("Media", "release.label") get an explicit root.
/// Dotted members are then brought into RFC 9535 form, see `bracket_members`.
fn rooted_path(pattern: &str) -> String {
    let trimmed = pattern.trim();
    let rooted = if trimmed.starts_with('$') {
        trimmed.to_string()
    } else if trimmed.starts_with('[') {
        format!("${}", trimmed)
    } else {
        format!("$.{}", trimmed)
    };
    bracket_members(&rooted)
}

/// Rewrite dotted members that RFC 9535 shorthand can't express as bracket
/// selectors: quoted members (`$."Catalog number"`, `$.'Catalog number'`) and
/// bare names with spaces or punctuation (`$.Record label`).
///
/// Bracketed segments, including filter expressions, are copied untouched.
fn bracket_members(path: &str) -> String {
    let chars: Vec<char> = path.chars().collect();
    let mut out = String::with_capacity(path.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '[' => {
                let end = bracket_end(&chars, i);
                out.extend(&chars[i..end]);
                i = end;
            }
            '.' => {
                let descendant = chars.get(i + 1) == Some(&'.');
                i += if descendant { 2 } else { 1 };
                let prefix = if descendant { ".." } else { "." };

                match chars.get(i) {
                    Some(&quote) if quote == '"' || quote == '\'' => {
                        let start = i + 1;
                        let close = chars[start..]
                            .iter()
                            .position(|&c| c == quote)
                            .map(|p| start + p);
                        let Some(close) = close else {
                            // Unterminated quote; leave it for the parser to reject
                            out.push_str(prefix);
                            out.extend(&chars[i..]);
                            break;
                        };
                        let name: String = chars[start..close].iter().collect();
                        push_bracketed(&mut out, descendant, &name);
                        i = close + 1;
                    }
                    _ => {
                        let start = i;
                        while i < chars.len() && chars[i] != '.' && chars[i] != '[' {
                            i += 1;
                        }
                        let name: String = chars[start..i].iter().collect();
                        if name.is_empty() || name == "*" || is_shorthand_name(&name) {
                            out.push_str(prefix);
                            out.push_str(&name);
                        } else {
                            push_bracketed(&mut out, descendant, name.trim_end());
                        }
                    }
                }
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Index one past the `]` closing the bracket opened at `open`, skipping quoted strings.
fn bracket_end(chars: &[char], open: usize) -> usize {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut i = open;
    while i < chars.len() {
        let c = chars[i];
        match quote {
            Some(_) if c == '\\' => i += 1,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '[' => depth += 1,
                ']' => {
                    depth -= 1;
                    if depth == 0 {
                        return i + 1;
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }
    chars.len()
}

fn push_bracketed(out: &mut String, descendant: bool, name: &str) {
    if descendant {
        out.push_str("..");
    }
    out.push_str("['");
    for c in name.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push_str("']");
}

/// RFC 9535 member-name-shorthand: a letter, `_` or non-ASCII first, then also digits.
fn is_shorthand_name(name: &str) -> bool {
    let mut chars = name.chars();
    let first_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || !c.is_ascii());
    first_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || !c.is_ascii())
}

// ============================================================================
// Documents
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Body {
    Lines(Vec<String>),
    Tree(Value),
}

/// A loaded origin file, ready to be matched against the configured patterns.
#[derive(Debug, Clone, PartialEq)]
pub struct OriginDocument {
    kind: OriginKind,
    body: Body,
}

impl OriginDocument {
    /// Read and parse an origin file. Read and parse failures are returned to the caller.
    pub fn load(path: &Path, kind: OriginKind) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| OriginError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, kind, path)
    }

    /// Parse origin file contents; `path` is only used for error messages.
    pub fn parse(contents: &str, kind: OriginKind, path: &Path) -> Result<Self> {
        let body = match kind {
            OriginKind::Text => Body::Lines(contents.lines().map(|l| l.trim().to_string()).collect()),
            OriginKind::Json => Body::Tree(serde_json::from_str(contents).map_err(|source| {
                OriginError::Json {
                    path: path.to_path_buf(),
                    source,
                }
            })?),
            OriginKind::Yaml => {
                let yaml: serde_yaml::Value =
                    serde_yaml::from_str(contents).map_err(|source| OriginError::Yaml {
                        path: path.to_path_buf(),
                        source,
                    })?;
                Body::Tree(yaml_to_json(yaml))
            }
        };
        Ok(Self { kind, body })
    }

    pub fn kind(&self) -> OriginKind {
        self.kind
    }

    /// Lazily match every pattern against this document.
    pub fn matches<'a>(&'a self, patterns: &'a [(FieldKey, TagPattern)]) -> Matches<'a> {
        Matches {
            document: self,
            patterns: patterns.iter(),
        }
    }

    fn match_one(&self, pattern: &TagPattern) -> Option<String> {
        match (&self.body, pattern) {
            (Body::Lines(lines), TagPattern::Line(regex)) => lines.iter().find_map(|line| {
                let caps = regex.captures(line)?;
                // Anchored at line start: the leftmost match starts at 0 if any match does
                if caps.get(0)?.start() != 0 {
                    return None;
                }
                caps.get(1).map(|m| m.as_str().to_string())
            }),
            (Body::Tree(root), TagPattern::Path(path)) => {
                let node = path.query(root).first()?;
                if self.kind == OriginKind::Yaml && is_falsy(node) {
                    return None;
                }
                Some(stringify(node))
            }
            // Patterns are compiled for the configured kind, so other pairs never match
            _ => None,
        }
    }
}

/// Iterator over (field, raw value) pairs, at most one per configured pattern.
/// Fields without a matching node or line are skipped.
pub struct Matches<'a> {
    document: &'a OriginDocument,
    patterns: std::slice::Iter<'a, (FieldKey, TagPattern)>,
}

impl<'a> Iterator for Matches<'a> {
    type Item = (FieldKey, String);

    fn next(&mut self) -> Option<Self::Item> {
        for (key, pattern) in self.patterns.by_ref() {
            if let Some(value) = self.document.match_one(pattern) {
                return Some((*key, value));
            }
        }
        None
    }
}

// ============================================================================
// Value Helpers
// ============================================================================

/// Render a matched node as the string stored in the comparison table.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Convert a YAML tree into a JSON tree. Non-string mapping keys are stringified.
pub fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(seq) => Value::Array(seq.into_iter().map(yaml_to_json).collect()),
        serde_yaml::Value::Mapping(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (yaml_key(k), yaml_to_json(v)))
                .collect(),
        ),
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Bool(b) => b.to_string(),
        other => stringify(&yaml_to_json(other)),
    }
}
