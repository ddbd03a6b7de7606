//! Parsers for Godot's text formats.
//!
//! - `scene`: `.tscn` scene descriptions
//! - `resource`: `.tres` resource headers
//! - `project`: the `project.godot` configuration
//!
//! Scene and resource files share the bracketed block-header syntax
//! (`[kind key="value" ...]`); the helpers here read those headers.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

pub mod project;
pub mod resource;
pub mod scene;

pub use project::{parse_project, parse_project_text, Autoload, ProjectConfig, PROJECT_FILE};
pub use resource::{parse_resource, parse_resource_text, ResourceHeader, ScriptReference};
pub use scene::{
    node_depth, parse_scene, parse_scene_text, Connection, ExtResource, SceneDescriptor,
    SceneNode, SceneRoot, SubResource,
};

lazy_static! {
    /// A whole-line block header: `[kind attrs...]`.
    static ref BLOCK_HEADER: Regex = Regex::new(r"^\[(\w+)(?:\s+(.*))?\]\s*$").unwrap();
    /// `key=value` where value is quoted, call-shaped, an array, or a bare token.
    static ref ATTRIBUTE: Regex = Regex::new(
        r#"(\w+)\s*=\s*("(?:[^"\\]|\\.)*"|\w+\([^)]*\)|\[[^\]]*\]|[^\s\]]+)"#
    )
    .unwrap();
    static ref EXT_RESOURCE_CALL: Regex =
        Regex::new(r#"ExtResource\(\s*"?([^")\s]+)"?\s*\)"#).unwrap();
}

/// Prefix of project-rooted resource paths.
pub const RES_PREFIX: &str = "res://";

/// A parsed `[kind key=value ...]` header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub kind: String,
    pub attrs: BTreeMap<String, String>,
}

impl BlockHeader {
    /// Parse one line; `None` if it is not a block header.
    pub fn parse(line: &str) -> Option<Self> {
        let caps = BLOCK_HEADER.captures(line.trim())?;
        let attrs = caps
            .get(2)
            .map(|m| parse_attributes(m.as_str()))
            .unwrap_or_default();
        Some(Self {
            kind: caps[1].to_string(),
            attrs,
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// Attribute value, or `None` if absent or empty.
    pub fn non_empty(&self, key: &str) -> Option<String> {
        self.get(key).filter(|v| !v.is_empty()).map(str::to_string)
    }
}

/// Parse an attribute list. Quoted values are unquoted; other values are kept
/// verbatim. Later duplicates overwrite earlier ones.
pub fn parse_attributes(text: &str) -> BTreeMap<String, String> {
    ATTRIBUTE
        .captures_iter(text)
        .map(|caps| (caps[1].to_string(), unquote(&caps[2])))
        .collect()
}

/// Id inside an `ExtResource("id")` / `ExtResource(id)` call.
pub fn ext_resource_id(value: &str) -> Option<&str> {
    EXT_RESOURCE_CALL
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Map a `res://` path to a project-relative key. Other paths pass through.
pub fn res_to_relative(path: &str) -> &str {
    path.strip_prefix(RES_PREFIX).unwrap_or(path)
}

fn unquote(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        value[1..value.len() - 1].replace("\\\"", "\"")
    } else {
        value.to_string()
    }
}
