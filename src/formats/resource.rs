//! `.tres` resource header parser.
//!
//! Only the leading header region is inspected; resource bodies are never
//! parsed.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use super::{ext_resource_id, BlockHeader};

/// Lines read from the top of a resource file.
pub const HEADER_LINES: usize = 31;

lazy_static! {
    static ref RESOURCE_TYPE: Regex =
        Regex::new(r#"\[gd_resource\b[^\]\n]*?\btype="([^"]*)""#).unwrap();
    static ref CLASS_NAME: Regex =
        Regex::new(r#"\b(?:script_class|class_name)\s*=\s*"([^"]*)""#).unwrap();
    static ref INLINE_SOURCE: Regex =
        Regex::new(r#"(?m)^\s*script/source\s*=\s*"((?:[^"\\]|\\.)*)""#).unwrap();
    static ref EXTERNAL_SCRIPT: Regex =
        Regex::new(r#"(?m)^\s*script\s*=\s*(ExtResource\([^)]*\))"#).unwrap();
}

/// Declared type and script of a resource file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceHeader {
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    pub class_name: Option<String>,
    pub script: Option<ScriptReference>,
}

impl ResourceHeader {
    /// Script path, when the reference names one.
    pub fn script_path(&self) -> Option<&str> {
        match self.script.as_ref()? {
            ScriptReference::External { path, .. } => path.as_deref(),
            ScriptReference::Inline { .. } => None,
        }
    }
}

/// The two header encodings of an attached script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptReference {
    /// `script/source = "..."` embedded in the resource.
    Inline { source: String },
    /// `script = ExtResource("id")`, with the path if the id is declared in the header.
    External { id: String, path: Option<String> },
}

/// Read the header of a resource file. Read failures yield an empty header.
pub fn parse_resource(path: &Path) -> ResourceHeader {
    match read_header(path) {
        Ok(header) => parse_resource_text(&header),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "cannot read resource");
            ResourceHeader::default()
        }
    }
}

fn read_header(path: &Path) -> std::io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut header = String::new();
    let mut buf = Vec::new();
    for _ in 0..HEADER_LINES {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        header.push_str(&String::from_utf8_lossy(&buf));
    }
    Ok(header)
}

/// Parse header text. Callers pass at most `HEADER_LINES` lines.
pub fn parse_resource_text(header: &str) -> ResourceHeader {
    let resource_type = RESOURCE_TYPE.captures(header).map(|c| c[1].to_string());
    let class_name = CLASS_NAME.captures(header).map(|c| c[1].to_string());

    let mut script = INLINE_SOURCE.captures(header).map(|c| ScriptReference::Inline {
        source: c[1].to_string(),
    });

    // the external form wins when both are present
    if let Some(id) = EXTERNAL_SCRIPT
        .captures(header)
        .and_then(|c| ext_resource_id(c.get(1)?.as_str()).map(str::to_string))
    {
        let path = header
            .lines()
            .filter_map(BlockHeader::parse)
            .filter(|h| h.kind == "ext_resource" && h.get("id") == Some(id.as_str()))
            .find_map(|h| h.non_empty("path"));
        script = Some(ScriptReference::External { id, path });
    }

    ResourceHeader {
        resource_type,
        class_name,
        script,
    }
}
