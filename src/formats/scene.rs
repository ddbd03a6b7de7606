//! `.tscn` scene description parser.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::warn;

use super::{ext_resource_id, BlockHeader};

/// Declared types that mark an external resource as a script.
const SCRIPT_TYPES: [&str; 2] = ["Script", "GDScript"];

/// Structure of one scene file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SceneDescriptor {
    pub root: Option<SceneRoot>,
    pub nodes: Vec<SceneNode>,
    pub ext_resources: Vec<ExtResource>,
    pub sub_resources: Vec<SubResource>,
    pub connections: Vec<Connection>,
    /// First script-typed external resource in file order.
    pub script: Option<String>,
    /// Set when the file could not be read; all other fields are then empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneRoot {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneNode {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: Option<String>,
    /// Parent path relative to the root: empty for the root, `.` for its children.
    pub parent: String,
    /// Path of the instanced scene, when the node instances another scene.
    pub instance: Option<String>,
}

impl SceneNode {
    pub fn depth(&self) -> usize {
        node_depth(&self.parent)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtResource {
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    pub path: Option<String>,
    pub id: Option<String>,
}

impl ExtResource {
    pub fn is_script(&self) -> bool {
        self.resource_type
            .as_deref()
            .map_or(false, |t| SCRIPT_TYPES.contains(&t))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubResource {
    #[serde(rename = "type")]
    pub resource_type: String,
}

/// A `[connection]` block wiring a signal to a handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Connection {
    pub signal: String,
    pub from: String,
    pub to: String,
    pub method: String,
}

/// Tree depth from a node's parent marker.
///
/// `""` is the root (0), `"."` a direct child (1); anything else is
/// `slashes + 2`, so `"a/b"` is 3.
pub fn node_depth(parent: &str) -> usize {
    match parent {
        "" => 0,
        "." => 1,
        path => path.matches('/').count() + 2,
    }
}

/// Read and parse a scene file. Read failures are recorded on the descriptor.
pub fn parse_scene(path: &Path) -> SceneDescriptor {
    match fs::read(path) {
        Ok(bytes) => parse_scene_text(&String::from_utf8_lossy(&bytes)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read scene");
            SceneDescriptor {
                error: Some(e.to_string()),
                ..Default::default()
            }
        }
    }
}

/// Parse scene text. Unrecognized lines are ignored.
pub fn parse_scene_text(text: &str) -> SceneDescriptor {
    let mut scene = SceneDescriptor::default();
    let headers: Vec<BlockHeader> = text.lines().filter_map(BlockHeader::parse).collect();

    let mut paths_by_id: HashMap<String, String> = HashMap::new();
    for header in headers.iter().filter(|h| h.kind == "ext_resource") {
        let resource = ExtResource {
            resource_type: header.non_empty("type"),
            path: header.non_empty("path"),
            id: header.non_empty("id"),
        };
        if let (Some(id), Some(path)) = (&resource.id, &resource.path) {
            paths_by_id.insert(id.clone(), path.clone());
        }
        scene.ext_resources.push(resource);
    }

    for header in &headers {
        match header.kind.as_str() {
            "sub_resource" => {
                if let Some(resource_type) = header.non_empty("type") {
                    scene.sub_resources.push(SubResource { resource_type });
                }
            }
            "node" => {
                let instance = header.get("instance").map(|value| {
                    ext_resource_id(value)
                        .and_then(|id| paths_by_id.get(id).cloned())
                        .unwrap_or_else(|| value.to_string())
                });
                scene.nodes.push(SceneNode {
                    name: header.non_empty("name").unwrap_or_else(|| "?".to_string()),
                    node_type: header.non_empty("type"),
                    parent: header.get("parent").unwrap_or_default().to_string(),
                    instance,
                });
            }
            "connection" => {
                let field = |key| header.get(key).map(str::to_string);
                if let (Some(signal), Some(from), Some(to), Some(method)) =
                    (field("signal"), field("from"), field("to"), field("method"))
                {
                    scene.connections.push(Connection {
                        signal,
                        from,
                        to,
                        method,
                    });
                }
            }
            _ => {}
        }
    }

    scene.root = scene.nodes.first().map(|node| SceneRoot {
        name: node.name.clone(),
        node_type: node.node_type.clone().unwrap_or_else(|| "?".to_string()),
    });

    scene.script = scene
        .ext_resources
        .iter()
        .find(|r| r.is_script())
        .and_then(|r| r.path.clone());

    scene
}
