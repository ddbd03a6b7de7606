//! `project.godot` configuration parser.

use std::fs;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

/// Configuration file name at the project root.
pub const PROJECT_FILE: &str = "project.godot";

const UNKNOWN_NAME: &str = "Unknown";

lazy_static! {
    static ref SECTION: Regex = Regex::new(r"^\[([^\]]+)\]\s*$").unwrap();
    static ref NAME: Regex = Regex::new(r#"(?m)^\s*config/name\s*=\s*"([^"]*)""#).unwrap();
    static ref MAIN_SCENE: Regex =
        Regex::new(r#"(?m)^\s*run/main_scene\s*=\s*"([^"]*)""#).unwrap();
    static ref FEATURES: Regex =
        Regex::new(r"(?m)^\s*config/features\s*=\s*PackedStringArray\(([^)]*)\)").unwrap();
    static ref RENDERER: Regex = Regex::new(
        r#"(?m)^\s*(?:rendering/)?renderer/rendering_method(?:\.mobile)?\s*=\s*"([^"]*)""#
    )
    .unwrap();
    static ref AUTOLOAD: Regex =
        Regex::new(r#"^(\w+)\s*=\s*"(\*?)((?:res|uid)://[^"]*)""#).unwrap();
    static ref INPUT_ACTION: Regex = Regex::new(r"^(\w+)\s*=\s*\{").unwrap();
    static ref VERSION: Regex = Regex::new(r"^\d+\.\d+$").unwrap();
}

/// Project-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectConfig {
    /// Whether `project.godot` existed and was readable.
    pub found: bool,
    pub name: String,
    pub main_scene: Option<String>,
    pub features: Vec<String>,
    /// First feature shaped like `N.M`.
    pub engine_version: Option<String>,
    pub renderer: Option<String>,
    pub autoloads: Vec<Autoload>,
    pub input_actions: Vec<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            found: false,
            name: UNKNOWN_NAME.to_string(),
            main_scene: None,
            features: Vec::new(),
            engine_version: None,
            renderer: None,
            autoloads: Vec::new(),
            input_actions: Vec::new(),
        }
    }
}

/// A singleton registered under `[autoload]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Autoload {
    pub name: String,
    /// Resource path with the `*` marker removed.
    pub path: String,
    /// `*`-prefixed entries are registered as globals.
    pub global: bool,
}

/// Parse `project.godot` under `root`. A missing or unreadable file yields defaults.
pub fn parse_project(root: &Path) -> ProjectConfig {
    let path = root.join(PROJECT_FILE);
    if !path.is_file() {
        debug!(path = %path.display(), "no project file");
        return ProjectConfig::default();
    }
    match fs::read(&path) {
        Ok(bytes) => parse_project_text(&String::from_utf8_lossy(&bytes)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read project file");
            ProjectConfig::default()
        }
    }
}

/// Parse configuration text.
pub fn parse_project_text(text: &str) -> ProjectConfig {
    let mut config = ProjectConfig {
        found: true,
        ..Default::default()
    };

    if let Some(caps) = NAME.captures(text) {
        config.name = caps[1].to_string();
    }
    config.main_scene = MAIN_SCENE.captures(text).map(|c| c[1].to_string());
    config.renderer = RENDERER.captures(text).map(|c| c[1].to_string());

    if let Some(caps) = FEATURES.captures_iter(text).last() {
        config.features = caps[1]
            .split(',')
            .map(|f| f.trim().trim_matches('"').to_string())
            .filter(|f| !f.is_empty())
            .collect();
    }
    config.engine_version = config
        .features
        .iter()
        .find(|f| VERSION.is_match(f))
        .cloned();

    let mut section: Option<&str> = None;
    for raw in text.lines() {
        let line = raw.trim();
        if let Some(caps) = SECTION.captures(line) {
            section = caps.get(1).map(|m| m.as_str());
            continue;
        }
        match section {
            Some("autoload") => {
                if let Some(caps) = AUTOLOAD.captures(line) {
                    config.autoloads.push(Autoload {
                        name: caps[1].to_string(),
                        path: caps[3].to_string(),
                        global: !caps[2].is_empty(),
                    });
                }
            }
            Some("input") => {
                if let Some(caps) = INPUT_ACTION.captures(line) {
                    config.input_actions.push(caps[1].to_string());
                }
            }
            _ => {}
        }
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_section_scoped_entries() {
        let config = parse_project_text(
            "Foo=\"*res://early.gd\"\nFoo={}\n[autoload]\nFoo=\"*res://auto/foo.gd\"\n[input]\nFoo={}\n",
        );
        assert_eq!(
            config.autoloads,
            vec![Autoload {
                name: "Foo".to_string(),
                path: "res://auto/foo.gd".to_string(),
                global: true,
            }]
        );
        assert_eq!(config.input_actions, vec!["Foo"]);
    }

    #[test]
    fn test_wrong_section_is_excluded() {
        let config = parse_project_text(
            "[application]\nBar=\"res://bar.gd\"\n[autoload]\nMusic=\"res://music.tscn\"\n[display]\njump={\n",
        );
        assert_eq!(config.autoloads.len(), 1);
        assert_eq!(config.autoloads[0].name, "Music");
        assert!(!config.autoloads[0].global);
        assert!(config.input_actions.is_empty());
    }

    #[test]
    fn test_application_settings() {
        let config = parse_project_text(
            r#"config_version=5

[application]

config/name="Space Miner"
run/main_scene="res://scenes/main.tscn"
config/features=PackedStringArray("4.3", "GL Compatibility")
config/icon="res://icon.svg"

[input]

move_left={
"deadzone": 0.5,
"events": []
}
shoot={
"deadzone": 0.5,
"events": []
}

[rendering]

renderer/rendering_method.mobile="gl_compatibility"
"#,
        );
        assert!(config.found);
        assert_eq!(config.name, "Space Miner");
        assert_eq!(config.main_scene.as_deref(), Some("res://scenes/main.tscn"));
        assert_eq!(config.features, vec!["4.3", "GL Compatibility"]);
        assert_eq!(config.engine_version.as_deref(), Some("4.3"));
        assert_eq!(config.input_actions, vec!["move_left", "shoot"]);
        assert_eq!(config.renderer.as_deref(), Some("gl_compatibility"));
    }

    #[test]
    fn test_missing_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = parse_project(dir.path());
        assert!(!config.found);
        assert_eq!(config.name, "Unknown");
        assert_eq!(config.main_scene, None);
        assert!(config.autoloads.is_empty());
    }
}
