//! The assembled architecture report.
//!
//! Every map is keyed by project-relative path (or name) and ordered, so two
//! scans of the same tree serialize identically.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::analysis::{Parameter, ScriptSymbolTable};
use crate::formats::{res_to_relative, ProjectConfig, ResourceHeader, SceneDescriptor};

/// Cross-referenced view of one project. Built once per scan, read-only after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchitectureReport {
    /// Project root as given to the scanner.
    pub root: String,
    pub project: ProjectConfig,
    /// Declared class name to defining script. Last write wins.
    pub class_registry: BTreeMap<String, String>,
    pub scripts: BTreeMap<String, ScriptSymbolTable>,
    pub scenes: BTreeMap<String, SceneDescriptor>,
    pub resources: BTreeMap<String, ResourceHeader>,
    /// Files that are not scripts, scenes or resources, by lowercase extension.
    pub other_files: BTreeMap<String, Vec<String>>,
    pub assets: BTreeMap<AssetCategory, Vec<String>>,
    /// Signal name to the scenes that connect it, in path order.
    pub signal_connections: BTreeMap<String, Vec<String>>,
    pub signals: Vec<SignalEntry>,
    /// Script path to its outgoing edges. Scripts without edges are absent.
    pub dependencies: BTreeMap<String, Vec<DependencyEdge>>,
    pub stats: ReportStats,
    pub warnings: Vec<ReportWarning>,
    /// Script sources, only when full-source capture is enabled.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub sources: BTreeMap<String, String>,
}

impl ArchitectureReport {
    /// Every reported file path, sorted.
    pub fn all_files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = self
            .scripts
            .keys()
            .chain(self.scenes.keys())
            .chain(self.resources.keys())
            .map(String::as_str)
            .chain(self.other_files.values().flatten().map(String::as_str))
            .collect();
        files.sort_unstable();
        files
    }

    /// Scripts that fell back plus scenes that could not be read.
    pub fn error_count(&self) -> usize {
        self.stats.parse_errors + self.stats.unreadable_scenes
    }

    /// The scanned script a `res://` path points at.
    pub fn script_for_res_path(&self, path: &str) -> Option<&ScriptSymbolTable> {
        self.scripts.get(res_to_relative(path))
    }
}

/// Asset buckets for the "other files" index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AssetCategory {
    Images,
    Audio,
    Fonts,
    #[serde(rename = "3D Models")]
    Models,
    Shaders,
    Data,
    Other,
}

impl AssetCategory {
    pub fn label(&self) -> &'static str {
        match self {
            AssetCategory::Images => "Images",
            AssetCategory::Audio => "Audio",
            AssetCategory::Fonts => "Fonts",
            AssetCategory::Models => "3D Models",
            AssetCategory::Shaders => "Shaders",
            AssetCategory::Data => "Data",
            AssetCategory::Other => "Other",
        }
    }
}

/// A directed relation from a script to something it depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DependencyEdge {
    /// Base type resolved to a scanned script.
    Extends { class: String, file: String },
    /// A raw `preload`/`load` path.
    Loads { path: String },
}

impl std::fmt::Display for DependencyEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DependencyEdge::Extends { class, file } => write!(f, "extends {} ({})", class, file),
            DependencyEdge::Loads { path } => write!(f, "loads {}", path),
        }
    }
}

/// Where a signal is declared and where scenes connect it.
///
/// Either side may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignalEntry {
    pub name: String,
    pub definitions: Vec<SignalDefinition>,
    pub connected_in: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignalDefinition {
    pub file: String,
    pub params: Vec<Parameter>,
}

/// Aggregate counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportStats {
    pub scripts: usize,
    pub scenes: usize,
    pub resources: usize,
    /// Reported files; ignored markers are not counted.
    pub total_files: usize,
    pub classes: usize,
    pub functions: usize,
    pub signals: usize,
    pub exports: usize,
    pub autoloads: usize,
    /// Scripts extracted through the fallback path.
    pub parse_errors: usize,
    pub unreadable_scenes: usize,
}

/// Non-fatal findings about the project as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportWarning {
    /// Several scripts declare the same class name; `winner` is the registered one.
    ClassCollision {
        class: String,
        files: Vec<String>,
        winner: String,
    },
    MissingProjectFile,
}

impl std::fmt::Display for ReportWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportWarning::ClassCollision {
                class,
                files,
                winner,
            } => write!(
                f,
                "class_name {} declared in {} files ({}); registry uses {}",
                class,
                files.len(),
                files.join(", "),
                winner
            ),
            ReportWarning::MissingProjectFile => {
                write!(f, "no project.godot found at the project root")
            }
        }
    }
}
