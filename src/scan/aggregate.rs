//! Single-writer assembly of per-file results into an `ArchitectureReport`.

use std::collections::{BTreeMap, BTreeSet};

use phf::phf_map;
use tracing::warn;

use crate::analysis::ScriptSymbolTable;
use crate::formats::{res_to_relative, ProjectConfig, ResourceHeader, SceneDescriptor, RES_PREFIX};
use crate::report::{
    ArchitectureReport, AssetCategory, DependencyEdge, ReportStats, ReportWarning,
    SignalDefinition, SignalEntry,
};

/// Asset category by lowercase extension.
static ASSET_EXTENSIONS: phf::Map<&'static str, AssetCategory> = phf_map! {
    "png" => AssetCategory::Images,
    "jpg" => AssetCategory::Images,
    "jpeg" => AssetCategory::Images,
    "webp" => AssetCategory::Images,
    "svg" => AssetCategory::Images,
    "bmp" => AssetCategory::Images,
    "wav" => AssetCategory::Audio,
    "ogg" => AssetCategory::Audio,
    "mp3" => AssetCategory::Audio,
    "opus" => AssetCategory::Audio,
    "ttf" => AssetCategory::Fonts,
    "otf" => AssetCategory::Fonts,
    "woff" => AssetCategory::Fonts,
    "woff2" => AssetCategory::Fonts,
    "glb" => AssetCategory::Models,
    "gltf" => AssetCategory::Models,
    "obj" => AssetCategory::Models,
    "fbx" => AssetCategory::Models,
    "dae" => AssetCategory::Models,
    "gdshader" => AssetCategory::Shaders,
    "gdshaderinc" => AssetCategory::Shaders,
    "shader" => AssetCategory::Shaders,
    "json" => AssetCategory::Data,
    "cfg" => AssetCategory::Data,
    "ini" => AssetCategory::Data,
    "csv" => AssetCategory::Data,
    "xml" => AssetCategory::Data,
};

/// Extensions of project bookkeeping and documentation, never counted as assets.
const NON_ASSET_EXTENSIONS: [&str; 5] = ["godot", "gdignore", "gitignore", "md", "txt"];

/// Category of a file extension, or `None` for non-asset files.
pub fn categorize(ext: &str) -> Option<AssetCategory> {
    if NON_ASSET_EXTENSIONS.contains(&ext) {
        return None;
    }
    Some(
        ASSET_EXTENSIONS
            .get(ext)
            .copied()
            .unwrap_or(AssetCategory::Other),
    )
}

/// Accumulates per-file results in traversal order.
#[derive(Default)]
pub struct ReportBuilder {
    scripts: BTreeMap<String, ScriptSymbolTable>,
    scenes: BTreeMap<String, SceneDescriptor>,
    resources: BTreeMap<String, ResourceHeader>,
    other_files: BTreeMap<String, Vec<String>>,
    class_registry: BTreeMap<String, String>,
    /// Every declaring file per class name, in traversal order.
    declarations: BTreeMap<String, Vec<String>>,
    sources: BTreeMap<String, String>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a script; its class name overwrites any earlier registration.
    pub fn add_script(&mut self, table: ScriptSymbolTable, source: Option<String>) {
        if let Some(class) = &table.class_name {
            self.class_registry.insert(class.clone(), table.path.clone());
            self.declarations
                .entry(class.clone())
                .or_default()
                .push(table.path.clone());
        }
        if let Some(source) = source {
            self.sources.insert(table.path.clone(), source);
        }
        self.scripts.insert(table.path.clone(), table);
    }

    pub fn add_scene(&mut self, path: String, scene: SceneDescriptor) {
        self.scenes.insert(path, scene);
    }

    pub fn add_resource(&mut self, path: String, header: ResourceHeader) {
        self.resources.insert(path, header);
    }

    pub fn add_other(&mut self, ext: String, path: String) {
        self.other_files.entry(ext).or_default().push(path);
    }

    /// Build derived indexes and freeze the report.
    pub fn finish(self, root: String, project: ProjectConfig) -> ArchitectureReport {
        let signal_connections = self.signal_connections();
        let signals = self.signal_entries(&signal_connections);
        let dependencies = self.dependencies();
        let assets = self.assets();
        let warnings = self.warnings(&project);
        let stats = self.stats(&project);

        ArchitectureReport {
            root,
            project,
            class_registry: self.class_registry,
            scripts: self.scripts,
            scenes: self.scenes,
            resources: self.resources,
            other_files: self.other_files,
            assets,
            signal_connections,
            signals,
            dependencies,
            stats,
            warnings,
            sources: self.sources,
        }
    }

    fn signal_connections(&self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (path, scene) in &self.scenes {
            let names: BTreeSet<&str> = scene.connections.iter().map(|c| c.signal.as_str()).collect();
            for name in names {
                map.entry(name.to_string()).or_default().push(path.clone());
            }
        }
        map
    }

    fn signal_entries(&self, connections: &BTreeMap<String, Vec<String>>) -> Vec<SignalEntry> {
        let mut entries: BTreeMap<&str, SignalEntry> = BTreeMap::new();

        for (path, table) in &self.scripts {
            for signal in &table.body.signals {
                entries
                    .entry(signal.name.as_str())
                    .or_insert_with(|| SignalEntry {
                        name: signal.name.clone(),
                        definitions: Vec::new(),
                        connected_in: Vec::new(),
                    })
                    .definitions
                    .push(SignalDefinition {
                        file: path.clone(),
                        params: signal.params.clone(),
                    });
            }
        }

        for (name, scenes) in connections {
            entries
                .entry(name.as_str())
                .or_insert_with(|| SignalEntry {
                    name: name.clone(),
                    definitions: Vec::new(),
                    connected_in: Vec::new(),
                })
                .connected_in = scenes.clone();
        }

        entries.into_values().collect()
    }

    fn dependencies(&self) -> BTreeMap<String, Vec<DependencyEdge>> {
        let mut graph = BTreeMap::new();
        for (path, table) in &self.scripts {
            let mut edges = Vec::new();
            if let Some(base) = &table.base {
                if let Some(file) = self.resolve_base(base) {
                    edges.push(DependencyEdge::Extends {
                        class: base.clone(),
                        file,
                    });
                }
            }
            edges.extend(
                table
                    .dependencies
                    .iter()
                    .map(|p| DependencyEdge::Loads { path: p.clone() }),
            );
            if !edges.is_empty() {
                graph.insert(path.clone(), edges);
            }
        }
        graph
    }

    /// A base type names a registered class or a scanned script path.
    fn resolve_base(&self, base: &str) -> Option<String> {
        if let Some(file) = self.class_registry.get(base) {
            return Some(file.clone());
        }
        if base.starts_with(RES_PREFIX) {
            let rel = res_to_relative(base);
            if self.scripts.contains_key(rel) {
                return Some(rel.to_string());
            }
        }
        None
    }

    fn assets(&self) -> BTreeMap<AssetCategory, Vec<String>> {
        let mut assets: BTreeMap<AssetCategory, Vec<String>> = BTreeMap::new();
        for (ext, files) in &self.other_files {
            if let Some(category) = categorize(ext) {
                assets.entry(category).or_default().extend(files.iter().cloned());
            }
        }
        for files in assets.values_mut() {
            files.sort();
        }
        assets
    }

    fn warnings(&self, project: &ProjectConfig) -> Vec<ReportWarning> {
        let mut warnings = Vec::new();
        if !project.found {
            warnings.push(ReportWarning::MissingProjectFile);
        }
        for (class, files) in &self.declarations {
            if files.len() < 2 {
                continue;
            }
            let winner = self.class_registry.get(class).cloned().unwrap_or_default();
            warn!(class = %class, files = ?files, winner = %winner, "duplicate class_name");
            warnings.push(ReportWarning::ClassCollision {
                class: class.clone(),
                files: files.clone(),
                winner,
            });
        }
        warnings
    }

    fn stats(&self, project: &ProjectConfig) -> ReportStats {
        let tables = || self.scripts.values();
        ReportStats {
            scripts: self.scripts.len(),
            scenes: self.scenes.len(),
            resources: self.resources.len(),
            total_files: self.scripts.len()
                + self.scenes.len()
                + self.resources.len()
                + self.other_files.values().map(Vec::len).sum::<usize>(),
            classes: self.class_registry.len(),
            functions: tables()
                .map(|t| t.body.functions.len() + t.body.static_functions.len())
                .sum(),
            signals: tables().map(|t| t.body.signals.len()).sum(),
            exports: tables().map(|t| t.body.exported.len()).sum(),
            autoloads: project.autoloads.len(),
            parse_errors: tables().filter(|t| t.is_degraded()).count(),
            unreadable_scenes: self.scenes.values().filter(|s| s.error.is_some()).count(),
        }
    }
}
