//! Markdown rendering.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::analysis::{format_params, Function, Property, ScriptSymbolTable};
use crate::formats::{SceneDescriptor, ScriptReference};
use crate::report::{ArchitectureReport, AssetCategory};

use super::RenderOptions;

const INDENT: &str = "  ";
const NONE: &str = "—";

/// Render the full document. Sections with nothing to show are omitted.
pub fn render_markdown(report: &ArchitectureReport, options: &RenderOptions) -> String {
    let sections = [
        header(report),
        project_overview(report),
        directory_tree(report),
        autoloads(report),
        class_registry(report),
        scene_map(report),
        scripts_detail(report),
        signal_map(report),
        resources(report),
        asset_summary(report, options),
        dependency_graph(report),
        full_source(report),
        warnings(report),
        stats_footer(report),
    ];

    let mut out = sections
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    out.push('\n');
    out
}

fn header(report: &ArchitectureReport) -> String {
    format!(
        "# Project Architecture: {}\n\n> **Path:** `{}`\n> **Generator:** gdarch {}\n\n---",
        report.project.name,
        report.root,
        env!("CARGO_PKG_VERSION")
    )
}

fn project_overview(report: &ArchitectureReport) -> String {
    let cfg = &report.project;
    let mut lines = vec![
        "## 1. Project Overview".to_string(),
        String::new(),
        "| Property | Value |".to_string(),
        "|----------|-------|".to_string(),
        format!("| **Project Name** | {} |", cfg.name),
    ];
    if let Some(version) = &cfg.engine_version {
        lines.push(format!("| **Engine Version** | {} |", version));
    }
    if !cfg.features.is_empty() {
        lines.push(format!("| **Engine Features** | {} |", cfg.features.join(", ")));
    }
    if let Some(scene) = &cfg.main_scene {
        lines.push(format!("| **Main Scene** | `{}` |", scene));
    }
    if let Some(renderer) = &cfg.renderer {
        lines.push(format!("| **Renderer** | {} |", renderer));
    }
    lines.push(format!("| **Scripts** | {} |", report.stats.scripts));
    lines.push(format!("| **Scenes** | {} |", report.stats.scenes));
    lines.push(format!("| **Resources (.tres)** | {} |", report.stats.resources));
    if !cfg.input_actions.is_empty() {
        let actions: Vec<String> = cfg.input_actions.iter().map(|a| format!("`{}`", a)).collect();
        lines.push(format!("| **Input Actions** | {} |", actions.join(", ")));
    }
    lines.join("\n")
}

fn directory_tree(report: &ArchitectureReport) -> String {
    let mut lines = vec![
        "## 2. Directory Structure".to_string(),
        String::new(),
        "```".to_string(),
    ];
    let mut seen_dirs: BTreeSet<String> = BTreeSet::new();
    for file in report.all_files() {
        let parts: Vec<&str> = file.split('/').collect();
        for i in 0..parts.len() - 1 {
            let dir = parts[..=i].join("/");
            if seen_dirs.insert(dir) {
                lines.push(format!("{}{}/", INDENT.repeat(i), parts[i]));
            }
        }
        lines.push(format!(
            "{}{}",
            INDENT.repeat(parts.len() - 1),
            parts[parts.len() - 1]
        ));
    }
    lines.push("```".to_string());
    lines.join("\n")
}

fn autoloads(report: &ArchitectureReport) -> String {
    if report.project.autoloads.is_empty() {
        return String::new();
    }
    let mut lines = vec![
        "## 3. Autoloads (Singletons)".to_string(),
        String::new(),
        "| Name | Path | Type |".to_string(),
        "|------|------|------|".to_string(),
    ];
    for autoload in &report.project.autoloads {
        let type_info = report
            .script_for_res_path(&autoload.path)
            .map(type_label)
            .unwrap_or_default();
        lines.push(format!(
            "| **{}** | `{}` | {} |",
            autoload.name, autoload.path, type_info
        ));
    }
    lines.join("\n")
}

/// `Class (extends Base)`, `Class`, or `Base`.
fn type_label(script: &ScriptSymbolTable) -> String {
    match (&script.class_name, &script.base) {
        (Some(class), Some(base)) => format!("{} (extends {})", class, base),
        (Some(class), None) => class.clone(),
        (None, Some(base)) => base.clone(),
        (None, None) => String::new(),
    }
}

fn class_registry(report: &ArchitectureReport) -> String {
    if report.class_registry.is_empty() {
        return String::new();
    }
    let mut lines = vec![
        "## 4. Class Registry (class_name)".to_string(),
        String::new(),
        "| Class Name | File | Extends |".to_string(),
        "|------------|------|---------|".to_string(),
    ];
    for (class, file) in &report.class_registry {
        let base = report
            .scripts
            .get(file)
            .and_then(|s| s.base.as_deref())
            .unwrap_or("?");
        lines.push(format!("| `{}` | `{}` | `{}` |", class, file, base));
    }
    lines.join("\n")
}

fn scene_map(report: &ArchitectureReport) -> String {
    if report.scenes.is_empty() {
        return String::new();
    }
    let mut lines = vec!["## 5. Scene Map".to_string(), String::new()];
    for (path, scene) in &report.scenes {
        lines.push(format!("### `{}`", path));
        if let Some(error) = &scene.error {
            lines.push(format!("> Read error: {}", error));
            lines.push(String::new());
            continue;
        }
        if let Some(root) = &scene.root {
            lines.push(format!("- **Root:** {} ({})", root.name, root.node_type));
        }
        if let Some(script) = &scene.script {
            lines.push(format!("- **Script:** `{}`", script));
        }

        lines.push(String::new());
        lines.push("```".to_string());
        lines.push(node_tree(scene));
        lines.push("```".to_string());

        if !scene.connections.is_empty() {
            lines.push(String::new());
            lines.push("**Signal Connections:**".to_string());
            for c in &scene.connections {
                lines.push(format!(
                    "- `{}`.{} → `{}`.{}()",
                    c.from, c.signal, c.to, c.method
                ));
            }
        }

        let resources: Vec<_> = scene
            .ext_resources
            .iter()
            .filter(|r| r.resource_type.is_some() && !r.is_script())
            .collect();
        if !resources.is_empty() {
            lines.push(String::new());
            lines.push("**External Resources:**".to_string());
            for r in resources {
                lines.push(format!(
                    "- [{}] `{}`",
                    r.resource_type.as_deref().unwrap_or("?"),
                    r.path.as_deref().unwrap_or("?")
                ));
            }
        }
        lines.push(String::new());
    }
    trim_trailing_blank(&mut lines);
    lines.join("\n")
}

/// Depth-indented node tree, one node per line.
pub(crate) fn node_tree(scene: &SceneDescriptor) -> String {
    if scene.nodes.is_empty() {
        return "(empty scene)".to_string();
    }
    scene
        .nodes
        .iter()
        .map(|node| {
            let depth = node.depth();
            let prefix = if depth > 0 {
                format!("{}└─ ", INDENT.repeat(depth))
            } else {
                String::new()
            };
            let type_label = node
                .node_type
                .as_ref()
                .map(|t| format!(" ({})", t))
                .unwrap_or_default();
            let instance = if node.instance.is_some() { " [Instance]" } else { "" };
            format!("{}{}{}{}", prefix, node.name, type_label, instance)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn scripts_detail(report: &ArchitectureReport) -> String {
    if report.scripts.is_empty() {
        return String::new();
    }
    let mut lines = vec!["## 6. Scripts Detail".to_string(), String::new()];
    for (path, script) in &report.scripts {
        lines.push(format!("### `{}`", path));
        if let Some(diagnostic) = &script.diagnostic {
            let short: String = diagnostic.chars().take(100).collect();
            lines.push(format!("> Parser error (used line-based fallback): {}", short));
        }

        let mut header = Vec::new();
        if script.is_tool {
            header.push("@tool".to_string());
        }
        if let Some(class) = &script.class_name {
            header.push(format!("**class_name** `{}`", class));
        }
        if let Some(base) = &script.base {
            header.push(format!("**extends** `{}`", base));
        }
        if !header.is_empty() {
            lines.push(header.join(" | "));
        }

        let body = &script.body;
        if !body.enums.is_empty() {
            lines.push("\n**Enums:**".to_string());
            for e in &body.enums {
                lines.push(format!(
                    "- `{}` {{ {} }}",
                    e.name.as_deref().unwrap_or("(anonymous)"),
                    e.values.join(", ")
                ));
            }
        }
        if !body.constants.is_empty() {
            lines.push("\n**Constants:**".to_string());
            for c in &body.constants {
                match &c.value {
                    Some(value) => lines.push(format!("- `{}` = {}", c.name, value)),
                    None => lines.push(format!("- `{}`", c.name)),
                }
            }
        }
        if !body.signals.is_empty() {
            lines.push("\n**Signals:**".to_string());
            for s in &body.signals {
                lines.push(format!("- `{}({})`", s.name, format_params(&s.params)));
            }
        }
        push_properties(&mut lines, "**Exports:**", &body.exported, true);
        push_properties(&mut lines, "**@onready Variables:**", &body.deferred, false);
        push_properties(&mut lines, "**Variables:**", &body.plain, true);

        let functions: Vec<&Function> = body.all_functions().collect();
        if !functions.is_empty() {
            lines.push("\n**Functions:**".to_string());
            lines.push("| Function | Arguments | Returns | Notes |".to_string());
            lines.push("|----------|-----------|---------|-------|".to_string());
            for f in functions {
                lines.push(function_row(f));
            }
        }

        if !body.inner_types.is_empty() {
            lines.push("\n**Inner Classes:**".to_string());
            for inner in &body.inner_types {
                let base = inner
                    .base
                    .as_ref()
                    .map(|b| format!(" extends {}", b))
                    .unwrap_or_default();
                lines.push(format!("- `class {}{}`", inner.name, base));
                for f in inner.body.all_functions() {
                    lines.push(format!("  - func `{}()`", f.name));
                }
            }
        }

        if !script.dependencies.is_empty() {
            lines.push("\n**Dependencies (preload/load):**".to_string());
            for dep in &script.dependencies {
                lines.push(format!("- `{}`", dep));
            }
        }
        lines.push(String::new());
    }
    trim_trailing_blank(&mut lines);
    lines.join("\n")
}

fn push_properties(lines: &mut Vec<String>, title: &str, props: &[Property], with_default: bool) {
    if props.is_empty() {
        return;
    }
    lines.push(format!("\n{}", title));
    for p in props {
        let mut item = format!("- `{}", p.name);
        if let Some(ty) = &p.ty {
            let _ = write!(item, ": {}", ty);
        }
        if with_default {
            if let Some(default) = &p.default {
                let _ = write!(item, " = {}", default);
            }
        }
        item.push('`');
        lines.push(item);
    }
}

fn function_row(f: &Function) -> String {
    let mut notes = Vec::new();
    if f.is_static {
        notes.push("static");
    }
    if f.name.starts_with('_') {
        notes.push("override/private");
    }
    format!(
        "| `{}` | `({})` | `{}` | {} |",
        f.name,
        format_params(&f.params),
        f.return_type.as_deref().unwrap_or(NONE),
        notes.join(", ")
    )
}

fn signal_map(report: &ArchitectureReport) -> String {
    if report.signals.is_empty() {
        return String::new();
    }
    let mut lines = vec![
        "## 7. Global Signal Map".to_string(),
        String::new(),
        "| Signal | Defined In | Arguments | Connected In |".to_string(),
        "|--------|------------|-----------|--------------|".to_string(),
    ];
    for entry in &report.signals {
        let connected = if entry.connected_in.is_empty() {
            NONE.to_string()
        } else {
            entry
                .connected_in
                .iter()
                .map(|s| format!("`{}`", s))
                .collect::<Vec<_>>()
                .join(", ")
        };
        if entry.definitions.is_empty() {
            lines.push(format!(
                "| `{}` | {} | {} | {} |",
                entry.name, NONE, NONE, connected
            ));
        }
        for def in &entry.definitions {
            lines.push(format!(
                "| `{}` | `{}` | `({})` | {} |",
                entry.name,
                def.file,
                format_params(&def.params),
                connected
            ));
        }
    }
    lines.join("\n")
}

fn resources(report: &ArchitectureReport) -> String {
    if report.resources.is_empty() {
        return String::new();
    }
    let mut lines = vec![
        "## 8. Resources (.tres)".to_string(),
        String::new(),
        "| File | Type | Class | Script |".to_string(),
        "|------|------|-------|--------|".to_string(),
    ];
    for (path, header) in &report.resources {
        let script = match &header.script {
            Some(ScriptReference::External { path: Some(p), .. }) => format!("`{}`", p),
            Some(ScriptReference::External { id, path: None }) => format!("ExtResource(`{}`)", id),
            Some(ScriptReference::Inline { .. }) => "(inline)".to_string(),
            None => NONE.to_string(),
        };
        lines.push(format!(
            "| `{}` | {} | {} | {} |",
            path,
            header.resource_type.as_deref().unwrap_or("?"),
            header.class_name.as_deref().unwrap_or(NONE),
            script
        ));
    }
    lines.join("\n")
}

fn asset_summary(report: &ArchitectureReport, options: &RenderOptions) -> String {
    if report.assets.is_empty() {
        return String::new();
    }
    let mut lines = vec!["## 9. Asset Summary".to_string(), String::new()];
    for (category, files) in &report.assets {
        let limit = match category {
            AssetCategory::Other => options.max_other_assets,
            _ => options.max_assets_per_category,
        };
        lines.push(format!("**{}** ({} files):", category.label(), files.len()));
        for f in files.iter().take(limit) {
            lines.push(format!("- `{}`", f));
        }
        if files.len() > limit {
            lines.push(format!("- ... and {} more", files.len() - limit));
        }
        lines.push(String::new());
    }
    trim_trailing_blank(&mut lines);
    lines.join("\n")
}

fn dependency_graph(report: &ArchitectureReport) -> String {
    let mut lines = vec![
        "## 10. Dependency Graph".to_string(),
        String::new(),
        "```".to_string(),
        "(script) --preloads/extends--> (dependency)".to_string(),
        String::new(),
    ];
    for (path, edges) in &report.dependencies {
        lines.push(format!("{}{}", INDENT, path));
        for edge in edges {
            lines.push(format!("{}└─→ {}", INDENT.repeat(2), edge));
        }
    }
    lines.push("```".to_string());
    lines.join("\n")
}

fn full_source(report: &ArchitectureReport) -> String {
    if report.sources.is_empty() {
        return String::new();
    }
    let mut lines = vec![
        "## Full Source Code".to_string(),
        String::new(),
        "> Included with `--full-source`.".to_string(),
        String::new(),
    ];
    for (path, source) in &report.sources {
        lines.push(format!("### `{}`", path));
        lines.push("```gdscript".to_string());
        lines.push(source.trim_end().to_string());
        lines.push("```".to_string());
        lines.push(String::new());
    }
    trim_trailing_blank(&mut lines);
    lines.join("\n")
}

fn warnings(report: &ArchitectureReport) -> String {
    if report.warnings.is_empty() {
        return String::new();
    }
    let mut lines = vec!["## Warnings".to_string(), String::new()];
    lines.extend(report.warnings.iter().map(|w| format!("- {}", w)));
    lines.join("\n")
}

fn stats_footer(report: &ArchitectureReport) -> String {
    let s = &report.stats;
    let mut lines = vec![
        "---".to_string(),
        String::new(),
        "## Stats Summary".to_string(),
        String::new(),
        "| Metric | Count |".to_string(),
        "|--------|-------|".to_string(),
    ];
    let rows = [
        ("Scripts", s.scripts),
        ("Scenes", s.scenes),
        ("Resources", s.resources),
        ("Total Files", s.total_files),
        ("Registered Classes", s.classes),
        ("Total Functions", s.functions),
        ("Total Signals", s.signals),
        ("Total Exports", s.exports),
        ("Autoloads", s.autoloads),
    ];
    lines.extend(rows.iter().map(|(label, n)| format!("| {} | {} |", label, n)));
    if s.parse_errors > 0 {
        lines.push(format!("| Parse Errors | {} |", s.parse_errors));
    }
    if s.unreadable_scenes > 0 {
        lines.push(format!("| Unreadable Scenes | {} |", s.unreadable_scenes));
    }
    lines.join("\n")
}

fn trim_trailing_blank(lines: &mut Vec<String>) {
    while lines.last().map_or(false, |l| l.is_empty()) {
        lines.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::parse_scene_text;

    #[test]
    fn test_node_tree_indentation() {
        let scene = parse_scene_text(
            r#"[node name="Main" type="Node2D"]
[node name="Hud" type="CanvasLayer" parent="."]
[node name="Label" type="Label" parent="Hud"]
[node name="Enemy" parent="." instance=ExtResource("1")]
"#,
        );
        assert_eq!(
            node_tree(&scene),
            "Main (Node2D)\n  └─ Hud (CanvasLayer)\n    └─ Label (Label)\n  └─ Enemy [Instance]"
        );
    }

    #[test]
    fn test_empty_node_tree() {
        assert_eq!(node_tree(&SceneDescriptor::default()), "(empty scene)");
    }

    #[test]
    fn test_function_row_notes() {
        let f = Function {
            name: "_make".to_string(),
            params: vec![],
            return_type: None,
            is_static: true,
        };
        assert_eq!(function_row(&f), "| `_make` | `()` | `—` | static, override/private |");
    }

    #[test]
    fn test_type_label() {
        let mut script = ScriptSymbolTable::new("game.gd");
        assert_eq!(type_label(&script), "");
        script.base = Some("Node".to_string());
        assert_eq!(type_label(&script), "Node");
        script.class_name = Some("Game".to_string());
        assert_eq!(type_label(&script), "Game (extends Node)");
    }
}
