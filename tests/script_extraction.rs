//! Consistency tests between structural and line-based script extraction.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;

use gdarch::analysis::{extract_script_fallback, ScriptSymbolTable};

fn scripts_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join("sample_project")
        .join("scripts")
}

fn read_script(name: &str) -> String {
    fs::read_to_string(scripts_path().join(name)).unwrap()
}

fn names(table: &ScriptSymbolTable) -> BTreeSet<String> {
    let body = &table.body;
    let mut names = BTreeSet::new();
    names.extend(body.signals.iter().map(|s| format!("signal {}", s.name)));
    names.extend(body.all_functions().map(|f| format!("func {}", f.name)));
    names.extend(body.exported.iter().map(|p| format!("export {}", p.name)));
    names.extend(body.deferred.iter().map(|p| format!("onready {}", p.name)));
    names.extend(body.plain.iter().map(|p| format!("var {}", p.name)));
    names.extend(body.constants.iter().map(|c| format!("const {}", c.name)));
    names.extend(
        body.enums
            .iter()
            .filter_map(|e| e.name.as_ref())
            .map(|n| format!("enum {}", n)),
    );
    names
}

// =============================================================================
// Fallback extraction
// =============================================================================

#[test]
fn test_fallback_on_well_formed_script() {
    let table = extract_script_fallback("scripts/player.gd", &read_script("player.gd"));

    assert_eq!(table.class_name.as_deref(), Some("Player"));
    assert_eq!(table.base.as_deref(), Some("Entity"));
    assert_eq!(
        names(&table),
        [
            "const Bullet",
            "const MAX_SPEED",
            "enum State",
            "export speed",
            "func _physics_process",
            "func create",
            "func shoot",
            "onready sprite",
            "signal fired",
            "var state",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect::<BTreeSet<_>>()
    );
    assert_eq!(table.body.static_functions[0].name, "create");
    assert!(table.body.inner_types.is_empty());
    assert_eq!(
        table.dependencies,
        vec!["res://scenes/bullet.tscn", "res://scenes/player.tscn"]
    );
}

#[test]
fn test_fallback_signal_params() {
    let table = extract_script_fallback("scripts/entity.gd", &read_script("entity.gd"));
    let changed = &table.body.signals[1];
    assert_eq!(changed.name, "health_changed");
    let params: Vec<_> = changed
        .params
        .iter()
        .map(|p| (p.name.as_str(), p.ty.as_deref()))
        .collect();
    assert_eq!(params, vec![("current", Some("int")), ("maximum", Some("int"))]);
}

// =============================================================================
// Structural extraction (tree-sitter)
// =============================================================================

#[cfg(feature = "tree-sitter")]
mod structural {
    use super::*;
    use pretty_assertions::assert_eq;
    use gdarch::extract_script;

    const WELL_FORMED: [&str; 3] = ["entity.gd", "game_state.gd", "player.gd"];

    #[test]
    fn test_fallback_is_subset_of_structural() {
        for name in WELL_FORMED {
            let source = read_script(name);
            let primary = extract_script(name, &source);
            let fallback = extract_script_fallback(name, &source);

            assert!(!primary.is_degraded(), "{} should parse cleanly", name);
            assert_eq!(primary.class_name, fallback.class_name, "{}", name);
            assert_eq!(primary.base, fallback.base, "{}", name);
            assert_eq!(primary.dependencies, fallback.dependencies, "{}", name);

            let missing: Vec<_> = names(&fallback).difference(&names(&primary)).cloned().collect();
            assert!(missing.is_empty(), "{}: fallback-only names {:?}", name, missing);
        }
    }

    #[test]
    fn test_structural_captures_more_than_fallback() {
        let source = read_script("player.gd");
        let primary = extract_script("player.gd", &source);

        let inventory = &primary.body.inner_types[0];
        assert_eq!(inventory.name, "Inventory");
        assert_eq!(inventory.base.as_deref(), Some("RefCounted"));
        assert_eq!(inventory.body.plain[0].name, "items");
        assert_eq!(inventory.body.functions[0].name, "add");

        let state = &primary.body.enums[0];
        assert_eq!(state.values, vec!["IDLE", "RUNNING", "DEAD"]);
    }

    #[test]
    fn test_function_signature() {
        let primary = extract_script("player.gd", &read_script("player.gd"));
        let shoot = primary
            .body
            .functions
            .iter()
            .find(|f| f.name == "shoot")
            .unwrap();
        let params: Vec<_> = shoot
            .params
            .iter()
            .map(|p| (p.name.as_str(), p.ty.as_deref()))
            .collect();
        assert_eq!(params, vec![("target", Some("Vector2")), ("power", None)]);
        assert_eq!(shoot.return_type.as_deref(), Some("Node2D"));
    }

    #[test]
    fn test_syntax_error_reports_location() {
        let table = extract_script("broken.gd", &read_script("broken.gd"));
        let diagnostic = table.diagnostic.unwrap();
        assert!(diagnostic.starts_with("line "), "{}", diagnostic);
        assert_eq!(table.class_name.as_deref(), Some("Broken"));
    }
}
