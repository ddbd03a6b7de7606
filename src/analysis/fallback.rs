//! Line-based extraction used when the structural parse fails.
//!
//! Each rule is anchored at the start of a top-level line. Indented lines
//! belong to a function body or an inner class and are skipped rather than
//! trimmed and matched, so this path never reports inner types or locals and
//! only ever finds names the structural parse would also find. Lines that
//! match no rule are ignored.

use lazy_static::lazy_static;
use regex::Regex;

use super::extract::clean_expr;
use super::symbols::{Constant, Enum, Function, Parameter, Property, ScriptSymbolTable, Signal};

lazy_static! {
    /// `class_name X`, optionally followed by an `extends` clause on the same line.
    static ref CLASS_NAME: Regex = Regex::new(
        r#"^class_name\s+(\w+)(?:\s+extends\s+(?:"([^"]+)"|'([^']+)'|(\w+(?:\.\w+)*)))?"#
    )
    .unwrap();
    static ref EXTENDS: Regex =
        Regex::new(r#"^extends\s+(?:"([^"]+)"|'([^']+)'|(\w+(?:\.\w+)*))"#).unwrap();
    static ref SIGNAL: Regex = Regex::new(r"^signal\s+(\w+)(?:\s*\(([^)]*)\))?").unwrap();
    static ref EXPORTED_VAR: Regex =
        Regex::new(r"^@export.*?\bvar\s+(\w+)\s*(?::\s*(\w+))?").unwrap();
    static ref DEFERRED_VAR: Regex =
        Regex::new(r"^@onready\s+var\s+(\w+)\s*(?::\s*(\w+))?").unwrap();
    static ref PLAIN_VAR: Regex = Regex::new(r"^var\s+(\w+)\s*(?::\s*(\w+))?").unwrap();
    static ref FUNCTION: Regex = Regex::new(
        r"^(?:@\w+\s+)*(?:static\s+)?func\s+(\w+)\s*\(([^)]*)\)\s*(?:->\s*(\w+))?"
    )
    .unwrap();
    static ref STATIC_TOKEN: Regex = Regex::new(r"\bstatic\b").unwrap();
    static ref CONST: Regex = Regex::new(r"^const\s+(\w+)").unwrap();
    static ref ENUM: Regex = Regex::new(r"^enum\s+(\w+)").unwrap();
    /// Initializers simple enough to recover from one line: numbers, quoted
    /// strings, and dotted identifiers.
    static ref SIMPLE_DEFAULT: Regex = Regex::new(
        r#"=\s*(-?\d+(?:\.\d+)?|"[^"]*"|'[^']*'|[A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*)\s*(?:#.*)?$"#
    )
    .unwrap();
}

/// Extract whatever the line rules recover. Never fails.
pub fn extract(path: &str, source: &str) -> ScriptSymbolTable {
    let mut table = ScriptSymbolTable::new(path);

    for raw in source.lines() {
        if raw.starts_with(|c: char| c.is_whitespace()) {
            continue;
        }
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(caps) = CLASS_NAME.captures(line) {
            table.class_name.get_or_insert_with(|| caps[1].to_string());
            if let Some(base) = caps.get(2).or_else(|| caps.get(3)).or_else(|| caps.get(4)) {
                table.base = Some(base.as_str().to_string());
            }
        }

        if let Some(caps) = EXTENDS.captures(line) {
            let base = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3));
            table.base = base.map(|m| m.as_str().to_string());
        }

        if line.starts_with("@tool") || line == "tool" {
            table.is_tool = true;
        }

        if let Some(caps) = SIGNAL.captures(line) {
            table.body.signals.push(Signal {
                name: caps[1].to_string(),
                params: caps.get(2).map(|m| split_params(m.as_str())).unwrap_or_default(),
            });
        }

        if let Some(caps) = EXPORTED_VAR.captures(line) {
            table.body.exported.push(property(&caps, line));
            continue;
        }

        if let Some(caps) = DEFERRED_VAR.captures(line) {
            table.body.deferred.push(property(&caps, line));
            continue;
        }

        if let Some(caps) = PLAIN_VAR.captures(line) {
            table.body.plain.push(property(&caps, line));
        }

        if let Some(caps) = FUNCTION.captures(line) {
            let function = Function {
                name: caps[1].to_string(),
                params: split_params(&caps[2]),
                return_type: caps.get(3).map(|m| m.as_str().to_string()),
                is_static: STATIC_TOKEN.is_match(line),
            };
            if function.is_static {
                table.body.static_functions.push(function);
            } else {
                table.body.functions.push(function);
            }
        }

        if let Some(caps) = CONST.captures(line) {
            table.body.constants.push(Constant {
                name: caps[1].to_string(),
                value: simple_default(line),
            });
        }

        if let Some(caps) = ENUM.captures(line) {
            table.body.enums.push(Enum {
                name: Some(caps[1].to_string()),
                values: Vec::new(),
            });
        }
    }

    table
}

fn property(caps: &regex::Captures<'_>, line: &str) -> Property {
    Property {
        name: caps[1].to_string(),
        ty: caps.get(2).map(|m| m.as_str().to_string()),
        default: simple_default(line),
    }
}

fn simple_default(line: &str) -> Option<String> {
    SIMPLE_DEFAULT.captures(line).map(|caps| clean_expr(&caps[1]))
}

/// Split `a: int, b = 2, c: String = ""` into named, optionally typed parameters.
fn split_params(list: &str) -> Vec<Parameter> {
    list.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|param| {
            let (head, _default) = param.split_once('=').unwrap_or((param, ""));
            match head.split_once(':') {
                Some((name, ty)) => {
                    let ty = ty.trim();
                    Parameter::new(name.trim(), (!ty.is_empty()).then(|| ty.to_string()))
                }
                None => Parameter::new(head.trim(), None),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BROKEN_SCRIPT: &str = r#"@tool
class_name Turret
extends "res://enemies/base_enemy.gd"

signal fired(target: Node2D, power)
signal destroyed

enum Mode { IDLE, TRACKING }
const RANGE = 300

@export var damage: int = 5
@export_range(0, 10) var rate: float
@onready var barrel: Marker2D = $Barrel
var cooldown := 0.5
var target

func _ready() -> void:
    var local = 1
    if broken(:
        pass

static func create(level: int, name = "x") -> Turret:
    return null

class Inner:
    signal nested
    func hidden():
        pass
"#;

    #[test]
    fn test_header_rules() {
        let table = extract("turret.gd", BROKEN_SCRIPT);
        assert!(table.is_tool);
        assert_eq!(table.class_name.as_deref(), Some("Turret"));
        assert_eq!(table.base.as_deref(), Some("res://enemies/base_enemy.gd"));
    }

    #[test]
    fn test_signals_with_params() {
        let table = extract("turret.gd", BROKEN_SCRIPT);
        let names: Vec<_> = table.body.signals.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["fired", "destroyed"]);
        assert_eq!(
            table.body.signals[0].params,
            vec![
                Parameter::new("target", Some("Node2D".to_string())),
                Parameter::new("power", None),
            ]
        );
        assert!(table.body.signals[1].params.is_empty());
    }

    #[test]
    fn test_property_rules() {
        let table = extract("turret.gd", BROKEN_SCRIPT);
        let names = |props: &[Property]| props.iter().map(|p| p.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&table.body.exported), vec!["damage", "rate"]);
        assert_eq!(names(&table.body.deferred), vec!["barrel"]);
        assert_eq!(names(&table.body.plain), vec!["cooldown", "target"]);

        assert_eq!(table.body.exported[0].ty.as_deref(), Some("int"));
        assert_eq!(table.body.exported[0].default.as_deref(), Some("5"));
        assert_eq!(table.body.exported[1].ty.as_deref(), Some("float"));
        // `$Barrel` is not a simple literal
        assert_eq!(table.body.deferred[0].default, None);
        assert_eq!(table.body.plain[0].default.as_deref(), Some("0.5"));
    }

    #[test]
    fn test_functions_skip_nested_scopes() {
        let table = extract("turret.gd", BROKEN_SCRIPT);
        let names: Vec<_> = table.body.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["_ready"]);
        assert_eq!(table.body.functions[0].return_type.as_deref(), Some("void"));

        assert_eq!(table.body.static_functions.len(), 1);
        let create = &table.body.static_functions[0];
        assert_eq!(create.name, "create");
        assert!(create.is_static);
        assert_eq!(
            create.params,
            vec![
                Parameter::new("level", Some("int".to_string())),
                Parameter::new("name", None),
            ]
        );
        assert!(table.body.inner_types.is_empty());
    }

    #[test]
    fn test_constants_and_enums() {
        let table = extract("turret.gd", BROKEN_SCRIPT);
        assert_eq!(table.body.constants.len(), 1);
        assert_eq!(table.body.constants[0].name, "RANGE");
        assert_eq!(table.body.constants[0].value.as_deref(), Some("300"));
        assert_eq!(table.body.enums[0].name.as_deref(), Some("Mode"));
        assert!(table.body.enums[0].values.is_empty());
    }

    #[test]
    fn test_static_detected_anywhere_on_line() {
        let table = extract("a.gd", "@rpc static func sync() -> void:\n\tpass\n");
        assert_eq!(table.body.static_functions.len(), 1);
        assert!(table.body.functions.is_empty());
    }

    #[test]
    fn test_unmatched_input_is_empty() {
        let table = extract("noise.gd", "}}}{{{ not gdscript at all\n\u{0}\n");
        assert_eq!(table, ScriptSymbolTable::new("noise.gd"));
    }

    #[test]
    fn test_first_class_name_wins() {
        let table = extract("dup.gd", "class_name First\nclass_name Second\n");
        assert_eq!(table.class_name.as_deref(), Some("First"));
    }

    #[test]
    fn test_plain_tool_keyword() {
        let table = extract("old.gd", "tool\nextends Node\n");
        assert!(table.is_tool);
        assert_eq!(table.base.as_deref(), Some("Node"));
    }

    #[test]
    fn test_class_name_with_inline_extends() {
        let table = extract(
            "player.gd",
            "class_name Player extends CharacterBody2D\n\nfunc _ready():\n\tpass\n",
        );
        assert_eq!(table.class_name.as_deref(), Some("Player"));
        assert_eq!(table.base.as_deref(), Some("CharacterBody2D"));
        assert_eq!(table.body.functions[0].name, "_ready");

        let table = extract("tool.gd", "class_name Tool extends \"res://base.gd\"\n");
        assert_eq!(table.base.as_deref(), Some("res://base.gd"));
    }
}
