//! Structural extraction of a script's symbol table.
//!
//! The primary path walks the declaration tree from a `ScriptParser` once.
//! When the parser reports a diagnostic, the line-based fallback takes over
//! and the diagnostic is kept on the result. Load references are always
//! scanned from the raw text, independent of either path.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use crate::parser::{
    default_parser, ConstDecl, EnumDecl, FunctionDecl, Item, Param, ScriptParser, SignalDecl,
    VariableDecl, VariableForm,
};

use super::fallback;
use super::symbols::{
    Constant, Enum, Function, InnerType, Parameter, Property, ScriptSymbolTable, Signal, TypeBody,
};

lazy_static! {
    /// `preload("...")` and `load("...")` with a single quoted argument.
    static ref LOAD_REFERENCE: Regex =
        Regex::new(r#"(?:preload|load)\s*\(\s*["']([^"']+)["']\s*\)"#).unwrap();
    static ref DOT_SPACING: Regex = Regex::new(r"\s*\.\s*").unwrap();
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Extract a script using the default structural parser.
pub fn extract_script(path: &str, source: &str) -> ScriptSymbolTable {
    ScriptExtractor::new(default_parser()).extract(path, source)
}

/// Builds symbol tables from script source.
pub struct ScriptExtractor<'p> {
    parser: &'p dyn ScriptParser,
}

impl<'p> ScriptExtractor<'p> {
    pub fn new(parser: &'p dyn ScriptParser) -> Self {
        Self { parser }
    }

    /// Extract a symbol table. Never fails; degraded results carry a diagnostic.
    pub fn extract(&self, path: &str, source: &str) -> ScriptSymbolTable {
        let mut table = match self.parser.parse(source) {
            Ok(tree) => {
                let mut table = ScriptSymbolTable::new(path);
                let mut header = Header::default();
                walk(&tree.items, &mut header, &mut table.body);
                table.class_name = header.class_name;
                table.base = header.base;
                table.is_tool = header.is_tool;
                table
            }
            Err(diagnostic) => {
                warn!(
                    path,
                    parser = self.parser.name(),
                    %diagnostic,
                    "structural parse failed, using line-based fallback"
                );
                let mut table = fallback::extract(path, source);
                table.diagnostic = Some(diagnostic.message);
                table
            }
        };

        table.dependencies = load_references(source);
        debug!(
            path,
            signals = table.body.signals.len(),
            functions = table.body.functions.len() + table.body.static_functions.len(),
            dependencies = table.dependencies.len(),
            "extracted script"
        );
        table
    }
}

/// Every `preload`/`load` path in order of appearance.
pub fn load_references(source: &str) -> Vec<String> {
    LOAD_REFERENCE
        .captures_iter(source)
        .map(|c| c[1].to_string())
        .collect()
}

/// Normalize expression text: collapse whitespace, join `A . B` into `A.B`.
pub fn clean_expr(text: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(text.trim(), " ");
    DOT_SPACING.replace_all(&collapsed, ".").trim().to_string()
}

/// Script-level header statements. Inner classes only use `base`.
#[derive(Default)]
struct Header {
    class_name: Option<String>,
    base: Option<String>,
    is_tool: bool,
}

/// Category marker an annotation contributes to the next declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Marker {
    Other,
    Static,
    Deferred,
    Exported,
}

impl Marker {
    fn from_annotation(name: &str) -> Self {
        if name.starts_with("export") {
            Marker::Exported
        } else if name == "onready" {
            Marker::Deferred
        } else if name == "static" {
            Marker::Static
        } else {
            Marker::Other
        }
    }
}

/// Single-slot annotation buffer.
///
/// Holds the most significant marker seen since the last declaration; it is
/// consumed by the next property or function and dropped by anything else.
#[derive(Default)]
struct PendingAnnotation(Option<Marker>);

impl PendingAnnotation {
    fn push(&mut self, name: &str) {
        let marker = Marker::from_annotation(name);
        if self.0.map_or(true, |current| marker >= current) {
            self.0 = Some(marker);
        }
    }

    fn take(&mut self) -> Option<Marker> {
        self.0.take()
    }

    fn clear(&mut self) {
        self.0 = None;
    }
}

fn walk(items: &[Item], header: &mut Header, body: &mut TypeBody) {
    let mut pending = PendingAnnotation::default();

    for item in items {
        match item {
            Item::Annotation(name) => {
                pending.push(name);
                continue;
            }
            Item::Variable(var) => {
                let property = property_from(var);
                match pending.take() {
                    Some(Marker::Exported) => body.exported.push(property),
                    Some(Marker::Deferred) => body.deferred.push(property),
                    _ => body.plain.push(property),
                }
                continue;
            }
            Item::Function(func) => {
                let mut function = function_from(func);
                if pending.take() == Some(Marker::Static) {
                    function.is_static = true;
                    body.static_functions.push(function);
                } else {
                    body.functions.push(function);
                }
                continue;
            }
            Item::Tool => header.is_tool = true,
            Item::ClassName(name) => {
                if header.class_name.is_none() {
                    header.class_name = Some(name.clone());
                }
            }
            Item::Extends(base) => header.base = Some(base.clone()),
            Item::Signal(signal) => body.signals.push(signal_from(signal)),
            Item::Enum(decl) => body.enums.push(enum_from(decl)),
            Item::Constant(decl) => body.constants.push(constant_from(decl)),
            Item::Class(class) => {
                let mut inner_header = Header {
                    base: class.extends.clone(),
                    ..Default::default()
                };
                let mut inner_body = TypeBody::default();
                walk(&class.body, &mut inner_header, &mut inner_body);
                body.inner_types.push(InnerType {
                    name: class.name.clone(),
                    base: inner_header.base,
                    body: inner_body,
                });
            }
            Item::Other => {}
        }
        pending.clear();
    }
}

fn parameter_from(param: &Param) -> Parameter {
    Parameter::new(&param.name, param.declared_type().map(str::to_string))
}

fn signal_from(decl: &SignalDecl) -> Signal {
    Signal {
        name: decl.name.clone(),
        params: decl.params.iter().map(parameter_from).collect(),
    }
}

fn property_from(decl: &VariableDecl) -> Property {
    let (ty, default) = match &decl.form {
        VariableForm::TypedAssigned { ty, value } => (Some(ty.clone()), Some(clean_expr(value))),
        VariableForm::Typed { ty } => (Some(ty.clone()), None),
        VariableForm::Assigned { value } => (None, Some(clean_expr(value))),
        VariableForm::Untyped => (None, None),
    };
    Property {
        name: decl.name.clone(),
        ty,
        default,
    }
}

fn function_from(decl: &FunctionDecl) -> Function {
    Function {
        name: decl.name.clone(),
        params: decl.params.iter().map(parameter_from).collect(),
        return_type: decl.return_type.clone(),
        is_static: false,
    }
}

fn enum_from(decl: &EnumDecl) -> Enum {
    Enum {
        name: decl.name.clone(),
        values: decl.values.clone(),
    }
}

fn constant_from(decl: &ConstDecl) -> Constant {
    Constant {
        name: decl.name.clone(),
        value: decl
            .value
            .as_deref()
            .map(clean_expr)
            .filter(|v| !v.is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ClassDecl, ParamForm, ParseDiagnostic, SourceTree};
    use pretty_assertions::assert_eq;

    /// Parser that returns a fixed tree, or a fixed diagnostic.
    struct FixedParser(Result<Vec<Item>, ParseDiagnostic>);

    impl ScriptParser for FixedParser {
        fn parse(&self, _source: &str) -> Result<SourceTree, ParseDiagnostic> {
            self.0.clone().map(|items| SourceTree { items })
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn extract_items(items: Vec<Item>) -> ScriptSymbolTable {
        let parser = FixedParser(Ok(items));
        ScriptExtractor::new(&parser).extract("test.gd", "")
    }

    fn var(name: &str, form: VariableForm) -> Item {
        Item::Variable(VariableDecl {
            name: name.to_string(),
            form,
        })
    }

    fn func(name: &str) -> Item {
        Item::Function(FunctionDecl {
            name: name.to_string(),
            params: vec![],
            return_type: None,
        })
    }

    fn annotation(name: &str) -> Item {
        Item::Annotation(name.to_string())
    }

    #[test]
    fn test_header_statements() {
        let table = extract_items(vec![
            Item::Tool,
            Item::ClassName("Player".to_string()),
            Item::ClassName("Ignored".to_string()),
            Item::Extends("CharacterBody2D".to_string()),
        ]);
        assert!(table.is_tool);
        assert_eq!(table.class_name.as_deref(), Some("Player"));
        assert_eq!(table.base.as_deref(), Some("CharacterBody2D"));
        assert!(table.diagnostic.is_none());
    }

    #[test]
    fn test_property_categories() {
        let table = extract_items(vec![
            annotation("export"),
            var(
                "speed",
                VariableForm::TypedAssigned {
                    ty: "float".to_string(),
                    value: "200.0".to_string(),
                },
            ),
            annotation("export_range"),
            var("armor", VariableForm::Typed { ty: "int".to_string() }),
            annotation("onready"),
            var(
                "sprite",
                VariableForm::Assigned {
                    value: "$Sprite2D".to_string(),
                },
            ),
            var("counter", VariableForm::Untyped),
        ]);

        let names = |props: &[Property]| props.iter().map(|p| p.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&table.body.exported), vec!["speed", "armor"]);
        assert_eq!(names(&table.body.deferred), vec!["sprite"]);
        assert_eq!(names(&table.body.plain), vec!["counter"]);

        assert_eq!(table.body.exported[0].ty.as_deref(), Some("float"));
        assert_eq!(table.body.exported[0].default.as_deref(), Some("200.0"));
        assert_eq!(table.body.exported[1].default, None);
        assert_eq!(table.body.deferred[0].ty, None);
        assert_eq!(table.body.deferred[0].default.as_deref(), Some("$Sprite2D"));
    }

    #[test]
    fn test_annotation_does_not_cross_other_statements() {
        let table = extract_items(vec![
            annotation("export"),
            Item::Signal(SignalDecl {
                name: "died".to_string(),
                params: vec![],
            }),
            var("health", VariableForm::Untyped),
            annotation("onready"),
            Item::Other,
            var("label", VariableForm::Untyped),
        ]);
        assert!(table.body.exported.is_empty());
        assert!(table.body.deferred.is_empty());
        assert_eq!(table.body.plain.len(), 2);
    }

    #[test]
    fn test_annotation_applies_to_next_declaration_only() {
        let table = extract_items(vec![
            annotation("export"),
            var("a", VariableForm::Untyped),
            var("b", VariableForm::Untyped),
        ]);
        assert_eq!(table.body.exported.len(), 1);
        assert_eq!(table.body.plain.len(), 1);
        assert_eq!(table.body.plain[0].name, "b");
    }

    #[test]
    fn test_static_functions_routed_separately() {
        let table = extract_items(vec![
            annotation("static"),
            func("create"),
            func("_ready"),
            annotation("rpc"),
            func("sync_state"),
        ]);
        assert_eq!(table.body.static_functions.len(), 1);
        assert_eq!(table.body.static_functions[0].name, "create");
        assert!(table.body.static_functions[0].is_static);
        let names: Vec<_> = table.body.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["_ready", "sync_state"]);
        assert!(table.body.functions.iter().all(|f| !f.is_static));
    }

    #[test]
    fn test_function_parameters_keep_types_of_default_forms() {
        let table = extract_items(vec![Item::Function(FunctionDecl {
            name: "hit".to_string(),
            params: vec![
                Param {
                    name: "amount".to_string(),
                    form: ParamForm::TypedDefault("int".to_string()),
                },
                Param {
                    name: "crit".to_string(),
                    form: ParamForm::Default,
                },
            ],
            return_type: Some("bool".to_string()),
        })]);
        let func = &table.body.functions[0];
        assert_eq!(
            func.params,
            vec![
                Parameter::new("amount", Some("int".to_string())),
                Parameter::new("crit", None),
            ]
        );
        assert_eq!(func.return_type.as_deref(), Some("bool"));
    }

    #[test]
    fn test_constant_value_is_cleaned() {
        let table = extract_items(vec![Item::Constant(ConstDecl {
            name: "START".to_string(),
            value: Some("State . IDLE".to_string()),
        })]);
        assert_eq!(table.body.constants[0].value.as_deref(), Some("State.IDLE"));
    }

    #[test]
    fn test_inner_class_recursion() {
        let table = extract_items(vec![Item::Class(ClassDecl {
            name: "Health".to_string(),
            extends: Some("RefCounted".to_string()),
            body: vec![
                annotation("export"),
                var("max", VariableForm::Typed { ty: "int".to_string() }),
                func("heal"),
            ],
        })]);
        assert_eq!(table.body.inner_types.len(), 1);
        let inner = &table.body.inner_types[0];
        assert_eq!(inner.name, "Health");
        assert_eq!(inner.base.as_deref(), Some("RefCounted"));
        assert_eq!(inner.body.exported.len(), 1);
        assert_eq!(inner.body.functions[0].name, "heal");
        assert!(table.body.functions.is_empty());
    }

    #[test]
    fn test_enum_extraction() {
        let table = extract_items(vec![Item::Enum(EnumDecl {
            name: None,
            values: vec!["A".to_string(), "B".to_string()],
        })]);
        assert_eq!(table.body.enums[0].name, None);
        assert_eq!(table.body.enums[0].values, vec!["A", "B"]);
    }

    #[test]
    fn test_diagnostic_triggers_fallback() {
        let parser = FixedParser(Err(ParseDiagnostic::at("unexpected syntax", 2, 1)));
        let source = "class_name Door\nextends Area2D\nsignal opened\n";
        let table = ScriptExtractor::new(&parser).extract("door.gd", source);
        assert_eq!(
            table.diagnostic.as_deref(),
            Some("line 2, column 1: unexpected syntax")
        );
        assert_eq!(table.class_name.as_deref(), Some("Door"));
        assert_eq!(table.base.as_deref(), Some("Area2D"));
        assert_eq!(table.body.signals[0].name, "opened");
    }

    #[test]
    fn test_load_references_independent_of_tree() {
        let parser = FixedParser(Err(ParseDiagnostic::new("broken")));
        let source = r#"
const Bullet = preload("res://bullet.tscn")
var data = load('res://data/items.tres')
func f(:
"#;
        let table = ScriptExtractor::new(&parser).extract("gun.gd", source);
        assert_eq!(
            table.dependencies,
            vec!["res://bullet.tscn", "res://data/items.tres"]
        );
    }

    #[test]
    fn test_clean_expr() {
        assert_eq!(clean_expr("Vector2 . ZERO"), "Vector2.ZERO");
        assert_eq!(clean_expr("  [1,\n   2]  "), "[1, 2]");
        assert_eq!(clean_expr("100"), "100");
    }
}
