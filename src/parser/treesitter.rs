//! Tree-sitter based GDScript parser.
//!
//! Parses with the `tree-sitter-gdscript` grammar and lowers the concrete
//! syntax tree into a `SourceTree`. A tree that contains any `ERROR` or
//! `MISSING` node is reported as a failed parse.

use tree_sitter::{Language, Node, Parser as TsParser, Tree};

use super::{
    ClassDecl, ConstDecl, EnumDecl, FunctionDecl, Item, Param, ParamForm, ParseDiagnostic,
    ScriptParser, SignalDecl, SourceTree, VariableDecl, VariableForm,
};

/// Longest snippet of offending source quoted in a diagnostic.
const SNIPPET_LEN: usize = 40;

/// Tree-sitter GDScript parser.
pub struct TreeSitterParser {
    language: Language,
}

impl TreeSitterParser {
    /// Create a new parser for the GDScript grammar.
    pub fn new() -> Self {
        Self {
            language: tree_sitter_gdscript::LANGUAGE.into(),
        }
    }

    /// Parse source code and return the tree.
    fn parse_tree(&self, source: &str) -> Result<Tree, ParseDiagnostic> {
        let mut parser = TsParser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| ParseDiagnostic::new(format!("failed to load GDScript grammar: {}", e)))?;
        parser
            .parse(source, None)
            .ok_or_else(|| ParseDiagnostic::new("parser produced no tree"))
    }
}

impl Default for TreeSitterParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptParser for TreeSitterParser {
    fn parse(&self, source: &str) -> Result<SourceTree, ParseDiagnostic> {
        let tree = self.parse_tree(source)?;
        let root = tree.root_node();

        if root.has_error() {
            return Err(diagnose(root, source));
        }

        let lowering = Lowering { source };
        Ok(SourceTree {
            items: lowering.block(root),
        })
    }

    fn name(&self) -> &str {
        "tree-sitter-gdscript"
    }
}

/// Build a diagnostic for the first error or missing node.
fn diagnose(root: Node, source: &str) -> ParseDiagnostic {
    let node = first_error(root).unwrap_or_else(|| innermost_error(root));

    let pos = node.start_position();
    let message = if node.is_missing() {
        format!("missing {}", node.kind())
    } else if node.is_error() {
        let text = node.utf8_text(source.as_bytes()).unwrap_or("");
        let snippet: String = text
            .lines()
            .next()
            .unwrap_or("")
            .trim()
            .chars()
            .take(SNIPPET_LEN)
            .collect();
        if snippet.is_empty() {
            "unexpected syntax".to_string()
        } else {
            format!("unexpected syntax near {:?}", snippet)
        }
    } else {
        "syntax error".to_string()
    };

    ParseDiagnostic::at(message, pos.row + 1, pos.column + 1)
}

/// Pre-order walk for the first `ERROR` or `MISSING` node. Visits every node,
/// zero-width `MISSING` nodes included.
fn first_error(root: Node) -> Option<Node> {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

/// Deepest node on the first `has_error` path, used when no explicit error
/// node is found.
fn innermost_error(root: Node) -> Node {
    let mut node = root;
    loop {
        let mut cursor = node.walk();
        let next = node.children(&mut cursor).find(|c| c.has_error());
        match next {
            Some(child) => node = child,
            None => return node,
        }
    }
}

/// Converts grammar nodes into `Item`s.
struct Lowering<'s> {
    source: &'s str,
}

impl<'s> Lowering<'s> {
    fn text(&self, node: Node) -> &'s str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("").trim()
    }

    fn field_text(&self, node: Node, field: &str) -> Option<String> {
        node.child_by_field_name(field)
            .map(|n| self.text(n).to_string())
            .filter(|s| !s.is_empty())
    }

    /// Lower every statement of a block (the source root or a class body).
    fn block(&self, parent: Node) -> Vec<Item> {
        let mut items = Vec::new();
        let mut cursor = parent.walk();
        let children: Vec<Node> = parent.named_children(&mut cursor).collect();
        for child in children {
            self.statement(child, &mut items);
        }
        items
    }

    fn statement(&self, node: Node, out: &mut Vec<Item>) {
        match node.kind() {
            // Comments are invisible to the walk; they must not clear annotations.
            "comment" => {}
            "tool_statement" => out.push(Item::Tool),
            "class_name_statement" => match self.decl_name(node) {
                Some(name) => out.push(Item::ClassName(name)),
                None => out.push(Item::Other),
            },
            "extends_statement" => match self.extends_target(node) {
                Some(base) => out.push(Item::Extends(base)),
                None => out.push(Item::Other),
            },
            "signal_statement" => match self.decl_name(node) {
                Some(name) => {
                    let params = self.params_of(node);
                    out.push(Item::Signal(SignalDecl { name, params }));
                }
                None => out.push(Item::Other),
            },
            "annotations" => {
                let mut cursor = node.walk();
                let children: Vec<Node> = node.named_children(&mut cursor).collect();
                for child in children {
                    self.statement(child, out);
                }
            }
            "annotation" => {
                let name = self.annotation_name(node);
                if name == "tool" {
                    out.push(Item::Tool);
                } else {
                    out.push(Item::Annotation(name));
                }
            }
            "variable_statement" | "export_variable_statement" | "onready_variable_statement" => {
                self.inline_annotations(node, out);
                match node.kind() {
                    "export_variable_statement" => out.push(Item::Annotation("export".to_string())),
                    "onready_variable_statement" => {
                        out.push(Item::Annotation("onready".to_string()))
                    }
                    _ => {}
                }
                match self.variable(node) {
                    Some(var) => out.push(Item::Variable(var)),
                    None => out.push(Item::Other),
                }
            }
            "function_definition" | "constructor_definition" => {
                self.inline_annotations(node, out);
                if self.has_static_keyword(node) {
                    out.push(Item::Annotation("static".to_string()));
                }
                match self.function(node) {
                    Some(func) => out.push(Item::Function(func)),
                    None => out.push(Item::Other),
                }
            }
            "enum_definition" => out.push(Item::Enum(self.enumeration(node))),
            "const_statement" => match self.decl_name(node) {
                Some(name) => out.push(Item::Constant(ConstDecl {
                    name,
                    value: self.field_text(node, "value"),
                })),
                None => out.push(Item::Other),
            },
            "class_definition" => match self.class(node) {
                Some(class) => out.push(Item::Class(class)),
                None => out.push(Item::Other),
            },
            _ => out.push(Item::Other),
        }
    }

    /// Annotations the grammar nests inside a declaration node.
    fn inline_annotations(&self, node: Node, out: &mut Vec<Item>) {
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        for child in children {
            if matches!(child.kind(), "annotations" | "annotation") {
                self.statement(child, out);
            }
        }
    }

    fn annotation_name(&self, node: Node) -> String {
        let mut cursor = node.walk();
        let ident = node
            .named_children(&mut cursor)
            .find(|c| c.kind() == "identifier");
        match ident {
            Some(ident) => self.text(ident).to_string(),
            None => self
                .text(node)
                .trim_start_matches('@')
                .chars()
                .take_while(|c| c.is_alphanumeric() || *c == '_')
                .collect(),
        }
    }

    fn has_static_keyword(&self, node: Node) -> bool {
        let mut cursor = node.walk();
        let found = node
            .children(&mut cursor)
            .any(|c| matches!(c.kind(), "static_keyword" | "static"));
        found
    }

    fn extends_target(&self, node: Node) -> Option<String> {
        let target = node.named_child(0)?;
        let text = self.text(target).trim_matches(|c| c == '"' || c == '\'');
        (!text.is_empty()).then(|| text.to_string())
    }

    fn variable(&self, node: Node) -> Option<VariableDecl> {
        let name = self.decl_name(node)?;
        // `:=` may surface as an inferred-type node in the type slot.
        let ty = node
            .child_by_field_name("type")
            .filter(|t| t.kind() != "inferred_type")
            .map(|t| self.text(t).to_string())
            .filter(|t| !t.is_empty() && t != ":=");
        let value = self.field_text(node, "value");

        let form = match (ty, value) {
            (Some(ty), Some(value)) => VariableForm::TypedAssigned { ty, value },
            (Some(ty), None) => VariableForm::Typed { ty },
            (None, Some(value)) => VariableForm::Assigned { value },
            (None, None) => VariableForm::Untyped,
        };
        Some(VariableDecl { name, form })
    }

    fn function(&self, node: Node) -> Option<FunctionDecl> {
        let name = match self.decl_name(node) {
            Some(name) => name,
            None if node.kind() == "constructor_definition" => "_init".to_string(),
            None => return None,
        };
        let params = self.params_of(node);
        let return_type = self
            .field_text(node, "return_type")
            .or_else(|| self.trailing_type(node));

        Some(FunctionDecl {
            name,
            params,
            return_type,
        })
    }

    /// A bare type node after the parameter list, for grammars that do not
    /// label the return type.
    fn trailing_type(&self, node: Node) -> Option<String> {
        let mut cursor = node.walk();
        let mut after_params = false;
        let mut found = None;
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "parameters" => after_params = true,
                "body" => break,
                "type" if after_params => found = Some(self.text(child).to_string()),
                _ => {}
            }
        }
        found.filter(|t| !t.is_empty())
    }

    fn params_of(&self, node: Node) -> Vec<Param> {
        let params_node = node.child_by_field_name("parameters").or_else(|| {
            let mut cursor = node.walk();
            let found = node
                .named_children(&mut cursor)
                .find(|c| c.kind() == "parameters");
            found
        });
        let Some(params_node) = params_node else {
            return Vec::new();
        };

        let mut cursor = params_node.walk();
        let children: Vec<Node> = params_node.named_children(&mut cursor).collect();
        children
            .into_iter()
            .filter(|c| c.kind() != "comment")
            .filter_map(|c| self.param(c))
            .collect()
    }

    fn param(&self, node: Node) -> Option<Param> {
        let type_text = || {
            let typed = node.child_by_field_name("type").or_else(|| {
                let mut cursor = node.walk();
                let found = node.named_children(&mut cursor).find(|c| c.kind() == "type");
                found
            });
            typed
                .filter(|t| t.kind() != "inferred_type")
                .map(|t| self.text(t).to_string())
                .filter(|t| !t.is_empty())
        };

        let (name, form) = match node.kind() {
            "identifier" | "name" => (self.text(node).to_string(), ParamForm::Untyped),
            "typed_parameter" => {
                let name = self.decl_name(node)?;
                match type_text() {
                    Some(ty) => (name, ParamForm::Typed(ty)),
                    None => (name, ParamForm::Untyped),
                }
            }
            "default_parameter" => (self.decl_name(node)?, ParamForm::Default),
            "typed_default_parameter" => {
                let name = self.decl_name(node)?;
                match type_text() {
                    Some(ty) => (name, ParamForm::TypedDefault(ty)),
                    None => (name, ParamForm::Default),
                }
            }
            _ => (self.decl_name(node)?, ParamForm::Untyped),
        };

        (!name.is_empty()).then_some(Param { name, form })
    }

    /// Declared name of a statement or parameter. The grammar labels some of
    /// these with a `name` field and leaves others as a bare `name` child.
    fn decl_name(&self, node: Node) -> Option<String> {
        if let Some(name) = self.field_text(node, "name") {
            return Some(name);
        }
        let mut cursor = node.walk();
        let ident = node
            .named_children(&mut cursor)
            .find(|c| matches!(c.kind(), "identifier" | "name"));
        ident
            .map(|n| self.text(n).to_string())
            .filter(|s| !s.is_empty())
    }

    fn enumeration(&self, node: Node) -> EnumDecl {
        let name = self.decl_name(node);
        let body = node.child_by_field_name("body").or_else(|| {
            let mut cursor = node.walk();
            let found = node
                .named_children(&mut cursor)
                .find(|c| c.kind() == "enumerator_list");
            found
        });

        let mut values = Vec::new();
        if let Some(body) = body {
            let mut cursor = body.walk();
            let enumerators: Vec<Node> = body
                .named_children(&mut cursor)
                .filter(|c| c.kind() == "enumerator")
                .collect();
            for enumerator in enumerators {
                let value = self
                    .field_text(enumerator, "left")
                    .or_else(|| enumerator.named_child(0).map(|n| self.text(n).to_string()));
                if let Some(value) = value.filter(|v| !v.is_empty()) {
                    values.push(value);
                }
            }
        }

        EnumDecl { name, values }
    }

    fn class(&self, node: Node) -> Option<ClassDecl> {
        let name = self.decl_name(node)?;
        let extends = node
            .child_by_field_name("extends")
            .and_then(|e| self.extends_target(e));
        let body = node
            .child_by_field_name("body")
            .map(|b| self.block(b))
            .unwrap_or_default();

        Some(ClassDecl {
            name,
            extends,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> SourceTree {
        TreeSitterParser::new().parse(source).expect("should parse")
    }

    #[test]
    fn test_header_statements() {
        let tree = parse("class_name Player\nextends CharacterBody2D\n");
        assert!(tree.items.contains(&Item::ClassName("Player".to_string())));
        assert!(tree
            .items
            .contains(&Item::Extends("CharacterBody2D".to_string())));
    }

    #[test]
    fn test_extends_path_is_unquoted() {
        let tree = parse("extends \"res://actors/base.gd\"\n");
        assert!(tree
            .items
            .contains(&Item::Extends("res://actors/base.gd".to_string())));
    }

    #[test]
    fn test_function_with_typed_params() {
        let tree = parse("func move(speed: float, dir) -> void:\n\tpass\n");
        let func = tree
            .items
            .iter()
            .find_map(|item| match item {
                Item::Function(f) => Some(f),
                _ => None,
            })
            .expect("function item");
        assert_eq!(func.name, "move");
        assert_eq!(func.params.len(), 2);
        assert_eq!(func.params[0].name, "speed");
        assert_eq!(func.params[0].declared_type(), Some("float"));
        assert_eq!(func.params[1].name, "dir");
        assert_eq!(func.params[1].declared_type(), None);
        assert_eq!(func.return_type.as_deref(), Some("void"));
    }

    #[test]
    fn test_signal_with_params() {
        let tree = parse("signal hit(damage: int, source)\n");
        let signal = tree
            .items
            .iter()
            .find_map(|item| match item {
                Item::Signal(s) => Some(s),
                _ => None,
            })
            .expect("signal item");
        assert_eq!(signal.name, "hit");
        assert_eq!(signal.params.len(), 2);
        assert_eq!(signal.params[0].declared_type(), Some("int"));
    }

    #[test]
    fn test_class_name_and_signal_are_named() {
        let tree = parse("class_name Twin\nextends Node\nsignal pinged(x: int)\nsignal done\n");
        assert_eq!(
            tree.items,
            vec![
                Item::ClassName("Twin".to_string()),
                Item::Extends("Node".to_string()),
                Item::Signal(SignalDecl {
                    name: "pinged".to_string(),
                    params: vec![Param {
                        name: "x".to_string(),
                        form: ParamForm::Typed("int".to_string()),
                    }],
                }),
                Item::Signal(SignalDecl {
                    name: "done".to_string(),
                    params: vec![],
                }),
            ]
        );
    }

    #[test]
    fn test_declaration_names() {
        let tree = parse(
            "const LIMIT = 3\nvar hp: int = 10\nenum Mode { A, B }\nfunc run() -> void:\n\tpass\nclass Bag:\n\tvar items = []\n",
        );
        let names: Vec<String> = tree
            .items
            .iter()
            .filter_map(|item| match item {
                Item::Constant(c) => Some(c.name.clone()),
                Item::Variable(v) => Some(v.name.clone()),
                Item::Enum(e) => e.name.clone(),
                Item::Function(f) => Some(f.name.clone()),
                Item::Class(c) => Some(c.name.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["LIMIT", "hp", "Mode", "run", "Bag"]);
    }

    #[test]
    fn test_missing_token_is_located() {
        let err = TreeSitterParser::new()
            .parse("class_name Player extends CharacterBody2D\n\nfunc _ready():\n\tpass\n")
            .unwrap_err();
        assert!(err.line.is_some());
        assert!(err.column.is_some());
        assert!(err.message.starts_with("line "), "{}", err.message);
    }

    #[test]
    fn test_syntax_error_is_diagnosed() {
        let err = TreeSitterParser::new()
            .parse("func broken(:\n\tpass\n")
            .unwrap_err();
        assert!(err.line.is_some());
        assert!(err.message.starts_with("line "));
    }
}
