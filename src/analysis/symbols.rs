//! Symbol table structures extracted from GDScript files.

use serde::Serialize;

/// Everything extracted from one script file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScriptSymbolTable {
    /// Project-relative path of the script.
    pub path: String,
    /// `class_name`, if declared.
    pub class_name: Option<String>,
    /// `extends` target, unresolved (a class name or a `res://` path).
    pub base: Option<String>,
    /// Whether the script runs in the editor (`@tool`).
    pub is_tool: bool,
    #[serde(flatten)]
    pub body: TypeBody,
    /// `preload`/`load` paths in order of appearance.
    pub dependencies: Vec<String>,
    /// Set when the structural parse failed and the line-based fallback was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl ScriptSymbolTable {
    /// Create an empty table for a path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Whether the result came from the degraded fallback.
    pub fn is_degraded(&self) -> bool {
        self.diagnostic.is_some()
    }
}

/// Members of a script or of an inner class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypeBody {
    pub signals: Vec<Signal>,
    pub enums: Vec<Enum>,
    pub constants: Vec<Constant>,
    /// Properties marked with an `@export*` annotation.
    pub exported: Vec<Property>,
    /// Properties marked `@onready`.
    pub deferred: Vec<Property>,
    /// Properties without a category marker.
    pub plain: Vec<Property>,
    pub functions: Vec<Function>,
    pub static_functions: Vec<Function>,
    pub inner_types: Vec<InnerType>,
}

impl TypeBody {
    /// Instance and static functions, instance first.
    pub fn all_functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.iter().chain(self.static_functions.iter())
    }

    /// Number of properties across all three categories.
    pub fn property_count(&self) -> usize {
        self.exported.len() + self.deferred.len() + self.plain.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signal {
    pub name: String,
    pub params: Vec<Parameter>,
}

/// A signal or function parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: Option<String>) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enum {
    /// `None` for anonymous enums.
    pub name: Option<String>,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Constant {
    pub name: String,
    /// Cleaned initializer text.
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Property {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Option<String>,
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Function {
    pub name: String,
    pub params: Vec<Parameter>,
    pub return_type: Option<String>,
    pub is_static: bool,
}

/// A nested `class X:` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InnerType {
    pub name: String,
    pub base: Option<String>,
    #[serde(flatten)]
    pub body: TypeBody,
}

/// Format a parameter list as `a: int, b`.
pub fn format_params(params: &[Parameter]) -> String {
    params
        .iter()
        .map(|p| match &p.ty {
            Some(ty) => format!("{}: {}", p.name, ty),
            None => p.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_params() {
        let params = vec![
            Parameter::new("amount", Some("int".to_string())),
            Parameter::new("source", None),
        ];
        assert_eq!(format_params(&params), "amount: int, source");
        assert_eq!(format_params(&[]), "");
    }

    #[test]
    fn test_all_functions_order() {
        let func = |name: &str, is_static| Function {
            name: name.to_string(),
            params: vec![],
            return_type: None,
            is_static,
        };
        let body = TypeBody {
            functions: vec![func("a", false)],
            static_functions: vec![func("b", true)],
            ..Default::default()
        };
        let names: Vec<_> = body.all_functions().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_degraded_flag() {
        let mut table = ScriptSymbolTable::new("a.gd");
        assert!(!table.is_degraded());
        table.diagnostic = Some("line 1, column 1: unexpected syntax".to_string());
        assert!(table.is_degraded());
    }
}
