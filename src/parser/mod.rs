//! Structural parsing interface for GDScript source.
//!
//! This module provides:
//! - `ScriptParser` trait: the black-box seam between the extractor and a
//!   grammar-aware parser (`parse(text) -> tree | diagnostic`)
//! - `SourceTree`: a closed, tagged-variant declaration tree that every
//!   backend lowers into
//! - A tree-sitter backend (behind the `tree-sitter` feature)

use once_cell::sync::OnceCell;
use thiserror::Error;

#[cfg(feature = "tree-sitter")]
pub mod treesitter;

/// A failed structural parse.
///
/// The message is kept verbatim on the script's symbol table so callers can
/// flag degraded results.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ParseDiagnostic {
    /// Human-readable description, including the location when known.
    pub message: String,
    /// Line of the first offending token (1-indexed).
    pub line: Option<usize>,
    /// Column of the first offending token (1-indexed).
    pub column: Option<usize>,
}

impl ParseDiagnostic {
    /// Create a diagnostic without a source location.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            column: None,
        }
    }

    /// Create a diagnostic pointing at a source location.
    pub fn at(message: impl AsRef<str>, line: usize, column: usize) -> Self {
        Self {
            message: format!("line {}, column {}: {}", line, column, message.as_ref()),
            line: Some(line),
            column: Some(column),
        }
    }
}

/// Parsed declarations of one script, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceTree {
    pub items: Vec<Item>,
}

/// One declaration-level statement.
///
/// The set is closed: anything the extractor does not model is `Other`,
/// which still matters because it clears pending annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// `@tool` / `tool`
    Tool,
    /// `class_name X`
    ClassName(String),
    /// `extends X` or `extends "res://x.gd"` (quotes stripped)
    Extends(String),
    Signal(SignalDecl),
    /// An annotation name without the `@` (e.g. "export", "onready", "static").
    Annotation(String),
    Variable(VariableDecl),
    Function(FunctionDecl),
    Enum(EnumDecl),
    Constant(ConstDecl),
    /// Inner `class X:` block.
    Class(ClassDecl),
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalDecl {
    pub name: String,
    pub params: Vec<Param>,
}

/// A member variable declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDecl {
    pub name: String,
    pub form: VariableForm,
}

/// Syntactic shape of a variable declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableForm {
    /// `var x: T = v`
    TypedAssigned { ty: String, value: String },
    /// `var x: T`
    Typed { ty: String },
    /// `var x = v` / `var x := v`
    Assigned { value: String },
    /// `var x`
    Untyped,
}

/// A function or signal parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub form: ParamForm,
}

/// Syntactic shape of a parameter. Default expressions are not retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamForm {
    Untyped,
    Typed(String),
    /// `x = v` / `x := v`
    Default,
    /// `x: T = v`
    TypedDefault(String),
}

impl Param {
    /// Declared type, if the parameter carries one.
    pub fn declared_type(&self) -> Option<&str> {
        match &self.form {
            ParamForm::Typed(ty) | ParamForm::TypedDefault(ty) => Some(ty),
            ParamForm::Untyped | ParamForm::Default => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDecl {
    pub name: Option<String>,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstDecl {
    pub name: String,
    /// Raw initializer text.
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl {
    pub name: String,
    pub extends: Option<String>,
    pub body: Vec<Item>,
}

/// Grammar-aware parser for script source.
pub trait ScriptParser: Send + Sync {
    /// Parse source text into declarations, or fail with a diagnostic.
    ///
    /// Implementations must fail rather than return a partial tree.
    fn parse(&self, source: &str) -> Result<SourceTree, ParseDiagnostic>;

    /// Backend name, for logging.
    fn name(&self) -> &str;
}

/// Backend used when no grammar is compiled in. Every parse fails, so every
/// script goes through the line-based fallback.
pub struct UnavailableParser;

impl ScriptParser for UnavailableParser {
    fn parse(&self, _source: &str) -> Result<SourceTree, ParseDiagnostic> {
        Err(ParseDiagnostic::new(
            "structural parser unavailable (built without the tree-sitter feature)",
        ))
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

#[cfg(feature = "tree-sitter")]
static DEFAULT_PARSER: OnceCell<treesitter::TreeSitterParser> = OnceCell::new();

#[cfg(not(feature = "tree-sitter"))]
static DEFAULT_PARSER: OnceCell<UnavailableParser> = OnceCell::new();

/// The default structural parser for this build.
#[cfg(feature = "tree-sitter")]
pub fn default_parser() -> &'static dyn ScriptParser {
    DEFAULT_PARSER.get_or_init(treesitter::TreeSitterParser::new)
}

/// The default structural parser for this build.
#[cfg(not(feature = "tree-sitter"))]
pub fn default_parser() -> &'static dyn ScriptParser {
    DEFAULT_PARSER.get_or_init(|| UnavailableParser)
}
