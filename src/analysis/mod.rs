//! Script analysis module.
//!
//! Turns GDScript source into a `ScriptSymbolTable`:
//! - Declared class name, base type and tool flag
//! - Signals, enums, constants
//! - Properties partitioned into exported / deferred / plain
//! - Functions (instance and static) and inner types
//! - `preload`/`load` dependency paths
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐  ok   ┌──────────────────┐
//! │ Script text │────▶│ ScriptParser │──────▶│ Declaration walk │──┐
//! └─────────────┘     └──────────────┘       └──────────────────┘  │
//!        │                    │ diagnostic                         ▼
//!        │                    ▼                           ┌──────────────────┐
//!        │            ┌──────────────┐                    │ ScriptSymbolTable│
//!        │            │ Line fallback│───────────────────▶│                  │
//!        │            └──────────────┘                    └──────────────────┘
//!        │                                                         ▲
//!        └──────────────── load references ────────────────────────┘
//! ```

mod extract;
mod fallback;
mod symbols;

pub use extract::{clean_expr, extract_script, load_references, ScriptExtractor};
pub use symbols::{
    format_params, Constant, Enum, Function, InnerType, Parameter, Property, ScriptSymbolTable,
    Signal, TypeBody,
};

/// Run only the line-based fallback on a script.
pub fn extract_script_fallback(path: &str, source: &str) -> ScriptSymbolTable {
    let mut table = fallback::extract(path, source);
    table.dependencies = load_references(source);
    table
}
