//! gdarch - Godot project architecture extractor.
//!
//! gdarch statically analyzes a Godot project and builds a cross-referenced
//! report of its architecture: declared classes, scene trees, signal wiring,
//! script dependencies and assets. The report renders as Markdown for humans
//! and AI assistants, or as JSON.
//!
//! # Architecture
//!
//! - `parser`: structural GDScript parsing behind the `ScriptParser` trait
//!   (tree-sitter backend with the `tree-sitter` feature)
//! - `analysis`: script symbol extraction, with a line-based fallback
//! - `formats`: `.tscn`, `.tres` and `project.godot` parsers
//! - `scan`: tree walk, parallel per-file parsing, report assembly
//! - `report`: the `ArchitectureReport` data model
//! - `render`: Markdown / JSON output and the terminal summary
//! - `config`: optional YAML configuration
//!
//! # Example
//!
//! ```no_run
//! use gdarch::{render, Scanner};
//!
//! let report = Scanner::new("my_game").scan()?;
//! let markdown = render::render_markdown(&report, &render::RenderOptions::default());
//! println!("{}", markdown);
//! # Ok::<(), gdarch::ScanError>(())
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod formats;
pub mod parser;
pub mod render;
pub mod report;
pub mod scan;

pub use analysis::{extract_script, ScriptExtractor, ScriptSymbolTable};
pub use config::{Config, ConfigError};
pub use formats::{ProjectConfig, ResourceHeader, SceneDescriptor};
pub use parser::{default_parser, ParseDiagnostic, ScriptParser, SourceTree};
pub use report::{ArchitectureReport, DependencyEdge, ReportWarning};
pub use scan::{ScanError, ScanOptions, Scanner};
