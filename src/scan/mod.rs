//! Project scanning.
//!
//! The scanner parses `project.godot` once, walks the tree, parses every
//! script, scene and resource in parallel, and merges the results in path
//! order through a single `ReportBuilder`.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use globset::GlobSet;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analysis::{ScriptExtractor, ScriptSymbolTable};
use crate::formats::{parse_project, parse_resource, parse_scene, ResourceHeader, SceneDescriptor};
use crate::parser::{default_parser, ScriptParser};
use crate::report::ArchitectureReport;

mod aggregate;
mod files;

pub use aggregate::{categorize, ReportBuilder};
pub use files::{list_files, relative_path, FileKind, ProjectFile};

/// Directory names skipped unless configured otherwise.
pub const DEFAULT_EXCLUDED_DIRS: [&str; 4] = [".godot", ".git", "__pycache__", ".import"];

/// Conditions that stop a scan before a report exists.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("project root {0:?} does not exist")]
    RootNotFound(PathBuf),

    #[error("project root {0:?} is not a directory")]
    NotADirectory(PathBuf),

    #[error("cannot access project root {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("walking project tree: {0}")]
    Walk(#[from] walkdir::Error),
}

/// What to skip and what to keep while scanning.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    exclude_dirs: BTreeSet<String>,
    excluded_paths: Option<GlobSet>,
    include_source: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            exclude_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|d| d.to_string()).collect(),
            excluded_paths: None,
            include_source: false,
        }
    }
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the excluded directory names.
    pub fn exclude_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Skip entries whose project-relative path matches any glob.
    pub fn excluded_paths(mut self, globs: GlobSet) -> Self {
        self.excluded_paths = Some(globs);
        self
    }

    /// Keep each script's source text in the report.
    pub fn include_source(mut self, include: bool) -> Self {
        self.include_source = include;
        self
    }

    pub fn excluded_dir_names(&self) -> &BTreeSet<String> {
        &self.exclude_dirs
    }

    pub fn includes_source(&self) -> bool {
        self.include_source
    }
}

/// Result of parsing one file, before merging.
enum Parsed {
    Script(ScriptSymbolTable, Option<String>),
    Scene(String, SceneDescriptor),
    Resource(String, ResourceHeader),
    Other(String, String),
    Skipped,
}

/// Scans one project root into an `ArchitectureReport`.
pub struct Scanner<'p> {
    root: PathBuf,
    options: ScanOptions,
    parser: &'p dyn ScriptParser,
}

impl Scanner<'static> {
    /// Create a scanner with default options and the default script parser.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            options: ScanOptions::default(),
            parser: default_parser(),
        }
    }
}

impl<'p> Scanner<'p> {
    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// Use a different structural parser for scripts.
    pub fn with_parser<'q>(self, parser: &'q dyn ScriptParser) -> Scanner<'q> {
        Scanner {
            root: self.root,
            options: self.options,
            parser,
        }
    }

    /// Run the scan. Only a missing or unreadable root is an error.
    pub fn scan(&self) -> Result<ArchitectureReport, ScanError> {
        self.check_root()?;
        info!(root = %self.root.display(), parser = self.parser.name(), "scanning project");

        let project = parse_project(&self.root);
        let files = list_files(
            &self.root,
            &self.options.exclude_dirs,
            self.options.excluded_paths.as_ref(),
        )?;

        let parsed: Vec<Parsed> = files.par_iter().map(|f| self.parse_file(f)).collect();

        let mut builder = ReportBuilder::new();
        for result in parsed {
            match result {
                Parsed::Script(table, source) => builder.add_script(table, source),
                Parsed::Scene(path, scene) => builder.add_scene(path, scene),
                Parsed::Resource(path, header) => builder.add_resource(path, header),
                Parsed::Other(ext, path) => builder.add_other(ext, path),
                Parsed::Skipped => {}
            }
        }

        let report = builder.finish(self.root.display().to_string(), project);
        info!(
            scripts = report.stats.scripts,
            scenes = report.stats.scenes,
            resources = report.stats.resources,
            total = report.stats.total_files,
            errors = report.error_count(),
            "scan complete"
        );
        Ok(report)
    }

    fn check_root(&self) -> Result<(), ScanError> {
        match fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(ScanError::NotADirectory(self.root.clone())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ScanError::RootNotFound(self.root.clone()))
            }
            Err(e) => Err(ScanError::Unreadable {
                path: self.root.clone(),
                source: e,
            }),
        }
    }

    fn parse_file(&self, file: &ProjectFile) -> Parsed {
        debug!(path = %file.relative, kind = ?file.kind, "dispatching");
        match &file.kind {
            FileKind::Script => {
                let (table, source) = self.parse_script(file);
                Parsed::Script(table, source)
            }
            FileKind::Scene => Parsed::Scene(file.relative.clone(), parse_scene(&file.path)),
            FileKind::Resource => {
                Parsed::Resource(file.relative.clone(), parse_resource(&file.path))
            }
            FileKind::Other(ext) => Parsed::Other(ext.clone(), file.relative.clone()),
            FileKind::Ignored => Parsed::Skipped,
        }
    }

    fn parse_script(&self, file: &ProjectFile) -> (ScriptSymbolTable, Option<String>) {
        match fs::read(&file.path) {
            Ok(bytes) => {
                let source = String::from_utf8_lossy(&bytes).into_owned();
                let table = ScriptExtractor::new(self.parser).extract(&file.relative, &source);
                let kept = self.options.include_source.then_some(source);
                (table, kept)
            }
            Err(e) => {
                warn!(path = %file.relative, error = %e, "cannot read script");
                let mut table = ScriptSymbolTable::new(file.relative.clone());
                table.diagnostic = Some(format!("unreadable: {}", e));
                (table, None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_root() {
        let temp = TempDir::new().unwrap();
        let err = Scanner::new(temp.path().join("absent")).scan().unwrap_err();
        assert!(matches!(err, ScanError::RootNotFound(_)));
    }

    #[test]
    fn test_root_is_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("project.godot");
        fs::write(&file, "").unwrap();
        let err = Scanner::new(&file).scan().unwrap_err();
        assert!(matches!(err, ScanError::NotADirectory(_)));
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn test_options_builder() {
        let options = ScanOptions::new()
            .exclude_dirs(["build", ".git"])
            .include_source(true);
        assert!(options.includes_source());
        assert!(options.excluded_dir_names().contains("build"));
        assert!(!options.excluded_dir_names().contains(".godot"));
        assert_eq!(ScanOptions::default().excluded_dir_names().len(), 4);
    }

    #[test]
    fn test_source_capture() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.gd"), "extends Node\n").unwrap();

        let report = Scanner::new(temp.path())
            .with_options(ScanOptions::new().include_source(true))
            .scan()
            .unwrap();
        assert_eq!(report.sources["a.gd"], "extends Node\n");

        let report = Scanner::new(temp.path()).scan().unwrap();
        assert!(report.sources.is_empty());
    }
}
