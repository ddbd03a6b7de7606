//! Optional YAML configuration for a scan.
//!
//! Looked up as `gdarch.yaml` or `.gdarch.yaml` in the project root unless a
//! path is given explicitly. Every field is optional.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use thiserror::Error;

use crate::render::RenderOptions;
use crate::scan::{ScanOptions, DEFAULT_EXCLUDED_DIRS};

/// Configuration file names, in lookup order.
pub const CONFIG_FILE_NAMES: &[&str] = &["gdarch.yaml", ".gdarch.yaml"];

/// Errors loading or validating a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid excluded_paths pattern {pattern:?}: {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Directory names never descended into.
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,
    /// Glob patterns matched against project-relative paths (e.g. "addons/**").
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    /// Append every script's source to the output.
    #[serde(default)]
    pub full_source: bool,
    #[serde(default = "default_max_assets")]
    pub max_assets_per_category: usize,
    #[serde(default = "default_max_other")]
    pub max_other_assets: usize,
}

fn default_exclude_dirs() -> Vec<String> {
    DEFAULT_EXCLUDED_DIRS.iter().map(|d| d.to_string()).collect()
}

fn default_max_assets() -> usize {
    20
}

fn default_max_other() -> usize {
    15
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exclude_dirs: default_exclude_dirs(),
            excluded_paths: Vec::new(),
            full_source: false,
            max_assets_per_category: default_max_assets(),
            max_other_assets: default_max_other(),
        }
    }
}

impl Config {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse_str(content: &str) -> Result<Self, serde_yaml::Error> {
        // an empty document deserializes as null
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Find a configuration file in `project_root`.
    pub fn discover(project_root: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| project_root.join(name))
            .find(|path| path.is_file())
    }

    /// Compile `excluded_paths`, or `None` when there are none.
    pub fn excluded_globs(&self) -> Result<Option<GlobSet>, ConfigError> {
        if self.excluded_paths.is_empty() {
            return Ok(None);
        }
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.excluded_paths {
            let glob = Glob::new(pattern).map_err(|source| ConfigError::Glob {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        builder
            .build()
            .map(Some)
            .map_err(|source| ConfigError::Glob {
                pattern: self.excluded_paths.join(", "),
                source,
            })
    }

    pub fn scan_options(&self) -> Result<ScanOptions, ConfigError> {
        let mut options = ScanOptions::new()
            .exclude_dirs(self.exclude_dirs.iter().cloned())
            .include_source(self.full_source);
        if let Some(globs) = self.excluded_globs()? {
            options = options.excluded_paths(globs);
        }
        Ok(options)
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            max_assets_per_category: self.max_assets_per_category,
            max_other_assets: self.max_other_assets,
        }
    }
}

/// Validate a configuration for correctness.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    config.excluded_globs().map(|_| ())
}
