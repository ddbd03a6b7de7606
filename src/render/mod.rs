//! Output rendering for architecture reports.
//!
//! Supports two output formats:
//! - Markdown: a sectioned document meant for humans and AI assistants
//! - JSON: the full report, for programmatic consumption
//!
//! Rendering never mutates the report and is deterministic for a given report.

use std::fs;
use std::path::Path;

use clap::ValueEnum;

use crate::report::ArchitectureReport;

mod markdown;
mod summary;

pub use markdown::render_markdown;
pub use summary::write_summary;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Markdown,
    Json,
}

impl Format {
    /// Default output file name for this format.
    pub fn default_file_name(&self) -> &'static str {
        match self {
            Format::Markdown => "PROJECT_ARCHITECTURE.md",
            Format::Json => "PROJECT_ARCHITECTURE.json",
        }
    }
}

/// Limits applied while rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Files listed per asset category before truncating.
    pub max_assets_per_category: usize,
    /// Files listed in the "Other" category before truncating.
    pub max_other_assets: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_assets_per_category: 20,
            max_other_assets: 15,
        }
    }
}

/// Render the report in the given format.
pub fn render(
    report: &ArchitectureReport,
    format: Format,
    options: &RenderOptions,
) -> anyhow::Result<String> {
    match format {
        Format::Markdown => Ok(render_markdown(report, options)),
        Format::Json => render_json(report),
    }
}

/// Pretty-printed JSON with a trailing newline.
pub fn render_json(report: &ArchitectureReport) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(report)?;
    json.push('\n');
    Ok(json)
}

/// Render and write to `path`.
pub fn write_report(
    path: &Path,
    report: &ArchitectureReport,
    format: Format,
    options: &RenderOptions,
) -> anyhow::Result<()> {
    let output = render(report, format, options)?;
    fs::write(path, output)?;
    Ok(())
}
