//! Command-line interface for gdarch.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{self, Config};
use crate::render::{self, Format};
use crate::scan::Scanner;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ERROR: i32 = 2;

/// Godot project architecture extractor.
///
/// Scans a Godot project (scripts, scenes, resources and project.godot) and
/// writes a cross-referenced architecture document: class registry, scene
/// trees, signal wiring, dependency graph and asset summary.
#[derive(Parser, Debug)]
#[command(name = "gdarch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the Godot project root (containing project.godot)
    pub project: PathBuf,

    /// Output file (default: <PROJECT>/PROJECT_ARCHITECTURE.md or .json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "markdown")]
    pub format: Format,

    /// Append the full source of every script
    #[arg(long)]
    pub full_source: bool,

    /// Comma-separated directory names to skip (replaces the configured list)
    #[arg(long, value_delimiter = ',')]
    pub exclude: Option<Vec<String>>,

    /// Path to a YAML config file (default: auto-discover in the project root)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `-v`.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // a subscriber may already be set (e.g. in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Load the explicit or discovered config, then apply CLI overrides.
pub fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let path = cli
        .config
        .clone()
        .or_else(|| Config::discover(&cli.project));

    let mut config = match &path {
        Some(path) => {
            info!(path = %path.display(), "using config");
            Config::parse_file(path)?
        }
        None => Config::default(),
    };

    if let Some(dirs) = &cli.exclude {
        config.exclude_dirs = dirs
            .iter()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .collect();
    }
    if cli.full_source {
        config.full_source = true;
    }

    config::validate(&config)?;
    Ok(config)
}

/// Run a scan and write the report.
pub fn run(cli: &Cli) -> anyhow::Result<i32> {
    let config = match load_config(cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let report = match Scanner::new(&cli.project)
        .with_options(config.scan_options()?)
        .scan()
    {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.project.join(cli.format.default_file_name()));

    render::write_report(&output, &report, cli.format, &config.render_options())
        .with_context(|| format!("writing {}", output.display()))?;

    render::write_summary(&report, &output.display().to_string());
    Ok(EXIT_SUCCESS)
}
