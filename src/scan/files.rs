//! Project file enumeration and classification.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use globset::GlobSet;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::ScanError;

/// Extensions that are never reported.
const IGNORED_EXTENSIONS: [&str; 3] = ["uid", "import", "tmp"];

/// How a file is dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKind {
    Script,
    Scene,
    Resource,
    /// Editor/engine bookkeeping, skipped entirely.
    Ignored,
    /// Anything else, bucketed by lowercase extension (empty if none).
    Other(String),
}

impl FileKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "gd" => FileKind::Script,
            "tscn" => FileKind::Scene,
            "tres" => FileKind::Resource,
            e if IGNORED_EXTENSIONS.contains(&e) => FileKind::Ignored,
            _ => FileKind::Other(ext),
        }
    }
}

/// A regular file found under the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFile {
    pub path: PathBuf,
    /// Root-relative path with `/` separators.
    pub relative: String,
    pub kind: FileKind,
}

/// List every regular file under `root`, sorted by relative path.
///
/// Directories named in `excluded_dirs`, and any entry whose relative path
/// matches `excluded_paths`, are pruned before descending. Errors below the
/// root are logged and skipped; an error on the root itself is returned.
pub fn list_files(
    root: &Path,
    excluded_dirs: &BTreeSet<String>,
    excluded_paths: Option<&GlobSet>,
) -> Result<Vec<ProjectFile>, ScanError> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            if e.file_type().is_dir() && excluded_dirs.contains(name.as_ref()) {
                debug!(path = %e.path().display(), "skipping excluded directory");
                return false;
            }
            match excluded_paths {
                Some(globs) => !globs.is_match(relative_path(root, e.path())),
                None => true,
            }
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(ScanError::Walk(e)),
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        files.push(ProjectFile {
            relative: relative_path(root, &path),
            kind: FileKind::from_path(&path),
            path,
        });
    }

    files.sort_by(|a, b| a.relative.cmp(&b.relative));
    Ok(files)
}

/// `path` relative to `root`, joined with `/`.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
