use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Name of the per-repository ignore descriptor.
pub const IGNORE_FILE_NAME: &str = "repoprint.ignore";

/// File and directory names that are never rendered, regardless of the
/// ignore descriptor.
pub const EXCLUDED_NAMES: &[&str] = &[
    ".git",
    ".gitignore",
    ".gitmodules",
    "Cargo.lock",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "node_modules",
    "target",
    ".vscode",
    ".idea",
    ".vs",
    IGNORE_FILE_NAME,
];

/// Extensions (with leading dot) that are never rendered.
pub const EXCLUDED_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".svg", ".bmp", ".webp", ".ico", ".mp4", ".mp3", ".mov",
    ".avi", ".wmv", ".pdf",
];

/// Optional repository-supplied additions to the built-in deny lists.
/// Missing file is treated as an empty addition; a malformed file is a
/// fatal configuration error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IgnoreConfig {
    pub ignored_files: Vec<String>,
    pub ignored_extensions: Vec<String>,
}

#[derive(Debug, Error)]
pub enum IgnoreConfigError {
    #[error("failed to read ignore descriptor {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed ignore descriptor {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Merged deny lists, built once per run and read-only thereafter.
/// The merge is additive only: the built-in sets cannot be re-included.
#[derive(Debug)]
pub struct ExclusionSet {
    names: HashSet<String>,
    extensions: HashSet<String>,
}

impl ExclusionSet {
    pub fn built_in() -> Self {
        Self {
            names: EXCLUDED_NAMES.iter().map(|n| n.to_string()).collect(),
            extensions: EXCLUDED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Builds the merged set for `root`, reading `repoprint.ignore` when
    /// present.
    pub fn load(root: &Path) -> Result<Self, IgnoreConfigError> {
        let mut set = Self::built_in();
        let path = root.join(IGNORE_FILE_NAME);
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No ignore descriptor, using built-in excludes only");
                return Ok(set);
            }
            Err(source) => return Err(IgnoreConfigError::Read { path, source }),
        };
        let ignore: IgnoreConfig = serde_json::from_str(&data)
            .map_err(|source| IgnoreConfigError::Parse { path, source })?;
        info!(
            files = ignore.ignored_files.len(),
            extensions = ignore.ignored_extensions.len(),
            "Merged ignore descriptor into built-in excludes"
        );
        set.names.extend(ignore.ignored_files);
        set.extensions.extend(ignore.ignored_extensions);
        Ok(set)
    }

    /// Checks both the base name and the extension (with leading dot,
    /// case-sensitive); either match suppresses the entry.
    pub fn is_excluded(&self, name: &str, extension: Option<&str>) -> bool {
        if self.names.contains(name) {
            return true;
        }
        extension.is_some_and(|ext| self.extensions.contains(ext))
    }
}
