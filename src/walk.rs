use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::assemble::Assembler;
use crate::contract::{Progress, RunReport};
use crate::document::DocumentError;
use crate::excludes::ExclusionSet;
use crate::preprocess::TextPipeline;

#[derive(Debug, Error)]
pub enum WalkError {
    #[error("failed to list directory {path:?}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read file {path:?}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to append {path:?} to the document: {source}")]
    Append {
        path: PathBuf,
        source: DocumentError,
    },
}

/// Depth-first traversal in directory-listing order. Holds the per-run
/// mutable state explicitly so nothing is captured across the recursion.
pub struct Walker<'a> {
    root: &'a Path,
    excludes: &'a ExclusionSet,
    pipeline: &'a TextPipeline<'a>,
    assembler: &'a mut Assembler,
    progress: &'a dyn Progress,
    files_processed: usize,
}

impl<'a> Walker<'a> {
    pub fn new(
        root: &'a Path,
        excludes: &'a ExclusionSet,
        pipeline: &'a TextPipeline<'a>,
        assembler: &'a mut Assembler,
        progress: &'a dyn Progress,
    ) -> Self {
        Self {
            root,
            excludes,
            pipeline,
            assembler,
            progress,
            files_processed: 0,
        }
    }

    /// Visits `dir` recursively. Excluded entries are skipped without
    /// descent or processing; files and directories alike.
    pub fn walk(&mut self, dir: &Path) -> Result<(), WalkError> {
        let entries = fs::read_dir(dir).map_err(|source| WalkError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| WalkError::ReadDir {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if self.is_excluded(&path) {
                debug!(path = %path.display(), "Skipping excluded entry");
                continue;
            }
            let file_type = entry.file_type().map_err(|source| WalkError::ReadDir {
                path: path.clone(),
                source,
            })?;
            if file_type.is_dir() {
                self.walk(&path)?;
            } else if file_type.is_file() {
                self.render_file(&path)?;
            }
        }
        Ok(())
    }

    /// Normalizes, tokenizes and appends one file. Unreadable content is
    /// fatal for the whole run, never silently skipped.
    pub fn render_file(&mut self, path: &Path) -> Result<(), WalkError> {
        let raw = fs::read(path).map_err(|source| WalkError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let extension = path.extension().and_then(|e| e.to_str());
        let content = self.pipeline.render(&raw, extension);
        let rel = path.strip_prefix(self.root).unwrap_or(path);
        self.assembler
            .add_file(rel, content)
            .map_err(|source| WalkError::Append {
                path: path.to_path_buf(),
                source,
            })?;
        self.files_processed += 1;
        self.progress.update(&format!(
            "Processing files... ({} processed)",
            self.files_processed
        ));
        Ok(())
    }

    pub fn report(&self) -> RunReport {
        RunReport {
            files_processed: self.files_processed,
            documents_produced: 0,
        }
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"));
        self.excludes.is_excluded(name, extension.as_deref())
    }
}
