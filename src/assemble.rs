//! Document assembly: accumulates rendered files into one aggregate
//! document, or opens and finalizes one document per file. Owns all
//! document state; closes are asynchronous and tracked until awaited.

use futures::future::try_join_all;
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::RenderOptions;
use crate::contract::{RenderedContent, TextRun};
use crate::document::{DocumentError, PageBuffer};

/// Color of the file header line and the line-number gutter.
const ANNOTATION_COLOR: &str = "#666666";

enum Mode {
    Single { doc: PageBuffer, target: PathBuf },
    PerFile { out_dir: PathBuf },
}

pub struct Assembler {
    mode: Mode,
    options: RenderOptions,
    files_added: usize,
    documents_produced: usize,
    pending: Vec<JoinHandle<Result<(), DocumentError>>>,
}

impl Assembler {
    /// Opens the aggregate document before traversal begins.
    pub fn open_single(target: &Path, options: RenderOptions) -> Result<Self, DocumentError> {
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| DocumentError::Write {
                path: target.to_path_buf(),
                source,
            })?;
        }
        let title = target
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("repoprint");
        let mut doc = PageBuffer::new(title, &options.code_font, options.line_spacing)?;
        doc.start_page();
        debug!(target = %target.display(), "Opened single-document assembler");
        Ok(Self {
            mode: Mode::Single {
                doc,
                target: target.to_path_buf(),
            },
            options,
            files_added: 0,
            documents_produced: 0,
            pending: Vec::new(),
        })
    }

    /// Prepares the output directory for one-document-per-file mode.
    pub fn open_per_file(out_dir: &Path, options: RenderOptions) -> Result<Self, DocumentError> {
        std::fs::create_dir_all(out_dir).map_err(|source| DocumentError::Write {
            path: out_dir.to_path_buf(),
            source,
        })?;
        debug!(out_dir = %out_dir.display(), "Opened per-file assembler");
        Ok(Self {
            mode: Mode::PerFile {
                out_dir: out_dir.to_path_buf(),
            },
            options,
            files_added: 0,
            documents_produced: 0,
            pending: Vec::new(),
        })
    }

    /// Appends one rendered file. In single-document mode this adds a page
    /// break (except ahead of the first file) and accumulates; in per-file
    /// mode a whole document is opened, finalized, and its write pipelined.
    pub fn add_file(&mut self, rel: &Path, content: RenderedContent) -> Result<(), DocumentError> {
        let options = self.options.clone();
        match &mut self.mode {
            Mode::Single { doc, .. } => {
                if self.files_added > 0 {
                    doc.start_page();
                }
                write_file_contents(doc, rel, &content, &options);
            }
            Mode::PerFile { out_dir } => {
                let flat_name = flatten_file_name(rel);
                let path = out_dir.join(&flat_name);
                let mut doc = PageBuffer::new(&flat_name, &options.code_font, options.line_spacing)?;
                doc.start_page();
                write_file_contents(&mut doc, rel, &content, &options);
                doc.seal();
                if options.page_numbers {
                    overlay_page_numbers(&mut doc);
                }
                let bytes = doc.save();
                debug!(path = %path.display(), size = bytes.len(), "Finalized per-file document");
                self.pending.push(tokio::spawn(async move {
                    tokio::fs::write(&path, bytes)
                        .await
                        .map_err(|source| DocumentError::Write { path, source })
                }));
                self.documents_produced += 1;
            }
        }
        self.files_added += 1;
        Ok(())
    }

    /// Buffered page count of the aggregate document (zero in per-file mode).
    pub fn page_count(&self) -> usize {
        match &self.mode {
            Mode::Single { doc, .. } => doc.page_count(),
            Mode::PerFile { .. } => 0,
        }
    }

    /// Finalizes the aggregate document (page-number overlay, serialize,
    /// write) and awaits every pending byte-stream completion. The run must
    /// not be reported successful until this resolves.
    pub async fn finish(mut self) -> Result<usize, DocumentError> {
        if let Mode::Single { mut doc, target } = self.mode {
            doc.seal();
            if self.options.page_numbers {
                overlay_page_numbers(&mut doc);
            }
            let bytes = doc.save();
            tokio::fs::write(&target, bytes)
                .await
                .map_err(|source| DocumentError::Write {
                    path: target.clone(),
                    source,
                })?;
            info!(target = %target.display(), "Document stream completed");
            self.documents_produced += 1;
        }
        let results = try_join_all(self.pending)
            .await
            .map_err(|e| DocumentError::Task(e.to_string()))?;
        for result in results {
            result?;
        }
        Ok(self.documents_produced)
    }
}

/// Overlays `Page: i of n` captions once the total page count is known.
fn overlay_page_numbers(doc: &mut PageBuffer) {
    let total = doc.page_count();
    for index in 0..total {
        doc.overlay_caption(index, &format!("Page: {} of {}", index + 1, total));
    }
}

/// Derives the per-file output name: traversal-relative path with
/// separators replaced by `_`, plus the document extension.
fn flatten_file_name(rel: &Path) -> String {
    let mut flat = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("_");
    flat.push_str(".pdf");
    flat
}

fn write_file_contents(
    doc: &mut PageBuffer,
    rel: &Path,
    content: &RenderedContent,
    options: &RenderOptions,
) {
    doc.write_span(
        &format!("// File: {}", rel.display()),
        Some(ANNOTATION_COLOR),
    );
    doc.line_break();

    match content {
        RenderedContent::Binary(payload) => {
            doc.line_break();
            doc.write_span("BASE64:", None);
            doc.line_break();
            doc.line_break();
            doc.write_span(payload, None);
            doc.line_break();
        }
        RenderedContent::Text(runs) => write_runs(doc, runs, options),
    }
}

/// Streams runs into the document: newline runs terminate the current line,
/// anything else continues it. The line-number gutter is written before the
/// first run of each line, right-justified to the width of the file's total
/// line count.
fn write_runs(doc: &mut PageBuffer, runs: &[TextRun], options: &RenderOptions) {
    let total_lines = runs.iter().filter(|r| r.is_newline()).count().max(1);
    let gutter_width = total_lines.to_string().len();
    let mut line_number = 1usize;
    let mut at_line_start = true;

    for run in runs {
        if run.is_newline() {
            doc.line_break();
            at_line_start = true;
            continue;
        }
        if at_line_start {
            if options.line_numbers {
                doc.write_span(
                    &format!("{line_number:>gutter_width$} "),
                    Some(ANNOTATION_COLOR),
                );
                line_number += 1;
            }
            at_line_start = false;
        }
        doc.write_span(&run.text, run.color);
    }
}
