//! High-level pipeline: orchestrates acquire → traverse → assemble →
//! cleanup for one run.
//!
//! The traversal and rendering loop is strictly sequential: one file is
//! fully normalized, tokenized and appended before the next begins, because
//! page order and per-file numbering depend on traversal order and the
//! assembler is a single-writer resource. The only asynchrony is byte-stream
//! completion, which [`render`] awaits before reporting success and before
//! any clone cleanup.
//!
//! # Error Handling
//! Recoverable per-file errors (reformatting, highlighting, comment
//! stripping) are swallowed inside the text pipeline with a warning; every
//! other failure propagates as [`RenderError`] and aborts the run without
//! attempting partial recovery of already-open documents.

use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info};

use crate::assemble::Assembler;
use crate::config::{OptionsError, RunConfig, SourceSpec};
use crate::contract::{
    AcquireError, AcquiredSource, Acquirer, Highlighter, Progress, Reformatter, RunReport,
};
use crate::document::DocumentError;
use crate::excludes::{ExclusionSet, IgnoreConfigError};
use crate::preprocess::TextPipeline;
use crate::syntax::DEFAULT_PALETTE;
use crate::walk::{WalkError, Walker};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Options(#[from] OptionsError),
    #[error(transparent)]
    Acquire(#[from] AcquireError),
    #[error(transparent)]
    IgnoreConfig(#[from] IgnoreConfigError),
    #[error("requested path {0:?} does not exist in the source tree")]
    MissingSubPath(PathBuf),
    #[error(transparent)]
    Walk(#[from] WalkError),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// The injected collaborators a run depends on.
pub struct Collaborators<'a> {
    pub acquirer: &'a dyn Acquirer,
    pub reformatter: &'a dyn Reformatter,
    pub highlighter: &'a dyn Highlighter,
    pub progress: &'a dyn Progress,
}

/// Entrypoint: renders the configured source into one or many documents
/// and reports the final counters.
pub async fn render(
    config: &RunConfig,
    collab: &Collaborators<'_>,
) -> Result<RunReport, RenderError> {
    config.options.validate()?;
    config.source.trace_loaded();
    collab.progress.update("Setting everything up...");

    if matches!(config.source, SourceSpec::Git { .. }) {
        collab.progress.update("Cloning repository...");
    }
    let acquired = collab.acquirer.acquire(&config.source).await?;
    if acquired.transient {
        collab.progress.succeed("Repository cloned successfully");
    }

    collab.progress.update("Processing files...");
    let result = render_tree(config, collab, &acquired).await;
    match &result {
        Ok(report) => {
            let plural = if config.options.one_pdf_per_file {
                "PDFs"
            } else {
                "PDF"
            };
            collab.progress.succeed(&format!(
                "{} created with {} files processed.",
                plural, report.files_processed
            ));
            // Cleanup strictly after every document has closed.
            if config.source.cleanup_after_run() {
                collab.acquirer.cleanup(&acquired).await?;
                collab
                    .progress
                    .succeed("Temporary repository has been deleted.");
            }
        }
        Err(e) => {
            error!(error = %e, "Render run failed");
            collab.progress.fail("An error occurred");
        }
    }
    result
}

async fn render_tree(
    config: &RunConfig,
    collab: &Collaborators<'_>,
    acquired: &AcquiredSource,
) -> Result<RunReport, RenderError> {
    let root = acquired.root.as_path();
    let excludes = ExclusionSet::load(root)?;
    let options = &config.options;

    // Validate the sub-path restriction before any output path is touched.
    let scope = match &config.subpath {
        Some(sub) => {
            let full = root.join(sub);
            if !full.exists() {
                return Err(RenderError::MissingSubPath(sub.clone()));
            }
            Some(full)
        }
        None => None,
    };

    let mut assembler = if options.one_pdf_per_file {
        Assembler::open_per_file(&config.output, options.clone())?
    } else {
        Assembler::open_single(&config.output, options.clone())?
    };
    let pipeline = TextPipeline::new(
        options,
        collab.reformatter,
        collab.highlighter,
        DEFAULT_PALETTE,
    );

    let report = {
        let mut walker = Walker::new(root, &excludes, &pipeline, &mut assembler, collab.progress);
        match &scope {
            Some(path) if path.is_file() => walker.render_file(path)?,
            Some(path) => walker.walk(path)?,
            None => walker.walk(root)?,
        }
        walker.report()
    };

    let documents_produced = assembler.finish().await?;
    info!(
        files = report.files_processed,
        documents = documents_produced,
        "Render complete"
    );
    Ok(RunReport {
        files_processed: report.files_processed,
        documents_produced,
    })
}
