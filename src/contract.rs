//! # contract: collaborator seams and shared pipeline data
//!
//! This module defines the traits the rendering pipeline consumes
//! (source acquisition, reformatting, highlighting, progress reporting)
//! together with the plain data types that flow between the components.
//!
//! ## Interface & Extensibility
//! - Implement [`Acquirer`] to plug in a new way of materialising a source
//!   tree (the default shells out to git, see `download::GitAcquirer`).
//! - Implement [`Reformatter`] to wire an actual reformatting engine into
//!   the text pipeline; failures are recovered per file, never fatal.
//! - Implement [`Highlighter`] to swap the markup producer; the tokenizer
//!   only depends on the markup contract, not on any engine.
//!
//! ## Mocking & Testing
//! All traits are annotated for `mockall`, so tests can generate
//! deterministic mocks. Mocks are exported behind the `test-export-mocks`
//! feature for use from integration tests.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::SourceSpec;

/// A maximal span of text sharing one highlight color, or a single newline
/// marker. Concatenating the `text` of every run of a file reproduces the
/// normalized source text exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    /// Hex color such as `"#000080"`; `None` renders in the caller's
    /// default color. Newline runs never carry a color.
    pub color: Option<&'static str>,
}

impl TextRun {
    pub fn text(text: impl Into<String>, color: Option<&'static str>) -> Self {
        Self {
            text: text.into(),
            color,
        }
    }

    pub fn newline() -> Self {
        Self {
            text: "\n".to_string(),
            color: None,
        }
    }

    pub fn is_newline(&self) -> bool {
        self.text == "\n" && self.color.is_none()
    }
}

/// The renderable form of one file after the text pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedContent {
    /// Ordered runs of a textual file.
    Text(Vec<TextRun>),
    /// Base64 payload of a binary file, emitted as an opaque block.
    Binary(String),
}

/// Aggregate counters reported at the end of a run.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunReport {
    pub files_processed: usize,
    pub documents_produced: usize,
}

/// A materialised source tree ready for traversal.
#[derive(Debug, Clone)]
pub struct AcquiredSource {
    pub root: PathBuf,
    /// True when the tree is a transient clone owned by this run.
    pub transient: bool,
}

#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("local source path {0:?} does not exist")]
    MissingLocalPath(PathBuf),
    #[error("failed to create clone directory: {0}")]
    CloneDir(std::io::Error),
    #[error("failed to launch git: {0}")]
    GitLaunch(std::io::Error),
    #[error("git clone of {url} exited with {status}")]
    CloneFailed {
        url: String,
        status: std::process::ExitStatus,
    },
    #[error("git checkout of {reference} exited with {status}")]
    CheckoutFailed {
        reference: String,
        status: std::process::ExitStatus,
    },
    #[error("failed to remove transient clone at {path:?}: {source}")]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Yields a filesystem root for the configured source. Remote acquisition
/// may fail; any such failure is fatal to the run.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
#[async_trait]
pub trait Acquirer: Send + Sync {
    async fn acquire(&self, source: &SourceSpec) -> Result<AcquiredSource, AcquireError>;

    /// Removes a transient clone. Must only be called after all documents
    /// have fully closed. A no-op for non-transient sources.
    async fn cleanup(&self, acquired: &AcquiredSource) -> Result<(), AcquireError>;
}

#[derive(Debug, Error)]
pub enum ReformatError {
    #[error("no reformatter grammar named {0:?}")]
    UnknownGrammar(String),
    #[error("reformatting failed: {0}")]
    Failed(String),
}

/// Reformats text according to a grammar identifier. Failure is recovered
/// at the file level: the pipeline falls back to the unformatted text.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
pub trait Reformatter: Send + Sync {
    fn reformat(&self, text: &str, grammar: &str) -> Result<String, ReformatError>;
}

#[derive(Debug, Error)]
pub enum HighlightError {
    #[error("highlighting failed: {0}")]
    Failed(String),
}

/// Produces tag-annotated markup for normalized text. `language` is an
/// extension token; `None` or an unknown token must yield plain-text markup
/// (entity-escaped, no tags). Failure falls back to plain-text markup.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
pub trait Highlighter: Send + Sync {
    fn highlight<'a>(
        &self,
        text: &str,
        language: Option<&'a str>,
    ) -> Result<String, HighlightError>;
}

/// Status-reporting capability injected into the run. The pipeline never
/// depends on which implementation is installed.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
pub trait Progress: Send + Sync {
    fn update(&self, message: &str);
    fn succeed(&self, message: &str);
    fn fail(&self, message: &str);
}
