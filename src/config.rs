use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

use crate::document::font_for_identifier;

pub const MIN_TAB_WIDTH: u8 = 1;
pub const MAX_TAB_WIDTH: u8 = 8;
pub const MAX_LINE_SPACING: u8 = 12;

/// The full configuration for one render run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub source: SourceSpec,
    /// Output file in single-document mode, output directory in per-file mode.
    pub output: PathBuf,
    pub options: RenderOptions,
    /// Restricts traversal to one file or one subtree within the source root.
    pub subpath: Option<PathBuf>,
}

/// Where the source tree comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceSpec {
    Git {
        repo_url: String,
        #[serde(default)]
        reference: Option<String>,
        /// Retain the transient clone after the run instead of deleting it.
        #[serde(default)]
        keep_clone: bool,
    },
    Local {
        path: PathBuf,
    },
}

impl SourceSpec {
    /// Whether the acquired tree is a transient clone that should be removed
    /// once all documents have closed.
    pub fn cleanup_after_run(&self) -> bool {
        match self {
            SourceSpec::Git { keep_clone, .. } => !keep_clone,
            SourceSpec::Local { .. } => false,
        }
    }

    pub fn trace_loaded(&self) {
        match self {
            SourceSpec::Git {
                repo_url,
                reference,
                keep_clone,
            } => {
                info!(
                    repo_url = %repo_url,
                    reference = reference.as_deref().unwrap_or("HEAD"),
                    keep_clone = keep_clone,
                    "Loaded git source"
                );
            }
            SourceSpec::Local { path } => {
                info!(path = %path.display(), "Loaded local source");
            }
        }
    }
}

/// Immutable per-run rendering configuration. Numeric fields are validated
/// once via [`RenderOptions::validate`]; the pipeline assumes they are in
/// range after that.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub line_numbers: bool,
    pub highlighting: bool,
    pub page_numbers: bool,
    pub strip_comments: bool,
    pub remove_blank_lines: bool,
    pub one_pdf_per_file: bool,
    /// Number of spaces a tab character expands to.
    pub tab_width: u8,
    /// Extra points of leading between lines.
    pub line_spacing: u8,
    pub code_font: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            line_numbers: true,
            highlighting: true,
            page_numbers: true,
            strip_comments: false,
            remove_blank_lines: false,
            one_pdf_per_file: false,
            tab_width: 4,
            line_spacing: 4,
            code_font: "courier".to_string(),
        }
    }
}

impl RenderOptions {
    pub fn validate(&self) -> Result<(), OptionsError> {
        if !(MIN_TAB_WIDTH..=MAX_TAB_WIDTH).contains(&self.tab_width) {
            return Err(OptionsError::TabWidth(self.tab_width));
        }
        if self.line_spacing > MAX_LINE_SPACING {
            return Err(OptionsError::LineSpacing(self.line_spacing));
        }
        if font_for_identifier(&self.code_font).is_none() {
            return Err(OptionsError::CodeFont(self.code_font.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("tab width {0} is outside the supported range {MIN_TAB_WIDTH}..={MAX_TAB_WIDTH}")]
    TabWidth(u8),
    #[error("line spacing {0} exceeds the maximum of {MAX_LINE_SPACING} points")]
    LineSpacing(u8),
    #[error("unknown code font {0:?} (expected courier, helvetica or times)")]
    CodeFont(String),
}
