//! Per-file text normalization ahead of tokenization: binary detection,
//! optional reformatting with graceful fallback, tab expansion, line-ending
//! normalization, best-effort comment stripping and blank-line removal.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::config::RenderOptions;
use crate::contract::{Highlighter, Reformatter, RenderedContent, ReformatError};
use crate::highlight::plaintext_markup;
use crate::syntax::{markup_to_runs, Palette};

/// Bytes inspected for the NUL sniff.
const BINARY_SNIFF_LEN: usize = 8192;

/// A file is treated as binary when a NUL byte appears near the start.
pub fn is_binary(raw: &[u8]) -> bool {
    let len = raw.len().min(BINARY_SNIFF_LEN);
    raw[..len].contains(&0)
}

/// Fixed extension → reformatter grammar mapping. Extensions not listed
/// here skip the reformatting pass entirely.
pub fn grammar_for_extension(extension: &str) -> Option<&'static str> {
    let grammar = match extension {
        "js" | "jsx" => "babel",
        "ts" | "tsx" => "typescript",
        "css" => "css",
        "scss" => "scss",
        "less" => "less",
        "html" => "html",
        "json" => "json",
        "md" => "markdown",
        "yaml" | "yml" => "yaml",
        "graphql" => "graphql",
        "vue" => "vue",
        "xml" => "xml",
        "java" => "java",
        "kt" => "kotlin",
        "swift" => "swift",
        "php" => "php",
        "rb" => "ruby",
        "py" => "python",
        "pl" => "perl",
        "sh" => "sh",
        "dockerfile" => "dockerfile",
        "ini" => "ini",
        _ => return None,
    };
    Some(grammar)
}

/// Default [`Reformatter`]: no engine is bundled, text passes through. The
/// seam exists for callers that wire in a real one.
pub struct PassthroughReformatter;

impl Reformatter for PassthroughReformatter {
    fn reformat(&self, text: &str, _grammar: &str) -> Result<String, ReformatError> {
        Ok(text.to_string())
    }
}

pub fn expand_tabs(text: &str, tab_width: u8) -> String {
    text.replace('\t', &" ".repeat(tab_width as usize))
}

pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

static BLANK_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*\n").unwrap());

/// Deletes lines that are empty or contain only whitespace.
pub fn remove_blank_lines(text: &str) -> String {
    BLANK_LINE.replace_all(text, "").into_owned()
}

enum CommentStyle {
    /// `//` line comments and `/* ... */` block comments.
    CLike,
    /// `#` line comments.
    Hash,
}

fn comment_style(extension: &str) -> Option<CommentStyle> {
    match extension {
        "rs" | "js" | "jsx" | "ts" | "tsx" | "c" | "h" | "cpp" | "hpp" | "cc" | "java" | "kt"
        | "swift" | "go" | "cs" | "php" | "scss" | "less" | "css" => Some(CommentStyle::CLike),
        "py" | "rb" | "sh" | "bash" | "yaml" | "yml" | "toml" | "pl" | "dockerfile" => {
            Some(CommentStyle::Hash)
        }
        _ => None,
    }
}

/// Best-effort comment stripper. Returns `None` when the extension has no
/// known comment syntax; the caller passes the text through unchanged.
/// String and character literals are respected; shebang lines survive.
pub fn strip_comments(text: &str, extension: Option<&str>) -> Option<String> {
    let style = extension.and_then(comment_style)?;
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut string_delim: Option<char> = None;
    let mut at_start = true;

    while let Some(ch) = chars.next() {
        if let Some(delim) = string_delim {
            out.push(ch);
            if ch == '\\' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else if ch == delim {
                string_delim = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' | '`' => {
                string_delim = Some(ch);
                out.push(ch);
            }
            '#' if matches!(style, CommentStyle::Hash) => {
                if at_start && chars.peek() == Some(&'!') {
                    // Shebang line, keep it.
                    out.push(ch);
                    continue;
                }
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if matches!(style, CommentStyle::CLike) && chars.peek() == Some(&'/') => {
                chars.next();
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if matches!(style, CommentStyle::CLike) && chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            _ => out.push(ch),
        }
        at_start = false;
    }
    Some(out)
}

/// The text pipeline: normalizes raw file bytes into renderable content.
pub struct TextPipeline<'a> {
    options: &'a RenderOptions,
    reformatter: &'a dyn Reformatter,
    highlighter: &'a dyn Highlighter,
    palette: Palette,
}

impl<'a> TextPipeline<'a> {
    pub fn new(
        options: &'a RenderOptions,
        reformatter: &'a dyn Reformatter,
        highlighter: &'a dyn Highlighter,
        palette: Palette,
    ) -> Self {
        Self {
            options,
            reformatter,
            highlighter,
            palette,
        }
    }

    /// Binary content short-circuits into an opaque base64 block; textual
    /// content is normalized, highlighted and tokenized into runs.
    /// Reformatting and highlighting failures are recovered here and never
    /// escape the pipeline.
    pub fn render(&self, raw: &[u8], extension: Option<&str>) -> RenderedContent {
        if is_binary(raw) {
            debug!(size = raw.len(), "Binary content, emitting base64 block");
            return RenderedContent::Binary(BASE64.encode(raw));
        }
        let mut text = String::from_utf8_lossy(raw).into_owned();

        if let Some(grammar) = extension.and_then(grammar_for_extension) {
            match self.reformatter.reformat(&text, grammar) {
                Ok(formatted) => text = formatted,
                Err(e) => {
                    warn!(grammar = grammar, error = %e, "Plain text fallback, reformatting failed");
                }
            }
        }

        text = expand_tabs(&text, self.options.tab_width);
        text = normalize_line_endings(&text);

        if self.options.strip_comments {
            match strip_comments(&text, extension) {
                Some(stripped) => text = stripped,
                None => {
                    debug!(extension = ?extension, "No comment syntax known, passing text through");
                }
            }
        }
        if self.options.remove_blank_lines {
            text = remove_blank_lines(&text);
        }

        let language = if self.options.highlighting {
            extension
        } else {
            None
        };
        let markup = match self.highlighter.highlight(&text, language) {
            Ok(markup) => markup,
            Err(e) => {
                warn!(error = %e, "Highlighting failed, plain text fallback");
                plaintext_markup(&text)
            }
        };
        RenderedContent::Text(markup_to_runs(
            &markup,
            self.options.remove_blank_lines,
            &self.palette,
        ))
    }
}
