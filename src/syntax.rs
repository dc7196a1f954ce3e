//! Markup tokenizer: converts tag-annotated highlighted markup into the
//! ordered [`TextRun`] sequence consumed by the document assembler.
//!
//! The scanner walks the markup left to right keeping a color stack for
//! nested classification tags. Literal text is entity-decoded and split on
//! newlines; every newline becomes its own uncolored run, so downstream
//! line numbering and pagination only ever look at run boundaries.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::contract::TextRun;

/// Immutable classification → hex color table. Passed into the tokenizer
/// explicitly so tests can substitute a palette.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    entries: &'static [(&'static str, &'static str)],
}

impl Palette {
    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { entries }
    }

    pub fn color_for(&self, classification: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(class, _)| *class == classification)
            .map(|(_, color)| *color)
    }
}

/// Default classification colors. Keys match both hljs-style classes
/// (`hljs-keyword`, with the prefix stripped) and syntect scope atoms.
pub const DEFAULT_PALETTE: Palette = Palette::new(&[
    ("keyword", "#000080"),
    ("storage", "#000080"),
    ("built_in", "#000080"),
    ("string", "#006400"),
    ("number", "#FF4500"),
    ("numeric", "#FF4500"),
    ("literal", "#32CD32"),
    ("boolean", "#32CD32"),
    ("language", "#32CD32"),
    ("comment", "#708090"),
    ("title", "#4682B4"),
    ("entity", "#4682B4"),
]);

static TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<span(?:\s+class="([^"]*)")?[^>]*>|</span>"#).unwrap());

/// Tokenizes highlighted markup into ordered runs.
///
/// With `remove_empty_lines`, a line whose only run would be the bare
/// newline is dropped entirely; with it off, the empty segment is preserved
/// so the run sequence still round-trips the input text.
pub fn markup_to_runs(markup: &str, remove_empty_lines: bool, palette: &Palette) -> Vec<TextRun> {
    let mut state = Scanner {
        runs: Vec::new(),
        buf: String::new(),
        stack: Vec::new(),
        line_has_text: false,
        remove_empty_lines,
    };

    let mut pos = 0;
    for caps in TAG.captures_iter(markup) {
        let tag = caps.get(0).expect("capture 0 always present");
        state.literal(&markup[pos..tag.start()]);
        pos = tag.end();
        if tag.as_str() == "</span>" {
            state.flush();
            state.stack.pop();
        } else {
            // A tag that maps to no palette entry keeps the current color.
            state.flush();
            let mapped = caps
                .get(1)
                .and_then(|classes| classify(classes.as_str(), palette));
            let color = mapped.or_else(|| state.current_color());
            state.stack.push(color);
        }
    }
    state.literal(&markup[pos..]);
    state.flush();
    state.runs
}

/// Maps a tag's class attribute to a palette color: the first class word
/// with a palette entry wins. hljs-style prefixes are stripped before the
/// lookup so both markup dialects resolve through one table.
fn classify(classes: &str, palette: &Palette) -> Option<&'static str> {
    classes
        .split_whitespace()
        .map(|word| word.strip_prefix("hljs-").unwrap_or(word))
        .find_map(|word| palette.color_for(word))
}

struct Scanner {
    runs: Vec<TextRun>,
    buf: String,
    stack: Vec<Option<&'static str>>,
    line_has_text: bool,
    remove_empty_lines: bool,
}

impl Scanner {
    fn current_color(&self) -> Option<&'static str> {
        self.stack.last().copied().flatten()
    }

    /// Consumes literal markup text: decodes entities and splits on
    /// newlines, emitting a dedicated newline run at each boundary.
    fn literal(&mut self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        let decoded = decode_entities(raw);
        for ch in decoded.chars() {
            if ch == '\n' {
                self.newline_boundary();
            } else {
                self.buf.push(ch);
            }
        }
    }

    fn newline_boundary(&mut self) {
        if !self.buf.is_empty() || self.line_has_text {
            self.flush();
            self.runs.push(TextRun::newline());
        } else if !self.remove_empty_lines {
            // An empty line: preserve exactly one empty segment ahead of
            // its newline so the sequence still concatenates losslessly.
            self.runs
                .push(TextRun::text(String::new(), self.current_color()));
            self.runs.push(TextRun::newline());
        }
        self.line_has_text = false;
    }

    fn flush(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.buf);
        self.runs.push(TextRun::text(text, self.current_color()));
        self.line_has_text = true;
    }
}

/// Decodes the entities the highlighting collaborators emit. `&amp;` must
/// decode last so double-escaped input stays stable.
fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
