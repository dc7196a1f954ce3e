use once_cell::sync::Lazy;
use syntect::html::{ClassedHTMLGenerator, ClassStyle};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use tracing::debug;

use crate::contract::{HighlightError, Highlighter};

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

/// Escape-only markup for content that is not (or cannot be) highlighted.
/// The tokenizer decodes these entities back, so plain text round-trips.
pub fn plaintext_markup(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Production [`Highlighter`]: classifies text with syntect and emits
/// nested `<span class="...">` markup with scope atoms as class words.
pub struct SyntectHighlighter {
    syntaxes: &'static SyntaxSet,
}

impl SyntectHighlighter {
    pub fn new() -> Self {
        Self {
            syntaxes: &SYNTAX_SET,
        }
    }
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight<'a>(
        &self,
        text: &str,
        language: Option<&'a str>,
    ) -> Result<String, HighlightError> {
        let syntax = language.and_then(|token| self.syntaxes.find_syntax_by_token(token));
        let Some(syntax) = syntax else {
            debug!(language = ?language, "No syntax for language token, plain-text markup");
            return Ok(plaintext_markup(text));
        };
        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, self.syntaxes, ClassStyle::Spaced);
        for line in LinesWithEndings::from(text) {
            generator
                .parse_html_for_line_which_includes_newline(line)
                .map_err(|e| HighlightError::Failed(e.to_string()))?;
        }
        Ok(generator.finalize())
    }
}
