//! Thin page-buffering primitive over printpdf. Pages are buffered as op
//! lists so captions can be overlaid onto any page before serialization;
//! the assembler owns when pages start, lines break, and bytes get written.

use printpdf::{
    BuiltinFont, Color, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Point, Pt, Rgb, TextItem,
};
use std::path::PathBuf;
use thiserror::Error;

// US Letter geometry, in points.
const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const PAGE_WIDTH_MM: f32 = 215.9;
const PAGE_HEIGHT_MM: f32 = 279.4;
const MARGIN_LEFT: f32 = 54.0;
const MARGIN_RIGHT: f32 = 54.0;
const MARGIN_TOP: f32 = 54.0;
const MARGIN_BOTTOM: f32 = 54.0;
const FONT_SIZE: f32 = 10.0;
const CAPTION_SIZE: f32 = 9.0;
// Advance width as a fraction of the font size; exact for Courier, an
// estimate for the proportional faces.
const GLYPH_ADVANCE: f32 = 0.6;

const DEFAULT_FILL: &str = "#000000";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("unknown code font {0:?}")]
    UnknownFont(String),
    #[error("failed to write document to {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("document write task failed: {0}")]
    Task(String),
}

/// Maps a configured font identifier to a PDF builtin face.
pub fn font_for_identifier(identifier: &str) -> Option<BuiltinFont> {
    match identifier {
        "courier" => Some(BuiltinFont::Courier),
        "helvetica" => Some(BuiltinFont::Helvetica),
        "times" => Some(BuiltinFont::TimesRoman),
        _ => None,
    }
}

/// One buffered document: a list of pages under construction plus the
/// cursor state for the page currently accepting text.
pub struct PageBuffer {
    doc: PdfDocument,
    pages: Vec<Vec<Op>>,
    font: BuiltinFont,
    line_height: f32,
    max_lines: usize,
    max_cols: usize,
    lines_used: usize,
    cols_used: usize,
    fill: String,
    sealed: bool,
}

impl PageBuffer {
    pub fn new(title: &str, font_identifier: &str, line_spacing: u8) -> Result<Self, DocumentError> {
        let font = font_for_identifier(font_identifier)
            .ok_or_else(|| DocumentError::UnknownFont(font_identifier.to_string()))?;
        let line_height = FONT_SIZE + f32::from(line_spacing);
        let max_lines = ((PAGE_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM) / line_height).floor() as usize;
        let max_cols =
            ((PAGE_WIDTH - MARGIN_LEFT - MARGIN_RIGHT) / (FONT_SIZE * GLYPH_ADVANCE)).floor()
                as usize;
        Ok(Self {
            doc: PdfDocument::new(title),
            pages: Vec::new(),
            font,
            line_height,
            max_lines: max_lines.max(1),
            max_cols: max_cols.max(1),
            lines_used: 0,
            cols_used: 0,
            fill: DEFAULT_FILL.to_string(),
            sealed: true,
        })
    }

    /// Starts a fresh page; the previous page's text section is closed.
    pub fn start_page(&mut self) {
        self.seal();
        let top = PAGE_HEIGHT - MARGIN_TOP;
        self.pages.push(vec![
            Op::StartTextSection,
            Op::SetTextCursor {
                pos: Point {
                    x: Pt(MARGIN_LEFT),
                    y: Pt(top),
                },
            },
            Op::SetLineHeight {
                lh: Pt(self.line_height),
            },
            Op::SetFontSizeBuiltinFont {
                size: Pt(FONT_SIZE),
                font: self.font,
            },
            Op::SetFillColor {
                col: hex_color(DEFAULT_FILL),
            },
        ]);
        self.fill = DEFAULT_FILL.to_string();
        self.lines_used = 0;
        self.cols_used = 0;
        self.sealed = false;
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Writes a span continuing the current line, wrapping onto fresh lines
    /// (and pages) as columns run out. `None` renders in the default color.
    pub fn write_span(&mut self, text: &str, color: Option<&str>) {
        if text.is_empty() {
            return;
        }
        if self.pages.is_empty() {
            self.start_page();
        }
        let hex = color.unwrap_or(DEFAULT_FILL);
        if hex != self.fill {
            self.current_page().push(Op::SetFillColor {
                col: hex_color(hex),
            });
            self.fill = hex.to_string();
        }
        let chars: Vec<char> = text.chars().collect();
        let mut start = 0;
        while start < chars.len() {
            let avail = self.max_cols.saturating_sub(self.cols_used);
            if avail == 0 {
                self.line_break();
                continue;
            }
            let end = (start + avail).min(chars.len());
            let chunk: String = chars[start..end].iter().collect();
            let font = self.font;
            let op = Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(chunk)],
                font,
            };
            self.current_page().push(op);
            self.cols_used += end - start;
            start = end;
        }
    }

    /// Terminates the current line, paginating when the page is full.
    pub fn line_break(&mut self) {
        if self.pages.is_empty() {
            self.start_page();
        }
        self.current_page().push(Op::AddLineBreak);
        self.lines_used += 1;
        self.cols_used = 0;
        if self.lines_used >= self.max_lines {
            let fill = self.fill.clone();
            self.start_page();
            // Carry the active color across the page boundary.
            if fill != DEFAULT_FILL {
                self.current_page().push(Op::SetFillColor {
                    col: hex_color(&fill),
                });
                self.fill = fill;
            }
        }
    }

    /// Closes the open text section. Must run before overlays or saving.
    pub fn seal(&mut self) {
        if !self.sealed {
            if let Some(page) = self.pages.last_mut() {
                page.push(Op::EndTextSection);
            }
            self.sealed = true;
        }
    }

    /// Overlays a centered caption near the bottom margin of an already
    /// buffered page. The buffer must be sealed first.
    pub fn overlay_caption(&mut self, page_index: usize, text: &str) {
        debug_assert!(self.sealed, "overlay on an unsealed page buffer");
        let Some(page) = self.pages.get_mut(page_index) else {
            return;
        };
        let width = text.chars().count() as f32 * CAPTION_SIZE * GLYPH_ADVANCE;
        let x = (PAGE_WIDTH - width) / 2.0;
        let y = MARGIN_BOTTOM / 2.0;
        page.extend([
            Op::StartTextSection,
            Op::SetTextCursor {
                pos: Point { x: Pt(x), y: Pt(y) },
            },
            Op::SetFillColor {
                col: hex_color(DEFAULT_FILL),
            },
            Op::SetFontSizeBuiltinFont {
                size: Pt(CAPTION_SIZE),
                font: self.font,
            },
            Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(text.to_string())],
                font: self.font,
            },
            Op::EndTextSection,
        ]);
    }

    /// Serializes the buffered pages into PDF bytes.
    pub fn save(mut self) -> Vec<u8> {
        self.seal();
        if self.pages.is_empty() {
            self.start_page();
            self.seal();
        }
        let pages: Vec<PdfPage> = self
            .pages
            .into_iter()
            .map(|ops| PdfPage::new(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), ops))
            .collect();
        let mut warnings = Vec::new();
        self.doc
            .with_pages(pages)
            .save(&PdfSaveOptions::default(), &mut warnings)
    }

    fn current_page(&mut self) -> &mut Vec<Op> {
        self.pages.last_mut().expect("page started before writing")
    }
}

/// Parses `#RRGGBB`; anything malformed renders black.
fn hex_color(hex: &str) -> Color {
    let channel = |range: std::ops::Range<usize>| -> f32 {
        hex.get(range)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .map_or(0.0, |v| f32::from(v) / 255.0)
    };
    Color::Rgb(Rgb {
        r: channel(1..3),
        g: channel(3..5),
        b: channel(5..7),
        icc_profile: None,
    })
}
