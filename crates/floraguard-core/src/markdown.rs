//! Minimal markdown renderer for model output.
//!
//! Supports exactly what diagnosis responses use: paragraphs with hard line
//! breaks, flat ordered/unordered lists, and one level of bold or italic
//! emphasis. Anything else is passed through as literal text.
//!
//! The output is UI-agnostic; the presentation layer maps blocks and spans
//! to concrete styling.

use std::sync::LazyLock;

use regex::Regex;

/// A run of text within one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineSpan {
    Plain(String),
    Bold(String),
    Italic(String),
}

impl InlineSpan {
    pub fn text(&self) -> &str {
        match self {
            InlineSpan::Plain(text) | InlineSpan::Bold(text) | InlineSpan::Italic(text) => text,
        }
    }
}

/// Spans making up one line (or one list item).
pub type SpanLine = Vec<InlineSpan>;

/// A paragraph- or list-level unit of output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderBlock {
    /// Lines are kept separate; a line break goes between each pair.
    Paragraph(Vec<SpanLine>),
    OrderedList(Vec<SpanLine>),
    UnorderedList(Vec<SpanLine>),
}

/// Lazy iterator over the blocks of a text.
///
/// Cloning it (or calling [`render_markdown`] again) restarts rendering from
/// the beginning; no state outlives a pass.
#[derive(Debug, Clone)]
pub struct Blocks<'a> {
    rest: &'a str,
}

/// Renders `text` into blocks. Empty or whitespace-only input yields nothing.
pub fn render_markdown(text: &str) -> Blocks<'_> {
    Blocks { rest: text.trim() }
}

static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid regex"));
static ORDERED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[0-9]+\.\s+").expect("valid regex"));
static UNORDERED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*]\s+").expect("valid regex"));

/// Delimiters in precedence order: double before single, `*` before `_`.
static EMPHASIS: LazyLock<[(Regex, Emphasis); 4]> = LazyLock::new(|| {
    [
        (Regex::new(r"\*\*(.+?)\*\*").expect("valid regex"), Emphasis::Bold),
        (Regex::new(r"\*(.+?)\*").expect("valid regex"), Emphasis::Italic),
        (Regex::new(r"__(.+?)__").expect("valid regex"), Emphasis::Bold),
        (Regex::new(r"_(.+?)_").expect("valid regex"), Emphasis::Italic),
    ]
});

#[derive(Debug, Clone, Copy)]
enum Emphasis {
    Bold,
    Italic,
}

impl Emphasis {
    fn span(self, text: &str) -> InlineSpan {
        match self {
            Emphasis::Bold => InlineSpan::Bold(text.to_string()),
            Emphasis::Italic => InlineSpan::Italic(text.to_string()),
        }
    }
}

impl Iterator for Blocks<'_> {
    type Item = RenderBlock;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }

        let block = match BLANK_LINES.find(self.rest) {
            Some(sep) => {
                let block = &self.rest[..sep.start()];
                self.rest = &self.rest[sep.end()..];
                block
            }
            None => std::mem::take(&mut self.rest),
        };

        Some(classify_block(block))
    }
}

fn classify_block(block: &str) -> RenderBlock {
    let lines: Vec<&str> = block
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    if let Some(items) = strip_markers(&lines, &ORDERED_MARKER) {
        return RenderBlock::OrderedList(items);
    }
    if let Some(items) = strip_markers(&lines, &UNORDERED_MARKER) {
        return RenderBlock::UnorderedList(items);
    }

    RenderBlock::Paragraph(lines.into_iter().map(inline_spans).collect())
}

/// Returns list items if every line carries `marker`; the marker is removed
/// before emphasis is applied.
fn strip_markers(lines: &[&str], marker: &Regex) -> Option<Vec<SpanLine>> {
    lines
        .iter()
        .map(|line| marker.find(line).map(|m| inline_spans(&line[m.end()..])))
        .collect()
}

/// Splits one line into plain, bold and italic spans.
///
/// Each delimiter pass only looks at text still plain after the previous
/// passes, so emphasis never nests and unclosed delimiters stay literal.
pub fn inline_spans(line: &str) -> SpanLine {
    let mut spans = vec![InlineSpan::Plain(line.to_string())];

    for (pattern, emphasis) in EMPHASIS.iter() {
        spans = spans
            .into_iter()
            .flat_map(|span| match span {
                InlineSpan::Plain(text) => split_emphasis(&text, pattern, *emphasis),
                other => vec![other],
            })
            .collect();
    }

    spans.retain(|span| !span.text().is_empty());
    spans
}

fn split_emphasis(text: &str, pattern: &Regex, emphasis: Emphasis) -> Vec<InlineSpan> {
    let mut out = Vec::new();
    let mut last = 0;

    for caps in pattern.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            out.push(InlineSpan::Plain(text[last..whole.start()].to_string()));
        }
        out.push(emphasis.span(inner.as_str()));
        last = whole.end();
    }

    if last < text.len() {
        out.push(InlineSpan::Plain(text[last..].to_string()));
    }
    out
}
