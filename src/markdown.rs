//! Line-oriented renderer for the small markdown dialect the model answers in.
//!
//! Every input line becomes exactly one [`Block`]; there are no multi-line
//! constructs. The only inline rule is `**strong**`.

use regex::Regex;
use std::sync::LazyLock;

static STRONG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("strong pattern is valid"));
static NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.").expect("numbered pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span<'a> {
    Text(&'a str),
    Strong(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block<'a> {
    Spacer,
    Heading { level: u8, spans: Vec<Span<'a>> },
    ListItem(Vec<Span<'a>>),
    /// A line starting with `N.`, kept whole
    Numbered(Vec<Span<'a>>),
    Paragraph(Vec<Span<'a>>),
}

impl<'a> Block<'a> {
    pub fn spans(&self) -> &[Span<'a>] {
        match self {
            Block::Spacer => &[],
            Block::Heading { spans, .. }
            | Block::ListItem(spans)
            | Block::Numbered(spans)
            | Block::Paragraph(spans) => spans,
        }
    }

    /// Text content with inline markers removed
    pub fn plain_text(&self) -> String {
        self.spans()
            .iter()
            .map(|s| match s {
                Span::Text(t) | Span::Strong(t) => *t,
            })
            .collect()
    }
}

/// Lazy block sequence over a text. Clone it to iterate again.
#[derive(Debug, Clone)]
pub struct Blocks<'a> {
    lines: std::str::Split<'a, char>,
}

impl<'a> Iterator for Blocks<'a> {
    type Item = Block<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines.next().map(classify_line)
    }
}

pub fn render(text: &str) -> Blocks<'_> {
    Blocks {
        lines: text.split('\n'),
    }
}

/// Classify one line. Prefix checks run on the raw line; only blankness
/// ignores surrounding whitespace.
pub fn classify_line(line: &str) -> Block<'_> {
    let line = line.strip_suffix('\r').unwrap_or(line);

    if line.trim().is_empty() {
        return Block::Spacer;
    }
    for (prefix, level) in [("### ", 3), ("## ", 2), ("# ", 1)] {
        if let Some(rest) = line.strip_prefix(prefix) {
            return Block::Heading {
                level,
                spans: parse_inline(rest),
            };
        }
    }
    if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        return Block::ListItem(parse_inline(rest));
    }
    if NUMBERED.is_match(line) {
        return Block::Numbered(parse_inline(line));
    }
    Block::Paragraph(parse_inline(line))
}

/// Split text into plain and strong spans. Markers without a partner stay literal.
pub fn parse_inline(text: &str) -> Vec<Span<'_>> {
    let mut spans = Vec::new();
    let mut last = 0;
    for caps in STRONG.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            spans.push(Span::Text(&text[last..whole.start()]));
        }
        spans.push(Span::Strong(inner.as_str()));
        last = whole.end();
    }
    if last < text.len() {
        spans.push(Span::Text(&text[last..]));
    }
    spans
}
