//! Coloured terminal output for roadmaps and request state.

use colored::*;

use crate::markdown::{Block, Span, render};
use crate::models::{AdviceResult, PersonaProfile};
use crate::orchestrator::Display;

fn styled_spans(spans: &[Span<'_>], base: impl Fn(&str) -> ColoredString) -> String {
    spans
        .iter()
        .map(|span| match span {
            Span::Text(t) => base(t).to_string(),
            Span::Strong(t) => base(t).bold().bright_white().to_string(),
        })
        .collect()
}

/// One rendered line (or pair of lines, for level-2 headings) per block
pub fn render_block(block: &Block<'_>) -> String {
    match block {
        Block::Spacer => String::new(),
        Block::Heading { level: 1, spans } => {
            styled_spans(spans, |t| t.to_uppercase().bold().bright_white())
        }
        Block::Heading { level: 2, spans } => {
            let title = styled_spans(spans, |t| t.bold().white());
            let width = block.plain_text().chars().count().max(3);
            format!("\n{}\n{}", title, "─".repeat(width).bright_black())
        }
        Block::Heading { spans, .. } => {
            format!("\n{}", styled_spans(spans, |t| t.bold().bright_blue()))
        }
        Block::ListItem(spans) => {
            format!("  {} {}", "•".blue(), styled_spans(spans, |t| t.normal()))
        }
        Block::Numbered(spans) => styled_spans(spans, |t| t.bold().bright_cyan()),
        Block::Paragraph(spans) => styled_spans(spans, |t| t.normal()),
    }
}

/// Render markdown text into terminal lines
pub fn render_markdown(text: &str) -> String {
    render(text)
        .map(|block| render_block(&block))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full roadmap view: header, body, and web sources
pub fn render_advice(persona: &PersonaProfile, result: &AdviceResult) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n{}\n{}\n\n",
        persona.name.bold().bright_white(),
        persona.display_title().to_uppercase().bright_blue(),
        "═".repeat(48).bright_black()
    ));
    out.push_str(&render_markdown(&result.content));
    out.push('\n');

    let sources: Vec<_> = result.web_sources().collect();
    if !sources.is_empty() {
        out.push_str(&format!("\n{}\n", "VERIFIED SOURCES".bold().bright_black()));
        for src in sources {
            let uri = format!("<{}>", src.uri);
            out.push_str(&format!("  {} {} {}\n", "↗".blue(), src.title, uri.bright_black()));
        }
    }
    out
}

/// Render whatever the shell should currently show
pub fn render_display(
    persona: &PersonaProfile,
    display: Display<'_>,
    caption: &(String, String),
) -> String {
    match display {
        Display::Loading => format!("{}\n{}", caption.0.bright_blue(), caption.1.bright_black()),
        Display::Failed(message) => format!("{} {}", "✖".red(), message.red()),
        Display::Ready(result) => render_advice(persona, result),
        Display::Idle => String::new(),
    }
}
