//! Minimal reply markup: `**bold**`, `*italic*`, and line breaks.
//!
//! Markers pair up within a single line, shortest match first. Bold is
//! resolved before italic, so italic markers inside a bold run stay inside it.
//! Everything else is literal text.

use std::fmt::Write as _;

/// One piece of formatted reply text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Text(String),
    Bold(Vec<Span>),
    Italic(String),
    LineBreak,
}

/// Split a reply into spans.
#[must_use]
pub fn parse(content: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    for (idx, line) in content.split('\n').enumerate() {
        if idx > 0 {
            spans.push(Span::LineBreak);
        }
        parse_bold(line, &mut spans);
    }
    spans
}

fn parse_bold(line: &str, out: &mut Vec<Span>) {
    let mut rest = line;
    while let Some(open) = rest.find("**") {
        let after = &rest[open + 2..];
        let Some(close) = after.find("**") else {
            break;
        };
        parse_italic(&rest[..open], out);
        let mut inner = Vec::new();
        parse_italic(&after[..close], &mut inner);
        out.push(Span::Bold(inner));
        rest = &after[close + 2..];
    }
    parse_italic(rest, out);
}

fn parse_italic(text: &str, out: &mut Vec<Span>) {
    let mut rest = text;
    while let Some(open) = rest.find('*') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('*') else {
            break;
        };
        push_text(&rest[..open], out);
        out.push(Span::Italic(after[..close].to_string()));
        rest = &after[close + 1..];
    }
    push_text(rest, out);
}

fn push_text(text: &str, out: &mut Vec<Span>) {
    if !text.is_empty() {
        out.push(Span::Text(text.to_string()));
    }
}

/// Render spans as HTML, escaping all literal text.
#[must_use]
pub fn to_html(spans: &[Span]) -> String {
    let mut out = String::new();
    for span in spans {
        match span {
            Span::Text(text) => out.push_str(&escape_html(text)),
            Span::Bold(inner) => {
                let _ = write!(out, "<strong>{}</strong>", to_html(inner));
            }
            Span::Italic(text) => {
                let _ = write!(out, "<em>{}</em>", escape_html(text));
            }
            Span::LineBreak => out.push_str("<br>"),
        }
    }
    out
}

/// Render spans for a terminal, using ANSI bold/italic when `styled`.
#[must_use]
pub fn to_terminal(spans: &[Span], styled: bool) -> String {
    let mut out = String::new();
    for span in spans {
        match span {
            Span::Text(text) => out.push_str(text),
            Span::Bold(inner) if styled => {
                let _ = write!(out, "\x1b[1m{}\x1b[22m", to_terminal(inner, styled));
            }
            Span::Bold(inner) => out.push_str(&to_terminal(inner, styled)),
            Span::Italic(text) if styled => {
                let _ = write!(out, "\x1b[3m{text}\x1b[23m");
            }
            Span::Italic(text) => out.push_str(text),
            Span::LineBreak => out.push('\n'),
        }
    }
    out
}

/// Escape the five HTML-significant characters.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html(content: &str) -> String {
        to_html(&parse(content))
    }

    #[test]
    fn bold_italic_and_breaks() {
        assert_eq!(
            html("**$8,333** per *family*\nnext"),
            "<strong>$8,333</strong> per <em>family</em><br>next"
        );
    }

    #[test]
    fn italic_inside_bold() {
        assert_eq!(
            html("**very *local* models**"),
            "<strong>very <em>local</em> models</strong>"
        );
    }

    #[test]
    fn unpaired_markers_stay_literal() {
        assert_eq!(html("5 * 3"), "5 * 3");
        assert_eq!(html("**open"), "<em></em>open");
        assert_eq!(html("a *b\nc* d"), "a *b<br>c* d");
    }

    #[test]
    fn html_is_escaped() {
        assert_eq!(
            html("<script>alert('x')</script> & **<b>**"),
            "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; <strong>&lt;b&gt;</strong>"
        );
    }

    #[test]
    fn terminal_rendering() {
        let spans = parse("**Cost:** *about* $8k\nper family");
        assert_eq!(to_terminal(&spans, false), "Cost: about $8k\nper family");
        assert_eq!(
            to_terminal(&spans, true),
            "\x1b[1mCost:\x1b[22m \x1b[3mabout\x1b[23m $8k\nper family"
        );
    }
}
