//! Inline run rendering with minimal format tags.

use std::fmt::Write;

use kg_html::{escape_attr, escape_text};
use serde::{Deserialize, Serialize};

use crate::format::TextFormat;

/// A run of text with its formats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(default)]
    pub format: TextFormat,
}

/// A link wrapping further inline nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
    #[serde(default)]
    pub children: Vec<InlineNode>,
}

/// A leaf-level inline node as stored in editor JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InlineNode {
    #[serde(alias = "extended-text")]
    Text(TextRun),
    #[serde(rename = "linebreak")]
    LineBreak,
    Link(Link),
}

impl InlineNode {
    /// Plain text run.
    pub fn text(text: impl Into<String>) -> Self {
        Self::formatted(text, TextFormat::NONE)
    }

    /// Text run with formats.
    pub fn formatted(text: impl Into<String>, format: TextFormat) -> Self {
        Self::Text(TextRun {
            text: text.into(),
            format,
        })
    }

    pub fn link(url: impl Into<String>, children: Vec<InlineNode>) -> Self {
        Self::Link(Link {
            url: url.into(),
            rel: None,
            children,
        })
    }

    fn as_text(&self) -> Option<&TextRun> {
        match self {
            Self::Text(run) => Some(run),
            _ => None,
        }
    }

    fn is_link(&self) -> bool {
        matches!(self, Self::Link(_))
    }
}

/// Collects inline nodes of one block and renders them as HTML.
///
/// Format tags are opened in the order that keeps longer-lived formats
/// outermost and closed as soon as the next run no longer needs them, so
/// output nesting is always well formed.
///
/// # Example
///
/// ```
/// use kg_renderer::{InlineNode, TextContent, TextFormat};
///
/// let mut content = TextContent::new();
/// content.add_node(InlineNode::formatted("a", TextFormat::BOLD));
/// content.add_node(InlineNode::formatted("b", TextFormat::BOLD | TextFormat::ITALIC));
/// content.add_node(InlineNode::formatted("c", TextFormat::ITALIC));
/// assert_eq!(content.render(), "<strong>a<em>b</em></strong><em>c</em>");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TextContent {
    nodes: Vec<InlineNode>,
}

impl TextContent {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from a list of nodes.
    #[must_use]
    pub fn with_nodes(nodes: Vec<InlineNode>) -> Self {
        Self { nodes }
    }

    pub fn add_node(&mut self, node: InlineNode) {
        self.nodes.push(node);
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Render the collected nodes.
    pub fn render(&self) -> String {
        let mut out = String::new();
        render_nodes(&self.nodes, &mut out);
        out
    }
}

fn render_nodes(nodes: &[InlineNode], out: &mut String) {
    let mut open: Vec<TextFormat> = Vec::new();

    for (i, node) in nodes.iter().enumerate() {
        match node {
            InlineNode::LineBreak => out.push_str("<br>"),
            InlineNode::Link(link) => render_link(link, out),
            InlineNode::Text(run) if run.format.is_empty() => {
                out.push_str(&escape_text(&run.text));
            }
            InlineNode::Text(run) => {
                let remaining = &nodes[i + 1..];
                for format in formats_to_open(run.format, &open, remaining) {
                    open_tag(format, out);
                    open.push(format);
                }

                out.push_str(&escape_text(&run.text));

                let next = remaining.iter().find(|n| n.as_text().is_some() || n.is_link());
                let keep = |format: TextFormat| {
                    next.and_then(InlineNode::as_text)
                        .is_some_and(|next| next.format.contains(format))
                };
                // Closing a format closes everything nested inside it too.
                if let Some(depth) = open.iter().position(|f| !keep(*f)) {
                    while open.len() > depth {
                        if let Some(format) = open.pop() {
                            close_tag(format, out);
                        }
                    }
                }
            }
        }
    }

    while let Some(format) = open.pop() {
        close_tag(format, out);
    }
}

/// Formats the run needs that are not open yet, soonest-recurring first.
fn formats_to_open(
    format: TextFormat,
    open: &[TextFormat],
    remaining: &[InlineNode],
) -> Vec<TextFormat> {
    let mut to_open: Vec<TextFormat> = TextFormat::TAGS
        .iter()
        .map(|(flag, _)| *flag)
        .filter(|flag| format.contains(*flag) && !open.contains(flag))
        .collect();

    // Links close every format, so lookahead stops at the next one.
    let upcoming: Vec<&TextRun> = remaining
        .iter()
        .take_while(|n| !n.is_link())
        .filter_map(InlineNode::as_text)
        .collect();
    to_open.sort_by_key(|flag| {
        upcoming
            .iter()
            .position(|run| run.format.contains(*flag))
            .unwrap_or(usize::MAX)
    });
    to_open
}

fn render_link(link: &Link, out: &mut String) {
    out.push_str("<a");
    if !link.url.is_empty() {
        write!(out, r#" href="{}""#, escape_attr(&link.url)).unwrap();
    }
    if let Some(rel) = link.rel.as_deref().filter(|r| !r.is_empty()) {
        write!(out, r#" rel="{}""#, escape_attr(rel)).unwrap();
    }
    out.push('>');
    render_nodes(&link.children, out);
    out.push_str("</a>");
}

fn open_tag(format: TextFormat, out: &mut String) {
    if let Some(tag) = format.tag() {
        write!(out, "<{tag}>").unwrap();
    }
}

fn close_tag(format: TextFormat, out: &mut String) {
    if let Some(tag) = format.tag() {
        write!(out, "</{tag}>").unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(nodes: Vec<InlineNode>) -> String {
        TextContent::with_nodes(nodes).render()
    }

    #[test]
    fn test_plain_text_escaped() {
        assert_eq!(render(vec![InlineNode::text("a < b & c")]), "a &lt; b &amp; c");
    }

    #[test]
    fn test_overlapping_formats_nest_correctly() {
        let html = render(vec![
            InlineNode::formatted("a", TextFormat::BOLD),
            InlineNode::formatted("b", TextFormat::BOLD | TextFormat::ITALIC),
            InlineNode::formatted("c", TextFormat::ITALIC),
        ]);
        assert_eq!(html, "<strong>a<em>b</em></strong><em>c</em>");
    }

    #[test]
    fn test_longer_lived_format_opens_first() {
        let html = render(vec![
            InlineNode::formatted("a", TextFormat::BOLD | TextFormat::ITALIC),
            InlineNode::formatted("b", TextFormat::ITALIC),
        ]);
        assert_eq!(html, "<em><strong>a</strong>b</em>");
    }

    #[test]
    fn test_tag_order_follows_format_table_without_lookahead() {
        let html = render(vec![InlineNode::formatted(
            "x",
            TextFormat::HIGHLIGHT | TextFormat::CODE | TextFormat::BOLD,
        )]);
        assert_eq!(html, "<strong><code><mark>x</mark></code></strong>");
    }

    #[test]
    fn test_formats_stay_open_across_line_breaks() {
        let html = render(vec![
            InlineNode::formatted("a", TextFormat::BOLD),
            InlineNode::LineBreak,
            InlineNode::formatted("b", TextFormat::BOLD),
        ]);
        assert_eq!(html, "<strong>a<br>b</strong>");
    }

    #[test]
    fn test_link_closes_formats() {
        let html = render(vec![
            InlineNode::formatted("a", TextFormat::BOLD),
            InlineNode::link("https://example.com", vec![InlineNode::formatted("b", TextFormat::BOLD)]),
            InlineNode::formatted("c", TextFormat::BOLD),
        ]);
        assert_eq!(
            html,
            r#"<strong>a</strong><a href="https://example.com"><strong>b</strong></a><strong>c</strong>"#
        );
    }

    #[test]
    fn test_link_without_url_or_rel() {
        let html = render(vec![InlineNode::link("", vec![InlineNode::text("x")])]);
        assert_eq!(html, "<a>x</a>");
    }

    #[test]
    fn test_link_with_rel() {
        let html = render(vec![InlineNode::Link(Link {
            url: "/about".to_owned(),
            rel: Some("noopener".to_owned()),
            children: vec![InlineNode::text("About")],
        })]);
        assert_eq!(html, r#"<a href="/about" rel="noopener">About</a>"#);
    }

    #[test]
    fn test_plain_run_after_formatted_run() {
        let html = render(vec![
            InlineNode::formatted("bold", TextFormat::BOLD),
            InlineNode::text(" plain"),
        ]);
        assert_eq!(html, "<strong>bold</strong> plain");
    }

    #[test]
    fn test_deserialize_editor_json() {
        let json = r#"[
            {"type": "text", "text": "Hi ", "format": 0},
            {"type": "extended-text", "text": "there", "format": 2},
            {"type": "linebreak"},
            {"type": "link", "url": "/x", "children": [{"type": "text", "text": "go"}]}
        ]"#;
        let nodes: Vec<InlineNode> = serde_json::from_str(json).unwrap();
        assert_eq!(render(nodes), r#"Hi <em>there</em><br><a href="/x">go</a>"#);
    }

    #[test]
    fn test_render_is_deterministic() {
        let nodes = vec![
            InlineNode::formatted("a", TextFormat::UNDERLINE | TextFormat::STRIKETHROUGH),
            InlineNode::formatted("b", TextFormat::STRIKETHROUGH),
        ];
        let content = TextContent::with_nodes(nodes);
        assert_eq!(content.render(), content.render());
        assert_eq!(content.render(), "<s><u>a</u>b</s>");
    }
}
