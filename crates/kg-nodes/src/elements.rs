//! Text-level nodes and their import rules.
//!
//! These are the element nodes the editor keeps between cards: asides,
//! headings and quotes. Their rules also normalise markup pasted from word
//! processors (formatting spans, ARIA headings, Google Docs spacing).

use kg_html::DomNode;
use kg_renderer::TextFormat;
use serde_json::{Map, Value};

use crate::error::RecordError;
use crate::import::{ImportOutput, ImportRule, ImportedNode};

const GOOGLE_DOCS_WRAPPER: &str = r#"[id^="docs-internal-guid-"]"#;

/// A block element whose children are regular editor content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementNode {
    /// A pull quote, rendered as `blockquote.kg-blockquote-alt`.
    Aside,
    /// A heading of level 1 to 6.
    Heading(u8),
    Quote,
}

impl ElementNode {
    pub fn node_type(self) -> &'static str {
        match self {
            Self::Aside => "aside",
            Self::Heading(_) => "extended-heading",
            Self::Quote => "extended-quote",
        }
    }

    /// Whether the element holds inline content directly.
    pub(crate) fn is_text_block(self) -> bool {
        matches!(self, Self::Heading(_))
    }

    /// Rework imported children: quotes merge their paragraphs into one run
    /// separated by double line breaks.
    pub(crate) fn after_import(self, children: Vec<ImportedNode>) -> Vec<ImportedNode> {
        if self != Self::Quote {
            return children;
        }
        let mut merged = Vec::with_capacity(children.len());
        for child in children {
            match child {
                ImportedNode::Paragraph(inline) => {
                    if !merged.is_empty() {
                        merged.push(ImportedNode::Inline(kg_renderer::InlineNode::LineBreak));
                        merged.push(ImportedNode::Inline(kg_renderer::InlineNode::LineBreak));
                    }
                    merged.extend(inline.into_iter().map(ImportedNode::Inline));
                }
                other => merged.push(other),
            }
        }
        merged
    }

    /// Wrap rendered children in the element's markup.
    pub fn wrap(self, inner_html: &str) -> String {
        match self {
            Self::Aside => format!(r#"<blockquote class="kg-blockquote-alt">{inner_html}</blockquote>"#),
            Self::Heading(level) => format!("<h{level}>{inner_html}</h{level}>"),
            Self::Quote => format!("<blockquote>{inner_html}</blockquote>"),
        }
    }

    /// The persisted record, with already exported children.
    pub fn export_record(self, children: Vec<Value>) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert("children".to_owned(), Value::Array(children));
        record.insert("direction".to_owned(), Value::Null);
        record.insert("format".to_owned(), Value::from(""));
        record.insert("indent".to_owned(), Value::from(0));
        record.insert("type".to_owned(), Value::from(self.node_type()));
        record.insert("version".to_owned(), Value::from(1));
        if let Self::Heading(level) = self {
            record.insert("tag".to_owned(), Value::from(format!("h{level}")));
        }
        record
    }

    pub fn import_record(record: &Map<String, Value>) -> Result<Self, RecordError> {
        let node_type = record
            .get("type")
            .and_then(Value::as_str)
            .ok_or(RecordError::MissingType)?;
        match node_type {
            "aside" => Ok(Self::Aside),
            "extended-quote" | "quote" => Ok(Self::Quote),
            "extended-heading" | "heading" => {
                let level = record
                    .get("tag")
                    .and_then(Value::as_str)
                    .and_then(heading_level)
                    .unwrap_or(2);
                Ok(Self::Heading(level))
            }
            other => Err(RecordError::UnknownType(other.to_owned())),
        }
    }
}

/// Level of an `h1`..`h6` tag.
pub(crate) fn heading_level(tag: &str) -> Option<u8> {
    let level: u8 = tag.strip_prefix('h')?.parse().ok()?;
    (1..=6).contains(&level).then_some(level)
}

/// Formats implied by an inline formatting tag.
pub(crate) fn tag_format(node: &DomNode) -> TextFormat {
    match node.tag_name().unwrap_or_default().as_str() {
        // Google Docs wraps whole documents in a non-bold <b>.
        "b" if node.style("font-weight").as_deref() == Some("normal") => TextFormat::NONE,
        "strong" | "b" => TextFormat::BOLD,
        "em" | "i" => TextFormat::ITALIC,
        "s" | "del" | "strike" => TextFormat::STRIKETHROUGH,
        "u" => TextFormat::UNDERLINE,
        "code" => TextFormat::CODE,
        "sub" => TextFormat::SUBSCRIPT,
        "sup" => TextFormat::SUPERSCRIPT,
        "mark" => TextFormat::HIGHLIGHT,
        _ => TextFormat::NONE,
    }
}

/// Rules for text structure, registered ahead of the cards.
pub(crate) fn text_rules() -> Vec<ImportRule> {
    vec![
        ImportRule::new("span", "extended-text", 1, convert_span),
        ImportRule::new("p", "extended-heading", 1, convert_aria_heading)
            .guard(|node| node.attr("role").as_deref() == Some("heading")),
        ImportRule::new("blockquote", "extended-quote", 1, |_| {
            Some(ImportOutput::Element(ElementNode::Quote))
        })
        .guard(|node| !node.has_class("kg-blockquote-alt")),
        ImportRule::new("blockquote", "aside", 0, |_| {
            Some(ImportOutput::Element(ElementNode::Aside))
        })
        .guard(|node| node.has_class("kg-blockquote-alt")),
    ]
}

/// Rules dropping the spacing Google Docs adds around blocks.
pub(crate) fn google_docs_rules() -> Vec<ImportRule> {
    vec![
        ImportRule::new("br", "linebreak", 1, |_| Some(ImportOutput::Skip))
            .guard(is_google_docs_spacer_break),
        ImportRule::new("p", "paragraph", 1, |_| Some(ImportOutput::Skip)).guard(|node| {
            node.closest(GOOGLE_DOCS_WRAPPER).is_some() && node.text_content().is_empty()
        }),
    ]
}

/// Word marks formatting with inline styles and classes on spans.
fn convert_span(span: &DomNode) -> Option<ImportOutput> {
    let parent = span.parent_element();
    let either = |check: &dyn Fn(&DomNode) -> bool| check(span) || parent.as_ref().is_some_and(check);

    let mut format = TextFormat::NONE;
    if either(&|n: &DomNode| matches!(n.style("font-weight").as_deref(), Some("bold" | "700"))) {
        format.insert(TextFormat::BOLD);
    }
    if either(&|n: &DomNode| n.style("font-style").as_deref() == Some("italic")) {
        format.insert(TextFormat::ITALIC);
    }
    let decoration = span.style("text-decoration").unwrap_or_default();
    if decoration.contains("underline")
        || parent
            .as_ref()
            .is_some_and(|p| p.style("text-decoration").as_deref() == Some("underline"))
    {
        format.insert(TextFormat::UNDERLINE);
    }
    if decoration.contains("line-through") || either(&|n: &DomNode| n.has_class("Strikethrough")) {
        format.insert(TextFormat::STRIKETHROUGH);
    }
    if either(&|n: &DomNode| n.has_class("Highlight")) {
        format.insert(TextFormat::HIGHLIGHT);
    }
    match span.style("vertical-align").as_deref() {
        Some("sub") => format.insert(TextFormat::SUBSCRIPT),
        Some("super") => format.insert(TextFormat::SUPERSCRIPT),
        _ => {}
    }
    Some(ImportOutput::Format(format))
}

/// Word writes headings as `<p role="heading" aria-level="N">`.
fn convert_aria_heading(p: &DomNode) -> Option<ImportOutput> {
    let level: u8 = p.attr("aria-level")?.trim().parse().ok()?;
    (1..=6)
        .contains(&level)
        .then_some(ImportOutput::Element(ElementNode::Heading(level)))
}

fn is_google_docs_spacer_break(br: &DomNode) -> bool {
    if br.closest(GOOGLE_DOCS_WRAPPER).is_none() {
        return false;
    }
    let previous = br.previous_element_sibling();
    let next = br.next_element_sibling();
    let previous = previous.as_ref().and_then(DomNode::tag_name).unwrap_or_default();
    let next = next.as_ref().and_then(DomNode::tag_name).unwrap_or_default();
    let is_block = |tag: &str| heading_level(tag).is_some() || matches!(tag, "ul" | "ol" | "dl");

    (previous == "p" && next == "p")
        || previous == "br"
        || next == "br"
        || (is_block(&previous) && next == "p")
        || (previous == "p" && is_block(&next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::ImportRegistry;
    use kg_renderer::InlineNode;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn import(html: &str) -> Vec<ImportedNode> {
        ImportRegistry::with_default_nodes().import_fragment(html)
    }

    fn paragraph(nodes: &[ImportedNode]) -> &[InlineNode] {
        match nodes {
            [ImportedNode::Paragraph(inline)] => inline,
            _ => panic!("expected one paragraph, got {nodes:?}"),
        }
    }

    #[test]
    fn test_word_span_formats() {
        let nodes = import(
            r#"<p><span style="font-weight:bold">b</span><span class="Strikethrough"><span>s</span></span><span style="font-style: italic; text-decoration: underline">iu</span></p>"#,
        );
        assert_eq!(
            paragraph(&nodes),
            [
                InlineNode::formatted("b", TextFormat::BOLD),
                InlineNode::formatted("s", TextFormat::STRIKETHROUGH),
                InlineNode::formatted("iu", TextFormat::ITALIC | TextFormat::UNDERLINE),
            ]
        );
    }

    #[test]
    fn test_aria_heading() {
        let nodes = import(r#"<p role="heading" aria-level="3">Title</p><p role="heading" aria-level="9">No</p>"#);
        assert!(matches!(
            &nodes[0],
            ImportedNode::Element { node: ElementNode::Heading(3), children } if children.len() == 1
        ));
        assert!(matches!(&nodes[1], ImportedNode::Paragraph(_)));
    }

    #[test]
    fn test_quote_merges_paragraphs() {
        let nodes = import("<blockquote><p>One</p><p>Two</p></blockquote>");
        let [ImportedNode::Element { node: ElementNode::Quote, children }] = nodes.as_slice() else {
            panic!("expected a quote, got {nodes:?}");
        };
        let inline: Vec<&InlineNode> = children
            .iter()
            .filter_map(|c| match c {
                ImportedNode::Inline(i) => Some(i),
                _ => None,
            })
            .collect();
        assert_eq!(
            inline,
            [
                &InlineNode::text("One"),
                &InlineNode::LineBreak,
                &InlineNode::LineBreak,
                &InlineNode::text("Two")
            ]
        );
    }

    #[test]
    fn test_alt_blockquote_is_aside() {
        let nodes = import(r#"<blockquote class="kg-blockquote-alt">Big</blockquote>"#);
        assert!(matches!(&nodes[0], ImportedNode::Element { node: ElementNode::Aside, .. }));
    }

    #[test]
    fn test_google_docs_spacing_dropped() {
        let html = r#"<b id="docs-internal-guid-1" style="font-weight:normal;"><p>One</p><br><p>Two</p><p></p></b>"#;
        let nodes = import(html);
        assert_eq!(nodes.len(), 2);
        assert_eq!(paragraph(&nodes[..1]), [InlineNode::text("One")]);
        assert_eq!(paragraph(&nodes[1..]), [InlineNode::text("Two")]);
    }

    #[test]
    fn test_breaks_outside_google_docs_are_kept() {
        let nodes = import("<p>One</p><br><p>Two</p>");
        assert_eq!(nodes.len(), 3);
        assert!(matches!(nodes[1], ImportedNode::Inline(InlineNode::LineBreak)));
    }

    #[test]
    fn test_element_records() {
        let record = ElementNode::Heading(3).export_record(Vec::new());
        assert_eq!(
            Value::Object(record.clone()),
            json!({"children": [], "direction": null, "format": "", "indent": 0, "type": "extended-heading", "version": 1, "tag": "h3"})
        );
        assert_eq!(ElementNode::import_record(&record), Ok(ElementNode::Heading(3)));
        assert_eq!(
            ElementNode::Aside.wrap("x"),
            r#"<blockquote class="kg-blockquote-alt">x</blockquote>"#
        );
    }
}
