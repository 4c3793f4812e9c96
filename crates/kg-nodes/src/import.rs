//! HTML import dispatch.
//!
//! Rules are indexed by tag name (comments use [`COMMENT_TAG`]). For a given
//! element the registry keeps the rules whose guard passes, orders them by
//! descending priority (registration order breaks ties) and takes the first
//! conversion that does not decline.
//!
//! [`ImportRegistry::import_fragment`] is a small reference walker over a
//! parsed fragment. It is enough to exercise the rules end to end; editor
//! hosts drive the rules from their own tree walk.

use std::collections::HashMap;
use std::sync::LazyLock;

use kg_html::{DomNode, Fragment};
use kg_renderer::{InlineNode, TextFormat};
use regex::Regex;

use crate::card::CardNode;
use crate::elements::{self, ElementNode};

/// Pseudo tag name under which comment rules are registered.
pub const COMMENT_TAG: &str = "#comment";

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("invalid whitespace regex"));

/// Cheap structural check run before a conversion.
pub type Guard = fn(&DomNode) -> bool;
/// Builds the node for an element, or declines with `None`.
pub type Convert = fn(&DomNode) -> Option<ImportOutput>;

/// What a rule produces for a claimed element.
#[derive(Debug, Clone)]
pub enum ImportOutput {
    Card(CardNode),
    /// A block element whose children are imported as its content.
    Element(ElementNode),
    /// Formats added to every text run inside the element.
    Format(TextFormat),
    /// Drop the element and its content.
    Skip,
}

impl ImportOutput {
    pub fn card(node: impl Into<CardNode>) -> Self {
        Self::Card(node.into())
    }
}

/// One conversion rule for a tag.
#[derive(Debug, Clone, Copy)]
pub struct ImportRule {
    tag: &'static str,
    node_type: &'static str,
    priority: u8,
    guard: Guard,
    convert: Convert,
}

fn always(_: &DomNode) -> bool {
    true
}

impl ImportRule {
    pub fn new(tag: &'static str, node_type: &'static str, priority: u8, convert: Convert) -> Self {
        Self {
            tag,
            node_type,
            priority,
            guard: always,
            convert,
        }
    }

    /// Only consider the rule for elements passing `guard`.
    #[must_use]
    pub fn guard(mut self, guard: Guard) -> Self {
        self.guard = guard;
        self
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn node_type(&self) -> &'static str {
        self.node_type
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn applies_to(&self, node: &DomNode) -> bool {
        (self.guard)(node)
    }

    pub fn convert(&self, node: &DomNode) -> Option<ImportOutput> {
        (self.convert)(node)
    }
}

/// A node produced by [`ImportRegistry::import_fragment`].
#[derive(Debug, Clone)]
pub enum ImportedNode {
    Card(CardNode),
    Element {
        node: ElementNode,
        children: Vec<ImportedNode>,
    },
    Paragraph(Vec<InlineNode>),
    Inline(InlineNode),
}

impl ImportedNode {
    pub fn as_card(&self) -> Option<&CardNode> {
        match self {
            Self::Card(card) => Some(card),
            _ => None,
        }
    }
}

/// Import rules indexed by tag name.
#[derive(Debug, Clone, Default)]
pub struct ImportRegistry {
    rules: HashMap<&'static str, Vec<ImportRule>>,
}

impl ImportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the text-level rules and every built-in card.
    pub fn with_default_nodes() -> Self {
        let mut registry = Self::new();
        for rule in elements::text_rules()
            .into_iter()
            .chain(CardNode::import_rules())
            .chain(elements::google_docs_rules())
        {
            registry.register(rule);
        }
        registry
    }

    pub fn register(&mut self, rule: ImportRule) {
        self.rules.entry(rule.tag).or_default().push(rule);
    }

    #[must_use]
    pub fn with_rule(mut self, rule: ImportRule) -> Self {
        self.register(rule);
        self
    }

    /// Rules registered for a tag, in registration order.
    pub fn rules_for(&self, tag: &str) -> &[ImportRule] {
        self.rules.get(tag).map(Vec::as_slice).unwrap_or_default()
    }

    /// Rules whose guard accepts `node`, highest priority first.
    pub fn candidates(&self, node: &DomNode) -> Vec<&ImportRule> {
        let Some(tag) = rule_tag(node) else {
            return Vec::new();
        };
        let mut candidates: Vec<&ImportRule> = self
            .rules_for(&tag)
            .iter()
            .filter(|rule| rule.applies_to(node))
            .collect();
        candidates.sort_by_key(|rule| std::cmp::Reverse(rule.priority));
        candidates
    }

    /// Run the candidate rules until one claims `node`.
    pub fn convert(&self, node: &DomNode) -> Option<(ImportOutput, &ImportRule)> {
        for rule in self.candidates(node) {
            if let Some(output) = rule.convert(node) {
                tracing::debug!(
                    node_type = rule.node_type,
                    tag = rule.tag,
                    priority = rule.priority,
                    "Import rule claimed element"
                );
                return Some((output, rule));
            }
            tracing::debug!(
                node_type = rule.node_type,
                tag = rule.tag,
                priority = rule.priority,
                "Import rule declined element"
            );
        }
        None
    }

    /// Import every recognised node of an HTML fragment.
    pub fn import_fragment(&self, html: &str) -> Vec<ImportedNode> {
        let fragment = Fragment::parse(html);
        self.walk_children(fragment.root(), Context::default())
    }

    fn walk_children(&self, parent: &DomNode, context: Context) -> Vec<ImportedNode> {
        let mut out = Vec::new();
        let mut child = parent.first_child();
        while let Some(node) = child {
            self.walk_node(&node, context, &mut out);
            // Rules may have removed following siblings.
            child = node.next_sibling();
        }
        out
    }

    fn walk_node(&self, node: &DomNode, context: Context, out: &mut Vec<ImportedNode>) {
        if node.is_text() {
            push_text(&node.text_content(), context, out);
            return;
        }
        if node.comment_text().is_some() {
            if let Some((ImportOutput::Card(card), _)) = self.convert(node) {
                out.push(ImportedNode::Card(card));
            }
            return;
        }
        let Some(tag) = node.tag_name() else {
            return;
        };

        match self.convert(node) {
            Some((ImportOutput::Card(card), _)) => out.push(ImportedNode::Card(card)),
            Some((ImportOutput::Skip, _)) => {}
            Some((ImportOutput::Format(format), _)) => {
                out.extend(self.walk_children(node, context.with_format(format)));
            }
            Some((ImportOutput::Element(element), _)) => {
                out.push(self.import_element(node, element, context));
            }
            None => self.default_handling(node, &tag, context, out),
        }
    }

    fn import_element(&self, node: &DomNode, element: ElementNode, context: Context) -> ImportedNode {
        let children = if element.is_text_block() {
            inline_only(self.walk_children(node, context.inline()))
        } else {
            self.walk_children(node, context.block())
        };
        let children = element.after_import(children);
        ImportedNode::Element {
            node: element,
            children,
        }
    }

    fn default_handling(&self, node: &DomNode, tag: &str, context: Context, out: &mut Vec<ImportedNode>) {
        if let Some(level) = elements::heading_level(tag) {
            out.push(self.import_element(node, ElementNode::Heading(level), context));
            return;
        }
        match tag {
            "script" | "style" | "template" => {}
            "br" => out.push(ImportedNode::Inline(InlineNode::LineBreak)),
            "p" => {
                let children = self.walk_children(node, context.inline());
                let (inline, blocks): (Vec<_>, Vec<_>) = children
                    .into_iter()
                    .partition(|c| matches!(c, ImportedNode::Inline(_)));
                out.push(ImportedNode::Paragraph(
                    inline_only(inline).into_iter().filter_map(into_inline).collect(),
                ));
                out.extend(blocks);
            }
            "a" => {
                let children = self.walk_children(node, context.inline());
                let url = node.attr("href").unwrap_or_default();
                let inline = children.into_iter().filter_map(into_inline).collect();
                out.push(ImportedNode::Inline(InlineNode::link(url, inline)));
            }
            _ => {
                let format = elements::tag_format(node);
                out.extend(self.walk_children(node, context.with_format(format)));
            }
        }
    }
}

fn rule_tag(node: &DomNode) -> Option<String> {
    if node.comment_text().is_some() {
        return Some(COMMENT_TAG.to_owned());
    }
    node.tag_name()
}

fn push_text(text: &str, context: Context, out: &mut Vec<ImportedNode>) {
    if !context.inline && text.trim().is_empty() {
        return;
    }
    let collapsed = WHITESPACE.replace_all(text, " ");
    if collapsed.is_empty() {
        return;
    }
    out.push(ImportedNode::Inline(InlineNode::formatted(
        collapsed.into_owned(),
        context.format,
    )));
}

fn into_inline(node: ImportedNode) -> Option<InlineNode> {
    match node {
        ImportedNode::Inline(inline) => Some(inline),
        _ => None,
    }
}

/// Flatten paragraphs into their inline content.
fn inline_only(nodes: Vec<ImportedNode>) -> Vec<ImportedNode> {
    nodes
        .into_iter()
        .flat_map(|node| match node {
            ImportedNode::Paragraph(inline) => inline.into_iter().map(ImportedNode::Inline).collect(),
            other => vec![other],
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
struct Context {
    format: TextFormat,
    inline: bool,
}

impl Context {
    fn with_format(self, format: TextFormat) -> Self {
        Self {
            format: self.format | format,
            ..self
        }
    }

    fn inline(self) -> Self {
        Self {
            inline: true,
            ..self
        }
    }

    fn block(self) -> Self {
        Self {
            inline: false,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeVariant;
    use pretty_assertions::assert_eq;

    fn decline(_: &DomNode) -> Option<ImportOutput> {
        None
    }

    fn skip(_: &DomNode) -> Option<ImportOutput> {
        Some(ImportOutput::Skip)
    }

    fn bold(_: &DomNode) -> Option<ImportOutput> {
        Some(ImportOutput::Format(TextFormat::BOLD))
    }

    #[test]
    fn test_candidates_order_by_priority_then_registration() {
        let registry = ImportRegistry::new()
            .with_rule(ImportRule::new("div", "low", 0, skip))
            .with_rule(ImportRule::new("div", "first", 1, skip))
            .with_rule(ImportRule::new("div", "second", 1, skip))
            .with_rule(ImportRule::new("div", "guarded", 2, skip).guard(|n| n.has_class("x")));
        let fragment = Fragment::parse("<div></div>");
        let node = &fragment.nodes()[0];
        let names: Vec<&str> = registry.candidates(node).iter().map(|r| r.node_type()).collect();
        assert_eq!(names, ["first", "second", "low"]);
    }

    #[test]
    fn test_declined_rule_falls_through() {
        let registry = ImportRegistry::new()
            .with_rule(ImportRule::new("span", "declines", 2, decline))
            .with_rule(ImportRule::new("span", "bold", 1, bold));
        let fragment = Fragment::parse("<span>x</span>");
        let (output, rule) = registry.convert(&fragment.nodes()[0]).unwrap();
        assert_eq!(rule.node_type(), "bold");
        assert!(matches!(output, ImportOutput::Format(f) if f == TextFormat::BOLD));
    }

    #[test]
    fn test_walker_applies_formats_to_text() {
        let registry = ImportRegistry::new().with_rule(ImportRule::new("span", "bold", 1, bold));
        let nodes = registry.import_fragment("<p>a <span>b</span></p>");
        let [ImportedNode::Paragraph(inline)] = nodes.as_slice() else {
            panic!("expected one paragraph, got {nodes:?}");
        };
        assert_eq!(
            inline,
            &vec![
                InlineNode::text("a "),
                InlineNode::formatted("b", TextFormat::BOLD)
            ]
        );
    }

    #[test]
    fn test_figure_with_caption_is_one_code_block() {
        let registry = ImportRegistry::with_default_nodes();
        let nodes =
            registry.import_fragment("<figure><pre><code>x</code></pre><figcaption>c</figcaption></figure>");
        assert_eq!(nodes.len(), 1);
        let Some(CardNode::CodeBlock(code)) = nodes[0].as_card() else {
            panic!("expected a code block, got {nodes:?}");
        };
        assert_eq!(code.code, "x");
        assert_eq!(code.caption, "c");
        assert_eq!(code.text_content(), "x\nc\n\n");
    }
}
