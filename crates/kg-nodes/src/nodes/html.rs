//! Raw HTML card.

use std::sync::LazyLock;

use kg_html::DomNode;
use regex::Regex;

use crate::import::{COMMENT_TAG, ImportOutput, ImportRule};
use crate::node::{NodeVariant, card_node};
use crate::nodes::empty_output;
use crate::render::{RenderOptions, RenderOutput};
use crate::schema::UrlKind;
use crate::visibility::render_with_visibility;

static BEGIN_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^kg-card-begin:\s?html$").expect("invalid begin comment regex"));
static END_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^kg-card-end:\s?html$").expect("invalid end comment regex"));

card_node! {
    /// Author-supplied markup inserted verbatim.
    pub struct HtmlNode("html", 1, visibility) {
        html as "html": String = String::new() => url(UrlKind::Html) word_count(),
    }
}

impl NodeVariant for HtmlNode {
    fn is_empty(&self) -> bool {
        self.html.is_empty()
    }

    fn import_rules() -> Vec<ImportRule> {
        vec![
            ImportRule::new(COMMENT_TAG, Self::NODE_TYPE, 0, import_comment_block)
                .guard(|comment| is_marker(comment, &BEGIN_COMMENT)),
            ImportRule::new("table", Self::NODE_TYPE, 0, |table| {
                Some(ImportOutput::card(HtmlNode {
                    html: table.outer_html(),
                    ..HtmlNode::default()
                }))
            })
            .guard(|table| !table.parent_element().is_some_and(|p| p.is_tag("table"))),
        ]
    }

    fn render(&self, options: &RenderOptions) -> RenderOutput {
        if self.html.is_empty() {
            return empty_output(Self::NODE_TYPE);
        }
        let wrapped = format!(
            "\n<!--kg-card-begin: html-->\n{}\n<!--kg-card-end: html-->\n",
            self.html
        );
        let mut visibility = self.visibility.clone();
        render_with_visibility(RenderOutput::value(wrapped), &mut visibility, options.target)
    }
}

fn is_marker(node: &DomNode, pattern: &Regex) -> bool {
    node.comment_text()
        .is_some_and(|text| pattern.is_match(text.trim()))
}

/// Capture every sibling up to the end marker, removing them from the tree.
fn import_comment_block(begin: &DomNode) -> Option<ImportOutput> {
    let mut parts = Vec::new();
    let mut next = begin.next_sibling();
    while let Some(node) = next {
        if is_marker(&node, &END_COMMENT) {
            break;
        }
        parts.push(node.outer_html());
        next = node.next_sibling();
        node.remove();
    }
    Some(ImportOutput::card(HtmlNode {
        html: parts.join("\n").trim().to_owned(),
        ..HtmlNode::default()
    }))
}
