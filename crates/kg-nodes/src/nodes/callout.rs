//! Callout card.

use std::sync::LazyLock;

use kg_html::{CALLOUT_ALLOWED_TAGS, DomNode, Element, clean_inline};
use regex::Regex;
use serde_json::{Map, Value};

use crate::import::{ImportOutput, ImportRule};
use crate::node::{NodeData, NodeVariant, card_node};
use crate::nodes::{inner_html_of, text_of};
use crate::render::{RenderOptions, RenderOutput};

static CLASS_SAFE_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\d-]+$").expect("invalid color regex"));
static COLOR_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"kg-callout-card-(\w+)").expect("invalid callout color regex"));

card_node! {
    /// Highlighted text with an emoji and a background colour.
    pub struct CalloutNode("callout", 1) {
        callout_text as "calloutText": String = String::new() => word_count(),
        callout_emoji as "calloutEmoji": String = "💡".to_owned(),
        background_color as "backgroundColor": String = "blue".to_owned(),
    }
}

impl CalloutNode {
    /// The background colour when it is usable as a class suffix, else `white`.
    ///
    /// Old pasted content can carry values such as `rgba(0, 0, 0, 0)`.
    pub fn class_color(&self) -> &str {
        if CLASS_SAFE_COLOR.is_match(&self.background_color) {
            &self.background_color
        } else {
            "white"
        }
    }
}

impl NodeVariant for CalloutNode {
    /// An explicitly empty emoji is kept, unlike other string properties.
    fn from_dataset(data: &Map<String, Value>) -> Self {
        let mut node = Self::from_properties(data);
        if let Some(Value::String(emoji)) = data.get("calloutEmoji") {
            emoji.clone_into(&mut node.callout_emoji);
        }
        node
    }

    fn import_rules() -> Vec<ImportRule> {
        vec![
            ImportRule::new("div", Self::NODE_TYPE, 1, import_callout_card)
                .guard(|div| div.has_class("kg-callout-card")),
        ]
    }

    fn render(&self, _options: &RenderOptions) -> RenderOutput {
        let mut card = Element::new("div").class(&format!(
            "kg-card kg-callout-card kg-callout-card-{}",
            self.class_color()
        ));
        if !self.callout_emoji.is_empty() {
            card.push(
                Element::new("div")
                    .class("kg-callout-emoji")
                    .text(&self.callout_emoji),
            );
        }
        card.push(
            Element::new("div")
                .class("kg-callout-text")
                .raw(clean_inline(&self.callout_text, CALLOUT_ALLOWED_TAGS)),
        );
        RenderOutput::element(card.outer_html())
    }
}

fn import_callout_card(div: &DomNode) -> Option<ImportOutput> {
    let class_name = div.class_name();
    let background_color = COLOR_CLASS
        .captures(&class_name)
        .map(|caps| caps[1].to_owned())
        .unwrap_or_default();
    Some(ImportOutput::card(CalloutNode {
        callout_text: inner_html_of(div, ".kg-callout-text"),
        callout_emoji: text_of(div, ".kg-callout-emoji"),
        background_color: if background_color.is_empty() {
            "blue".to_owned()
        } else {
            background_color
        },
        ..CalloutNode::default()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardNode;
    use crate::import::ImportRegistry;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_render_sanitizes_text() {
        let node = CalloutNode {
            callout_text: r#"<p>Hello <span>there</span> <b>you</b></p>"#.to_owned(),
            ..CalloutNode::default()
        };
        assert_eq!(
            node.render(&RenderOptions::default()).content,
            r#"<div class="kg-card kg-callout-card kg-callout-card-blue"><div class="kg-callout-emoji">💡</div><div class="kg-callout-text">Hello there <b>you</b></div></div>"#
        );
    }

    #[test]
    fn test_invalid_color_falls_back_to_white() {
        let node = CalloutNode {
            background_color: "rgba(0, 0, 0, 0)".to_owned(),
            callout_emoji: String::new(),
            ..CalloutNode::default()
        };
        assert_eq!(
            node.render(&RenderOptions::default()).content,
            r#"<div class="kg-card kg-callout-card kg-callout-card-white"><div class="kg-callout-text"></div></div>"#
        );
    }

    #[test]
    fn test_empty_emoji_survives_dataset() {
        let data = json!({"calloutText": "x", "calloutEmoji": ""});
        let Value::Object(data) = data else { unreachable!() };
        let node = CalloutNode::from_dataset(&data);
        assert_eq!(node.callout_emoji, "");
        assert_eq!(CalloutNode::from_dataset(&Map::new()).callout_emoji, "💡");
    }

    #[test]
    fn test_import_callout_card() {
        let html = r#"<div class="kg-card kg-callout-card kg-callout-card-accent"><div class="kg-callout-emoji">🔥</div><div class="kg-callout-text">Hot <em>take</em></div></div>"#;
        let nodes = ImportRegistry::with_default_nodes().import_fragment(html);
        let Some(CardNode::Callout(node)) = nodes[0].as_card() else {
            panic!("expected a callout, got {nodes:?}");
        };
        assert_eq!(node.callout_emoji, "🔥");
        assert_eq!(node.callout_text, "Hot <em>take</em>");
        assert_eq!(node.background_color, "accent");
    }
}
