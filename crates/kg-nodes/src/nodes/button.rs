//! Button card.

use std::sync::LazyLock;

use kg_html::{DomNode, Element};
use regex::Regex;

use crate::import::{ImportOutput, ImportRule};
use crate::node::{NodeVariant, card_node};
use crate::nodes::empty_output;
use crate::render::{RenderOptions, RenderOutput};
use crate::schema::UrlKind;

static ALIGNMENT_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"kg-align-(left|center)").expect("invalid alignment regex"));

card_node! {
    /// A single call-to-action link styled as a button.
    pub struct ButtonNode("button", 1) {
        button_text as "buttonText": String = String::new(),
        alignment as "alignment": String = "center".to_owned(),
        button_url as "buttonUrl": String = String::new() => url(UrlKind::Url),
    }
}

impl ButtonNode {
    fn web_element(&self) -> Element {
        let mut card = Element::new("div").class("kg-card kg-button-card");
        if !self.alignment.is_empty() {
            card.add_class(&format!("kg-align-{}", self.alignment));
        }
        let text = if self.button_text.is_empty() {
            "Button Title"
        } else {
            &self.button_text
        };
        card.child(
            Element::new("a")
                .attr("href", &self.button_url)
                .attr("class", "kg-btn kg-btn-accent")
                .text(text),
        )
    }

    fn email_element(&self) -> Element {
        let link = Element::new("a")
            .attr("href", &self.button_url)
            .text(&self.button_text);
        let table = Element::new("table")
            .attr("border", "0")
            .attr("cellspacing", "0")
            .attr("cellpadding", "0")
            .attr("align", &self.alignment)
            .child(Element::new("tr").child(Element::new("td").attr("align", "center").child(link)));
        Element::new("p").child(Element::new("div").class("btn btn-accent").child(table))
    }
}

impl NodeVariant for ButtonNode {
    fn import_rules() -> Vec<ImportRule> {
        vec![
            ImportRule::new("div", Self::NODE_TYPE, 1, import_button_card)
                .guard(|div| div.has_class("kg-button-card")),
        ]
    }

    fn render(&self, options: &RenderOptions) -> RenderOutput {
        if self.button_url.trim().is_empty() {
            return empty_output(Self::NODE_TYPE);
        }
        let element = if options.is_email() {
            self.email_element()
        } else {
            self.web_element()
        };
        RenderOutput::element(element.outer_html())
    }
}

fn import_button_card(div: &DomNode) -> Option<ImportOutput> {
    let class_name = div.class_name();
    let alignment = ALIGNMENT_CLASS
        .captures(&class_name)
        .map(|caps| caps[1].to_owned())
        .unwrap_or_default();
    let button = div.query_selector(".kg-btn");
    Some(ImportOutput::card(ButtonNode {
        button_text: button.as_ref().map(DomNode::text_content).unwrap_or_default(),
        button_url: button.and_then(|b| b.attr("href")).unwrap_or_default(),
        alignment: if alignment.is_empty() { "center".to_owned() } else { alignment },
        ..ButtonNode::default()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardNode;
    use crate::import::ImportRegistry;
    use crate::render::RenderTarget;
    use pretty_assertions::assert_eq;

    fn button() -> ButtonNode {
        ButtonNode {
            button_text: "Subscribe".to_owned(),
            button_url: "https://example.com/signup".to_owned(),
            alignment: "left".to_owned(),
            ..ButtonNode::default()
        }
    }

    #[test]
    fn test_web_render() {
        assert_eq!(
            button().render(&RenderOptions::default()).content,
            r#"<div class="kg-card kg-button-card kg-align-left"><a href="https://example.com/signup" class="kg-btn kg-btn-accent">Subscribe</a></div>"#
        );
    }

    #[test]
    fn test_web_render_placeholder_text() {
        let node = ButtonNode {
            button_text: String::new(),
            ..button()
        };
        assert!(node.render(&RenderOptions::default()).content.contains(">Button Title</a>"));
    }

    #[test]
    fn test_email_render() {
        assert_eq!(
            button().render(&RenderOptions::new(RenderTarget::Email)).content,
            r#"<p><div class="btn btn-accent"><table border="0" cellspacing="0" cellpadding="0" align="left"><tr><td align="center"><a href="https://example.com/signup">Subscribe</a></td></tr></table></div></p>"#
        );
    }

    #[test]
    fn test_blank_url_renders_empty() {
        let node = ButtonNode {
            button_url: "  ".to_owned(),
            ..button()
        };
        assert!(node.render(&RenderOptions::default()).is_empty());
    }

    #[test]
    fn test_import_button_card() {
        let html = r#"<div class="kg-card kg-button-card kg-align-left"><a href="https://x.test/" class="kg-btn kg-btn-accent">Go</a></div>"#;
        let nodes = ImportRegistry::with_default_nodes().import_fragment(html);
        let Some(CardNode::Button(node)) = nodes[0].as_card() else {
            panic!("expected a button, got {nodes:?}");
        };
        assert_eq!(node.button_text, "Go");
        assert_eq!(node.button_url, "https://x.test/");
        assert_eq!(node.alignment, "left");
    }
}
