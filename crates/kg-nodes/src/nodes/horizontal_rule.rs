//! Horizontal rule card.

use kg_html::Element;

use crate::import::{ImportOutput, ImportRule};
use crate::node::{NodeVariant, card_node};
use crate::render::{RenderOptions, RenderOutput};

card_node! {
    /// A thematic break.
    pub struct HorizontalRuleNode("horizontalrule", 1) {}
}

impl NodeVariant for HorizontalRuleNode {
    fn text_content(&self) -> String {
        "---\n\n".to_owned()
    }

    fn has_edit_mode(&self) -> bool {
        false
    }

    fn import_rules() -> Vec<ImportRule> {
        vec![ImportRule::new("hr", Self::NODE_TYPE, 0, |_| {
            Some(ImportOutput::card(HorizontalRuleNode::default()))
        })]
    }

    fn render(&self, _options: &RenderOptions) -> RenderOutput {
        RenderOutput::element(Element::new("hr").outer_html())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardNode;
    use crate::import::ImportRegistry;
    use crate::node::NodeData;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    #[test]
    fn test_render_and_text() {
        let node = HorizontalRuleNode::default();
        assert_eq!(node.render(&RenderOptions::default()).content, "<hr>");
        assert_eq!(node.text_content(), "---\n\n");
        assert!(!node.has_edit_mode());
    }

    #[test]
    fn test_record_has_only_type_and_version() {
        let record = HorizontalRuleNode::default().export_record();
        assert_eq!(Value::Object(record), json!({"type": "horizontalrule", "version": 1}));
        assert!(HorizontalRuleNode::schema().properties().is_empty());
    }

    #[test]
    fn test_import_hr() {
        let nodes = ImportRegistry::with_default_nodes().import_fragment("<p>a</p><hr><p>b</p>");
        assert!(matches!(nodes[1].as_card(), Some(CardNode::HorizontalRule(_))));
    }
}
