//! Paywall marker.

use crate::import::{COMMENT_TAG, ImportOutput, ImportRule};
use crate::node::{NodeVariant, card_node};
use crate::render::{RenderOptions, RenderOutput};

const MEMBERS_ONLY: &str = "members-only";

card_node! {
    /// Marks where free content ends and member content begins.
    pub struct PaywallNode("paywall", 1) {}
}

impl NodeVariant for PaywallNode {
    fn import_rules() -> Vec<ImportRule> {
        vec![
            ImportRule::new(COMMENT_TAG, Self::NODE_TYPE, 0, |_| {
                Some(ImportOutput::card(PaywallNode::default()))
            })
            .guard(|comment| comment.comment_text().is_some_and(|text| text.trim() == MEMBERS_ONLY)),
        ]
    }

    fn render(&self, _options: &RenderOptions) -> RenderOutput {
        RenderOutput::inner(format!("<!--{MEMBERS_ONLY}-->"))
    }
}
