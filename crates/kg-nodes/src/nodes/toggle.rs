//! Toggle (collapsible section) card.

use kg_html::DomNode;

use crate::import::{ImportOutput, ImportRule};
use crate::node::{NodeVariant, card_node};
use crate::nodes::{template_element, text_of};
use crate::render::{RenderOptions, RenderOutput};
use crate::schema::UrlKind;

card_node! {
    /// A heading that expands to reveal its content.
    pub struct ToggleNode("toggle", 1) {
        heading as "heading": String = String::new() => url(UrlKind::Html) word_count(),
        content as "content": String = String::new() => url(UrlKind::Html) word_count(),
    }
}

impl ToggleNode {
    fn web_template(&self) -> String {
        format!(
            r#"
        <div class="kg-card kg-toggle-card" data-kg-toggle-state="close">
            <div class="kg-toggle-heading">
                <h4 class="kg-toggle-heading-text">{heading}</h4>
                <button class="kg-toggle-card-icon" aria-label="Expand toggle to read content">
                    <svg id="Regular" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24">
                        <path class="cls-1" d="M23.25,7.311,12.53,18.03a.749.749,0,0,1-1.06,0L.75,7.311"></path>
                    </svg>
                </button>
            </div>
            <div class="kg-toggle-content">{content}</div>
        </div>
        "#,
            heading = self.heading,
            content = self.content,
        )
    }

    fn email_template(&self) -> String {
        format!(
            r#"
        <div style="background: transparent;
        border: 1px solid rgba(124, 139, 154, 0.25); border-radius: 4px; padding: 20px; margin-bottom: 1.5em;">
            <h4 style="font-size: 1.375rem; font-weight: 600; margin-bottom: 8px; margin-top:0px">{heading}</h4>
            <div style="font-size: 1rem; line-height: 1.5; margin-bottom: -1.5em;">{content}</div>
        </div>
        "#,
            heading = self.heading,
            content = self.content,
        )
    }
}

impl NodeVariant for ToggleNode {
    fn import_rules() -> Vec<ImportRule> {
        vec![
            ImportRule::new("div", Self::NODE_TYPE, 1, import_toggle_card)
                .guard(|div| div.has_class("kg-toggle-card")),
        ]
    }

    fn render(&self, options: &RenderOptions) -> RenderOutput {
        let template = if options.is_email() {
            self.email_template()
        } else {
            self.web_template()
        };
        RenderOutput::element(template_element(&template))
    }
}

fn import_toggle_card(div: &DomNode) -> Option<ImportOutput> {
    Some(ImportOutput::card(ToggleNode {
        heading: text_of(div, ".kg-toggle-heading-text"),
        content: text_of(div, ".kg-toggle-content"),
        ..ToggleNode::default()
    }))
}
