//! Segmented newsletter call to action.

use kg_html::{Element, escape_html};

use crate::node::{NodeVariant, card_node};
use crate::nodes::email::clean_email_html;
use crate::nodes::empty_output;
use crate::render::{RenderOptions, RenderOutput};
use crate::schema::UrlKind;

card_node! {
    /// Newsletter-only block shown to one member segment.
    pub struct EmailCtaNode("email-cta", 1) {
        alignment as "alignment": String = "left".to_owned(),
        button_text as "buttonText": String = String::new(),
        button_url as "buttonUrl": String = String::new() => url(UrlKind::Url),
        html as "html": String = String::new() => url(UrlKind::Html),
        segment as "segment": String = "status:free".to_owned(),
        show_button as "showButton": bool = false,
        show_dividers as "showDividers": bool = true,
    }
}

impl EmailCtaNode {
    fn has_button(&self) -> bool {
        self.show_button && !self.button_text.is_empty() && !self.button_url.is_empty()
    }

    fn button_html(&self) -> String {
        let template = format!(
            r#"
            <div class="btn btn-accent">
                <table border="0" cellspacing="0" cellpadding="0" align="{alignment}">
                    <tbody>
                        <tr>
                            <td align="center">
                                <a href="{url}">{text}</a>
                            </td>
                        </tr>
                    </tbody>
                </table>
            </div>
            <p></p>
        "#,
            alignment = escape_html(&self.alignment),
            url = escape_html(&self.button_url),
            text = escape_html(&self.button_text),
        );
        clean_email_html(&template)
    }
}

impl NodeVariant for EmailCtaNode {
    fn render(&self, options: &RenderOptions) -> RenderOutput {
        let has_button = self.has_button();
        if (self.html.is_empty() && !has_button) || !options.is_email() {
            return empty_output(Self::NODE_TYPE);
        }

        let mut element = Element::new("div");
        if !self.segment.is_empty() {
            element.set_attr("data-gh-segment", &self.segment);
        }
        if self.alignment == "center" {
            element.set_attr("class", "align-center");
        }
        if self.show_dividers {
            element.push(Element::new("hr"));
        }
        element = element.raw(clean_email_html(&self.html));
        if has_button {
            element = element.raw(self.button_html());
        }
        if self.show_dividers {
            element.push(Element::new("hr"));
        }
        RenderOutput::element(element.outer_html())
    }
}
