//! Call-to-action card.

use kg_html::escape_attr;

use crate::node::{NodeVariant, card_node};
use crate::nodes::template_element;
use crate::render::{RenderOptions, RenderOutput};
use crate::visibility::render_with_visibility;

card_node! {
    /// A sponsor or promotion block with optional image and button.
    pub struct CallToActionNode("call-to-action", 1, visibility) {
        layout as "layout": String = "minimal".to_owned(),
        text_value as "textValue": String = String::new() => word_count(),
        show_button as "showButton": bool = false,
        button_text as "buttonText": String = String::new(),
        button_url as "buttonUrl": String = String::new(),
        button_color as "buttonColor": String = String::new(),
        button_text_color as "buttonTextColor": String = String::new(),
        has_sponsor_label as "hasSponsorLabel": bool = true,
        background_color as "backgroundColor": String = "grey".to_owned(),
        has_image as "hasImage": bool = false,
        image_url as "imageUrl": String = String::new() => strip_data_url(),
    }
}

impl CallToActionNode {
    fn button_style(&self) -> String {
        if self.button_color == "accent" {
            String::new()
        } else {
            format!("background-color: {};", self.button_color)
        }
    }

    fn web_template(&self) -> String {
        let background_accent = if self.background_color == "accent" { "kg-style-accent" } else { "" };
        let button_accent = if self.button_color == "accent" { "kg-style-accent" } else { "" };
        let image = if self.has_image {
            format!(r#"<img src="{}" alt="CTA Image">"#, escape_attr(&self.image_url))
        } else {
            String::new()
        };
        let button = if self.show_button {
            format!(
                r#"<a href="{}" class="kg-cta-button {button_accent}" style="{} color: {};">
            {}
        </a>"#,
                escape_attr(&self.button_url),
                self.button_style(),
                self.button_text_color,
                self.button_text
            )
        } else {
            String::new()
        };
        let sponsor = if self.has_sponsor_label {
            r#"<div class="kg-sponsor-label">
            Sponsored
        </div>"#
        } else {
            ""
        };
        format!(
            r#"
<div class="cta-card {background_accent}" data-layout="{layout}" style="background-color: {background};">
    {image}
    <div>
        {text}
    </div>
    {button}
    {sponsor}
</div>
"#,
            layout = escape_attr(&self.layout),
            background = self.background_color,
            text = self.text_value,
        )
    }

    fn email_template(&self) -> String {
        let image = if self.has_image {
            format!(
                r#"<img src="{}" alt="CTA Image" style="max-width: 100%; border-radius: 4px;">"#,
                escape_attr(&self.image_url)
            )
        } else {
            String::new()
        };
        let button = if self.show_button {
            format!(
                r#"<a href="{}" class="cta-button" style="display: inline-block; margin-top: 12px; padding: 10px 16px; {} color: {}; text-decoration: none; border-radius: 4px;">
            {}
        </a>"#,
                escape_attr(&self.button_url),
                self.button_style(),
                self.button_text_color,
                self.button_text
            )
        } else {
            String::new()
        };
        let sponsor = if self.has_sponsor_label {
            r#"<div class="sponsor-label" style="margin-top: 8px; font-size: 12px; color: #888;">
            Sponsored
        </div>"#
        } else {
            ""
        };
        format!(
            r#"
<div class="cta-card-email" style="background-color: {background}; padding: 16px; text-align: center; border-radius: 8px;">
    {image}
    <div class="cta-text" style="margin-top: 12px;">
        {text}
    </div>
    {button}
    {sponsor}
</div>
"#,
            background = self.background_color,
            text = self.text_value,
        )
    }
}

impl NodeVariant for CallToActionNode {
    fn render(&self, options: &RenderOptions) -> RenderOutput {
        let template = if options.is_email() {
            self.email_template()
        } else {
            self.web_template()
        };
        let output = RenderOutput::element(template_element(&template));
        let mut visibility = self.visibility.clone();
        render_with_visibility(output, &mut visibility, options.target)
    }
}
