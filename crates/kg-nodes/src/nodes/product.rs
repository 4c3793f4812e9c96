//! Product card.

use std::sync::LazyLock;

use kg_html::DomNode;
use regex::Regex;
use serde_json::{Value, json};

use crate::image::Dimensions;
use crate::import::{ImportOutput, ImportRule};
use crate::node::{NodeVariant, card_node};
use crate::nodes::{empty_output, payload, read_caption, template_element};
use crate::render::{RenderOptions, RenderOutput};
use crate::schema::UrlKind;

const EMAIL_MAX_WIDTH: u64 = 560;
const STAR_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><path d="M12.729,1.2l3.346,6.629,6.44.638a.805.805,0,0,1,.5,1.374l-5.3,5.253,1.965,7.138a.813.813,0,0,1-1.151.935L12,19.934,5.48,23.163a.813.813,0,0,1-1.151-.935L6.294,15.09.99,9.837a.805.805,0,0,1,.5-1.374l6.44-.638L11.271,1.2A.819.819,0,0,1,12.729,1.2Z"/></svg>"#;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("invalid whitespace regex"));

card_node! {
    /// A product recommendation with image, rating and buy button.
    pub struct ProductNode("product", 1) {
        product_image_src as "productImageSrc": String = String::new() => url(UrlKind::Url) strip_data_url(),
        product_image_width as "productImageWidth": Option<u64> = None,
        product_image_height as "productImageHeight": Option<u64> = None,
        product_title as "productTitle": String = String::new() => url(UrlKind::Html) word_count(),
        product_description as "productDescription": String = String::new() => url(UrlKind::Html) word_count(),
        product_rating_enabled as "productRatingEnabled": bool = false,
        product_star_rating as "productStarRating": u32 = 5,
        product_button_enabled as "productButtonEnabled": bool = false,
        product_button as "productButton": String = String::new(),
        product_url as "productUrl": String = String::new(),
    }
}

impl ProductNode {
    fn has_button(&self) -> bool {
        self.product_button_enabled && !self.product_url.is_empty() && !self.product_button.is_empty()
    }

    fn web_template(&self) -> String {
        let image = if self.product_image_src.is_empty() {
            String::new()
        } else {
            let width = self
                .product_image_width
                .map(|w| format!(r#"width="{w}""#))
                .unwrap_or_default();
            let height = self
                .product_image_height
                .map(|h| format!(r#"height="{h}""#))
                .unwrap_or_default();
            format!(
                r#"<img src="{}" {width} {height} class="kg-product-card-image" loading="lazy" />"#,
                self.product_image_src
            )
        };
        let rating = if self.product_rating_enabled {
            let stars: Vec<String> = (1..=5)
                .map(|i| {
                    let active = if self.product_star_rating >= i { "kg-product-card-rating-active" } else { "" };
                    format!(r#"<span class="{active} kg-product-card-rating-star">{STAR_ICON}</span>"#)
                })
                .collect();
            format!(
                r#"
                    <div class="kg-product-card-rating">
                        {}
                    </div>
                "#,
                stars.join("\n                        ")
            )
        } else {
            String::new()
        };
        let button = if self.product_button_enabled {
            format!(
                r#"
                    <a href="{}" class="kg-product-card-button kg-product-card-btn-accent" target="_blank" rel="noopener noreferrer"><span>{}</span></a>
                "#,
                self.product_url, self.product_button
            )
        } else {
            String::new()
        };
        format!(
            r#"
        <div class="kg-card kg-product-card">
            <div class="kg-product-card-container">
                {image}
                <div class="kg-product-card-title-container">
                    <h4 class="kg-product-card-title">{title}</h4>
                </div>
                {rating}

                <div class="kg-product-card-description">{description}</div>
                {button}
            </div>
        </div>
    "#,
            title = self.product_title,
            description = self.product_description,
        )
    }

    fn email_template(&self) -> String {
        let dimensions = Dimensions::from_options(self.product_image_width, self.product_image_height)
            .map(|d| {
                if d.width >= EMAIL_MAX_WIDTH {
                    d.resize_to_width(EMAIL_MAX_WIDTH)
                } else {
                    d
                }
            });
        let image = if self.product_image_src.is_empty() {
            String::new()
        } else {
            let (width, height) = dimensions
                .map(|d| (format!(r#"width="{}""#, d.width), format!(r#"height="{}""#, d.height)))
                .unwrap_or_default();
            format!(
                r#"
                <tr>
                    <td align="center" style="padding-top:0; padding-bottom:0; margin-bottom:0; padding-bottom:0;">
                        <img src="{}" {width} {height} style="display: block; width: 100%; height: auto; max-width: 100%; border: none; padding-bottom: 16px;" border="0"/>
                    </td>
                </tr>
            "#,
                self.product_image_src
            )
        };
        let rating = if self.product_rating_enabled {
            format!(
                r#"
                <tr style="padding-top:0; padding-bottom:0; margin-bottom:0; padding-bottom:0;">
                    <td valign="top">
                        <img src="https://static.ghost.org/v4.0.0/images/star-rating-{}.png" style="border: none; width: 96px;" border="0" />
                    </td>
                </tr>
            "#,
                self.product_star_rating
            )
        } else {
            String::new()
        };
        let button = if self.product_button_enabled {
            format!(
                r#"
                <tr>
                    <td style="padding-top:0; padding-bottom:0; margin-bottom:0; padding-bottom:0;">
                        <div class="btn btn-accent" style="box-sizing: border-box;display: table;width: 100%;padding-top: 16px;">
                            <a href="{}" style="overflow-wrap: anywhere;border: solid 1px;border-radius: 5px;box-sizing: border-box;cursor: pointer;display: inline-block;font-size: 14px;font-weight: bold;margin: 0;padding: 0;text-decoration: none;color: #FFFFFF; width: 100%; text-align: center;"><span style="display: block;padding: 12px 25px;">{}</span></a>
                        </div>
                    </td>
                </tr>
            "#,
                self.product_url, self.product_button
            )
        } else {
            String::new()
        };
        format!(
            r#"
         <table cellspacing="0" cellpadding="0" border="0" style="width:100%; padding:20px; border:1px solid #E9E9E9; border-radius: 5px; margin: 0 0 1.5em; width: 100%;">
            {image}
            <tr>
                <td valign="top">
                    <h4 style="font-size: 22px !important; margin-top: 0 !important; margin-bottom: 0 !important; font-weight: 700;">{title}</h4>
                </td>
            </tr>
            {rating}
            <tr>
                <td style="padding-top:0; padding-bottom:0; margin-bottom:0; padding-bottom:0;">
                    <div style="padding-top: 8px; opacity: 0.7; font-size: 17px; line-height: 1.4; margin-bottom: -24px;">{description}</div>
                </td>
            </tr>
            {button}
        </table>
        "#,
            title = self.product_title,
            description = self.product_description,
        )
    }
}

impl NodeVariant for ProductNode {
    fn is_empty(&self) -> bool {
        self.product_title.is_empty()
            && self.product_description.is_empty()
            && !self.has_button()
            && self.product_image_src.is_empty()
            && !self.product_rating_enabled
    }

    fn import_rules() -> Vec<ImportRule> {
        vec![
            ImportRule::new("div", Self::NODE_TYPE, 1, import_product_card)
                .guard(|div| div.has_class("kg-product-card")),
        ]
    }

    fn render(&self, options: &RenderOptions) -> RenderOutput {
        if NodeVariant::is_empty(self) {
            return empty_output(Self::NODE_TYPE);
        }
        let template = if options.is_email() {
            self.email_template()
        } else {
            self.web_template()
        };
        RenderOutput::element(template_element(&template))
    }
}

fn import_product_card(div: &DomNode) -> Option<ImportOutput> {
    let title = read_caption(div, ".kg-product-card-title");
    let description = read_caption(div, ".kg-product-card-description");
    let mut data = payload(json!({
        "productButtonEnabled": false,
        "productRatingEnabled": false,
        "productTitle": title,
        "productDescription": description,
    }));

    let img = div.query_selector(".kg-product-card-image");
    if let Some(src) = img.as_ref().and_then(|img| img.attr("src")).filter(|s| !s.is_empty()) {
        data.insert("productImageSrc".to_owned(), Value::from(src));
        for (attr, name) in [("width", "productImageWidth"), ("height", "productImageHeight")] {
            if let Some(value) = img
                .as_ref()
                .and_then(|img| img.attr(attr))
                .and_then(|v| v.trim().parse::<u64>().ok())
            {
                data.insert(name.to_owned(), Value::from(value));
            }
        }
    }

    let stars = div.query_selector_all(".kg-product-card-rating-active").len();
    if stars > 0 {
        data.insert("productRatingEnabled".to_owned(), Value::from(true));
        data.insert("productStarRating".to_owned(), Value::from(stars));
    }

    let button = div.query_selector("a");
    if let Some(button) = &button {
        let url = button.attr("href").unwrap_or_default();
        let text = WHITESPACE.replace_all(&button.text_content(), " ").trim().to_owned();
        if !url.is_empty() && !text.is_empty() {
            data.insert("productButtonEnabled".to_owned(), Value::from(true));
            data.insert("productButton".to_owned(), Value::from(text));
            data.insert("productUrl".to_owned(), Value::from(url));
        }
    }

    if title.is_empty() && description.is_empty() && img.is_none() && button.is_none() {
        return None;
    }
    Some(ImportOutput::card(ProductNode::from_dataset(&data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardNode;
    use crate::import::ImportRegistry;
    use crate::render::RenderTarget;
    use pretty_assertions::assert_eq;

    fn product() -> ProductNode {
        ProductNode {
            product_image_src: "https://example.com/p.jpg".to_owned(),
            product_image_width: Some(1200),
            product_image_height: Some(800),
            product_title: "Gadget".to_owned(),
            product_description: "<p>Useful</p>".to_owned(),
            product_rating_enabled: true,
            product_star_rating: 3,
            product_button_enabled: true,
            product_button: "Buy".to_owned(),
            product_url: "https://shop.test/".to_owned(),
            ..ProductNode::default()
        }
    }

    #[test]
    fn test_web_render() {
        let html = product().render(&RenderOptions::default()).content;
        assert!(html.contains(
            r#"<img src="https://example.com/p.jpg" width="1200" height="800" class="kg-product-card-image" loading="lazy">"#
        ), "{html}");
        assert_eq!(html.matches(r#"<span class="kg-product-card-rating-active kg-product-card-rating-star">"#).count(), 3);
        assert_eq!(html.matches(r#"<span class=" kg-product-card-rating-star">"#).count(), 2);
        assert!(html.contains(
            r#"<a href="https://shop.test/" class="kg-product-card-button kg-product-card-btn-accent" target="_blank" rel="noopener noreferrer"><span>Buy</span></a>"#
        ), "{html}");
    }

    #[test]
    fn test_email_caps_image_width() {
        let html = product().render(&RenderOptions::new(RenderTarget::Email)).content;
        assert!(html.contains(r#"<img src="https://example.com/p.jpg" width="560" height="373""#), "{html}");
        assert!(html.contains("star-rating-3.png"), "{html}");
    }

    #[test]
    fn test_empty_product() {
        let node = ProductNode {
            product_button_enabled: true,
            product_url: "https://shop.test/".to_owned(),
            ..ProductNode::default()
        };
        assert!(NodeVariant::is_empty(&node));
        assert!(node.render(&RenderOptions::default()).is_empty());
    }

    #[test]
    fn test_import_round_trip() {
        let html = product().render(&RenderOptions::default()).content;
        let nodes = ImportRegistry::with_default_nodes().import_fragment(&html);
        let Some(CardNode::Product(node)) = nodes[0].as_card() else {
            panic!("expected a product, got {nodes:?}");
        };
        assert_eq!(node.product_title, "Gadget");
        assert_eq!(node.product_image_width, Some(1200));
        assert_eq!(node.product_star_rating, 3);
        assert_eq!(node.product_button, "Buy");
        assert_eq!(node.product_url, "https://shop.test/");
    }

    #[test]
    fn test_import_declines_empty_card() {
        let nodes = ImportRegistry::with_default_nodes()
            .import_fragment(r#"<div class="kg-product-card"><div class="kg-product-card-container"></div></div>"#);
        assert!(nodes.iter().all(|n| n.as_card().is_none()));
    }
}
