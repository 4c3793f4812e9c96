//! Header card, in two generations.
//!
//! Version 1 cards use `size`/`style`; version 2 cards use the layout and
//! colour properties. The `version` property picks the renderer and is also
//! written as the record version.

use kg_html::{DomNode, Element, slugify};
use serde_json::json;

use crate::image::srcset;
use crate::import::{ImportOutput, ImportRule};
use crate::node::{NodeVariant, card_node};
use crate::nodes::{empty_output, payload, template_element};
use crate::render::{RenderOptions, RenderOutput};
use crate::schema::UrlKind;

card_node! {
    /// A full-width banner with heading, subheading and optional button.
    pub struct HeaderNode("header", 1) {
        size as "size": String = "small".to_owned(),
        style as "style": String = "dark".to_owned(),
        button_enabled as "buttonEnabled": bool = false,
        button_url as "buttonUrl": String = String::new() => url(UrlKind::Url),
        button_text as "buttonText": String = String::new(),
        header as "header": String = String::new() => url(UrlKind::Html) word_count(),
        subheader as "subheader": String = String::new() => url(UrlKind::Html) word_count(),
        background_image_src as "backgroundImageSrc": String = String::new() => url(UrlKind::Url) strip_data_url(),
        version as "version": u32 = 1,
        accent_color as "accentColor": String = "#FF1A75".to_owned(),
        alignment as "alignment": String = "center".to_owned(),
        background_color as "backgroundColor": String = "#000000".to_owned(),
        background_image_width as "backgroundImageWidth": Option<u64> = None,
        background_image_height as "backgroundImageHeight": Option<u64> = None,
        background_size as "backgroundSize": String = "cover".to_owned(),
        text_color as "textColor": String = "#FFFFFF".to_owned(),
        button_color as "buttonColor": String = "#ffffff".to_owned(),
        button_text_color as "buttonTextColor": String = "#000000".to_owned(),
        layout as "layout": String = "full".to_owned(),
        swapped as "swapped": bool = false,
    }
}

impl HeaderNode {
    fn has_button(&self) -> bool {
        self.button_enabled && !self.button_url.trim().is_empty()
    }

    fn render_v1(&self) -> RenderOutput {
        let button_enabled =
            self.button_enabled && !self.button_url.is_empty() && !self.button_text.is_empty();
        if self.header.is_empty() && self.subheader.is_empty() && !button_enabled {
            return empty_output(Self::NODE_TYPE);
        }

        let background_style = if self.style == "image" {
            format!("background-image: url({})", self.background_image_src)
        } else {
            String::new()
        };
        let mut card = Element::new("div")
            .class(&format!(
                "kg-card kg-header-card kg-width-full kg-size-{} kg-style-{}",
                self.size, self.style
            ))
            .attr("data-kg-background-image", &self.background_image_src)
            .attr("style", background_style);
        if !self.header.is_empty() {
            card.push(
                Element::new("h2")
                    .class("kg-header-card-header")
                    .attr("id", slugify(&self.header))
                    .raw(&self.header),
            );
        }
        // Any non-empty subheader is shown, even one made only of `<br>`s.
        if !self.subheader.is_empty() {
            card.push(
                Element::new("h3")
                    .class("kg-header-card-subheader")
                    .attr("id", slugify(&self.subheader))
                    .raw(&self.subheader),
            );
        }
        if button_enabled {
            card.push(
                Element::new("a")
                    .class("kg-header-card-button")
                    .attr("href", &self.button_url)
                    .text(&self.button_text),
            );
        }
        RenderOutput::element(card.outer_html())
    }

    fn card_classes(&self) -> String {
        let split = self.layout == "split";
        let mut classes = vec!["kg-card kg-header-card kg-v2".to_owned()];
        if !self.layout.is_empty() && !split {
            classes.push(format!("kg-width-{}", self.layout));
        }
        if split {
            classes.push("kg-layout-split kg-width-full".to_owned());
            if self.swapped {
                classes.push("kg-swapped".to_owned());
            }
        }
        if self.layout == "full" || (split && self.background_size == "contain") {
            classes.push("kg-content-wide".to_owned());
        }
        classes.join(" ")
    }

    fn web_template_v2(&self, options: &RenderOptions) -> String {
        let split = self.layout == "split";
        let background_accent = if self.background_color == "accent" { "kg-style-accent" } else { "" };
        let button_accent = if self.button_color == "accent" { "kg-style-accent" } else { "" };
        let button_style = if self.button_color == "accent" {
            String::new()
        } else {
            format!("background-color: {};", self.button_color)
        };
        let alignment = if self.alignment == "center" { "kg-align-center" } else { "" };
        let wrapper_style = if self.background_color != "accent"
            && (self.background_image_src.is_empty() || split)
        {
            format!(r#"style="background-color: {};""#, self.background_color)
        } else {
            String::new()
        };

        let image = if self.background_image_src.is_empty() {
            String::new()
        } else {
            let srcset = srcset(&self.background_image_src, self.background_image_width, options)
                .map(|value| format!(r#"srcset="{value}""#))
                .unwrap_or_default();
            format!(
                r#"
            <picture><img class="kg-header-card-image" src="{}" {srcset} loading="lazy" alt="" /></picture>
        "#,
                self.background_image_src
            )
        };
        let heading = if self.header.is_empty() {
            String::new()
        } else {
            format!(
                r#"<h2 id="{}" class="kg-header-card-heading" style="color: {color};" data-text-color="{color}">{}</h2>"#,
                slugify(&self.header),
                self.header,
                color = self.text_color
            )
        };
        let subheading = if self.subheader.is_empty() {
            String::new()
        } else {
            format!(
                r#"<p id="{}" class="kg-header-card-subheading" style="color: {color};" data-text-color="{color}">{}</p>"#,
                slugify(&self.subheader),
                self.subheader,
                color = self.text_color
            )
        };
        let button = if self.has_button() {
            format!(
                r#"<a href="{}" class="kg-header-card-button {button_accent}" style="{button_style}color: {};" data-button-color="{}" data-button-text-color="{}">{}</a>"#,
                self.button_url,
                self.button_text_color,
                self.button_color,
                self.button_text_color,
                self.button_text
            )
        } else {
            String::new()
        };

        format!(
            r#"
        <div class="{classes} {background_accent}" {wrapper_style} data-background-color="{background}">
            {outer_image}
            <div class="kg-header-card-content">
                {inner_image}
                <div class="kg-header-card-text {alignment}">
                    {heading}
                    {subheading}
                    {button}
                </div>
            </div>
        </div>
        "#,
            classes = self.card_classes(),
            background = self.background_color,
            outer_image = if split { "" } else { image.as_str() },
            inner_image = if split { image.as_str() } else { "" },
        )
    }

    fn email_template_v2(&self) -> String {
        let split = self.layout == "split";
        let background_accent = if self.background_color == "accent" {
            format!("background-color: {};", self.accent_color)
        } else {
            String::new()
        };
        let button_accent = if self.button_color == "accent" {
            format!("background-color: {};", self.accent_color)
        } else {
            self.button_color.clone()
        };
        let button_style = if self.button_color == "accent" {
            String::new()
        } else {
            format!("background-color: {};", self.button_color)
        };
        let alignment = if self.alignment == "center" { "text-align: center;" } else { "" };
        let background_style = if !self.background_image_src.is_empty() && !split {
            format!(
                "background-image: url({}); background-size: cover; background-position: center center;",
                self.background_image_src
            )
        } else {
            format!("background-color: {};", self.background_color)
        };
        let split_image = if split && !self.background_image_src.is_empty() {
            format!(
                r#"
                <div class="kg-header-card-image" background="{src}" style="background-image: url({src}); background-size: {size}; background-position: center"></div>
            "#,
                src = self.background_image_src,
                size = if self.background_size == "contain" { "40%" } else { "cover" },
            )
        } else {
            String::new()
        };
        let content_style = if split && self.background_size == "contain" { "padding-top: 0;" } else { "" };
        let button = if self.has_button() {
            format!(
                r#"
                    <a class="kg-header-card-button" href="{}" style="color: {}; {button_style} {button_accent}">{}</a>
                "#,
                self.button_url, self.button_text_color, self.button_text
            )
        } else {
            String::new()
        };

        format!(
            r#"
        <div class="kg-header-card kg-v2" style="color:{color}; {alignment} {background_style} {background_accent}">
            {split_image}
            <div class="kg-header-card-content" style="{content_style}">
                <h2 class="kg-header-card-heading" style="color:{color};">{header}</h2>
                <p class="kg-header-card-subheading" style="color:{color};">{subheader}</p>
                {button}
            </div>
        </div>
    "#,
            color = self.text_color,
            header = self.header,
            subheader = self.subheader,
        )
    }
}

impl NodeVariant for HeaderNode {
    fn import_rules() -> Vec<ImportRule> {
        vec![
            ImportRule::new("div", Self::NODE_TYPE, 1, import_header_v1)
                .guard(|div| div.has_class("kg-header-card") && !div.has_class("kg-v2")),
            ImportRule::new("div", Self::NODE_TYPE, 1, import_header_v2)
                .guard(|div| div.has_class("kg-header-card") && div.has_class("kg-v2")),
        ]
    }

    fn render(&self, options: &RenderOptions) -> RenderOutput {
        match self.version {
            1 => self.render_v1(),
            2 if options.is_email() => {
                RenderOutput::element(template_element(&self.email_template_v2()))
            }
            2 => RenderOutput::element(template_element(&self.web_template_v2(options))),
            version => {
                tracing::warn!(version, "Unknown header card version");
                empty_output(Self::NODE_TYPE)
            }
        }
    }
}

fn import_header_v1(div: &DomNode) -> Option<ImportOutput> {
    let header = div.query_selector(".kg-header-card-header");
    let subheader = div.query_selector(".kg-header-card-subheader");
    let button = div.query_selector(".kg-header-card-button");
    let data = payload(json!({
        "size": if div.has_class("kg-size-large") { "large" } else { "small" },
        "style": if div.has_class("kg-style-image") { "image" } else { "text" },
        "backgroundImageSrc": div.attr("data-kg-background-image"),
        "header": header.map(|h| h.text_content()).unwrap_or_default(),
        "subheader": subheader.map(|h| h.text_content()).unwrap_or_default(),
        "buttonEnabled": button.is_some(),
        "buttonUrl": button.as_ref().and_then(|b| b.attr("href")).unwrap_or_default(),
        "buttonText": button.map(|b| b.text_content()).unwrap_or_default(),
        "version": 1,
    }));
    Some(ImportOutput::card(HeaderNode::from_dataset(&data)))
}

fn import_header_v2(div: &DomNode) -> Option<ImportOutput> {
    let header = div.query_selector(".kg-header-card-heading");
    let subheader = div.query_selector(".kg-header-card-subheading");
    let button = div.query_selector(".kg-header-card-button");
    let background_image_src = div
        .query_selector(".kg-header-card-image")
        .and_then(|img| img.attr("src"));
    let background_color = if div.has_class("kg-style-accent") {
        Some("accent".to_owned())
    } else {
        div.attr("data-background-color")
    };
    let button_attr = |name: &str| {
        button
            .as_ref()
            .and_then(|b| b.attr(name))
            .unwrap_or_default()
    };
    let data = payload(json!({
        "backgroundColor": background_color,
        "buttonColor": button_attr("data-button-color"),
        "alignment": if div.has_class("kg-align-center") { "center" } else { "" },
        "layout": if background_image_src.is_some() { "split" } else { "" },
        "backgroundImageSrc": background_image_src,
        "textColor": header.as_ref().and_then(|h| h.attr("data-text-color")).unwrap_or_default(),
        "header": header.map(|h| h.text_content()).unwrap_or_default(),
        "subheader": subheader.map(|h| h.text_content()).unwrap_or_default(),
        "buttonEnabled": button.is_some(),
        "buttonUrl": button_attr("href"),
        "buttonText": button.as_ref().map(DomNode::text_content).unwrap_or_default(),
        "buttonTextColor": button_attr("data-button-text-color"),
        "version": 2,
    }));
    Some(ImportOutput::card(HeaderNode::from_dataset(&data)))
}
