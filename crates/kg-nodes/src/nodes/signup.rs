//! Member signup form.

use std::sync::LazyLock;

use kg_html::{DomNode, Fragment};
use regex::Regex;
use serde_json::{Map, Value, json};

use crate::import::{ImportOutput, ImportRule};
use crate::node::{NodeData, NodeVariant, card_node};
use crate::nodes::payload;
use crate::render::{RenderOptions, RenderOutput};

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("invalid digits regex"));

const DEFAULT_SUCCESS_MESSAGE: &str = "Thanks! Now check your email to confirm.";

const LOADING_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" height="24" width="24" viewBox="0 0 24 24">
        <g stroke-linecap="round" stroke-width="2" fill="currentColor" stroke="none" stroke-linejoin="round" class="nc-icon-wrapper">
            <g class="nc-loop-dots-4-24-icon-o">
                <circle cx="4" cy="12" r="3"></circle>
                <circle cx="12" cy="12" r="3"></circle>
                <circle cx="20" cy="12" r="3"></circle>
            </g>
            <style data-cap="butt">
                .nc-loop-dots-4-24-icon-o{--animation-duration:0.8s}
                .nc-loop-dots-4-24-icon-o *{opacity:.4;transform:scale(.75);animation:nc-loop-dots-4-anim var(--animation-duration) infinite}
                .nc-loop-dots-4-24-icon-o :nth-child(1){transform-origin:4px 12px;animation-delay:-.3s;animation-delay:calc(var(--animation-duration)/-2.666)}
                .nc-loop-dots-4-24-icon-o :nth-child(2){transform-origin:12px 12px;animation-delay:-.15s;animation-delay:calc(var(--animation-duration)/-5.333)}
                .nc-loop-dots-4-24-icon-o :nth-child(3){transform-origin:20px 12px}
                @keyframes nc-loop-dots-4-anim{0%,100%{opacity:.4;transform:scale(.75)}50%{opacity:1;transform:scale(1)}}
            </style>
        </g>
    </svg>"#;

card_node! {
    /// A newsletter signup form with optional background image.
    pub struct SignupNode("signup", 1) {
        alignment as "alignment": String = "left".to_owned(),
        background_color as "backgroundColor": String = "#F0F0F0".to_owned(),
        background_image_src as "backgroundImageSrc": String = String::new() => strip_data_url(),
        background_size as "backgroundSize": String = "cover".to_owned(),
        text_color as "textColor": String = String::new(),
        button_color as "buttonColor": String = "accent".to_owned(),
        button_text_color as "buttonTextColor": String = "#FFFFFF".to_owned(),
        button_text as "buttonText": String = "Subscribe".to_owned(),
        disclaimer as "disclaimer": String = String::new() => word_count(),
        header as "header": String = String::new() => word_count(),
        labels as "labels": Vec<String> = Vec::new(),
        layout as "layout": String = "wide".to_owned(),
        subheader as "subheader": String = String::new() => word_count(),
        success_message as "successMessage": String =
            "Email sent! Check your inbox to complete your signup.".to_owned(),
        swapped as "swapped": bool = false,
    }
}

impl SignupNode {
    /// Replace the member labels applied on signup.
    pub fn set_labels(&mut self, labels: Vec<String>) {
        self.labels = labels;
    }

    pub fn add_label(&mut self, label: impl Into<String>) {
        self.labels.push(label.into());
    }

    /// Remove every occurrence of `label`.
    pub fn remove_label(&mut self, label: &str) {
        self.labels.retain(|l| l != label);
    }

    fn is_split(&self) -> bool {
        self.layout == "split"
    }

    fn card_classes(&self) -> String {
        let mut classes = vec!["kg-card kg-signup-card".to_owned()];
        if !self.layout.is_empty() && !self.is_split() {
            classes.push(format!("kg-width-{}", self.layout));
        }
        if self.is_split() {
            classes.push("kg-layout-split kg-width-full".to_owned());
            if self.swapped {
                classes.push("kg-swapped".to_owned());
            }
        }
        if self.layout == "full" || (self.is_split() && self.background_size == "contain") {
            classes.push("kg-content-wide".to_owned());
        }
        classes.join(" ")
    }

    /// Accent backgrounds apply unless a full-bleed image covers them.
    fn accent_class(&self) -> &'static str {
        let accent = self.background_color == "accent";
        if accent && (self.is_split() || self.background_image_src.is_empty()) {
            "kg-style-accent"
        } else {
            ""
        }
    }

    fn web_template(&self) -> String {
        let text_style = if self.text_color.is_empty() {
            String::new()
        } else {
            format!(r#"style="color: {};""#, self.text_color)
        };
        let (button_accent, button_style) = if self.button_color == "accent" {
            ("kg-style-accent", String::new())
        } else {
            ("", format!("background-color: {};", self.button_color))
        };
        let alignment = if self.alignment == "center" {
            "kg-align-center"
        } else {
            ""
        };
        let background_style = if self.background_color != "accent"
            && (self.background_image_src.is_empty() || self.is_split())
        {
            format!("background-color: {}", self.background_color)
        } else {
            String::new()
        };
        let image = if self.background_image_src.is_empty() {
            String::new()
        } else {
            format!(
                r#"
        <picture><img class="kg-signup-card-image" src="{}" alt="" /></picture>
    "#,
                self.background_image_src
            )
        };
        let (outer_image, inner_image) = if self.is_split() {
            ("", image.as_str())
        } else {
            (image.as_str(), "")
        };
        let labels = self
            .labels
            .iter()
            .map(|label| format!(r#"<input data-members-label type="hidden" value="{label}" />"#))
            .collect::<Vec<_>>()
            .join("\n");
        let button_text = if self.button_text.is_empty() {
            "Subscribe"
        } else {
            &self.button_text
        };
        let success_message = if self.success_message.is_empty() {
            DEFAULT_SUCCESS_MESSAGE
        } else {
            &self.success_message
        };
        format!(
            r#"
        <div class="{classes} {accent}" data-lexical-signup-form style="{background_style}; display: none;">
            {outer_image}
            <div class="kg-signup-card-content">
                {inner_image}
                <div class="kg-signup-card-text {alignment}">
                    <h2 class="kg-signup-card-heading" {text_style}>{header}</h2>
                    <p class="kg-signup-card-subheading" {text_style}>{subheader}</p>

        <form class="kg-signup-card-form" data-members-form="signup">
            {labels}
            <div class="kg-signup-card-fields">
                <input class="kg-signup-card-input" id="email" data-members-email="" type="email" required="true" placeholder="Your email" />
                <button class="kg-signup-card-button {button_accent}" style="{button_style}color: {button_text_color};" type="submit">
                    <span class="kg-signup-card-button-default">{button_text}</span>
                    <span class="kg-signup-card-button-loading">{LOADING_ICON}</span>
                </button>
            </div>
            <div class="kg-signup-card-success" {text_style}>
                {success_message}
            </div>
            <div class="kg-signup-card-error" {text_style} data-members-error></div>
        </form>

                    <p class="kg-signup-card-disclaimer" {text_style}>{disclaimer}</p>
                </div>
            </div>
        </div>
        "#,
            classes = self.card_classes(),
            accent = self.accent_class(),
            header = self.header,
            subheader = self.subheader,
            button_text_color = self.button_text_color,
            disclaimer = self.disclaimer,
        )
    }
}

impl NodeVariant for SignupNode {
    /// Text color is inherited on transparent backgrounds unless an image
    /// sits behind the text.
    fn from_dataset(data: &Map<String, Value>) -> Self {
        let mut node = Self::from_properties(data);
        let raw = |key: &str| data.get(key).and_then(Value::as_str).unwrap_or_default();
        if raw("backgroundColor") == "transparent"
            && (raw("layout") == "split" || raw("backgroundImageSrc").is_empty())
        {
            node.text_color.clear();
        } else if node.text_color.is_empty() {
            "#000000".clone_into(&mut node.text_color);
        }
        node
    }

    fn import_rules() -> Vec<ImportRule> {
        vec![
            ImportRule::new("div", Self::NODE_TYPE, 1, import_signup_card)
                .guard(|div| div.attr("data-lexical-signup-form").is_some_and(|v| v.is_empty())),
        ]
    }

    fn render(&self, options: &RenderOptions) -> RenderOutput {
        if options.is_email() {
            return RenderOutput::element("<div></div>");
        }
        let fragment = Fragment::parse(self.web_template().trim());
        let optional = [
            (&self.header, ".kg-signup-card-heading"),
            (&self.subheader, ".kg-signup-card-subheading"),
            (&self.disclaimer, ".kg-signup-card-disclaimer"),
        ];
        for (text, selector) in optional {
            if text.is_empty()
                && let Some(element) = fragment.root().query_selector(selector)
            {
                element.remove();
            }
        }
        let html = fragment
            .root()
            .element_children()
            .first()
            .map(DomNode::outer_html)
            .unwrap_or_default();
        RenderOutput::element(html)
    }
}

/// `#rrggbb` for a CSS `rgb()` color; `transparent` and hex colors pass through.
fn rgb_to_hex(color: &str) -> Option<String> {
    if color == "transparent" || color.starts_with('#') {
        return Some(color.to_owned());
    }
    let channels: Vec<u8> = DIGITS
        .find_iter(color)
        .take(3)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();
    match channels.as_slice() {
        [r, g, b] => Some(format!("#{r:02x}{g:02x}{b:02x}")),
        _ => None,
    }
}

fn layout_of(div: &DomNode) -> &'static str {
    if div.has_class("kg-layout-split") {
        "split"
    } else if div.has_class("kg-layout-full") {
        "full"
    } else if div.has_class("kg-layout-wide") {
        "wide"
    } else {
        "regular"
    }
}

fn import_signup_card(div: &DomNode) -> Option<ImportOutput> {
    let text = |selector: &str| {
        div.query_selector(selector)
            .map(|node| node.text_content())
            .unwrap_or_default()
    };
    let button = div.query_selector(".kg-signup-card-button");
    let button_style = |property: &str| {
        button
            .as_ref()
            .and_then(|b| b.style(property))
            .unwrap_or_default()
    };
    let success = div.query_selector(".kg-signup-card-success");
    let color_or = |color: &str, fallback: &str| rgb_to_hex(color).unwrap_or_else(|| fallback.to_owned());

    let background_color = if div.has_class("kg-style-accent") {
        "accent".to_owned()
    } else {
        color_or(&div.style("background-color").unwrap_or_default(), "#ffffff")
    };
    let button_color = if button.as_ref().is_some_and(|b| b.has_class("kg-style-accent")) {
        "accent".to_owned()
    } else {
        color_or(&button_style("background-color"), "#ffffff")
    };
    let button_text = Some(text(".kg-signup-card-button-default").trim().to_owned())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Subscribe".to_owned());
    let text_color = success
        .as_ref()
        .and_then(|s| s.style("color"))
        .unwrap_or_default();
    let alignment = if div
        .query_selector(".kg-signup-card-text")
        .is_some_and(|t| t.has_class("kg-align-center"))
    {
        "center"
    } else {
        "left"
    };
    let labels: Vec<String> = div
        .query_selector_all("input[data-members-label]")
        .iter()
        .map(|input| input.attr("value").unwrap_or_default())
        .collect();
    let background_size = if div.has_class("kg-content-wide") {
        "contain"
    } else {
        "cover"
    };

    let data = json!({
        "layout": layout_of(div),
        "buttonText": button_text,
        "header": text("h2"),
        "subheader": text("h3"),
        "disclaimer": text("p"),
        "backgroundImageSrc": div.query_selector(".kg-signup-card-image").and_then(|img| img.attr("src")),
        "backgroundSize": background_size,
        "backgroundColor": background_color,
        "buttonColor": button_color,
        "textColor": color_or(&text_color, "#ffffff"),
        "buttonTextColor": color_or(&button_style("color"), "#000000"),
        "alignment": alignment,
        "successMessage": success.map(|s| s.text_content().trim().to_owned()).unwrap_or_default(),
        "labels": labels,
        "swapped": div.has_class("kg-swapped"),
    });
    Some(ImportOutput::card(SignupNode::from_dataset(&payload(data))))
}
