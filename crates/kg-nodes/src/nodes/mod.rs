//! Built-in card variants.
//!
//! Each module declares one variant with [`card_node!`](crate::node::card_node),
//! its HTML import rules and its web/email renderers.

use std::sync::LazyLock;

use kg_html::{CleanOptions, DomNode, Fragment, clean_basic_html};
use regex::Regex;
use serde_json::{Map, Value};

use crate::render::RenderOutput;

pub mod audio;
pub mod bookmark;
pub mod button;
pub mod call_to_action;
pub mod callout;
pub mod codeblock;
pub mod collection;
pub mod email;
pub mod email_cta;
pub mod embed;
pub mod file;
pub mod gallery;
pub mod header;
pub mod horizontal_rule;
pub mod html;
pub mod image;
pub mod markdown;
pub mod paywall;
pub mod product;
pub mod signup;
pub mod toggle;
mod tweet;
pub mod video;

pub use audio::AudioNode;
pub use bookmark::BookmarkNode;
pub use button::ButtonNode;
pub use call_to_action::CallToActionNode;
pub use callout::CalloutNode;
pub use codeblock::CodeBlockNode;
pub use collection::CollectionNode;
pub use email::EmailNode;
pub use email_cta::EmailCtaNode;
pub use embed::EmbedNode;
pub use file::FileNode;
pub use gallery::{GalleryImage, GalleryNode};
pub use header::HeaderNode;
pub use horizontal_rule::HorizontalRuleNode;
pub use html::HtmlNode;
pub use image::ImageNode;
pub use markdown::MarkdownNode;
pub use paywall::PaywallNode;
pub use product::ProductNode;
pub use signup::SignupNode;
pub use toggle::ToggleNode;
pub use video::VideoNode;

static IMAGE_DIMENSIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d*)x(\d*)$").expect("invalid image dimensions regex"));

/// The empty container, logged so silent drops can be traced.
pub(crate) fn empty_output(node_type: &'static str) -> RenderOutput {
    tracing::debug!(node_type, "Rendering empty container");
    RenderOutput::empty()
}

/// The object inside an import payload built with `json!`.
pub(crate) fn payload(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Serialize the first element of a string template.
///
/// Templates are parsed and re-serialized so their output is normalized the
/// same way as markup built with [`kg_html::Element`].
pub(crate) fn template_element(html: &str) -> String {
    let fragment = Fragment::parse(html.trim());
    fragment
        .root()
        .element_children()
        .first()
        .map(DomNode::outer_html)
        .unwrap_or_default()
}

/// Cleaned markup of every element matching `selector`, joined with ` / `.
pub(crate) fn read_caption(element: &DomNode, selector: &str) -> String {
    element
        .query_selector_all(selector)
        .iter()
        .filter_map(|caption| clean_basic_html(&caption.inner_html(), CleanOptions::default()))
        .collect::<Vec<_>>()
        .join(" / ")
}

/// Attributes of an imported `<img>`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ImageAttributes {
    pub src: String,
    pub width: Option<u64>,
    pub height: Option<u64>,
    pub alt: String,
    pub title: String,
    pub href: String,
}

pub(crate) fn read_image_attributes(img: &DomNode) -> ImageAttributes {
    let number = |name: &str| {
        img.attr(name)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|v| *v > 0)
    };
    let mut attrs = ImageAttributes {
        src: img.attr("src").unwrap_or_default(),
        width: number("width").or_else(|| number("data-width")),
        height: number("height").or_else(|| number("data-height")),
        alt: img.attr("alt").unwrap_or_default(),
        title: img.attr("title").unwrap_or_default(),
        href: String::new(),
    };
    if number("width").is_none()
        && number("height").is_none()
        && let Some(dimensions) = img.attr("data-image-dimensions")
        && let Some(caps) = IMAGE_DIMENSIONS.captures(&dimensions)
    {
        attrs.width = caps[1].parse().ok();
        attrs.height = caps[2].parse().ok();
    }
    if let Some(parent) = img.parent_element()
        && parent.is_tag("a")
    {
        let href = parent.attr("href").unwrap_or_default();
        if href != attrs.src {
            attrs.href = href;
        }
    }
    attrs
}

/// Trimmed text of the first element matching `selector`.
pub(crate) fn text_of(element: &DomNode, selector: &str) -> String {
    element
        .query_selector(selector)
        .map(|node| node.text_content().trim().to_owned())
        .unwrap_or_default()
}

/// Inner markup of the first element matching `selector`.
pub(crate) fn inner_html_of(element: &DomNode, selector: &str) -> String {
    element
        .query_selector(selector)
        .map(|node| node.inner_html().trim().to_owned())
        .unwrap_or_default()
}

/// Attribute of the first element matching `selector`.
pub(crate) fn attr_of(element: &DomNode, selector: &str, name: &str) -> String {
    element
        .query_selector(selector)
        .and_then(|node| node.attr(name))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_template_element_normalizes_markup() {
        let html = template_element("\n  <div class=x data-a='{\"b\": 1}'>\n <source src=a></source></div>\n  <p>ignored</p>");
        assert_eq!(
            html,
            "<div class=\"x\" data-a=\"{&quot;b&quot;: 1}\">\n <source src=\"a\"></div>"
        );
    }

    #[test]
    fn test_read_image_attributes() {
        let fragment = Fragment::parse(
            r#"<a href="https://link.test/"><img src="/a.jpg" data-width="800" height="600" alt="A" title="T"></a>"#,
        );
        let img = fragment.root().query_selector("img").unwrap();
        assert_eq!(
            read_image_attributes(&img),
            ImageAttributes {
                src: "/a.jpg".to_owned(),
                width: Some(800),
                height: Some(600),
                alt: "A".to_owned(),
                title: "T".to_owned(),
                href: "https://link.test/".to_owned(),
            }
        );
    }

    #[test]
    fn test_read_image_dimensions_attribute() {
        let fragment = Fragment::parse(r#"<img src="/a.jpg" data-image-dimensions="1200x800">"#);
        let img = fragment.root().query_selector("img").unwrap();
        let attrs = read_image_attributes(&img);
        assert_eq!((attrs.width, attrs.height), (Some(1200), Some(800)));
    }

    #[test]
    fn test_read_caption_joins_figcaptions() {
        let fragment =
            Fragment::parse("<figure><figcaption>One</figcaption><figcaption> <b>Two</b> </figcaption></figure>");
        let figure = fragment.root().query_selector("figure").unwrap();
        assert_eq!(read_caption(&figure, "figcaption"), "One / <b>Two</b>");
    }
}
