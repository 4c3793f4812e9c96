//! Image card.

use std::sync::LazyLock;

use kg_html::{DomNode, Element};
use regex::Regex;

use crate::image::{Dimensions, is_local_content_image, retina_src, sizes_attribute, srcset};
use crate::import::{ImportOutput, ImportRule};
use crate::node::{NodeVariant, card_node};
use crate::nodes::{empty_output, read_caption, read_image_attributes};
use crate::render::{RenderOptions, RenderOutput};
use crate::schema::UrlKind;

static KG_WIDTH_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"kg-width-(wide|full)").expect("invalid width class regex"));
static GRAF_LAYOUT_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"graf--layout(FillWidth|OutsetCenter)").expect("invalid graf layout regex")
});

/// Email images are laid out at this width.
const EMAIL_IMAGE_WIDTH: u64 = 600;

card_node! {
    /// A single image, optionally linked and captioned.
    pub struct ImageNode("image", 1) {
        src as "src": String = String::new() => url(UrlKind::Url) strip_data_url(),
        caption as "caption": String = String::new() => url(UrlKind::Html) word_count(),
        title as "title": String = String::new(),
        alt as "alt": String = String::new(),
        card_width as "cardWidth": String = "regular".to_owned(),
        width as "width": Option<u64> = None,
        height as "height": Option<u64> = None,
        href as "href": String = String::new() => url(UrlKind::Url),
        float_direction as "floatDirection": String = "none".to_owned(),
    }
}

impl NodeVariant for ImageNode {
    fn has_edit_mode(&self) -> bool {
        false
    }

    fn import_rules() -> Vec<ImportRule> {
        vec![
            ImportRule::new("img", Self::NODE_TYPE, 1, import_img),
            // Generic figures run after every other figure rule.
            ImportRule::new("figure", Self::NODE_TYPE, 0, import_figure)
                .guard(|figure| figure.query_selector("img").is_some()),
        ]
    }

    fn render(&self, options: &RenderOptions) -> RenderOutput {
        if self.src.trim().is_empty() {
            return empty_output(Self::NODE_TYPE);
        }
        let mut figure = Element::new("figure").class("kg-card kg-image-card");
        if self.card_width != "regular" {
            figure.add_class(&format!("kg-width-{}", self.card_width));
        }
        if matches!(self.float_direction.as_str(), "left" | "right") {
            figure.add_class(&format!("kg-float-image kg-float-{}", self.float_direction));
        }
        if !self.caption.is_empty() {
            figure.add_class("kg-card-hascaption");
        }

        let img = self.render_img(options);
        figure = if self.href.is_empty() {
            figure.child(img)
        } else {
            figure.child(Element::new("a").attr("href", &self.href).child(img))
        };
        if !self.caption.is_empty() {
            figure = figure.child(Element::new("figcaption").raw(&self.caption));
        }
        RenderOutput::element(figure.outer_html())
    }
}

impl ImageNode {
    fn dimensions(&self) -> Option<Dimensions> {
        Dimensions::from_options(self.width, self.height)
    }

    fn render_img(&self, options: &RenderOptions) -> Element {
        let mut img = Element::new("img")
            .attr("src", &self.src)
            .attr("class", "kg-image")
            .attr("alt", &self.alt)
            .attr("loading", "lazy");
        if !self.title.is_empty() {
            img.set_attr("title", &self.title);
        }
        let dimensions = self.dimensions();
        if let Some(dims) = dimensions {
            img.set_attr("width", dims.width.to_string());
            img.set_attr("height", dims.height.to_string());
        }

        // Report the resized dimensions so third-party lightboxes see the
        // size actually served.
        let max_width = options
            .image_optimization
            .as_ref()
            .and_then(|o| o.default_max_width)
            .map(u64::from);
        if let (Some(max_width), Some(dims)) = (max_width, dimensions)
            && dims.width > max_width
            && is_local_content_image(&self.src, &options.site_url)
            && options.transforms_image(&self.src)
        {
            let resized = dims.resize_to_width(max_width);
            img.set_attr("width", resized.width.to_string());
            img.set_attr("height", resized.height.to_string());
        }

        if !options.is_email() {
            if let Some(srcset) = srcset(&self.src, self.width, options) {
                img.set_attr("srcset", srcset);
                if let Some(sizes) = self.width.and_then(|w| sizes_attribute(w, &self.card_width)) {
                    img.set_attr("sizes", sizes);
                }
            }
            return img;
        }

        if let Some(dims) = dimensions {
            let sized = if dims.width >= EMAIL_IMAGE_WIDTH {
                dims.resize_to_width(EMAIL_IMAGE_WIDTH)
            } else {
                dims
            };
            img.set_attr("width", sized.width.to_string());
            img.set_attr("height", sized.height.to_string());
            if let Some(retina) = retina_src(&self.src, dims.width, options) {
                img.set_attr("src", retina);
            }
        }
        img
    }

    fn from_attributes(img: &DomNode) -> Self {
        let attrs = read_image_attributes(img);
        Self {
            src: attrs.src,
            width: attrs.width,
            height: attrs.height,
            alt: attrs.alt,
            title: attrs.title,
            href: attrs.href,
            ..Self::default()
        }
    }
}

fn import_img(img: &DomNode) -> Option<ImportOutput> {
    Some(ImportOutput::card(ImageNode::from_attributes(img)))
}

fn import_figure(figure: &DomNode) -> Option<ImportOutput> {
    let img = figure.query_selector("img")?;
    let mut node = ImageNode::from_attributes(&img);
    let class_name = figure.class_name();
    if let Some(caps) = KG_WIDTH_CLASS.captures(&class_name) {
        caps[1].clone_into(&mut node.card_width);
    } else if let Some(caps) = GRAF_LAYOUT_CLASS.captures(&class_name) {
        node.card_width = if &caps[1] == "FillWidth" { "full" } else { "wide" }.to_owned();
    }
    node.caption = read_caption(figure, "figcaption");
    Some(ImportOutput::card(node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardNode;
    use crate::import::ImportRegistry;
    use crate::node::NodeData;
    use crate::render::{ImageOptimization, RenderTarget};
    use pretty_assertions::assert_eq;

    fn image(src: &str, width: u64, height: u64) -> ImageNode {
        ImageNode {
            src: src.to_owned(),
            width: Some(width),
            height: Some(height),
            ..ImageNode::default()
        }
    }

    fn web() -> RenderOptions {
        RenderOptions::default()
            .with_site_url("https://site.test/")
            .with_image_optimization(ImageOptimization::default())
    }

    fn import_one(html: &str) -> ImageNode {
        let nodes = ImportRegistry::with_default_nodes().import_fragment(html);
        match nodes.first().and_then(|n| n.as_card()) {
            Some(CardNode::Image(node)) => node.clone(),
            other => panic!("expected an image card, got {other:?}"),
        }
    }

    #[test]
    fn test_render_minimal() {
        let node = ImageNode {
            src: "https://cdn.test/a.jpg".to_owned(),
            ..ImageNode::default()
        };
        assert_eq!(
            node.render(&web()).content,
            r#"<figure class="kg-card kg-image-card"><img src="https://cdn.test/a.jpg" class="kg-image" alt="" loading="lazy"></figure>"#
        );
    }

    #[test]
    fn test_render_empty_src() {
        assert_eq!(ImageNode::default().render(&web()), RenderOutput::empty());
    }

    #[test]
    fn test_render_full_featured() {
        let node = ImageNode {
            caption: "A <b>cap</b>".to_owned(),
            title: "T".to_owned(),
            card_width: "wide".to_owned(),
            href: "https://link.test/".to_owned(),
            float_direction: "left".to_owned(),
            ..image("https://site.test/content/images/2024/a.jpg", 1300, 650)
        };
        assert_eq!(
            node.render(&web()).content,
            concat!(
                r#"<figure class="kg-card kg-image-card kg-width-wide kg-float-image kg-float-left kg-card-hascaption">"#,
                r#"<a href="https://link.test/"><img src="https://site.test/content/images/2024/a.jpg" class="kg-image" alt="" loading="lazy" title="T" width="1300" height="650" "#,
                r#"srcset="https://site.test/content/images/size/w600/2024/a.jpg 600w, https://site.test/content/images/size/w1000/2024/a.jpg 1000w, https://site.test/content/images/2024/a.jpg 1300w" "#,
                r#"sizes="(min-width: 1200px) 1200px"></a><figcaption>A <b>cap</b></figcaption></figure>"#
            )
        );
    }

    #[test]
    fn test_render_max_width_resize() {
        let node = image("/content/images/a.jpg", 4000, 2000);
        let options = web().with_can_transform_image(|_| true);
        let html = node.render(&options).content;
        assert!(html.contains(r#"width="2000" height="1000""#), "{html}");
    }

    #[test]
    fn test_render_email_resizes_and_uses_retina_src() {
        let node = image("/content/images/a.jpg", 2000, 1000);
        let options = web()
            .with_target(RenderTarget::Email)
            .with_can_transform_image(|_| true);
        assert_eq!(
            node.render(&options).content,
            r#"<figure class="kg-card kg-image-card"><img src="/content/images/size/w1600/a.jpg" class="kg-image" alt="" loading="lazy" width="600" height="300"></figure>"#
        );
    }

    #[test]
    fn test_import_img() {
        let node = import_one(r#"<img src="/a.jpg" width="100" height="50" alt="x">"#);
        assert_eq!(node.src, "/a.jpg");
        assert_eq!((node.width, node.height), (Some(100), Some(50)));
        assert_eq!(node.alt, "x");
    }

    #[test]
    fn test_import_figure_width_and_caption() {
        let node = import_one(
            r#"<figure class="graf--layoutOutsetCenter"><img src="/a.jpg"><figcaption>Hello <em>there</em></figcaption></figure>"#,
        );
        assert_eq!(node.card_width, "wide");
        assert_eq!(node.caption, "Hello <em>there</em>");

        let node = import_one(r#"<figure class="kg-card kg-width-full"><img src="/a.jpg"></figure>"#);
        assert_eq!(node.card_width, "full");
    }

    #[test]
    fn test_no_edit_mode_and_schema() {
        assert!(!ImageNode::default().has_edit_mode());
        assert_eq!(ImageNode::schema().node_type(), "image");
    }
}
