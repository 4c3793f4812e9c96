//! Image gallery card.

use std::collections::BTreeMap;

use kg_html::{DomNode, Element};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::image::{
    Dimensions, is_local_content_image, is_unsplash_image, retina_src, set_query_param, srcset,
};
use crate::import::{ImportOutput, ImportRule};
use crate::node::{NodeVariant, card_node};
use crate::nodes::{empty_output, read_caption, read_image_attributes};
use crate::render::{RenderOptions, RenderOutput};
use crate::schema::UrlKind;

const MAX_IMAGES_PER_ROW: usize = 3;
const EMAIL_IMAGE_WIDTH: u64 = 600;

/// One image in a gallery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GalleryImage {
    pub row: usize,
    pub src: String,
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u64>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub alt: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub caption: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub href: String,
}

impl GalleryImage {
    fn from_element(img: &DomNode, index: usize) -> Self {
        let attrs = read_image_attributes(img);
        let file_name = attrs.src.rsplit('/').next().unwrap_or_default().to_owned();
        Self {
            row: index / MAX_IMAGES_PER_ROW,
            src: attrs.src,
            file_name,
            width: attrs.width,
            height: attrs.height,
            alt: attrs.alt,
            title: attrs.title,
            caption: String::new(),
            href: attrs.href,
        }
    }

    fn dimensions(&self) -> Option<Dimensions> {
        Dimensions::from_options(self.width, self.height)
    }

    fn is_valid(&self) -> bool {
        !self.file_name.is_empty() && !self.src.is_empty() && self.dimensions().is_some()
    }
}

card_node! {
    /// Rows of up to three images with a shared caption.
    pub struct GalleryNode("gallery", 1) {
        images as "images": Vec<GalleryImage> = Vec::new()
            => nested_url("src", UrlKind::Url) nested_url("caption", UrlKind::Html) strip_data_url(),
        caption as "caption": String = String::new() => url(UrlKind::Html) word_count(),
    }
}

impl GalleryNode {
    fn from_images(images: &[DomNode], caption: String) -> Self {
        Self {
            images: images
                .iter()
                .enumerate()
                .map(|(index, img)| GalleryImage::from_element(img, index))
                .collect(),
            caption,
            ..Self::default()
        }
    }
}

/// Group images into rows, pulling the second-to-last image down when the
/// last row would otherwise hold a single image.
fn build_rows<'a>(images: &[&'a GalleryImage]) -> Vec<Vec<&'a GalleryImage>> {
    let count = images.len();
    let mut rows: BTreeMap<usize, Vec<&GalleryImage>> = BTreeMap::new();
    for (index, &image) in images.iter().enumerate() {
        let mut row = image.row;
        if count > 1 && count % MAX_IMAGES_PER_ROW == 1 && index == count - 2 {
            row += 1;
        }
        rows.entry(row).or_default().push(image);
    }
    rows.into_values().collect()
}

fn render_image(image: &GalleryImage, single: bool, options: &RenderOptions) -> Element {
    let mut img = Element::new("img").attr("src", &image.src);
    let Some(dims) = image.dimensions() else {
        return img;
    };
    img.set_attr("width", dims.width.to_string());
    img.set_attr("height", dims.height.to_string());
    img.set_attr("loading", "lazy");
    img.set_attr("alt", &image.alt);
    if !image.title.is_empty() {
        img.set_attr("title", &image.title);
    }

    let max_width = options
        .image_optimization
        .as_ref()
        .and_then(|o| o.default_max_width)
        .map(u64::from);
    if let Some(max_width) = max_width
        && dims.width > max_width
        && is_local_content_image(&image.src, &options.site_url)
        && options.transforms_image(&image.src)
    {
        let resized = dims.resize_to_width(max_width);
        img.set_attr("width", resized.width.to_string());
        img.set_attr("height", resized.height.to_string());
    }

    if !options.is_email() {
        if let Some(srcset) = srcset(&image.src, Some(dims.width), options) {
            img.set_attr("srcset", srcset);
            if dims.width >= 720 {
                let sizes = if single && dims.width >= 1200 {
                    "(min-width: 1200px) 1200px"
                } else {
                    "(min-width: 720px) 720px"
                };
                img.set_attr("sizes", sizes);
            }
        }
        return img;
    }

    if dims.width > EMAIL_IMAGE_WIDTH {
        let resized = dims.resize_to_width(EMAIL_IMAGE_WIDTH);
        img.set_attr("width", resized.width.to_string());
        img.set_attr("height", resized.height.to_string());
    }
    if let Some(retina) = retina_src(&image.src, dims.width, options) {
        img.set_attr("src", retina);
    }
    if is_unsplash_image(&image.src)
        && let Ok(mut url) = Url::parse(&image.src)
    {
        set_query_param(&mut url, "w", "1200");
        img.set_attr("src", url.to_string());
    }
    img
}

impl NodeVariant for GalleryNode {
    fn has_edit_mode(&self) -> bool {
        false
    }

    fn import_rules() -> Vec<ImportRule> {
        vec![
            ImportRule::new("figure", Self::NODE_TYPE, 1, |figure| {
                let images = figure.query_selector_all("img");
                let caption = read_caption(figure, "figcaption");
                Some(ImportOutput::card(GalleryNode::from_images(&images, caption)))
            })
            .guard(|figure| figure.has_class("kg-gallery-card")),
            ImportRule::new("div", Self::NODE_TYPE, 1, import_graf_gallery).guard(is_graf_gallery),
            ImportRule::new("div", Self::NODE_TYPE, 1, import_sqs_gallery).guard(is_sqs_gallery),
        ]
    }

    fn render(&self, options: &RenderOptions) -> RenderOutput {
        let valid: Vec<&GalleryImage> = self.images.iter().filter(|i| i.is_valid()).collect();
        if valid.is_empty() {
            return empty_output(Self::NODE_TYPE);
        }

        let rows = build_rows(&valid);
        let single_row = rows.len() == 1;
        let mut container = Element::new("div").class("kg-gallery-container");
        for row in &rows {
            let single = single_row && row.len() == 1;
            let mut row_div = Element::new("div").class("kg-gallery-row");
            for image in row {
                let img = render_image(image, single, options);
                let image_div = Element::new("div").class("kg-gallery-image");
                row_div.push(if image.href.is_empty() {
                    image_div.child(img)
                } else {
                    image_div.child(Element::new("a").attr("href", &image.href).child(img))
                });
            }
            container.push(row_div);
        }

        let mut figure = Element::new("figure")
            .class("kg-card kg-gallery-card kg-width-wide")
            .child(container);
        if !self.caption.is_empty() {
            figure.add_class("kg-card-hascaption");
            figure.push(Element::new("figcaption").raw(&self.caption));
        }
        RenderOutput::element(figure.outer_html())
    }
}

fn is_graf_gallery(div: &DomNode) -> bool {
    div.is_tag("div")
        && div.data("paragraph-count").is_some_and(|count| !count.is_empty())
        && div.query_selector("img").is_some()
}

/// Medium galleries span consecutive sibling blocks, which are merged and
/// removed from the tree.
fn import_graf_gallery(div: &DomNode) -> Option<ImportOutput> {
    let mut caption = read_caption(div, "figcaption");
    let mut images = div.query_selector_all("img");

    let mut next = div.next_element_sibling();
    while let Some(sibling) = next.filter(is_graf_gallery) {
        images.extend(sibling.query_selector_all("img"));
        let sibling_caption = read_caption(&sibling, "figcaption");
        if !sibling_caption.is_empty() {
            caption = format!("{caption} / {sibling_caption}");
        }
        next = sibling.next_element_sibling();
        sibling.remove();
    }

    Some(ImportOutput::card(GalleryNode::from_images(&images, caption)))
}

fn is_sqs_gallery(div: &DomNode) -> bool {
    let class_name = div.class_name();
    div.is_tag("div")
        && class_name.contains("sqs-gallery-container")
        && !class_name.contains("summary-")
}

/// Squarespace lazy-loads thumbnails; the real source sits in `data-src`
/// next to a `<noscript>` fallback copy.
fn import_sqs_gallery(div: &DomNode) -> Option<ImportOutput> {
    let images: Vec<DomNode> = div
        .query_selector_all("img.thumb-image")
        .into_iter()
        .filter(|img| {
            if img.attr("src").is_some_and(|src| !src.is_empty()) {
                return true;
            }
            match img.previous_element_sibling() {
                Some(noscript) if noscript.is_tag("noscript") && noscript.query_selector("img").is_some() => {
                    img.set_attr("src", &img.attr("data-src").unwrap_or_default());
                    noscript.remove();
                    true
                }
                _ => false,
            }
        })
        .collect();
    let caption = read_caption(div, ".meta-title");
    Some(ImportOutput::card(GalleryNode::from_images(&images, caption)))
}
