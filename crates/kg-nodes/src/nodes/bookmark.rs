//! Bookmark (link preview) card.
//!
//! The persisted shape nests everything except `url` and `caption` under
//! `metadata`; the node itself keeps the fields flat.

use std::sync::LazyLock;

use kg_html::{DomNode, Element, escape_html_quotes, truncate_html};
use regex::Regex;
use serde_json::{Map, Value};

use crate::import::{ImportOutput, ImportRule};
use crate::node::{NodeData, NodeVariant, card_node};
use crate::nodes::{empty_output, template_element};
use crate::render::{RenderOptions, RenderOutput};
use crate::schema::UrlKind;

static BACKGROUND_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"url\(([^)]*?)\)").expect("invalid background url regex"));

const METADATA_FIELDS: [&str; 6] = ["icon", "title", "description", "author", "publisher", "thumbnail"];

card_node! {
    /// A rich link preview.
    pub struct BookmarkNode("bookmark", 1) {
        title as "title": String = String::new() => word_count(),
        description as "description": String = String::new() => word_count(),
        url as "url": String = String::new() => url(UrlKind::Url) word_count(),
        caption as "caption": String = String::new() => word_count(),
        author as "author": String = String::new(),
        publisher as "publisher": String = String::new(),
        icon as "icon": String = String::new() => url(UrlKind::Url) url_path("metadata.icon") strip_data_url(),
        thumbnail as "thumbnail": String = String::new() => url(UrlKind::Url) url_path("metadata.thumbnail") strip_data_url(),
    }
}

impl BookmarkNode {
    fn web_element(&self) -> Element {
        let mut figure = Element::new("figure").class("kg-card kg-bookmark-card");
        if !self.caption.is_empty() {
            figure.add_class("kg-card-hascaption");
        }

        let mut metadata = Element::new("div").class("kg-bookmark-metadata");
        if !self.icon.is_empty() {
            metadata.push(
                Element::new("img")
                    .attr("class", "kg-bookmark-icon")
                    .attr("src", &self.icon)
                    .attr("alt", ""),
            );
        }
        // Author and publisher classes are swapped for theme compatibility.
        if !self.publisher.is_empty() {
            metadata.push(Element::new("span").class("kg-bookmark-author").text(&self.publisher));
        }
        if !self.author.is_empty() {
            metadata.push(Element::new("span").class("kg-bookmark-publisher").text(&self.author));
        }

        let mut container = Element::new("a")
            .attr("class", "kg-bookmark-container")
            .attr("href", &self.url)
            .child(
                Element::new("div")
                    .class("kg-bookmark-content")
                    .child(Element::new("div").class("kg-bookmark-title").text(&self.title))
                    .child(Element::new("div").class("kg-bookmark-description").text(&self.description))
                    .child(metadata),
            );
        if !self.thumbnail.is_empty() {
            container.push(
                Element::new("div").class("kg-bookmark-thumbnail").child(
                    Element::new("img")
                        .attr("src", &self.thumbnail)
                        .attr("alt", "")
                        .attr("onerror", "this.style.display = 'none'"),
                ),
            );
        }
        figure.push(container);
        if !self.caption.is_empty() {
            figure.push(Element::new("figcaption").raw(&self.caption));
        }
        figure
    }

    fn email_template(&self) -> String {
        let title = escape_html_quotes(&self.title);
        let publisher = escape_html_quotes(&self.publisher);
        let author = escape_html_quotes(&self.author);
        let description = truncate_html(&self.description, 120, 90);
        let url = &self.url;
        let icon = &self.icon;
        let thumbnail = &self.thumbnail;
        let caption = &self.caption;

        let has_caption = if caption.is_empty() { "" } else { "kg-card-hascaption" };
        let icon_img = if icon.is_empty() {
            String::new()
        } else {
            format!(r#"<img class="kg-bookmark-icon" src="{icon}" alt="">"#)
        };
        let publisher_span = if publisher.is_empty() {
            String::new()
        } else {
            format!(r#"<span class="kg-bookmark-author" src="{publisher}">{publisher}</span>"#)
        };
        let author_span = if author.is_empty() {
            String::new()
        } else {
            format!(r#"<span class="kg-bookmark-publisher" src="{author}">{author}</span>"#)
        };
        let thumbnail_div = if thumbnail.is_empty() {
            String::new()
        } else {
            format!(
                r#"<div class="kg-bookmark-thumbnail" style="background-image: url('{thumbnail}')">
                        <img src="{thumbnail}" alt="" onerror="this.style.display='none'"></div>"#
            )
        };
        let figcaption = if caption.is_empty() {
            String::new()
        } else {
            format!("<figcaption>{caption}</figcaption>")
        };
        let outlook_icon = if icon.is_empty() {
            String::new()
        } else {
            format!(
                r#"
                                                <td valign="middle" class="kg-bookmark-icon--outlook" style="padding-right: 8px; font-size: 0; line-height: 1.5em;">
                                                    <a href="{url}" style="text-decoration: none; color: #15212A;">
                                                        <img src="{icon}" width="22" height="22" alt=" ">
                                                    </a>
                                                </td>
                                            "#
            )
        };
        let byline_separator = if author.is_empty() { "" } else { "&nbsp;&#x2022;&nbsp;" };

        format!(
            r#"<div>
        <!--[if !mso !vml]-->
            <figure class="kg-card kg-bookmark-card {has_caption}">
                <a class="kg-bookmark-container" href="{url}">
                    <div class="kg-bookmark-content">
                        <div class="kg-bookmark-title">{title}</div>
                        <div class="kg-bookmark-description">{description}</div>
                        <div class="kg-bookmark-metadata">
                            {icon_img}
                            {publisher_span}
                            {author_span}
                        </div>
                    </div>
                    {thumbnail_div}
                </a>
                {figcaption}
            </figure>
        <!--[endif]-->
        <!--[if vml]>
            <table class="kg-card kg-bookmark-card--outlook" style="margin: 0; padding: 0; width: 100%; border: 1px solid #e5eff5; background: #ffffff; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, Cantarell, 'Open Sans', 'Helvetica Neue', sans-serif; border-collapse: collapse; border-spacing: 0;" width="100%">
                <tr>
                    <td width="100%" style="padding: 20px;">
                        <table style="margin: 0; padding: 0; border-collapse: collapse; border-spacing: 0;">
                            <tr>
                                <td class="kg-bookmark-title--outlook">
                                    <a href="{url}" style="text-decoration: none; color: #15212A; font-size: 15px; line-height: 1.5em; font-weight: 600;">
                                        {title}
                                    </a>
                                </td>
                            </tr>
                            <tr>
                                <td>
                                    <div class="kg-bookmark-description--outlook">
                                        <a href="{url}" style="text-decoration: none; margin-top: 12px; color: #738a94; font-size: 13px; line-height: 1.5em; font-weight: 400;">
                                            {description}
                                        </a>
                                    </div>
                                </td>
                            </tr>
                            <tr>
                                <td class="kg-bookmark-metadata--outlook" style="padding-top: 14px; color: #15212A; font-size: 13px; font-weight: 400; line-height: 1.5em;">
                                    <table style="margin: 0; padding: 0; border-collapse: collapse; border-spacing: 0;">
                                        <tr>
                                            {outlook_icon}
                                            <td valign="middle" class="kg-bookmark-byline--outlook">
                                                <a href="{url}" style="text-decoration: none; color: #15212A;">
                                                    {publisher}
                                                    {byline_separator}
                                                    {author}
                                                </a>
                                            </td>
                                        </tr>
                                    </table>
                                </td>
                            </tr>
                        </table>
                    </td>
                </tr>
            </table>
            <div class="kg-bookmark-spacer--outlook" style="height: 1.5em;">&nbsp;</div>
        <![endif]--></div>"#
        )
    }
}

impl NodeVariant for BookmarkNode {
    fn from_dataset(data: &Map<String, Value>) -> Self {
        let mut flat = data
            .get("metadata")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        for name in ["url", "caption"] {
            match data.get(name) {
                Some(value) => flat.insert(name.to_owned(), value.clone()),
                None => flat.remove(name),
            };
        }
        Self::from_properties(&flat)
    }

    fn dataset(&self) -> Map<String, Value> {
        let properties = self.properties();
        let metadata: Map<String, Value> = METADATA_FIELDS
            .iter()
            .filter_map(|name| Some(((*name).to_owned(), properties.get(*name)?.clone())))
            .collect();
        let mut dataset = Map::new();
        dataset.insert("url".to_owned(), Value::from(self.url.as_str()));
        dataset.insert("metadata".to_owned(), Value::Object(metadata));
        dataset.insert("caption".to_owned(), Value::from(self.caption.as_str()));
        dataset
    }

    fn is_empty(&self) -> bool {
        self.url.is_empty()
    }

    fn import_rules() -> Vec<ImportRule> {
        vec![
            ImportRule::new("figure", Self::NODE_TYPE, 1, import_bookmark_card)
                .guard(|figure| figure.has_class("kg-bookmark-card")),
            ImportRule::new("div", Self::NODE_TYPE, 1, import_mixtape_embed)
                .guard(|div| div.class_name().contains("graf--mixtapeEmbed")),
        ]
    }

    fn render(&self, options: &RenderOptions) -> RenderOutput {
        if self.url.trim().is_empty() {
            return empty_output(Self::NODE_TYPE);
        }
        if options.is_email() {
            RenderOutput::element(template_element(&self.email_template()))
        } else {
            RenderOutput::element(self.web_element().outer_html())
        }
    }
}

fn import_bookmark_card(figure: &DomNode) -> Option<ImportOutput> {
    let text = |selector: &str| {
        figure
            .query_selector(selector)
            .map(|node| node.text_content())
            .unwrap_or_default()
    };
    let attr = |selector: &str, name: &str| {
        figure
            .query_selector(selector)
            .and_then(|node| node.attr(name))
            .unwrap_or_default()
    };
    Some(ImportOutput::card(BookmarkNode {
        url: attr(".kg-bookmark-container", "href"),
        icon: attr(".kg-bookmark-icon", "src"),
        title: text(".kg-bookmark-title"),
        description: text(".kg-bookmark-description"),
        // Swapped classes, see the web renderer.
        author: text(".kg-bookmark-publisher"),
        publisher: text(".kg-bookmark-author"),
        thumbnail: attr(".kg-bookmark-thumbnail img", "src"),
        caption: text("figcaption"),
        ..BookmarkNode::default()
    }))
}

/// Medium's mixtape embed: title, description and publisher share one anchor.
fn import_mixtape_embed(div: &DomNode) -> Option<ImportOutput> {
    let anchor = div.query_selector(".markup--mixtapeEmbed-anchor")?;
    if let Some(br) = div.query_selector("br") {
        br.remove();
    }

    let take = |selector: &str| {
        let Some(element) = anchor.query_selector(selector) else {
            return String::new();
        };
        let html = element.inner_html();
        if html.is_empty() {
            return String::new();
        }
        element.remove();
        html.trim().to_owned()
    };
    let title = take(".markup--mixtapeEmbed-strong");
    let description = take(".markup--mixtapeEmbed-em");

    let thumbnail = div
        .query_selector(".mixtapeImage")
        .and_then(|img| img.style("background-image"))
        .and_then(|background| {
            BACKGROUND_URL
                .captures(&background)
                .map(|caps| caps[1].to_owned())
        })
        .unwrap_or_default();

    Some(ImportOutput::card(BookmarkNode {
        url: anchor.attr("href").unwrap_or_default(),
        title,
        description,
        publisher: anchor.inner_html().trim().to_owned(),
        thumbnail,
        ..BookmarkNode::default()
    }))
}
