//! File download card.

use kg_html::{DomNode, Element, escape_html};
use serde_json::{Map, Value};

use crate::import::{ImportOutput, ImportRule};
use crate::media::{bytes_to_size, size_to_bytes};
use crate::node::{NodeData, NodeVariant, card_node};
use crate::nodes::{empty_output, template_element, text_of};
use crate::render::{RenderOptions, RenderOutput};
use crate::schema::UrlKind;

const DOWNLOAD_ICON: &str = "https://static.ghost.org/v4.0.0/images/download-icon-darkmode.png";
const ICON_STYLE: &str =
    ".a{fill:none;stroke:currentColor;stroke-linecap:round;stroke-linejoin:round;stroke-width:1.5px;}";

card_node! {
    /// A downloadable attachment.
    ///
    /// `fileSize` holds a byte count, or an empty string when unknown.
    pub struct FileNode("file", 1) {
        src as "src": String = String::new() => url(UrlKind::Url) strip_data_url(),
        file_title as "fileTitle": String = String::new() => word_count(),
        file_caption as "fileCaption": String = String::new() => word_count(),
        file_name as "fileName": String = String::new(),
        file_size as "fileSize": Value = Value::from(""),
    }
}

impl FileNode {
    /// Size in bytes, zero when unknown.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn file_size_bytes(&self) -> u64 {
        match &self.file_size {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().map(|f| f.max(0.0).round() as u64))
                .unwrap_or_default(),
            Value::String(s) => s.trim().parse().unwrap_or_default(),
            _ => 0,
        }
    }

    /// Human readable size such as `2 MB`.
    pub fn formatted_file_size(&self) -> String {
        bytes_to_size(self.file_size_bytes())
    }

    fn web_element(&self) -> Element {
        let div = |class: &str, text: &str| Element::new("div").class(class).text(text);
        let contents = Element::new("div")
            .class("kg-file-card-contents")
            .child(div("kg-file-card-title", &self.file_title))
            .child(div("kg-file-card-caption", &self.file_caption))
            .child(
                Element::new("div")
                    .class("kg-file-card-metadata")
                    .child(div("kg-file-card-filename", &self.file_name))
                    .child(div("kg-file-card-filesize", &self.formatted_file_size())),
            );
        let svg = Element::new("svg")
            .attr("viewBox", "0 0 24 24")
            .child(Element::new("defs").child(Element::new("style").text(ICON_STYLE)))
            .child(Element::new("title").text("download-circle"))
            .child(
                Element::new("polyline")
                    .attr("class", "a")
                    .attr("points", "8.25 14.25 12 18 15.75 14.25"),
            )
            .child(
                Element::new("line")
                    .attr("class", "a")
                    .attr("x1", "12")
                    .attr("y1", "6.75")
                    .attr("x2", "12")
                    .attr("y2", "18"),
            )
            .child(
                Element::new("circle")
                    .attr("class", "a")
                    .attr("cx", "12")
                    .attr("cy", "12")
                    .attr("r", "11.25"),
            );
        let container = Element::new("a")
            .attr("class", "kg-file-card-container")
            .attr("href", &self.src)
            .attr("title", "Download")
            .attr("download", "")
            .child(contents)
            .child(Element::new("div").class("kg-file-card-icon").child(svg));
        Element::new("div").class("kg-card kg-file-card").child(container)
    }

    fn email_template(&self, options: &RenderOptions) -> String {
        let post_url = escape_html(&options.post_url);
        let icon_style = if self.file_title.is_empty() && self.file_caption.is_empty() {
            "margin-top: 6px; height: 20px; width: 20px; max-width: 20px; padding-top: 4px; padding-bottom: 4px;"
        } else {
            "margin-top: 6px; height: 24px; width: 24px; max-width: 24px;"
        };
        let row = |class: &str, text: &str| {
            if text.is_empty() {
                return String::new();
            }
            format!(
                r#"
                                <table cellspacing="0" cellpadding="0" border="0" width="100%"><tr><td>
                                    <a href="{post_url}" class="{class}">{}</a>
                                </td></tr></table>
                                "#,
                escape_html(text)
            )
        };
        format!(
            r#"
        <table cellspacing="0" cellpadding="4" border="0" class="kg-file-card" width="100%">
            <tr>
                <td>
                    <table cellspacing="0" cellpadding="0" border="0" width="100%">
                        <tr>
                            <td valign="middle" style="vertical-align: middle;">
                                {title}
                                {caption}
                                <table cellspacing="0" cellpadding="0" border="0" width="100%"><tr><td>
                                    <a href="{post_url}" class="kg-file-meta"><span class="kg-file-name">{name}</span> &bull; {size}</a>
                                </td></tr></table>
                            </td>
                            <td width="80" valign="middle" class="kg-file-thumbnail">
                                <a href="{post_url}" style="display: block; top: 0; right: 0; bottom: 0; left: 0;">
                                    <img src="{DOWNLOAD_ICON}" style="{icon_style}">
                                </a>
                            </td>
                        </tr>
                    </table>
                </td>
            </tr>
        </table>
    "#,
            title = row("kg-file-title", &self.file_title),
            caption = row("kg-file-description", &self.file_caption),
            name = escape_html(&self.file_name),
            size = self.formatted_file_size(),
        )
    }
}

impl NodeVariant for FileNode {
    /// File records carry no version.
    fn export_record(&self) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert("type".to_owned(), Value::from(Self::NODE_TYPE));
        record.extend(self.dataset());
        crate::node::strip_data_urls(Self::schema(), &mut record);
        record
    }

    fn import_rules() -> Vec<ImportRule> {
        vec![
            ImportRule::new("div", Self::NODE_TYPE, 1, import_file_card)
                .guard(|div| div.has_class("kg-file-card")),
        ]
    }

    fn render(&self, options: &RenderOptions) -> RenderOutput {
        if self.src.trim().is_empty() {
            return empty_output(Self::NODE_TYPE);
        }
        if options.is_email() {
            RenderOutput::element(template_element(&self.email_template(options)))
        } else {
            RenderOutput::element(self.web_element().outer_html())
        }
    }
}

fn import_file_card(div: &DomNode) -> Option<ImportOutput> {
    let src = div
        .query_selector("a")
        .and_then(|a| a.attr("href"))
        .unwrap_or_default();
    let text = |selector: &str| {
        div.query_selector(selector)
            .map(|node| node.text_content())
            .unwrap_or_default()
    };
    let file_size = size_to_bytes(&text_of(div, ".kg-file-card-filesize"));
    Some(ImportOutput::card(FileNode {
        src,
        file_title: text(".kg-file-card-title"),
        file_caption: text(".kg-file-card-caption"),
        file_name: text(".kg-file-card-filename"),
        file_size: if file_size == 0 { Value::from("") } else { Value::from(file_size) },
        ..FileNode::default()
    }))
}
