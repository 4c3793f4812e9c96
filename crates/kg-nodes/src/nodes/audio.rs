//! Audio card.

use kg_html::{DomNode, Element, escape_attr};

use crate::import::{ImportOutput, ImportRule};
use crate::media::{format_duration, parse_duration};
use crate::node::{NodeVariant, card_node};
use crate::nodes::{attr_of, empty_output, inner_html_of, template_element};
use crate::render::{RenderOptions, RenderOutput};
use crate::schema::UrlKind;

const EMPTY_THUMBNAIL_ICON: &str = "https://static.ghost.org/v4.0.0/images/audio-file-icon.png";

const NOTE_ICON_PATHS: [&str; 3] = [
    "M7.5 15.33a.75.75 0 1 0 0 1.5.75.75 0 0 0 0-1.5Zm-2.25.75a2.25 2.25 0 1 1 4.5 0 2.25 2.25 0 0 1-4.5 0ZM15 13.83a.75.75 0 1 0 0 1.5.75.75 0 0 0 0-1.5Zm-2.25.75a2.25 2.25 0 1 1 4.5 0 2.25 2.25 0 0 1-4.5 0Z",
    "M14.486 6.81A2.25 2.25 0 0 1 17.25 9v5.579a.75.75 0 0 1-1.5 0v-5.58a.75.75 0 0 0-.932-.727.755.755 0 0 1-.059.013l-4.465.744a.75.75 0 0 0-.544.72v6.33a.75.75 0 0 1-1.5 0v-6.33a2.25 2.25 0 0 1 1.763-2.194l4.473-.746Z",
    "M3 1.5a.75.75 0 0 0-.75.75v19.5a.75.75 0 0 0 .75.75h18a.75.75 0 0 0 .75-.75V5.133a.75.75 0 0 0-.225-.535l-.002-.002-3-2.883A.75.75 0 0 0 18 1.5H3ZM1.409.659A2.25 2.25 0 0 1 3 0h15a2.25 2.25 0 0 1 1.568.637l.003.002 3 2.883a2.25 2.25 0 0 1 .679 1.61V21.75A2.25 2.25 0 0 1 21 24H3a2.25 2.25 0 0 1-2.25-2.25V2.25c0-.597.237-1.169.659-1.591Z",
];
const PLAY_ICON_PATH: &str = "M23.14 10.608 2.253.164A1.559 1.559 0 0 0 0 1.557v20.887a1.558 1.558 0 0 0 2.253 1.392L23.14 13.393a1.557 1.557 0 0 0 0-2.785Z";
const UNMUTE_ICON_PATH: &str = "M15.189 2.021a9.728 9.728 0 0 0-7.924 4.85.249.249 0 0 1-.221.133H5.25a3 3 0 0 0-3 3v2a3 3 0 0 0 3 3h1.794a.249.249 0 0 1 .221.133 9.73 9.73 0 0 0 7.924 4.85h.06a1 1 0 0 0 1-1V3.02a1 1 0 0 0-1.06-.998Z";
const MUTE_ICON_PATH: &str = "M16.177 4.3a.248.248 0 0 0 .073-.176v-1.1a1 1 0 0 0-1.061-1 9.728 9.728 0 0 0-7.924 4.85.249.249 0 0 1-.221.133H5.25a3 3 0 0 0-3 3v2a3 3 0 0 0 3 3h.114a.251.251 0 0 0 .177-.073ZM23.707 1.706A1 1 0 0 0 22.293.292l-22 22a1 1 0 0 0 0 1.414l.009.009a1 1 0 0 0 1.405-.009l6.63-6.631A.251.251 0 0 1 8.515 17a.245.245 0 0 1 .177.075 10.081 10.081 0 0 0 6.5 2.92 1 1 0 0 0 1.061-1V9.266a.247.247 0 0 1 .073-.176Z";

card_node! {
    /// An uploaded audio file with a compact player.
    pub struct AudioNode("audio", 1) {
        duration as "duration": f64 = 0.0,
        mime_type as "mimeType": String = String::new(),
        src as "src": String = String::new() => url(UrlKind::Url) strip_data_url(),
        title as "title": String = String::new(),
        thumbnail_src as "thumbnailSrc": String = String::new() => strip_data_url(),
    }
}

fn svg(view_box: &str) -> Element {
    Element::new("svg").attr("viewBox", view_box)
}

fn path(d: &str) -> Element {
    Element::new("path").attr("d", d)
}

fn pause_bar(x: &str) -> Element {
    Element::new("rect")
        .attr("x", x)
        .attr("y", "1")
        .attr("width", "7")
        .attr("height", "22")
        .attr("rx", "1.5")
        .attr("ry", "1.5")
}

fn button(class: &str, label: &str, icon: Element) -> Element {
    Element::new("button")
        .attr("class", class)
        .attr("aria-label", label)
        .child(icon)
}

fn range(class: &str, value: &str) -> Element {
    Element::new("input")
        .attr("type", "range")
        .attr("class", class)
        .attr("max", "100")
        .attr("value", value)
}

impl AudioNode {
    fn thumbnail_class(&self) -> &'static str {
        if self.thumbnail_src.is_empty() {
            "kg-audio-thumbnail kg-audio-hide"
        } else {
            "kg-audio-thumbnail"
        }
    }

    fn empty_thumbnail_class(&self) -> &'static str {
        if self.thumbnail_src.is_empty() {
            "kg-audio-thumbnail placeholder"
        } else {
            "kg-audio-thumbnail placeholder kg-audio-hide"
        }
    }

    fn web_element(&self) -> Element {
        let mut note_icon = Element::new("svg")
            .attr("width", "24")
            .attr("height", "24")
            .attr("fill", "none");
        for d in NOTE_ICON_PATHS {
            note_icon.push(
                path(d)
                    .attr("fill-rule", "evenodd")
                    .attr("clip-rule", "evenodd"),
            );
        }

        let player = Element::new("div")
            .attr("class", "kg-audio-player")
            .child(button(
                "kg-audio-play-icon",
                "Play audio",
                svg("0 0 24 24").child(path(PLAY_ICON_PATH)),
            ))
            .child(button(
                "kg-audio-pause-icon kg-audio-hide",
                "Pause audio",
                svg("0 0 24 24").child(pause_bar("3")).child(pause_bar("14")),
            ))
            .child(
                Element::new("span")
                    .attr("class", "kg-audio-current-time")
                    .text("0:00"),
            )
            .child(
                Element::new("div").attr("class", "kg-audio-time").text("/").child(
                    Element::new("span")
                        .attr("class", "kg-audio-duration")
                        .text(self.duration.to_string()),
                ),
            )
            .child(range("kg-audio-seek-slider", "0"))
            .child(
                Element::new("button")
                    .attr("class", "kg-audio-playback-rate")
                    .attr("aria-label", "Adjust playback speed")
                    .text("1×"),
            )
            .child(button(
                "kg-audio-unmute-icon",
                "Unmute",
                svg("0 0 24 24").child(path(UNMUTE_ICON_PATH)),
            ))
            .child(button(
                "kg-audio-mute-icon kg-audio-hide",
                "Mute",
                svg("0 0 24 24").child(path(MUTE_ICON_PATH)),
            ))
            .child(range("kg-audio-volume-slider", "100"));

        Element::new("div")
            .attr("class", "kg-card kg-audio-card")
            .child(
                Element::new("img")
                    .attr("src", &self.thumbnail_src)
                    .attr("alt", "audio-thumbnail")
                    .attr("class", self.thumbnail_class()),
            )
            .child(
                Element::new("div")
                    .attr("class", self.empty_thumbnail_class())
                    .child(note_icon),
            )
            .child(
                Element::new("div")
                    .attr("class", "kg-audio-player-container")
                    .child(
                        Element::new("audio")
                            .attr("src", &self.src)
                            .attr("preload", "metadata"),
                    )
                    .child(Element::new("div").attr("class", "kg-audio-title").text(&self.title))
                    .child(player),
            )
    }

    fn email_template(&self, options: &RenderOptions) -> String {
        let post_url = escape_attr(&options.post_url);
        let thumbnail = if self.thumbnail_src.is_empty() {
            format!(
                r#"<img src="{EMPTY_THUMBNAIL_ICON}" class="{}" style="width: 24px; height: 24px; padding: 18px; border-radius: 2px;">"#,
                self.empty_thumbnail_class()
            )
        } else {
            format!(
                r#"<img src="{}" class="{}" style="width: 60px; height: 60px; object-fit: cover; border: 0; border-radius: 2px;">"#,
                escape_attr(&self.thumbnail_src),
                self.thumbnail_class()
            )
        };
        format!(
            r#"
<table cellspacing="0" cellpadding="0" border="0" class="kg-audio-card">
    <tr>
        <td>
            <table cellspacing="0" cellpadding="0" border="0" width="100%">
                <tr>
                    <td width="60">
                        <a href="{post_url}" style="display: block; width: 60px; height: 60px; padding-top: 4px; padding-right: 16px; padding-bottom: 4px; padding-left: 4px; border-radius: 2px;">
                            {thumbnail}
                        </a>
                    </td>
                    <td style="position: relative; vertical-align: center;" valign="middle">
                        <a href="{post_url}" style="position: absolute; display: block; top: 0; right: 0; bottom: 0; left: 0;"></a>
                        <table cellspacing="0" cellpadding="0" border="0" width="100%">
                            <tr>
                                <td>
                                    <a href="{post_url}" class="kg-audio-title">{title}</a>
                                </td>
                            </tr>
                            <tr>
                                <td>
                                    <table cellspacing="0" cellpadding="0" border="0" width="100%">
                                        <tr>
                                            <td width="24" style="vertical-align: middle;" valign="middle">
                                                <a href="{post_url}" class="kg-audio-play-button"></a>
                                            </td>
                                            <td style="vertical-align: middle;" valign="middle">
                                                <a href="{post_url}" class="kg-audio-duration">{duration}<span class="kg-audio-link"> • Click to play audio</span></a>
                                            </td>
                                        </tr>
                                    </table>
                                </td>
                            </tr>
                        </table>
                    </td>
                </tr>
            </table>
        </td>
    </tr>
</table>
"#,
            title = self.title,
            duration = format_duration(self.duration),
        )
    }
}

impl NodeVariant for AudioNode {
    fn import_rules() -> Vec<ImportRule> {
        vec![
            ImportRule::new("div", Self::NODE_TYPE, 1, import_audio_card)
                .guard(|div| div.has_class("kg-audio-card")),
        ]
    }

    fn render(&self, options: &RenderOptions) -> RenderOutput {
        if self.src.trim().is_empty() {
            return empty_output(Self::NODE_TYPE);
        }
        if options.is_email() {
            return RenderOutput::element(template_element(&self.email_template(options)));
        }
        RenderOutput::element(self.web_element().outer_html())
    }
}

fn import_audio_card(div: &DomNode) -> Option<ImportOutput> {
    let duration = div
        .query_selector(".kg-audio-duration")
        .and_then(|node| parse_duration(&node.inner_html()))
        .unwrap_or(0.0);
    Some(ImportOutput::card(AudioNode {
        src: attr_of(div, ".kg-audio-player-container audio", "src"),
        title: inner_html_of(div, ".kg-audio-title"),
        thumbnail_src: attr_of(div, ".kg-audio-thumbnail", "src"),
        duration,
        ..AudioNode::default()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardNode;
    use crate::import::ImportRegistry;
    use crate::node::NodeData;
    use crate::render::RenderTarget;
    use pretty_assertions::assert_eq;

    fn audio() -> AudioNode {
        AudioNode {
            src: "/content/media/a.mp3".to_owned(),
            title: "Episode".to_owned(),
            duration: 125.0,
            ..AudioNode::default()
        }
    }

    #[test]
    fn test_web_render() {
        let html = audio().render(&RenderOptions::default()).content;
        assert!(html.starts_with(
            r#"<div class="kg-card kg-audio-card"><img src="" alt="audio-thumbnail" class="kg-audio-thumbnail kg-audio-hide"><div class="kg-audio-thumbnail placeholder"><svg width="24" height="24" fill="none"><path d="M7.5"#
        ), "{html}");
        assert!(html.contains(
            r#"<div class="kg-audio-player-container"><audio src="/content/media/a.mp3" preload="metadata"></audio><div class="kg-audio-title">Episode</div>"#
        ), "{html}");
        assert!(html.contains(r#"<span class="kg-audio-duration">125</span>"#), "{html}");
        assert!(html.contains(r#"<input type="range" class="kg-audio-volume-slider" max="100" value="100"></div></div></div>"#), "{html}");
    }

    #[test]
    fn test_email_render() {
        let options = RenderOptions::new(RenderTarget::Email).with_post_url("https://site.test/p/");
        let html = audio().render(&options).content;
        assert!(html.starts_with(r#"<table cellspacing="0" cellpadding="0" border="0" class="kg-audio-card">"#), "{html}");
        assert!(html.contains(EMPTY_THUMBNAIL_ICON), "{html}");
        assert!(html.contains(
            r#"<a href="https://site.test/p/" class="kg-audio-duration">2:05<span class="kg-audio-link"> • Click to play audio</span></a>"#
        ), "{html}");
    }

    #[test]
    fn test_import_audio_card() {
        let html = audio().render(&RenderOptions::default()).content;
        let nodes = ImportRegistry::with_default_nodes().import_fragment(&html);
        let Some(CardNode::Audio(node)) = nodes[0].as_card() else {
            panic!("expected an audio card, got {nodes:?}");
        };
        assert_eq!(node.src, "/content/media/a.mp3");
        assert_eq!(node.title, "Episode");
        assert_eq!(node.thumbnail_src, "");
        assert_eq!(AudioNode::schema().node_type(), "audio");
    }
}
