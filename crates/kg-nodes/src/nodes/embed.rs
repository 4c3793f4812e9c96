//! Embedded third-party content (oEmbed, iframes, tweets).

use std::sync::LazyLock;

use kg_html::{DomNode, escape_attr};
use regex::Regex;
use serde_json::{Value, json};

use crate::import::{ImportOutput, ImportRule};
use crate::node::{NodeVariant, card_node};
use crate::nodes::tweet::TweetData;
use crate::nodes::{empty_output, payload, read_caption, template_element};
use crate::render::{RenderOptions, RenderOutput};
use crate::schema::UrlKind;

static IFRAME_SRC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(https?:)?//").expect("invalid iframe src regex"));
static ABSOLUTE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://").expect("invalid absolute url regex"));

const EMAIL_MAX_WIDTH: f64 = 600.0;
const FALLBACK_ASPECT_RATIO: f64 = 16.0 / 9.0;

card_node! {
    /// Third-party content stored as the provider's HTML plus oEmbed metadata.
    pub struct EmbedNode("embed", 1) {
        url as "url": String = String::new() => url(UrlKind::Url),
        embed_type as "embedType": String = String::new(),
        html as "html": String = String::new(),
        metadata as "metadata": Value = json!({}),
        caption as "caption": String = String::new() => word_count(),
    }
}

impl EmbedNode {
    fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }

    fn metadata_number(&self, key: &str) -> Option<f64> {
        self.metadata
            .get(key)
            .and_then(Value::as_f64)
            .filter(|value| *value > 0.0)
    }

    fn figure(&self, inner: &str) -> String {
        let (class, caption) = if self.caption.is_empty() {
            ("kg-card kg-embed-card", String::new())
        } else {
            (
                "kg-card kg-embed-card kg-card-hascaption",
                format!("<figcaption>{}</figcaption>", self.caption),
            )
        };
        template_element(&format!(r#"<figure class="{class}">{inner}{caption}</figure>"#))
    }

    /// Tweets render from their stored API data in email, else from the
    /// provider markup. They are never treated as empty.
    fn render_twitter(&self, options: &RenderOptions) -> RenderOutput {
        let inner = match TweetData::from_metadata(&self.metadata) {
            Some(tweet) if options.is_email() => tweet.email_html().trim().to_owned(),
            _ => self.html.clone(),
        };
        RenderOutput::element(self.figure(&inner))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn video_preview(&self, thumbnail: &str) -> String {
        let aspect_ratio = match (
            self.metadata_number("thumbnail_width"),
            self.metadata_number("thumbnail_height"),
        ) {
            (Some(width), Some(height)) => width / height,
            _ => FALLBACK_ASPECT_RATIO,
        };
        let spacer_width = (EMAIL_MAX_WIDTH / 4.0).round() as i64;
        let spacer_height = (EMAIL_MAX_WIDTH / aspect_ratio).round() as i64;
        let circle_left = (EMAIL_MAX_WIDTH / 2.0 - 39.0).round() as i64;
        let circle_top = (spacer_height as f64 / 2.0 - 39.0).round() as i64;
        let play_left = (EMAIL_MAX_WIDTH / 2.0 - 11.0).round() as i64;
        let play_top = (spacer_height as f64 / 2.0 - 17.0).round() as i64;
        let max_width = EMAIL_MAX_WIDTH as i64;
        let url = escape_attr(&self.url);
        let thumbnail = escape_attr(thumbnail);
        format!(
            r#"<!--[if !mso !vml]-->
            <a class="kg-video-preview" href="{url}" aria-label="Play video" style="mso-hide: all">
                <table cellpadding="0" cellspacing="0" border="0" width="100%" background="{thumbnail}" role="presentation" style="background: url('{thumbnail}') left top / cover; mso-hide: all">
                    <tr style="mso-hide: all">
                        <td width="25%" style="visibility: hidden; mso-hide: all">
                            <img src="https://img.spacergif.org/v1/{spacer_width}x{spacer_height}/0a/spacer.png" alt="" width="100%" border="0" style="display:block; height: auto; opacity: 0; visibility: hidden; mso-hide: all;">
                        </td>
                        <td width="50%" align="center" valign="middle" style="vertical-align: middle; mso-hide: all;">
                            <div class="kg-video-play-button" style="mso-hide: all"><div style="mso-hide: all"></div></div>
                        </td>
                        <td width="25%" style="mso-hide: all">&nbsp;</td>
                    </tr>
                </table>
            </a>
            <!--[endif]-->

            <!--[if vml]>
            <v:group xmlns:v="urn:schemas-microsoft-com:vml" xmlns:w="urn:schemas-microsoft-com:office:word" coordsize="{max_width},{spacer_height}" coordorigin="0,0" href="{url}" style="width:{max_width}px;height:{spacer_height}px;">
                <v:rect fill="t" stroked="f" style="position:absolute;width:{max_width};height:{spacer_height};"><v:fill src="{thumbnail}" type="frame"/></v:rect>
                <v:oval fill="t" strokecolor="white" strokeweight="4px" style="position:absolute;left:{circle_left};top:{circle_top};width:78;height:78"><v:fill color="black" opacity="30%" /></v:oval>
                <v:shape coordsize="24,32" path="m,l,32,24,16,xe" fillcolor="white" stroked="f" style="position:absolute;left:{play_left};top:{play_top};width:30;height:34;" />
            </v:group>
            <![endif]-->"#
        )
    }
}

impl NodeVariant for EmbedNode {
    fn is_empty(&self) -> bool {
        self.url.is_empty() && self.html.is_empty()
    }

    fn import_rules() -> Vec<ImportRule> {
        vec![
            ImportRule::new("figure", Self::NODE_TYPE, 1, import_iframe_figure)
                .guard(|figure| figure.query_selector("iframe").is_some()),
            ImportRule::new("figure", Self::NODE_TYPE, 1, import_blockquote_figure).guard(|figure| {
                figure.query_selector("iframe").is_none()
                    && figure.query_selector("blockquote").is_some()
            }),
            ImportRule::new("iframe", Self::NODE_TYPE, 1, |iframe| {
                let data = iframe_payload(iframe)?;
                Some(ImportOutput::card(EmbedNode::from_dataset(&payload(data))))
            }),
        ]
    }

    fn render(&self, options: &RenderOptions) -> RenderOutput {
        if self.embed_type == "twitter" {
            return self.render_twitter(options);
        }
        if self.is_empty() {
            return empty_output(Self::NODE_TYPE);
        }
        let inner = match self.metadata_str("thumbnail_url") {
            Some(thumbnail) if options.is_email() && self.embed_type == "video" => {
                self.video_preview(thumbnail)
            }
            _ => self.html.clone(),
        };
        RenderOutput::element(self.figure(&inner))
    }
}

/// `url` and `html` of an absolute or schemaless iframe; schemaless sources
/// are rewritten to https.
fn iframe_payload(iframe: &DomNode) -> Option<Value> {
    let src = iframe.attr("src").filter(|src| IFRAME_SRC.is_match(src))?;
    let src = if src.starts_with("//") {
        let secure = format!("https:{src}");
        iframe.set_attr("src", &secure);
        secure
    } else {
        src
    };
    Some(json!({"url": src, "html": iframe.outer_html()}))
}

fn import_iframe_figure(figure: &DomNode) -> Option<ImportOutput> {
    let iframe = figure.query_selector("iframe")?;
    let mut data = iframe_payload(&iframe)?;
    data["caption"] = Value::from(read_caption(figure, "figcaption"));
    Some(ImportOutput::card(EmbedNode::from_dataset(&payload(data))))
}

fn import_blockquote_figure(figure: &DomNode) -> Option<ImportOutput> {
    let url = figure
        .query_selector("a")
        .and_then(|link| link.attr("href"))
        .filter(|href| ABSOLUTE_URL.is_match(href))?;
    let caption = read_caption(figure, "figcaption");
    if let Some(figcaption) = figure.query_selector("figcaption") {
        figcaption.remove();
    }
    let data = json!({"url": url, "caption": caption, "html": figure.inner_html()});
    Some(ImportOutput::card(EmbedNode::from_dataset(&payload(data))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardNode;
    use crate::import::ImportRegistry;
    use crate::node::NodeData;
    use crate::render::RenderTarget;
    use pretty_assertions::assert_eq;

    fn youtube() -> EmbedNode {
        EmbedNode {
            url: "https://www.youtube.com/watch?v=abc".to_owned(),
            embed_type: "video".to_owned(),
            html: r#"<iframe src="https://www.youtube.com/embed/abc" width="200" height="113"></iframe>"#.to_owned(),
            metadata: json!({
                "thumbnail_url": "https://i.ytimg.com/vi/abc/hqdefault.jpg",
                "thumbnail_width": 480,
                "thumbnail_height": 360,
            }),
            ..EmbedNode::default()
        }
    }

    #[test]
    fn test_web_render_uses_provider_html() {
        let output = youtube().render(&RenderOptions::default());
        assert_eq!(
            output.content,
            r#"<figure class="kg-card kg-embed-card"><iframe src="https://www.youtube.com/embed/abc" width="200" height="113"></iframe></figure>"#
        );
    }

    #[test]
    fn test_caption_adds_class() {
        let node = EmbedNode {
            caption: "A <b>video</b>".to_owned(),
            ..youtube()
        };
        let html = node.render(&RenderOptions::default()).content;
        assert!(html.starts_with(r#"<figure class="kg-card kg-embed-card kg-card-hascaption">"#), "{html}");
        assert!(html.ends_with("<figcaption>A <b>video</b></figcaption></figure>"), "{html}");
    }

    #[test]
    fn test_email_video_uses_thumbnail_preview() {
        let html = youtube().render(&RenderOptions::new(RenderTarget::Email)).content;
        assert!(!html.contains("<iframe"), "{html}");
        assert!(html.contains(r#"<a class="kg-video-preview" href="https://www.youtube.com/watch?v=abc""#), "{html}");
        assert!(html.contains("https://img.spacergif.org/v1/150x450/0a/spacer.png"), "{html}");
        assert!(html.contains("left:261;top:186;width:78"), "{html}");
        assert!(html.contains("left:289;top:208;width:30"), "{html}");
    }

    #[test]
    fn test_email_video_without_dimensions_assumes_widescreen() {
        let node = EmbedNode {
            metadata: json!({"thumbnail_url": "https://i.test/t.jpg"}),
            ..youtube()
        };
        let html = node.render(&RenderOptions::new(RenderTarget::Email)).content;
        assert!(html.contains("https://img.spacergif.org/v1/150x338/0a/spacer.png"), "{html}");
    }

    #[test]
    fn test_empty_embed() {
        let node = EmbedNode::default();
        assert!(node.is_empty());
        assert!(node.render(&RenderOptions::default()).is_empty());
    }

    #[test]
    fn test_twitter_web_keeps_html() {
        let node = EmbedNode {
            url: "https://twitter.com/ghost/status/1".to_owned(),
            embed_type: "twitter".to_owned(),
            html: r#"<blockquote class="twitter-tweet"><p>Hello</p></blockquote>"#.to_owned(),
            metadata: json!({"tweet_data": {"id": "1", "text": "Hello"}}),
            ..EmbedNode::default()
        };
        let html = node.render(&RenderOptions::default()).content;
        assert_eq!(
            html,
            r#"<figure class="kg-card kg-embed-card"><blockquote class="twitter-tweet"><p>Hello</p></blockquote></figure>"#
        );

        let email = node.render(&RenderOptions::new(RenderTarget::Email)).content;
        assert!(email.contains(r#"<table cellspacing="0" cellpadding="0" border="0" class="kg-twitter-card">"#), "{email}");
        assert!(!email.contains("twitter-tweet"), "{email}");
    }

    #[test]
    fn test_twitter_is_never_empty() {
        let node = EmbedNode {
            embed_type: "twitter".to_owned(),
            ..EmbedNode::default()
        };
        let output = node.render(&RenderOptions::default());
        assert_eq!(output.content, r#"<figure class="kg-card kg-embed-card"></figure>"#);
    }

    #[test]
    fn test_metadata_defaults_to_object() {
        assert_eq!(EmbedNode::default().properties()["metadata"], json!({}));
    }

    #[test]
    fn test_import_schemaless_iframe() {
        let nodes = ImportRegistry::with_default_nodes()
            .import_fragment(r#"<figure><iframe src="//player.test/1"></iframe><figcaption>Cap</figcaption></figure>"#);
        let Some(CardNode::Embed(node)) = nodes[0].as_card() else {
            panic!("expected an embed card, got {nodes:?}");
        };
        assert_eq!(node.url, "https://player.test/1");
        assert_eq!(node.html, r#"<iframe src="https://player.test/1"></iframe>"#);
        assert_eq!(node.caption, "Cap");
    }

    #[test]
    fn test_import_relative_iframe_is_declined() {
        let nodes = ImportRegistry::with_default_nodes().import_fragment(r#"<iframe src="/local"></iframe>"#);
        assert!(nodes.iter().all(|node| node.as_card().is_none()), "{nodes:?}");
    }

    #[test]
    fn test_import_blockquote_figure() {
        let html = r#"<figure><blockquote><p>Tweet</p><a href="https://twitter.com/x/status/1">link</a></blockquote><figcaption>By x</figcaption></figure>"#;
        let nodes = ImportRegistry::with_default_nodes().import_fragment(html);
        let Some(CardNode::Embed(node)) = nodes[0].as_card() else {
            panic!("expected an embed card, got {nodes:?}");
        };
        assert_eq!(node.url, "https://twitter.com/x/status/1");
        assert_eq!(node.caption, "By x");
        assert_eq!(
            node.html,
            r#"<blockquote><p>Tweet</p><a href="https://twitter.com/x/status/1">link</a></blockquote>"#
        );
    }
}
