//! Video card.

use kg_html::{DomNode, escape_attr};

use crate::import::{ImportOutput, ImportRule};
use crate::media::{format_duration, parse_duration, video_mime_type};
use crate::node::{NodeVariant, card_node};
use crate::nodes::{empty_output, read_caption, template_element};
use crate::render::{RenderOptions, RenderOutput};
use crate::schema::UrlKind;

const EMAIL_MAX_WIDTH: f64 = 600.0;
/// Aspect ratio assumed for email layout when the video has no dimensions.
const FALLBACK_ASPECT_RATIO: f64 = 16.0 / 9.0;

card_node! {
    /// An uploaded video with a thumbnail.
    pub struct VideoNode("video", 1) {
        src as "src": String = String::new() => url(UrlKind::Url) strip_data_url(),
        caption as "caption": String = String::new() => url(UrlKind::Html) word_count(),
        file_name as "fileName": String = String::new(),
        mime_type as "mimeType": String = String::new(),
        width as "width": Option<u64> = None,
        height as "height": Option<u64> = None,
        duration as "duration": f64 = 0.0,
        thumbnail_src as "thumbnailSrc": String = String::new() => url(UrlKind::Url) strip_data_url(),
        custom_thumbnail_src as "customThumbnailSrc": String = String::new() => url(UrlKind::Url) strip_data_url(),
        thumbnail_width as "thumbnailWidth": Option<u64> = None,
        thumbnail_height as "thumbnailHeight": Option<u64> = None,
        card_width as "cardWidth": String = "regular".to_owned(),
        looped as "loop": bool = false,
    }
}

impl VideoNode {
    /// Duration as `m:ss`.
    pub fn formatted_duration(&self) -> String {
        format_duration(self.duration)
    }

    fn card_classes(&self) -> String {
        let mut classes = String::from("kg-card kg-video-card");
        if !self.card_width.is_empty() {
            classes.push_str(" kg-width-");
            classes.push_str(&self.card_width);
        }
        if !self.caption.is_empty() {
            classes.push_str(" kg-card-hascaption");
        }
        classes
    }

    /// The custom thumbnail when set, else the generated one.
    fn poster(&self) -> &str {
        if self.custom_thumbnail_src.is_empty() {
            &self.thumbnail_src
        } else {
            &self.custom_thumbnail_src
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn aspect_ratio(&self) -> Option<f64> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some(w as f64 / h as f64),
            _ => None,
        }
    }

    fn figcaption(&self) -> String {
        if self.caption.is_empty() {
            String::new()
        } else {
            format!("<figcaption>{}</figcaption>", self.caption)
        }
    }

    fn web_template(&self) -> String {
        let width = self.width.map(|w| w.to_string()).unwrap_or_default();
        let height = self.height.map(|h| h.to_string()).unwrap_or_default();
        let max_dimension = match (self.width, self.height) {
            (None, None) => "100%".to_owned(),
            (w, h) => format!("{}px", w.unwrap_or(0).max(h.unwrap_or(0))),
        };
        let aspect_ratio = self
            .aspect_ratio()
            .map_or_else(|| "auto".to_owned(), |r| r.to_string());
        let autoplay = if self.looped { "loop autoplay muted" } else { "" };
        let video_type = video_mime_type(&self.src).unwrap_or("video/mp4");
        format!(
            r#"
<figure class="{classes}" data-kg-thumbnail="{thumbnail}" data-kg-custom-thumbnail="{custom_thumbnail}">
    <div class="kg-video-container data-vjs-player" style="width:100%; max-width:{max_dimension}; aspect-ratio: {aspect_ratio}; margin: '0 auto'">
        <video controls responsive controlsList="nodownload" class="video-js vjs-big-play-centered vjs-paused" poster="https://img.spacergif.org/v1/{width}x{height}/0a/spacer.png" width="{width}" height="{height}" {autoplay} playsinline preload="auto" style="background: transparent url('{poster}') 50% 50% / cover no-repeat; width:100%; height:100%;" data-setup='{{"fluid": true}}'>
        <source src="{src}" type="{video_type}"></source>
        <p class="vjs-no-js">
            To view this video please enable JavaScript, and consider upgrading to a
            web browser that
            <a href="https://videojs.com/html5-video-support/" target="_blank">
                supports HTML5 video
            </a>
        </p>
        </video>
    </div>
    {caption}
</figure>
"#,
            classes = self.card_classes(),
            thumbnail = escape_attr(&self.thumbnail_src),
            custom_thumbnail = escape_attr(&self.custom_thumbnail_src),
            poster = escape_attr(self.poster()),
            src = escape_attr(&self.src),
            caption = self.figcaption(),
        )
    }

    #[allow(clippy::cast_possible_truncation)]
    fn email_template(&self, options: &RenderOptions) -> String {
        let aspect_ratio = self.aspect_ratio().unwrap_or(FALLBACK_ASPECT_RATIO);
        let spacer_width = (EMAIL_MAX_WIDTH / 4.0).round() as i64;
        let spacer_height = (EMAIL_MAX_WIDTH / aspect_ratio).round() as i64;
        let circle_left = (EMAIL_MAX_WIDTH / 2.0 - 39.0).round() as i64;
        let circle_top = (spacer_height as f64 / 2.0 - 39.0).round() as i64;
        let play_left = (EMAIL_MAX_WIDTH / 2.0 - 11.0).round() as i64;
        let play_top = (spacer_height as f64 / 2.0 - 17.0).round() as i64;
        let max_width = EMAIL_MAX_WIDTH as i64;
        let poster = escape_attr(self.poster());
        let post_url = escape_attr(&options.post_url);
        format!(
            r#"
<figure class="{classes}">
    <!--[if !mso !vml]-->
    <a class="kg-video-preview" href="{post_url}" aria-label="Play video" style="mso-hide: all">
        <table cellpadding="0" cellspacing="0" border="0" width="100%" background="{poster}" role="presentation" style="background: url('{poster}') left top / cover; mso-hide: all">
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
    <v:group xmlns:v="urn:schemas-microsoft-com:vml" xmlns:w="urn:schemas-microsoft-com:office:word" coordsize="{max_width},{spacer_height}" coordorigin="0,0" href="{post_url}" style="width:{max_width}px;height:{spacer_height}px;">
        <v:rect fill="t" stroked="f" style="position:absolute;width:{max_width};height:{spacer_height};"><v:fill src="{poster}" type="frame"/></v:rect>
        <v:oval fill="t" strokecolor="white" strokeweight="4px" style="position:absolute;left:{circle_left};top:{circle_top};width:78;height:78"><v:fill color="black" opacity="30%" /></v:oval>
        <v:shape coordsize="24,32" path="m,l,32,24,16,xe" fillcolor="white" stroked="f" style="position:absolute;left:{play_left};top:{play_top};width:30;height:34;" />
    </v:group>
    <![endif]-->

    {caption}
</figure>
"#,
            classes = self.card_classes(),
            caption = self.figcaption(),
        )
    }
}

impl NodeVariant for VideoNode {
    fn import_rules() -> Vec<ImportRule> {
        vec![
            ImportRule::new("figure", Self::NODE_TYPE, 1, import_video_card)
                .guard(|figure| figure.has_class("kg-video-card")),
        ]
    }

    fn render(&self, options: &RenderOptions) -> RenderOutput {
        if self.src.trim().is_empty() {
            return empty_output(Self::NODE_TYPE);
        }
        let template = if options.is_email() {
            self.email_template(options)
        } else {
            self.web_template()
        };
        RenderOutput::element(template_element(&template))
    }
}

fn card_width(element: &DomNode) -> Option<&'static str> {
    if element.has_class("kg-width-full") {
        Some("full")
    } else if element.has_class("kg-width-wide") {
        Some("wide")
    } else {
        None
    }
}

fn import_video_card(figure: &DomNode) -> Option<ImportOutput> {
    let video = figure.query_selector(".kg-video-container video")?;
    let src = video.attr("src").filter(|s| !s.is_empty())?;
    let dimension = |name: &str| {
        video
            .attr(name)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|v| *v > 0)
    };
    let duration = figure
        .query_selector(".kg-video-duration")
        .and_then(|node| parse_duration(&node.inner_html()))
        .unwrap_or(0.0);
    Some(ImportOutput::card(VideoNode {
        src,
        looped: video.has_attr("loop"),
        card_width: card_width(&video)
            .or_else(|| card_width(figure))
            .unwrap_or("regular")
            .to_owned(),
        duration,
        thumbnail_src: figure.data("kg-thumbnail").unwrap_or_default(),
        custom_thumbnail_src: figure.data("kg-custom-thumbnail").unwrap_or_default(),
        caption: read_caption(figure, "figcaption"),
        width: dimension("width"),
        height: dimension("height"),
        ..VideoNode::default()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardNode;
    use crate::import::ImportRegistry;
    use crate::render::RenderTarget;
    use pretty_assertions::assert_eq;

    fn video() -> VideoNode {
        VideoNode {
            src: "/content/media/clip.webm".to_owned(),
            width: Some(1920),
            height: Some(1080),
            thumbnail_src: "/content/media/clip_thumb.jpg".to_owned(),
            duration: 75.0,
            ..VideoNode::default()
        }
    }

    #[test]
    fn test_web_render_uses_video_player() {
        let html = video().render(&RenderOptions::default()).content;
        assert!(html.starts_with(
            r#"<figure class="kg-card kg-video-card kg-width-regular" data-kg-thumbnail="/content/media/clip_thumb.jpg" data-kg-custom-thumbnail="">"#
        ), "{html}");
        assert!(html.contains(r#"max-width:1920px; aspect-ratio: 1.7777777777777777;"#), "{html}");
        assert!(html.contains(r#"poster="https://img.spacergif.org/v1/1920x1080/0a/spacer.png""#), "{html}");
        assert!(html.contains(r#"<source src="/content/media/clip.webm" type="video/webm">"#), "{html}");
        assert!(!html.contains("autoplay"), "{html}");
    }

    #[test]
    fn test_email_render_uses_table_and_vml() {
        let options = RenderOptions::new(RenderTarget::Email).with_post_url("https://site.test/post/");
        let html = video().render(&options).content;
        assert!(!html.contains("<video"), "{html}");
        assert!(html.contains(r#"<a class="kg-video-preview" href="https://site.test/post/""#), "{html}");
        assert!(html.contains("https://img.spacergif.org/v1/150x338/0a/spacer.png"), "{html}");
        assert!(html.contains("left:261;top:130;width:78"), "{html}");
        assert!(html.contains("left:289;top:152;width:30"), "{html}");
    }

    #[test]
    fn test_loop_and_caption() {
        let node = VideoNode {
            looped: true,
            caption: "Nice".to_owned(),
            card_width: "wide".to_owned(),
            ..video()
        };
        let html = node.render(&RenderOptions::default()).content;
        assert!(html.contains(r#"class="kg-card kg-video-card kg-width-wide kg-card-hascaption""#), "{html}");
        assert!(html.contains(r#"loop="" autoplay="" muted="""#), "{html}");
        assert!(html.ends_with("<figcaption>Nice</figcaption>\n</figure>"), "{html}");
    }

    #[test]
    fn test_empty_src() {
        assert!(VideoNode::default().render(&RenderOptions::default()).is_empty());
    }

    #[test]
    fn test_import_video_card() {
        let html = r#"<figure class="kg-card kg-video-card kg-width-wide" data-kg-thumbnail="/t.jpg"><div class="kg-video-container"><video src="/v.mp4" width="640" height="480" loop></video><div class="kg-video-duration">1:05</div></div><figcaption>Cap</figcaption></figure>"#;
        let nodes = ImportRegistry::with_default_nodes().import_fragment(html);
        let Some(CardNode::Video(node)) = nodes[0].as_card() else {
            panic!("expected a video card, got {nodes:?}");
        };
        assert_eq!(node.src, "/v.mp4");
        assert_eq!((node.width, node.height), (Some(640), Some(480)));
        assert_eq!(node.duration, 65.0);
        assert!(node.looped);
        assert_eq!(node.card_width, "wide");
        assert_eq!(node.thumbnail_src, "/t.jpg");
        assert_eq!(node.caption, "Cap");
        assert_eq!(node.formatted_duration(), "1:05");
    }
}
