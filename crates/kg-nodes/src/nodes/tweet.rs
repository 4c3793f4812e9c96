//! Email rendering of embedded tweets from their stored API payload.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

const STATUS_URL: &str = "https://twitter.com/twitter/status";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct TweetData {
    id: String,
    text: String,
    author_id: String,
    created_at: String,
    public_metrics: PublicMetrics,
    users: Vec<TwitterUser>,
    entities: Entities,
    attachments: Option<Attachments>,
    includes: Includes,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PublicMetrics {
    retweet_count: u64,
    like_count: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TwitterUser {
    id: String,
    name: String,
    username: String,
    profile_image_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Entities {
    mentions: Vec<TweetEntity>,
    urls: Vec<TweetEntity>,
    hashtags: Vec<TweetEntity>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
struct TweetEntity {
    start: usize,
    end: usize,
    url: Option<String>,
    display_url: Option<String>,
    username: Option<String>,
    tag: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Attachments {
    media_keys: Option<Vec<String>>,
    poll_ids: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Includes {
    media: Vec<Media>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Media {
    preview_image_url: Option<String>,
    url: Option<String>,
}

#[derive(Clone, Copy)]
enum EntityKind {
    Text,
    Highlight,
    Link,
    Picture,
}

impl TweetData {
    /// The `tweet_data` of an embed's metadata, when present and well formed.
    pub(crate) fn from_metadata(metadata: &Value) -> Option<Self> {
        let data = metadata.get("tweet_data")?;
        if !data.is_object() {
            return None;
        }
        match serde_json::from_value(data.clone()) {
            Ok(tweet) => Some(tweet),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed tweet data");
                None
            }
        }
    }

    fn author(&self) -> Option<&TwitterUser> {
        self.users.iter().find(|user| user.id == self.author_id)
    }

    fn image_url(&self) -> Option<&str> {
        self.attachments.as_ref()?.media_keys.as_ref()?;
        let media = self.includes.media.first()?;
        media
            .preview_image_url
            .as_deref()
            .or(media.url.as_deref())
    }

    fn has_poll(&self) -> bool {
        self.attachments
            .as_ref()
            .is_some_and(|a| a.poll_ids.is_some())
    }

    /// Tweet text with entities highlighted and picture links dropped.
    fn content_html(&self) -> String {
        let chars: Vec<char> = self.text.chars().collect();
        let slice = |from: usize, to: usize| -> String {
            let from = from.min(chars.len());
            let to = to.clamp(from, chars.len());
            chars[from..to].iter().collect::<String>().replace('\n', "<br>")
        };

        let mut entities: Vec<TweetEntity> = self
            .entities
            .mentions
            .iter()
            .chain(&self.entities.urls)
            .chain(&self.entities.hashtags)
            .cloned()
            .collect();
        entities.sort_by_key(|e| e.start);

        let mut html = String::new();
        let mut last = 0;
        for entity in &entities {
            let mut data = slice(entity.start, entity.end + 1);
            let mut kind = EntityKind::Text;
            if let Some(url) = &entity.url {
                kind = match entity.display_url.as_deref() {
                    Some(display) if !display.starts_with("pic.twitter.com") => {
                        data = data.replace(url.as_str(), display);
                        EntityKind::Link
                    }
                    _ => EntityKind::Picture,
                };
            }
            if entity.username.is_some() || entity.tag.is_some() {
                kind = EntityKind::Highlight;
            }
            html.push_str(&slice(last, entity.start));
            match kind {
                EntityKind::Text => html.push_str(&data),
                EntityKind::Highlight => {
                    html.push_str(&format!(r#"<span style="color: #1DA1F2;">{data}</span>"#));
                }
                EntityKind::Link => html.push_str(&format!(
                    r#"<span style="color: #1DA1F2; word-break: break-all;">{data}</span>"#
                )),
                EntityKind::Picture => {}
            }
            last = entity.end + 1;
        }
        html.push_str(&slice(last, chars.len()));
        html
    }

    /// Email table for the tweet.
    pub(crate) fn email_html(&self) -> String {
        let status = format!("{STATUS_URL}/{}", self.id);
        let (time, date) = tweet_timestamp(&self.created_at);

        let author_row = self.author().map_or_else(String::new, |user| {
            let avatar = if user.profile_image_url.is_empty() {
                String::new()
            } else {
                format!(
                    r#"<td width="48" style="width: 48px;">
                                    <a href="{status}" class="kg-twitter-link" style="padding-left: 16px; padding-top: 16px;"><img src="{}" style="max-width: 512px; border: none; width: 48px; height: 48px; border-radius: 999px;" border="0"></a>
                                </td>"#,
                    user.profile_image_url
                )
            };
            let name = if user.name.is_empty() {
                String::new()
            } else {
                format!(
                    r#"
                                <td style="line-height: 1.3em; width: 100%;">
                                    <a href="{status}" class="kg-twitter-link" style="font-size: 15px !important; font-weight: 600; width: 100%; padding-top: 20px; padding-bottom: 18px;">{} <br> <span style="color: #ABB4BE; font-size: 14px; font-weight: 500;">@{}</span></a>
                                </td>"#,
                    user.name, user.username
                )
            };
            format!(
                r#"
                            <tr>
                                {avatar}
                                {name}
                                <td align="right" width="24" style="width: 24px;">
                                    <a href="{status}" class="kg-twitter-link" style="padding-right: 16px; padding-top: 20px; width: 24px; height: 38px;"><img src="https://static.ghost.org/v4.0.0/images/twitter-logo-small.png" width="24" border="0"></a>
                                </td>
                            </tr>
                        "#
            )
        });
        let poll = if self.has_poll() {
            r#"<br><span style="color: #1DA1F2;">View poll &rarr;</span>"#
        } else {
            ""
        };
        let image_row = self.image_url().map_or_else(String::new, |image| {
            format!(
                r#"<tr>
                            <td colspan="3" align="center" style="width: 100%;">
                                <a href="{status}" style="display: block; padding-top: 0; padding-left: 16px; padding-right: 16px; padding-bottom: 0;"><img src="{image}" style="width: 100%; border: 1px solid #E9E9E9; max-width: 528px; border-radius: 10px;" border="0"></a>
                            </td>
                        </tr>"#
            )
        });

        format!(
            r#"
        <table cellspacing="0" cellpadding="0" border="0" class="kg-twitter-card">
            <tr>
                <td>
                    <table cellspacing="0" cellpadding="0" border="0" width="100%">
                        {author_row}
                        <tr>
                            <td colspan="3">
                                <a href="{status}" class="kg-twitter-link" style="font-size: 15px; line-height: 1.4em; padding-top: 8px; padding-left: 16px; padding-right: 16px; padding-bottom: 16px;">{content}
                                {poll}
                                </a>
                            </td>
                        </tr>
                        {image_row}
                        <tr>
                            <td colspan="3" style="width: 100%;">
                                <table cellspacing="0" cellpadding="0" border="0" width="100%">
                                    <tr>
                                        <td>
                                        <a href="{status}" class="kg-twitter-link" style="padding-top: 4px; padding-right: 16px; padding-bottom: 12px; padding-left: 16px;"><span style="color: #838383;">{time} &bull; {date}</span></a>
                                        </td>
                                    </tr>
                                </table>
                            </td>
                        </tr>
                        <tr>
                            <td colspan="3" style="width: 100%;">
                                <table cellspacing="0" cellpadding="0" border="0" width="100%" style="border-top: 1px solid #E9E9E9;">
                                    <tr>
                                        <td>
                                            <a href="{status}" class="kg-twitter-link" style="padding-top: 12px; padding-right: 16px; padding-bottom: 12px; padding-left: 16px;">
                                                <span style="font-weight: 600;">{likes}</span> <span style="color: #838383;">likes &bull;</span>
                                                <span style="font-weight: 600;">{retweets}</span> <span style="color: #838383;">retweets</span>
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
        "#,
            content = self.content_html(),
            likes = compact_number(self.public_metrics.like_count),
            retweets = compact_number(self.public_metrics.retweet_count),
        )
    }
}

/// Time (`3:04 PM`) and date (`Jan 5, 2023`) of an ISO timestamp, in UTC.
fn tweet_timestamp(created_at: &str) -> (String, String) {
    match DateTime::parse_from_rfc3339(created_at) {
        Ok(timestamp) => {
            let timestamp = timestamp.with_timezone(&Utc);
            (
                timestamp.format("%-I:%M %p").to_string(),
                timestamp.format("%b %-d, %Y").to_string(),
            )
        }
        Err(e) => {
            tracing::debug!(error = %e, created_at, "Unparseable tweet timestamp");
            ("Invalid DateTime".to_owned(), "Invalid DateTime".to_owned())
        }
    }
}

/// Short count such as `999`, `1.2K` or `3M`, with at most one decimal.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn compact_number(count: u64) -> String {
    const UNITS: [(u64, &str); 4] = [
        (1_000_000_000_000, "T"),
        (1_000_000_000, "B"),
        (1_000_000, "M"),
        (1_000, "K"),
    ];
    for (index, (size, suffix)) in UNITS.iter().enumerate() {
        if count < *size {
            continue;
        }
        let scaled = (count as f64 / *size as f64 * 10.0).round() / 10.0;
        // Rounding can carry into the next unit, e.g. 999_950 -> 1M.
        if scaled >= 1000.0 && index > 0 {
            let (next, next_suffix) = UNITS[index - 1];
            return format_scaled(count as f64 / next as f64, next_suffix);
        }
        return format_scaled(scaled, suffix);
    }
    count.to_string()
}

fn format_scaled(value: f64, suffix: &str) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}{suffix}")
    } else {
        format!("{rounded:.1}{suffix}")
    }
}
