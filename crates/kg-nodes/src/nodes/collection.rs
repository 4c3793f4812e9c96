//! Post collection feed.

use chrono::{DateTime, Utc};
use kg_html::DomNode;
use serde_json::json;

use crate::import::{ImportOutput, ImportRule};
use crate::node::{NodeData, NodeVariant, card_node};
use crate::nodes::{empty_output, payload, template_element};
use crate::render::{Post, RenderOptions, RenderOutput};
use crate::schema::UrlKind;

card_node! {
    /// A feed of posts from a collection, filled in from pre-fetched data.
    pub struct CollectionNode("collection", 1) {
        collection as "collection": String = "latest".to_owned(),
        post_count as "postCount": u32 = 3,
        layout as "layout": String = "grid".to_owned(),
        columns as "columns": u32 = 3,
        header as "header": String = String::new() => url(UrlKind::Html) word_count(),
    }
}

impl CollectionNode {
    fn feed_class(&self) -> String {
        let mut class = String::from("kg-collection-card-feed");
        if self.layout == "list" {
            class.push_str(" kg-collection-card-list");
        } else {
            class.push_str(" kg-collection-card-grid");
        }
        if self.layout == "grid" && (1..=4).contains(&self.columns) {
            class.push_str(&format!(" columns-{}", self.columns));
        }
        class
    }

    fn post_template(&self, post: &Post) -> String {
        let wide = self.layout == "grid" && matches!(self.columns, 1 | 2);
        let image_class = if wide { "aspect-video" } else { "aspect-[3/2]" };
        let image = match post.feature_image.as_deref() {
            Some(src) if !src.is_empty() => format!(
                r#"<div class="kg-collection-card-img">
                        <img class="{image_class}" src="{src}" alt="{title}" />
                    </div>"#,
                title = post.title,
            ),
            _ => String::new(),
        };
        let title = if post.title.is_empty() {
            String::new()
        } else {
            format!(r#"<h2 class="kg-collection-card-post-title">{}</h2>"#, post.title)
        };
        let excerpt = if post.excerpt.is_empty() {
            String::new()
        } else {
            format!(r#"<p class="kg-collection-card-post-excerpt">{}</p>"#, post.excerpt)
        };
        let published = post
            .published_at
            .as_deref()
            .filter(|date| !date.is_empty())
            .map(|date| format!("<p>{}</p>", format_publish_date(date)))
            .unwrap_or_default();
        let reading_time = if post.reading_time > 0 {
            format!("<p>&nbsp;&middot; {} min</p>", post.reading_time)
        } else {
            String::new()
        };
        format!(
            r#"<a href="{url}" class="kg-collection-card-post-wrapper">
            <div class="kg-collection-card-post">
                {image}
                <div class="kg-collection-card-content">
                    {title}
                    {excerpt}
                    <div class="kg-collection-card-post-meta">
                        {published}
                        {reading_time}
                    </div>
                </div>
            </div>
        </a>"#,
            url = post.url,
        )
    }
}

/// `5 Jan 2023` for an ISO timestamp, in UTC.
fn format_publish_date(date: &str) -> String {
    match DateTime::parse_from_rfc3339(date) {
        Ok(date) => date.with_timezone(&Utc).format("%-d %b %Y").to_string(),
        Err(e) => {
            tracing::debug!(error = %e, date, "Unparseable publish date");
            "Invalid DateTime".to_owned()
        }
    }
}

impl NodeVariant for CollectionNode {
    fn has_dynamic_data(&self) -> bool {
        true
    }

    fn import_rules() -> Vec<ImportRule> {
        vec![
            ImportRule::new("div", Self::NODE_TYPE, 1, import_collection_card)
                .guard(|div| div.has_class("kg-collection-card")),
        ]
    }

    fn render(&self, options: &RenderOptions) -> RenderOutput {
        let Some(posts) = options.render_data.get(&self.key()) else {
            return empty_output(Self::NODE_TYPE);
        };
        let header = if self.header.is_empty() {
            String::new()
        } else {
            format!(r#"<h4 class="kg-collection-card-title">{}</h4>"#, self.header)
        };
        let posts: String = posts.iter().map(|post| self.post_template(post)).collect();
        let html = format!(
            r#"<div class="kg-card kg-collection-card kg-width-wide" data-kg-collection-slug="{slug}" data-kg-collection-limit="{limit}">
            {header}
            <div class="{feed_class}">
                {posts}
            </div>
        </div>"#,
            slug = self.collection,
            limit = self.post_count,
            feed_class = self.feed_class(),
        );
        RenderOutput::element(template_element(&html))
    }
}

fn import_collection_card(div: &DomNode) -> Option<ImportOutput> {
    let layout = if div.has_class("kg-collection-card-list") {
        "list"
    } else {
        "grid"
    };
    // A list switched back to grid shows three columns.
    let columns = if layout == "list" {
        Some(3)
    } else {
        (1..=4).find(|n| div.has_class(&format!("columns-{n}")))
    };
    let data = json!({
        "collection": div.attr("data-kg-collection-slug"),
        "postCount": div
            .attr("data-kg-collection-limit")
            .and_then(|limit| limit.trim().parse::<u32>().ok()),
        "layout": layout,
        "columns": columns,
        "header": div
            .query_selector(".kg-collection-card-title")
            .map(|title| title.text_content())
            .unwrap_or_default(),
    });
    Some(ImportOutput::card(CollectionNode::from_dataset(&payload(data))))
}
