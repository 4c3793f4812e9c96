//! Two-phase dynamic data.
//!
//! Renderers are synchronous. Cards that show live data declare
//! `has_dynamic_data()`; the host collects their requests with
//! [`DynamicDataPhase::collect`], resolves them against a [`PostFetcher`]
//! and passes the result to [`RenderOptions::with_render_data`] for the
//! render pass.
//!
//! [`RenderOptions::with_render_data`]: crate::RenderOptions::with_render_data

use std::collections::HashMap;
use std::future::Future;

use crate::card::CardNode;
use crate::error::DynamicDataError;
use crate::node::NodeKey;
use crate::render::Post;

/// Source of collection posts, supplied by the host.
pub trait PostFetcher: Send + Sync {
    fn fetch_posts(
        &self,
        slug: &str,
        count: u32,
    ) -> impl Future<Output = Result<Vec<Post>, DynamicDataError>> + Send;
}

/// Posts wanted by one card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicDataRequest {
    pub key: NodeKey,
    pub slug: String,
    pub count: u32,
}

impl DynamicDataRequest {
    fn for_card(card: &CardNode) -> Option<Self> {
        if !card.has_dynamic_data() {
            return None;
        }
        match card {
            CardNode::Collection(collection) => Some(Self {
                key: card.key(),
                slug: collection.collection.clone(),
                count: collection.post_count,
            }),
            _ => None,
        }
    }
}

/// Requests gathered from one document.
#[derive(Debug, Clone, Default)]
pub struct DynamicDataPhase {
    requests: Vec<DynamicDataRequest>,
}

impl DynamicDataPhase {
    /// Gather requests from every card with dynamic data.
    pub fn collect<'a>(cards: impl IntoIterator<Item = &'a CardNode>) -> Self {
        Self {
            requests: cards
                .into_iter()
                .filter_map(DynamicDataRequest::for_card)
                .collect(),
        }
    }

    pub fn requests(&self) -> &[DynamicDataRequest] {
        &self.requests
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Fetch every request in turn.
    ///
    /// A failed fetch is logged and leaves its card without data, so the card
    /// renders empty.
    pub async fn resolve<F: PostFetcher>(self, fetcher: &F) -> HashMap<NodeKey, Vec<Post>> {
        let mut render_data = HashMap::with_capacity(self.requests.len());
        for request in self.requests {
            match fetcher.fetch_posts(&request.slug, request.count).await {
                Ok(posts) => {
                    tracing::debug!(key = %request.key, slug = %request.slug, posts = posts.len(), "Fetched dynamic data");
                    render_data.insert(request.key, posts);
                }
                Err(e) => {
                    tracing::warn!(key = %request.key, error = %e, "Dynamic data fetch failed");
                }
            }
        }
        render_data
    }
}
