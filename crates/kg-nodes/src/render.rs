//! Render options and output.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::node::NodeKey;

/// Where rendered output is headed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderTarget {
    /// A page on the site.
    #[default]
    Web,
    /// A newsletter email.
    Email,
}

/// How the host splices a [`RenderOutput`] into the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// `content` is a whole element replacing the node.
    Element,
    /// `content` is the inner markup of a container that is dropped.
    Inner,
    /// `content` is raw markup inserted without re-parsing.
    Value,
}

/// Markup produced by a renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    pub content: String,
    pub mode: RenderMode,
}

impl RenderOutput {
    pub fn element(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            mode: RenderMode::Element,
        }
    }

    pub fn inner(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            mode: RenderMode::Inner,
        }
    }

    pub fn value(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            mode: RenderMode::Value,
        }
    }

    /// The neutral empty container.
    pub fn empty() -> Self {
        Self::inner("")
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// The markup the host inserts for this output.
    pub fn html(&self) -> &str {
        &self.content
    }
}

/// Responsive image settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOptimization {
    /// Widths the image service can produce, ascending.
    pub content_image_sizes: Vec<u32>,
    /// Width local images are downsized to before rendering.
    pub default_max_width: Option<u32>,
    /// Whether `srcset` attributes are emitted.
    pub srcsets: bool,
}

impl Default for ImageOptimization {
    fn default() -> Self {
        Self {
            content_image_sizes: vec![600, 1000, 1600, 2400],
            default_max_width: Some(2000),
            srcsets: true,
        }
    }
}

impl ImageOptimization {
    /// Build from widths in any order.
    pub fn with_sizes(widths: impl IntoIterator<Item = u32>) -> Self {
        let mut content_image_sizes: Vec<u32> = widths.into_iter().collect();
        content_image_sizes.sort_unstable();
        content_image_sizes.dedup();
        Self {
            content_image_sizes,
            ..Self::default()
        }
    }
}

/// Feature flags that change rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Features {
    pub content_visibility: bool,
}

/// A post as consumed by collection cards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    pub title: String,
    pub url: String,
    pub excerpt: String,
    pub published_at: Option<String>,
    pub feature_image: Option<String>,
    pub reading_time: u32,
}

/// Checks whether the image service can resize a URL.
pub type ImageTransformCheck = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Options shared by every renderer in one render pass.
#[derive(Clone, Default)]
pub struct RenderOptions {
    pub target: RenderTarget,
    pub site_url: String,
    /// URL of the post being rendered, used by email call-to-action links.
    pub post_url: String,
    pub image_optimization: Option<ImageOptimization>,
    pub feature: Features,
    /// Pre-fetched dynamic data, keyed by node.
    pub render_data: HashMap<NodeKey, Vec<Post>>,
    can_transform_image: Option<ImageTransformCheck>,
}

impl fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderOptions")
            .field("target", &self.target)
            .field("site_url", &self.site_url)
            .field("post_url", &self.post_url)
            .field("image_optimization", &self.image_optimization)
            .field("feature", &self.feature)
            .field("render_data", &self.render_data.len())
            .field("can_transform_image", &self.can_transform_image.is_some())
            .finish()
    }
}

impl RenderOptions {
    pub fn new(target: RenderTarget) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    /// Map loaded configuration onto render options.
    pub fn from_config(config: &kg_config::Config, target: RenderTarget) -> Self {
        let mut optimization = ImageOptimization::with_sizes(
            config.images.content_image_sizes.values().map(|size| size.width),
        );
        optimization.default_max_width = config.images.default_max_width;
        optimization.srcsets = config.images.srcsets;
        Self {
            target,
            site_url: config.site.url.clone(),
            image_optimization: Some(optimization),
            feature: Features {
                content_visibility: config.features.content_visibility,
            },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_target(mut self, target: RenderTarget) -> Self {
        self.target = target;
        self
    }

    #[must_use]
    pub fn with_site_url(mut self, site_url: impl Into<String>) -> Self {
        self.site_url = site_url.into();
        self
    }

    #[must_use]
    pub fn with_post_url(mut self, post_url: impl Into<String>) -> Self {
        self.post_url = post_url.into();
        self
    }

    #[must_use]
    pub fn with_image_optimization(mut self, optimization: ImageOptimization) -> Self {
        self.image_optimization = Some(optimization);
        self
    }

    #[must_use]
    pub fn with_content_visibility(mut self, enabled: bool) -> Self {
        self.feature.content_visibility = enabled;
        self
    }

    #[must_use]
    pub fn with_render_data(mut self, render_data: HashMap<NodeKey, Vec<Post>>) -> Self {
        self.render_data = render_data;
        self
    }

    #[must_use]
    pub fn with_can_transform_image(
        mut self,
        check: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.can_transform_image = Some(Arc::new(check));
        self
    }

    pub fn is_email(&self) -> bool {
        self.target == RenderTarget::Email
    }

    /// Result of the image transform check, `None` when no check is configured.
    pub fn can_transform_image(&self, url: &str) -> Option<bool> {
        self.can_transform_image.as_ref().map(|check| check(url))
    }

    /// Whether a check is configured and accepts `url`.
    pub(crate) fn transforms_image(&self, url: &str) -> bool {
        self.can_transform_image(url) == Some(true)
    }
}
