//! Koenig card nodes.
//!
//! Every card the editor knows is a variant of [`CardNode`]. A variant has
//! a property schema, a JSON record form, HTML import rules and renderers
//! for the web and for email.
//!
//! # Architecture
//!
//! - [`NodeVariant`]: per-variant behaviour, with the data side generated by
//!   a property macro
//! - [`ImportRegistry`]: tag-indexed import rules with priorities and guards
//! - [`RenderOptions`]: target, site settings and pre-fetched data for a
//!   render pass
//! - [`render_with_visibility`]: the member gate around rendered cards
//! - [`NodeStore`]: versioned storage with clone-on-write updates
//! - [`DynamicDataPhase`]: collects and resolves live data before rendering
//!
//! Inline text between cards is rendered by `kg-renderer`.
//!
//! # Example
//!
//! ```
//! use kg_nodes::{ImportRegistry, RenderOptions, RenderTarget};
//!
//! let registry = ImportRegistry::with_default_nodes();
//! let nodes = registry.import_fragment("<p>Intro</p><hr>");
//! let card = nodes.iter().find_map(|node| node.as_card()).unwrap();
//! assert_eq!(card.node_type(), "horizontalrule");
//!
//! let record = card.export_record();
//! assert_eq!(record["version"], 1);
//!
//! let options = RenderOptions::new(RenderTarget::Email);
//! assert_eq!(card.render(&options).content, "<hr>");
//! ```

mod card;
mod dynamic;
mod elements;
mod error;
pub mod image;
mod import;
pub mod media;
mod node;
pub mod nodes;
mod render;
pub mod schema;
mod store;
pub mod visibility;

pub use card::CardNode;
pub use dynamic::{DynamicDataPhase, DynamicDataRequest, PostFetcher};
pub use elements::ElementNode;
pub use error::{ConfigurationError, DynamicDataError, RecordError};
pub use import::{
    COMMENT_TAG, Convert, Guard, ImportOutput, ImportRegistry, ImportRule, ImportedNode,
};
pub use node::{DATA_URL_PLACEHOLDER, NodeData, NodeKey, NodeVariant};
pub use nodes::{
    AudioNode, BookmarkNode, ButtonNode, CallToActionNode, CalloutNode, CodeBlockNode,
    CollectionNode, EmailCtaNode, EmailNode, EmbedNode, FileNode, GalleryImage, GalleryNode,
    HeaderNode, HorizontalRuleNode, HtmlNode, ImageNode, MarkdownNode, PaywallNode, ProductNode,
    SignupNode, ToggleNode, VideoNode,
};
pub use render::{
    Features, ImageOptimization, ImageTransformCheck, Post, RenderMode, RenderOptions,
    RenderOutput, RenderTarget,
};
pub use schema::{NodeSchema, NodeSchemaBuilder, PropertyDescriptor, UrlKind};
pub use store::NodeStore;
pub use visibility::{Member, MemberStatus, Visibility, can_access_gated_block, render_with_visibility};
