//! The closed set of built-in card variants.

use serde_json::{Map, Value};

use crate::error::RecordError;
use crate::import::ImportRule;
use crate::node::{NodeData, NodeKey, NodeVariant};
use crate::nodes::{
    AudioNode, BookmarkNode, ButtonNode, CallToActionNode, CalloutNode, CodeBlockNode,
    CollectionNode, EmailCtaNode, EmailNode, EmbedNode, FileNode, GalleryNode, HeaderNode,
    HorizontalRuleNode, HtmlNode, ImageNode, MarkdownNode, PaywallNode, ProductNode, SignupNode,
    ToggleNode, VideoNode,
};
use crate::render::{RenderOptions, RenderOutput};
use crate::schema::NodeSchema;

macro_rules! card_variants {
    ($($variant:ident($node:ident)),* $(,)?) => {
        /// Any built-in card.
        #[derive(Debug, Clone)]
        pub enum CardNode {
            $($variant($node),)*
        }

        $(
            impl From<$node> for CardNode {
                fn from(node: $node) -> Self {
                    Self::$variant(node)
                }
            }
        )*

        impl CardNode {
            /// Schemas of every variant, in registration order.
            pub fn schemas() -> Vec<&'static NodeSchema> {
                vec![$($node::schema(),)*]
            }

            /// Import rules of every variant, in registration order.
            pub fn import_rules() -> Vec<ImportRule> {
                let mut rules = Vec::new();
                $(rules.extend($node::import_rules());)*
                rules
            }

            /// Build a card of `node_type` from an in-memory dataset.
            pub fn from_dataset(node_type: &str, data: &Map<String, Value>) -> Result<Self, RecordError> {
                $(
                    if node_type == $node::NODE_TYPE {
                        return Ok(Self::$variant($node::from_dataset(data)));
                    }
                )*
                Err(RecordError::UnknownType(node_type.to_owned()))
            }

            /// Build a card from a persisted record, dispatching on its `type`.
            pub fn import_record(record: &Value) -> Result<Self, RecordError> {
                let record = record.as_object().ok_or(RecordError::NotAnObject)?;
                let node_type = record
                    .get("type")
                    .and_then(Value::as_str)
                    .ok_or(RecordError::MissingType)?;
                $(
                    if node_type == $node::NODE_TYPE {
                        return Ok(Self::$variant($node::import_record(record)));
                    }
                )*
                Err(RecordError::UnknownType(node_type.to_owned()))
            }

            pub fn node_type(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => $node::NODE_TYPE,)*
                }
            }

            pub fn schema(&self) -> &'static NodeSchema {
                match self {
                    $(Self::$variant(_) => $node::schema(),)*
                }
            }

            pub fn key(&self) -> NodeKey {
                match self {
                    $(Self::$variant(node) => node.key(),)*
                }
            }

            pub fn dataset(&self) -> Map<String, Value> {
                match self {
                    $(Self::$variant(node) => node.dataset(),)*
                }
            }

            pub fn export_record(&self) -> Map<String, Value> {
                match self {
                    $(Self::$variant(node) => node.export_record(),)*
                }
            }

            pub fn text_content(&self) -> String {
                match self {
                    $(Self::$variant(node) => node.text_content(),)*
                }
            }

            pub fn is_visibility_active(&self) -> bool {
                match self {
                    $(Self::$variant(node) => node.is_visibility_active(),)*
                }
            }

            pub fn has_edit_mode(&self) -> bool {
                match self {
                    $(Self::$variant(node) => node.has_edit_mode(),)*
                }
            }

            pub fn is_empty(&self) -> bool {
                match self {
                    $(Self::$variant(node) => node.is_empty(),)*
                }
            }

            pub fn has_dynamic_data(&self) -> bool {
                match self {
                    $(Self::$variant(node) => node.has_dynamic_data(),)*
                }
            }

            pub fn render(&self, options: &RenderOptions) -> RenderOutput {
                match self {
                    $(Self::$variant(node) => node.render(options),)*
                }
            }

            /// A copy with a new key.
            #[must_use]
            pub fn duplicate(&self) -> Self {
                match self {
                    $(Self::$variant(node) => Self::$variant(node.duplicate()),)*
                }
            }
        }
    };
}

card_variants! {
    Image(ImageNode),
    CodeBlock(CodeBlockNode),
    Markdown(MarkdownNode),
    Video(VideoNode),
    Audio(AudioNode),
    Callout(CalloutNode),
    CallToAction(CallToActionNode),
    HorizontalRule(HorizontalRuleNode),
    Html(HtmlNode),
    File(FileNode),
    Toggle(ToggleNode),
    Button(ButtonNode),
    Header(HeaderNode),
    Bookmark(BookmarkNode),
    Paywall(PaywallNode),
    Product(ProductNode),
    Embed(EmbedNode),
    Email(EmailNode),
    Gallery(GalleryNode),
    EmailCta(EmailCtaNode),
    Signup(SignupNode),
    Collection(CollectionNode),
}
