//! Error types.

/// A node schema that cannot be registered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigurationError {
    #[error("node type must not be empty")]
    EmptyNodeType,
    #[error("{node_type}: property name must not be empty")]
    EmptyPropertyName { node_type: String },
    #[error("{node_type}: duplicate property `{name}`")]
    DuplicateProperty { node_type: String, name: String },
    #[error("{node_type}: property `{name}` has a url path but no url kind")]
    UrlPathWithoutKind { node_type: String, name: String },
}

/// A persisted record that cannot be turned into a node.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum RecordError {
    #[error("record must be a JSON object")]
    NotAnObject,
    #[error("record has no `type` field")]
    MissingType,
    #[error("unknown node type `{0}`")]
    UnknownType(String),
}

/// Failure reported by a [`PostFetcher`](crate::PostFetcher).
#[derive(Debug, thiserror::Error)]
#[error("failed to fetch posts for collection `{slug}`: {message}")]
pub struct DynamicDataError {
    pub slug: String,
    pub message: String,
}

impl DynamicDataError {
    pub fn new(slug: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            message: message.into(),
        }
    }
}
