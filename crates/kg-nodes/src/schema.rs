//! Property schemas for node variants.
//!
//! A [`NodeSchema`] lists a variant's properties in declaration order with
//! their defaults and the metadata external passes rely on: which fields hold
//! URLs (and of what kind) for URL rewriting, and which fields count toward
//! the document word count.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigurationError;
use crate::visibility::Visibility;

/// Kind of URL-bearing content a property holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlKind {
    /// The value is a single URL.
    Url,
    /// HTML that may contain URLs.
    Html,
    /// Markdown that may contain URLs.
    Markdown,
}

impl UrlKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::Html => "html",
            Self::Markdown => "markdown",
        }
    }
}

/// One property of a node variant.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    name: &'static str,
    default: Value,
    url_kind: Option<UrlKind>,
    url_path: Option<&'static str>,
    nested_urls: Vec<(&'static str, UrlKind)>,
    word_count: bool,
    data_url: bool,
}

impl PropertyDescriptor {
    pub fn new(name: &'static str, default: Value) -> Self {
        Self {
            name,
            default,
            url_kind: None,
            url_path: None,
            nested_urls: Vec::new(),
            word_count: false,
            data_url: false,
        }
    }

    /// Mark the property as holding URLs of `kind`.
    #[must_use]
    pub fn url(mut self, kind: UrlKind) -> Self {
        self.url_kind = Some(kind);
        self
    }

    /// Where the URL lives in the exported dataset, for nested fields.
    #[must_use]
    pub fn url_path(mut self, path: &'static str) -> Self {
        self.url_path = Some(path);
        self
    }

    /// URL-bearing fields of the objects in a list-valued property.
    #[must_use]
    pub fn nested_url(mut self, field: &'static str, kind: UrlKind) -> Self {
        self.nested_urls.push((field, kind));
        self
    }

    /// Count the property toward the document word count.
    #[must_use]
    pub fn word_count(mut self) -> Self {
        self.word_count = true;
        self
    }

    /// Replace inline `data:` URLs with a placeholder in exported records.
    ///
    /// Applies at the property's `url_path` when it has one, and to every
    /// nested `url` field of list items when the property declares them.
    #[must_use]
    pub fn strip_data_url(mut self) -> Self {
        self.data_url = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn url_kind(&self) -> Option<UrlKind> {
        self.url_kind
    }

    pub fn counts_for_word_count(&self) -> bool {
        self.word_count
    }

    pub fn strips_data_url(&self) -> bool {
        self.data_url
    }

    /// Dotted record paths whose `data:` URLs are replaced on export.
    ///
    /// A segment that reaches an array applies to each of its items.
    pub fn data_url_paths(&self) -> Vec<String> {
        if !self.data_url {
            return Vec::new();
        }
        if self.nested_urls.is_empty() {
            return vec![self.url_path.unwrap_or(self.name).to_owned()];
        }
        self.nested_urls
            .iter()
            .filter(|(_, kind)| *kind == UrlKind::Url)
            .map(|(field, _)| format!("{}.{field}", self.name))
            .collect()
    }
}

/// The name of the synthetic property added by [`NodeSchemaBuilder::with_visibility`].
pub const VISIBILITY_PROPERTY: &str = "visibility";

/// Static description of a node variant.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSchema {
    node_type: &'static str,
    version: u32,
    properties: Vec<PropertyDescriptor>,
    has_visibility: bool,
}

impl NodeSchema {
    pub fn builder(node_type: &'static str) -> NodeSchemaBuilder {
        NodeSchemaBuilder {
            node_type,
            version: 1,
            properties: Vec::new(),
            has_visibility: false,
        }
    }

    pub fn node_type(&self) -> &'static str {
        self.node_type
    }

    /// Record version, bumped whenever the persisted shape changes.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Declared properties, without the synthetic visibility property.
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    pub fn has_visibility(&self) -> bool {
        self.has_visibility
    }

    /// Property name to default value, used to detect edited properties.
    ///
    /// The visibility default is built fresh on every call.
    pub fn property_defaults(&self) -> Map<String, Value> {
        let mut defaults: Map<String, Value> = self
            .properties
            .iter()
            .map(|p| (p.name.to_owned(), p.default.clone()))
            .collect();
        if self.has_visibility {
            defaults.insert(
                VISIBILITY_PROPERTY.to_owned(),
                Visibility::default().to_value(),
            );
        }
        defaults
    }

    /// Field path to URL kind for the external URL rewriting pass.
    ///
    /// Nested fields are keyed by their `url_path`; list-valued properties with
    /// nested URL fields map to an object of field name to kind.
    pub fn url_transform_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for prop in &self.properties {
            if !prop.nested_urls.is_empty() {
                let nested: Map<String, Value> = prop
                    .nested_urls
                    .iter()
                    .map(|(field, kind)| ((*field).to_owned(), Value::from(kind.as_str())))
                    .collect();
                map.insert(prop.name.to_owned(), Value::Object(nested));
            } else if let Some(kind) = prop.url_kind {
                let key = prop.url_path.unwrap_or(prop.name);
                map.insert(key.to_owned(), Value::from(kind.as_str()));
            }
        }
        map
    }
}

/// Builder for [`NodeSchema`], validated by [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct NodeSchemaBuilder {
    node_type: &'static str,
    version: u32,
    properties: Vec<PropertyDescriptor>,
    has_visibility: bool,
}

impl NodeSchemaBuilder {
    #[must_use]
    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    #[must_use]
    pub fn properties(mut self, properties: impl IntoIterator<Item = PropertyDescriptor>) -> Self {
        self.properties.extend(properties);
        self
    }

    /// Add the member visibility property.
    #[must_use]
    pub fn with_visibility(mut self) -> Self {
        self.has_visibility = true;
        self
    }

    pub fn build(self) -> Result<NodeSchema, ConfigurationError> {
        if self.node_type.is_empty() {
            return Err(ConfigurationError::EmptyNodeType);
        }

        let mut seen = HashSet::new();
        if self.has_visibility {
            seen.insert(VISIBILITY_PROPERTY);
        }
        for prop in &self.properties {
            if prop.name.is_empty() {
                return Err(ConfigurationError::EmptyPropertyName {
                    node_type: self.node_type.to_owned(),
                });
            }
            if !seen.insert(prop.name) {
                return Err(ConfigurationError::DuplicateProperty {
                    node_type: self.node_type.to_owned(),
                    name: prop.name.to_owned(),
                });
            }
            if prop.url_path.is_some() && prop.url_kind.is_none() {
                return Err(ConfigurationError::UrlPathWithoutKind {
                    node_type: self.node_type.to_owned(),
                    name: prop.name.to_owned(),
                });
            }
        }

        Ok(NodeSchema {
            node_type: self.node_type,
            version: self.version,
            properties: self.properties,
            has_visibility: self.has_visibility,
        })
    }
}

/// Whether a value is truthy under the fill rule for non-boolean defaults.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Fill one property from a dataset.
///
/// Boolean properties keep any provided value, including `false`. Every other
/// property falls back to its default when the provided value is falsy, so an
/// explicit `0` or `""` becomes the default. Values of the wrong shape also
/// fall back to the default.
pub(crate) fn fill<T>(data: &Map<String, Value>, name: &str, default: T) -> T
where
    T: Serialize + serde::de::DeserializeOwned,
{
    let provided = data.get(name);
    let chosen = if serde_json::to_value(&default).is_ok_and(|d| d.is_boolean()) {
        provided.filter(|v| !v.is_null())
    } else {
        provided.filter(|v| is_truthy(v))
    };
    chosen
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or(default)
}

/// Serialize a property value, mapping failures to `null`.
pub(crate) fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn data(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_builder_rejects_empty_type() {
        let err = NodeSchema::builder("").build().unwrap_err();
        assert_eq!(err, ConfigurationError::EmptyNodeType);
    }

    #[test]
    fn test_builder_rejects_duplicate_property() {
        let err = NodeSchema::builder("x")
            .property(PropertyDescriptor::new("a", json!("")))
            .property(PropertyDescriptor::new("a", json!(1)))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::DuplicateProperty {
                node_type: "x".to_owned(),
                name: "a".to_owned()
            }
        );
    }

    #[test]
    fn test_builder_rejects_visibility_clash() {
        let err = NodeSchema::builder("x")
            .property(PropertyDescriptor::new("visibility", json!({})))
            .with_visibility()
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateProperty { .. }));
    }

    #[test]
    fn test_builder_rejects_url_path_without_kind() {
        let err = NodeSchema::builder("x")
            .property(PropertyDescriptor::new("icon", json!("")).url_path("metadata.icon"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("icon"));
    }

    #[test]
    fn test_url_transform_map() {
        let schema = NodeSchema::builder("bookmark")
            .property(PropertyDescriptor::new("url", json!("")).url(UrlKind::Url))
            .property(
                PropertyDescriptor::new("icon", json!(""))
                    .url(UrlKind::Url)
                    .url_path("metadata.icon"),
            )
            .property(PropertyDescriptor::new("title", json!("")))
            .property(
                PropertyDescriptor::new("images", json!([]))
                    .nested_url("src", UrlKind::Url)
                    .nested_url("caption", UrlKind::Html),
            )
            .build()
            .unwrap();
        assert_eq!(
            Value::Object(schema.url_transform_map()),
            json!({
                "url": "url",
                "metadata.icon": "url",
                "images": {"src": "url", "caption": "html"}
            })
        );
    }

    #[test]
    fn test_data_url_paths() {
        let plain = PropertyDescriptor::new("src", json!("")).strip_data_url();
        assert_eq!(plain.data_url_paths(), ["src"]);

        let nested = PropertyDescriptor::new("icon", json!(""))
            .url(UrlKind::Url)
            .url_path("metadata.icon")
            .strip_data_url();
        assert_eq!(nested.data_url_paths(), ["metadata.icon"]);

        let list = PropertyDescriptor::new("images", json!([]))
            .nested_url("src", UrlKind::Url)
            .nested_url("caption", UrlKind::Html)
            .strip_data_url();
        assert_eq!(list.data_url_paths(), ["images.src"]);

        let kept = PropertyDescriptor::new("href", json!("")).url(UrlKind::Url);
        assert!(kept.data_url_paths().is_empty());
    }

    #[test]
    fn test_property_defaults_include_fresh_visibility() {
        let schema = NodeSchema::builder("html")
            .property(PropertyDescriptor::new("html", json!("")))
            .with_visibility()
            .build()
            .unwrap();
        let mut first = schema.property_defaults();
        first.insert("visibility".to_owned(), json!(null));
        let second = schema.property_defaults();
        assert_eq!(second["visibility"]["web"]["nonMember"], json!(true));
    }

    #[test]
    fn test_fill_non_boolean_falls_back_on_falsy() {
        let data = data(json!({"count": 0, "name": "", "size": 7}));
        assert_eq!(fill(&data, "count", 5_i64), 5);
        assert_eq!(fill(&data, "name", "x".to_owned()), "x");
        assert_eq!(fill(&data, "size", 1_i64), 7);
        assert_eq!(fill(&data, "missing", 3_i64), 3);
    }

    #[test]
    fn test_fill_boolean_keeps_false() {
        let data = data(json!({"on": false, "off": null}));
        assert!(!fill(&data, "on", true));
        assert!(fill(&data, "off", true));
    }

    #[test]
    fn test_fill_wrong_type_uses_default() {
        let data = data(json!({"width": "wide"}));
        assert_eq!(fill(&data, "width", Some(10_u64)), Some(10));
    }
}
