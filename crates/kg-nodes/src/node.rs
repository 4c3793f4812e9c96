//! The node variant trait and its property macro.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::import::ImportRule;
use crate::render::{RenderOptions, RenderOutput};
use crate::schema::{NodeSchema, PropertyDescriptor, VISIBILITY_PROPERTY};
use crate::visibility::Visibility;

/// Placeholder stored instead of inline `data:` URLs.
pub const DATA_URL_PLACEHOLDER: &str = "<base64String>";

static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

/// Identity of a node within one editing session.
///
/// Keys are never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey(u64);

impl NodeKey {
    /// A key not handed out before.
    pub fn next() -> Self {
        Self(NEXT_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Property storage generated by [`card_node!`].
pub trait NodeData: Sized {
    fn schema() -> &'static NodeSchema;

    fn key(&self) -> NodeKey;

    /// Fill every property from `data`, with a fresh key.
    fn from_properties(data: &Map<String, Value>) -> Self;

    /// Property values in declaration order.
    fn properties(&self) -> Map<String, Value>;
}

/// Behaviour shared by every card variant.
///
/// Most methods have defaults driven by the schema; variants override
/// rendering and the few places where their persisted shape differs.
pub trait NodeVariant: NodeData + Clone {
    /// Build from an in-memory dataset.
    fn from_dataset(data: &Map<String, Value>) -> Self {
        Self::from_properties(data)
    }

    /// The in-memory dataset.
    fn dataset(&self) -> Map<String, Value> {
        self.properties()
    }

    /// Build from a persisted record, migrating legacy visibility first.
    fn import_record(record: &Map<String, Value>) -> Self {
        let Some(visibility) = record.get(VISIBILITY_PROPERTY).and_then(Visibility::from_value)
        else {
            return Self::from_dataset(record);
        };
        if !visibility.uses_old_format() {
            return Self::from_dataset(record);
        }
        let mut migrated = visibility;
        migrated.migrate();
        let mut data = record.clone();
        data.insert(VISIBILITY_PROPERTY.to_owned(), migrated.to_value());
        Self::from_dataset(&data)
    }

    /// The persisted record: `type`, `version` and the dataset.
    ///
    /// Inline `data:` URLs in image-like properties are replaced by
    /// [`DATA_URL_PLACEHOLDER`].
    fn export_record(&self) -> Map<String, Value> {
        let schema = Self::schema();
        let mut record = Map::new();
        record.insert("type".to_owned(), Value::from(schema.node_type()));
        record.insert("version".to_owned(), Value::from(schema.version()));
        record.extend(self.dataset());
        strip_data_urls(schema, &mut record);
        record
    }

    /// A copy of this node with a new key.
    #[must_use]
    fn duplicate(&self) -> Self {
        Self::from_dataset(&self.dataset())
    }

    /// Text counted toward the word count.
    fn text_content(&self) -> String {
        let properties = self.properties();
        let text: Vec<String> = Self::schema()
            .properties()
            .iter()
            .filter(|p| p.counts_for_word_count())
            .filter_map(|p| properties.get(p.name()))
            .map(read_text)
            .filter(|t| !t.is_empty())
            .collect();
        if text.is_empty() {
            String::new()
        } else {
            format!("{}\n\n", text.join("\n"))
        }
    }

    /// Whether member visibility restricts this node.
    fn is_visibility_active(&self) -> bool {
        if !Self::schema().has_visibility() {
            return false;
        }
        self.properties()
            .get(VISIBILITY_PROPERTY)
            .and_then(Visibility::from_value)
            .is_some_and(|visibility| visibility.is_active())
    }

    fn has_edit_mode(&self) -> bool {
        true
    }

    /// Whether the editor may drop the node as blank.
    fn is_empty(&self) -> bool {
        false
    }

    fn has_dynamic_data(&self) -> bool {
        false
    }

    fn render(&self, options: &RenderOptions) -> RenderOutput;

    /// HTML import rules claiming this variant.
    fn import_rules() -> Vec<ImportRule> {
        Vec::new()
    }
}

/// Plain text of a property value.
///
/// Strings are used as they are, numbers are stringified, and nested editor
/// states are read from their root.
/// Replace inline `data:` URLs in the properties of `schema` that ask for it.
pub(crate) fn strip_data_urls(schema: &NodeSchema, record: &mut Map<String, Value>) {
    for path in schema.properties().iter().flat_map(PropertyDescriptor::data_url_paths) {
        let segments: Vec<&str> = path.split('.').collect();
        if let Some((first, rest)) = segments.split_first()
            && let Some(value) = record.get_mut(*first)
        {
            replace_data_urls(value, rest);
        }
    }
}

/// Replace `data:` URLs at `path` below `value`, fanning out over arrays.
fn replace_data_urls(value: &mut Value, path: &[&str]) {
    match (value, path.split_first()) {
        (Value::Array(items), _) => {
            for item in items {
                replace_data_urls(item, path);
            }
        }
        (Value::Object(map), Some((first, rest))) => {
            if let Some(child) = map.get_mut(*first) {
                replace_data_urls(child, rest);
            }
        }
        (Value::String(url), None) if url.starts_with("data:") => {
            DATA_URL_PLACEHOLDER.clone_into(url);
        }
        _ => {}
    }
}

fn read_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Object(map) => map.get("root").map(nested_root_text).unwrap_or_default(),
        _ => String::new(),
    }
}

fn nested_root_text(root: &Value) -> String {
    let blocks = root.get("children").and_then(Value::as_array);
    blocks
        .map(|blocks| {
            blocks
                .iter()
                .map(inline_text)
                .collect::<Vec<_>>()
                .join("\n\n")
        })
        .unwrap_or_default()
}

fn inline_text(node: &Value) -> String {
    if node.get("type").and_then(Value::as_str) == Some("linebreak") {
        return "\n".to_owned();
    }
    if let Some(text) = node.get("text").and_then(Value::as_str) {
        return text.to_owned();
    }
    node.get("children")
        .and_then(Value::as_array)
        .map(|children| children.iter().map(inline_text).collect())
        .unwrap_or_default()
}

/// Declare a card variant's struct and its property plumbing.
///
/// Each field names its record key, type and default, optionally followed
/// by [`PropertyDescriptor`](crate::schema::PropertyDescriptor) modifiers.
/// A trailing `visibility` flag adds the member visibility property.
macro_rules! card_node {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($node_type:literal, $version:literal $(, $visibility:ident)?) {
            $(
                $(#[$field_meta:meta])*
                $field:ident as $json:literal: $ty:ty = $default:expr
                    $(=> $($modifier:ident($($arg:expr),*))+)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            pub(crate) key: $crate::node::NodeKey,
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )*
            $(pub $visibility: $crate::visibility::Visibility,)?
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    key: $crate::node::NodeKey::next(),
                    $($field: $default,)*
                    $($visibility: $crate::visibility::Visibility::default(),)?
                }
            }
        }

        impl $name {
            pub const NODE_TYPE: &'static str = $node_type;

            fn build_schema() -> Result<$crate::schema::NodeSchema, $crate::error::ConfigurationError> {
                let properties: Vec<$crate::schema::PropertyDescriptor> = vec![
                    $(
                        $crate::schema::PropertyDescriptor::new(
                            $json,
                            $crate::schema::to_json(&{ let default: $ty = $default; default }),
                        )
                        $($(.$modifier($($arg),*))+)?,
                    )*
                ];
                let builder = $crate::schema::NodeSchema::builder($node_type)
                    .version($version)
                    .properties(properties);
                $(let builder = { let _ = stringify!($visibility); builder.with_visibility() };)?
                builder.build()
            }
        }

        impl $crate::node::NodeData for $name {
            fn schema() -> &'static $crate::schema::NodeSchema {
                static SCHEMA: std::sync::LazyLock<$crate::schema::NodeSchema> =
                    std::sync::LazyLock::new(|| {
                        $name::build_schema().expect(concat!("invalid ", $node_type, " schema"))
                    });
                &SCHEMA
            }

            fn key(&self) -> $crate::node::NodeKey {
                self.key
            }

            fn from_properties(data: &serde_json::Map<String, serde_json::Value>) -> Self {
                let _ = data;
                Self {
                    key: $crate::node::NodeKey::next(),
                    $($field: $crate::schema::fill(data, $json, $default),)*
                    $($visibility: $crate::visibility::fill_visibility(data),)?
                }
            }

            fn properties(&self) -> serde_json::Map<String, serde_json::Value> {
                #[allow(unused_mut)]
                let mut map = serde_json::Map::new();
                $(map.insert($json.to_owned(), $crate::schema::to_json(&self.$field));)*
                $(map.insert(
                    $crate::schema::VISIBILITY_PROPERTY.to_owned(),
                    self.$visibility.to_value(),
                );)?
                map
            }
        }
    };
}

pub(crate) use card_node;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderOutput;
    use crate::schema::UrlKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    card_node! {
        /// A test card.
        pub struct SampleNode("sample", 2, visibility) {
            title as "title": String = String::new() => word_count(),
            src as "src": String = String::new() => url(UrlKind::Url) strip_data_url(),
            count as "count": u32 = 3 => word_count(),
            enabled as "enabled": bool = true,
            width as "width": Option<u64> = None,
        }
    }

    impl NodeVariant for SampleNode {
        fn render(&self, _options: &RenderOptions) -> RenderOutput {
            RenderOutput::element(format!("<p>{}</p>", self.title))
        }
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_defaults_fill_missing_properties() {
        let node = SampleNode::from_properties(&Map::new());
        assert_eq!(node.title, "");
        assert_eq!(node.count, 3);
        assert!(node.enabled);
        assert_eq!(node.width, None);
        assert_eq!(node.visibility, Visibility::default());
    }

    #[test]
    fn test_zero_falls_back_to_default() {
        let node = SampleNode::from_properties(&object(json!({"count": 0, "enabled": false})));
        assert_eq!(node.count, 3);
        assert!(!node.enabled);
    }

    #[test]
    fn test_schema() {
        let schema = SampleNode::schema();
        assert_eq!(schema.node_type(), "sample");
        assert_eq!(schema.version(), 2);
        assert!(schema.has_visibility());
        assert_eq!(
            Value::Object(schema.property_defaults()),
            json!({
                "title": "",
                "src": "",
                "count": 3,
                "enabled": true,
                "width": null,
                "visibility": {
                    "web": {"nonMember": true, "memberSegment": "status:free,status:-free"},
                    "email": {"memberSegment": "status:free,status:-free"}
                }
            })
        );
        assert_eq!(Value::Object(schema.url_transform_map()), json!({"src": "url"}));
    }

    #[test]
    fn test_export_record_replaces_data_urls() {
        let node = SampleNode {
            src: "data:image/png;base64,AAAA".to_owned(),
            ..SampleNode::default()
        };
        let record = node.export_record();
        assert_eq!(record["type"], json!("sample"));
        assert_eq!(record["version"], json!(2));
        assert_eq!(record["src"], json!(DATA_URL_PLACEHOLDER));
        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, ["type", "version", "title", "src", "count", "enabled", "width", "visibility"]);
    }

    #[test]
    fn test_replace_data_urls_in_nested_fields_and_lists() {
        let mut value = json!({
            "metadata": {"icon": "data:image/png;base64,AA", "title": "data:keep"},
            "images": [{"src": "data:image/gif;base64,R0"}, {"src": "/a.jpg"}]
        });
        if let Value::Object(map) = &mut value {
            replace_data_urls(&mut map["metadata"], &["icon"]);
            replace_data_urls(&mut map["images"], &["src"]);
        }
        assert_eq!(
            value,
            json!({
                "metadata": {"icon": DATA_URL_PLACEHOLDER, "title": "data:keep"},
                "images": [{"src": DATA_URL_PLACEHOLDER}, {"src": "/a.jpg"}]
            })
        );
    }

    #[test]
    fn test_import_record_migrates_visibility() {
        let node = SampleNode::import_record(&object(json!({
            "title": "Hi",
            "visibility": {"showOnWeb": false, "showOnEmail": true, "segment": "status:paid"}
        })));
        assert_eq!(node.visibility.web_segment(), "");
        assert_eq!(node.visibility.email_segment(), "status:paid");
        assert!(node.is_visibility_active());
    }

    #[test]
    fn test_text_content() {
        let node = SampleNode::from_properties(&object(json!({"title": "Hello"})));
        assert_eq!(node.text_content(), "Hello\n3\n\n");
    }

    #[test]
    fn test_text_content_reads_nested_editor_state() {
        let nested = json!({"root": {"children": [
            {"type": "paragraph", "children": [{"type": "text", "text": "One"}, {"type": "linebreak"}, {"type": "text", "text": "Two"}]},
            {"type": "paragraph", "children": [{"type": "text", "text": "Three"}]}
        ]}});
        assert_eq!(read_text(&nested), "One\nTwo\n\nThree");
    }

    #[test]
    fn test_duplicate_gets_new_key() {
        let node = SampleNode::from_properties(&object(json!({"title": "Hi"})));
        let copy = node.duplicate();
        assert_ne!(node.key(), copy.key());
        assert_eq!(node.properties(), copy.properties());
    }
}
