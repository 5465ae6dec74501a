//! BoxNote content nodes
//!
//! A BoxNote body is a tree of loosely typed nodes. Every node carries a
//! `type` tag, an attribute map, optional children and, for text leaves,
//! the literal text plus its inline marks.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Attribute mapping of a node or mark
pub type Attrs = serde_json::Map<String, Value>;

/// A node in the BoxNote content tree
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Node {
    /// Node type tag (e.g. "paragraph", "text", "table_cell")
    #[serde(rename = "type")]
    pub node_type: String,
    /// Node attributes
    #[serde(skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,
    /// Ordered children, absent on leaves
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<Node>>,
    /// Inline marks, only meaningful on text nodes
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
    /// Literal text of a text leaf
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// An inline formatting mark applied to a text node
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Mark {
    /// Mark type tag (e.g. "strong", "link", "font_color")
    #[serde(rename = "type")]
    pub mark_type: String,
    /// Mark attributes (e.g. `href`, `color`)
    #[serde(skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,
}

impl Node {
    /// Create a node of the given type with no attributes or children
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            ..Default::default()
        }
    }

    /// Create a text leaf
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            node_type: "text".to_string(),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Set children
    pub fn with_content(mut self, content: Vec<Node>) -> Self {
        self.content = Some(content);
        self
    }

    /// Set an attribute
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Add a mark
    pub fn with_mark(mut self, mark: Mark) -> Self {
        self.marks.push(mark);
        self
    }

    /// Build a node from an arbitrary JSON value.
    ///
    /// Never fails: anything that is not an object yields a node with an
    /// empty type, which renderers drop. Malformed `attrs`, `marks` and
    /// `text` fields are ignored individually.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let node_type = obj
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let attrs = obj
            .get("attrs")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let content = match obj.get("content") {
            Some(Value::Array(items)) => Some(items.iter().map(Node::from_value).collect()),
            _ => None,
        };

        let marks = match obj.get("marks") {
            Some(Value::Array(items)) => items.iter().filter_map(Mark::from_value).collect(),
            _ => Vec::new(),
        };

        let text = obj.get("text").and_then(Value::as_str).map(str::to_string);

        Self {
            node_type,
            attrs,
            content,
            marks,
            text,
        }
    }

    /// Children of this node, empty for leaves
    pub fn children(&self) -> &[Node] {
        self.content.as_deref().unwrap_or(&[])
    }

    /// Whether the node has a non-empty type tag
    pub fn is_typed(&self) -> bool {
        !self.node_type.is_empty()
    }

    /// Non-empty string attribute
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        attr_str(&self.attrs, key)
    }

    /// Unsigned integer attribute, accepting numbers and numeric strings
    pub fn attr_u32(&self, key: &str) -> Option<u32> {
        match self.attrs.get(key)? {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean attribute, accepting `true`/`false` and the strings "true"/"false"
    pub fn attr_bool(&self, key: &str) -> bool {
        match self.attrs.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
            _ => false,
        }
    }

    /// Concatenated text of this node and all its descendants
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in self.children() {
            child.collect_text(out);
        }
    }
}

impl Mark {
    /// Create a mark of the given type
    pub fn new(mark_type: impl Into<String>) -> Self {
        Self {
            mark_type: mark_type.into(),
            attrs: Attrs::new(),
        }
    }

    /// Set an attribute
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Build a mark from JSON; non-objects and untyped marks are skipped
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let mark_type = obj.get("type").and_then(Value::as_str)?;
        if mark_type.is_empty() {
            return None;
        }
        Some(Self {
            mark_type: mark_type.to_string(),
            attrs: obj
                .get("attrs")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
        })
    }

    /// Non-empty string attribute
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        attr_str(&self.attrs, key)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Node::from_value(&value))
    }
}

impl<'de> Deserialize<'de> for Mark {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Mark::from_value(&value).ok_or_else(|| serde::de::Error::custom("mark without a type"))
    }
}

fn attr_str<'a>(attrs: &'a Attrs, key: &str) -> Option<&'a str> {
    attrs
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_full_node() {
        let value = json!({
            "type": "paragraph",
            "attrs": {"align": "center"},
            "content": [
                {"type": "text", "text": "Hi", "marks": [{"type": "strong"}]}
            ]
        });
        let node = Node::from_value(&value);
        assert_eq!(node.node_type, "paragraph");
        assert_eq!(node.attr_str("align"), Some("center"));
        assert_eq!(node.children().len(), 1);
        assert_eq!(node.children()[0].text.as_deref(), Some("Hi"));
        assert_eq!(node.children()[0].marks[0].mark_type, "strong");
    }

    #[test]
    fn test_from_value_non_object_is_untyped() {
        let node = Node::from_value(&json!(42));
        assert!(!node.is_typed());
        assert!(node.children().is_empty());
    }

    #[test]
    fn test_malformed_fields_are_ignored() {
        let value = json!({
            "type": "text",
            "attrs": "not a map",
            "marks": ["bold", {"attrs": {}}, {"type": "em"}],
            "text": 5
        });
        let node = Node::from_value(&value);
        assert!(node.attrs.is_empty());
        assert_eq!(node.marks, vec![Mark::new("em")]);
        assert!(node.text.is_none());
    }

    #[test]
    fn test_numeric_attributes() {
        let node = Node::new("table_cell")
            .with_attr("colspan", 2)
            .with_attr("rowspan", "3")
            .with_attr("width", -1);
        assert_eq!(node.attr_u32("colspan"), Some(2));
        assert_eq!(node.attr_u32("rowspan"), Some(3));
        assert_eq!(node.attr_u32("width"), None);
        assert_eq!(node.attr_u32("missing"), None);
    }

    #[test]
    fn test_bool_attributes() {
        let node = Node::new("check_list_item")
            .with_attr("checked", true)
            .with_attr("header", "TRUE");
        assert!(node.attr_bool("checked"));
        assert!(node.attr_bool("header"));
        assert!(!node.attr_bool("other"));
    }

    #[test]
    fn test_plain_text_walks_descendants() {
        let node = Node::new("paragraph").with_content(vec![
            Node::text("Hello, "),
            Node::new("span").with_content(vec![Node::text("world")]),
        ]);
        assert_eq!(node.plain_text(), "Hello, world");
    }

    #[test]
    fn test_deserialize_via_serde() {
        let node: Node = serde_json::from_str(r#"{"type":"hard_break"}"#).unwrap();
        assert_eq!(node, Node::new("hard_break"));
    }

    #[test]
    fn test_serialize_skips_empty_fields() {
        let json = serde_json::to_string(&Node::text("x")).unwrap();
        assert_eq!(json, r#"{"type":"text","text":"x"}"#);
    }
}
