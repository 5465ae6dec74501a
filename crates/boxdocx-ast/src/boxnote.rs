//! BoxNote document loading
//!
//! Loading is deliberately forgiving: the expected shape is
//! `{"doc": {"content": [...]}}`, but anything else is repaired into that
//! shape, and input that is not JSON at all becomes a single paragraph of
//! literal text.

use serde_json::Value;

use crate::node::{Attrs, Node};

/// URL prefix used to key legacy `box_image` nodes by their file id
pub const BOX_FILE_URL_PREFIX: &str = "https://app.box.com/file/";

/// How the loader arrived at the document tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Input had the expected shape
    Clean,
    /// Input was JSON but had to be reshaped; carries one note per repair
    Repaired(Vec<String>),
    /// Input was not valid JSON and was wrapped as literal text
    LiteralFallback,
}

/// A loaded BoxNote document
#[derive(Debug, Clone, PartialEq)]
pub struct BoxNote {
    /// Top-level content nodes (`doc.content`)
    pub content: Vec<Node>,
    /// How the content was obtained
    pub outcome: ParseOutcome,
}

/// An image reference discovered in the tree
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSource {
    /// Lookup key used by the image mapping (URL or synthesized file URL)
    pub key: String,
    /// Original file name, when the note records one
    pub file_name: Option<String>,
    /// Box file id, when the note records one
    pub file_id: Option<String>,
    /// The image node's full attribute map
    pub attrs: Attrs,
}

impl BoxNote {
    /// Parse BoxNote text. Never fails; see [`ParseOutcome`].
    pub fn parse(input: &str) -> Self {
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);

        let value: Value = match serde_json::from_str(input) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("BoxNote is not valid JSON ({}), using literal text", e);
                return Self {
                    content: vec![literal_paragraph(input)],
                    outcome: ParseOutcome::LiteralFallback,
                };
            }
        };

        let mut repairs = Vec::new();
        let content_value = repair_shape(value, &mut repairs);
        let content = match &content_value {
            Value::Array(items) => items.iter().map(Node::from_value).collect(),
            _ => Vec::new(),
        };

        for note in &repairs {
            log::warn!("Repaired BoxNote structure: {}", note);
        }

        let outcome = if repairs.is_empty() {
            ParseOutcome::Clean
        } else {
            ParseOutcome::Repaired(repairs)
        };

        Self { content, outcome }
    }

    /// Parse raw bytes, decoding invalid UTF-8 lossily
    pub fn parse_bytes(bytes: &[u8]) -> Self {
        Self::parse(&String::from_utf8_lossy(bytes))
    }

    /// Whether the loader had to change anything
    pub fn was_repaired(&self) -> bool {
        self.outcome != ParseOutcome::Clean
    }

    /// All image references in document order
    pub fn collect_image_sources(&self) -> Vec<ImageSource> {
        let mut out = Vec::new();
        collect_images(&self.content, &mut out);
        out
    }
}

/// Check that text is a well-formed BoxNote: a JSON object with an object
/// `doc` whose `content` is a list. Unlike [`BoxNote::parse`] this performs
/// no repair.
pub fn validate_boxnote(input: &str) -> bool {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let Ok(value) = serde_json::from_str::<Value>(input) else {
        return false;
    };
    value
        .get("doc")
        .and_then(Value::as_object)
        .and_then(|doc| doc.get("content"))
        .is_some_and(Value::is_array)
}

/// Image key for a node, following the same precedence the mapper uses
pub(crate) fn image_key(node: &Node) -> Option<String> {
    match node.node_type.as_str() {
        "image" => ["src", "boxSharedLink", "url"]
            .iter()
            .find_map(|k| node.attr_str(k))
            .map(str::to_string),
        "box_image" => attr_id(node, "file_id").map(|id| format!("{}{}", BOX_FILE_URL_PREFIX, id)),
        _ => None,
    }
}

impl Node {
    /// Lookup key of an `image` or `box_image` node
    pub fn image_key(&self) -> Option<String> {
        image_key(self)
    }
}

fn attr_id(node: &Node, key: &str) -> Option<String> {
    match node.attrs.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn collect_images(nodes: &[Node], out: &mut Vec<ImageSource>) {
    for node in nodes {
        if let Some(key) = image_key(node) {
            log::debug!("Found image reference: {}", key);
            out.push(ImageSource {
                key,
                file_name: node.attr_str("fileName").map(str::to_string),
                file_id: attr_id(node, "boxFileId").or_else(|| attr_id(node, "file_id")),
                attrs: node.attrs.clone(),
            });
        }
        collect_images(node.children(), out);
    }
}

/// Reduce any JSON value to the `doc.content` array, recording each repair
fn repair_shape(value: Value, repairs: &mut Vec<String>) -> Value {
    let mut top = match value {
        Value::Object(map) => map,
        Value::Array(items) => {
            repairs.push("top-level array used as content".to_string());
            return Value::Array(items);
        }
        Value::String(s) => {
            repairs.push("top-level string wrapped as paragraph".to_string());
            return Value::Array(vec![literal_paragraph_value(&s)]);
        }
        other => {
            repairs.push(format!("top-level {} replaced by empty document", kind(&other)));
            return Value::Array(Vec::new());
        }
    };

    let doc = match top.remove("doc") {
        Some(Value::Object(doc)) => doc,
        Some(other) => {
            repairs.push(format!("`doc` was {}, not an object", kind(&other)));
            serde_json::Map::new()
        }
        None => {
            repairs.push("missing `doc`".to_string());
            // Some exports put the content at the top level
            top
        }
    };

    match doc.get("content") {
        Some(Value::Array(items)) => Value::Array(items.clone()),
        Some(Value::Object(single)) => {
            repairs.push("`content` was a single node".to_string());
            Value::Array(vec![Value::Object(single.clone())])
        }
        Some(other) => {
            repairs.push(format!("`content` was {}, not a list", kind(other)));
            Value::Array(Vec::new())
        }
        None => {
            repairs.push("missing `content`".to_string());
            Value::Array(Vec::new())
        }
    }
}

fn literal_paragraph(text: &str) -> Node {
    Node::from_value(&literal_paragraph_value(text))
}

fn literal_paragraph_value(text: &str) -> Value {
    if text.is_empty() {
        return serde_json::json!({"type": "paragraph"});
    }
    serde_json::json!({
        "type": "paragraph",
        "content": [{"type": "text", "text": text}]
    })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
