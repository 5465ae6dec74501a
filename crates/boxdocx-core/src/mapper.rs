//! BoxNote to HTML mapper
//!
//! This module walks a BoxNote content tree and produces the intermediate
//! HTML consumed by the DOCX reconstructor.
//!
//! Every node handler returns a [`NodeResult`]. A handler that cannot
//! render its node returns a [`MapWarning`]; the mapper logs it, keeps it
//! for the caller and renders the node as an empty string, so one bad node
//! never affects its siblings.
//!
//! # Example
//!
//! ```
//! use boxdocx_ast::BoxNote;
//! use boxdocx_core::HtmlMapper;
//!
//! let note = BoxNote::parse(
//!     r#"{"doc":{"content":[{"type":"paragraph","content":[{"type":"text","text":"Hi"}]}]}}"#,
//! );
//! let mut mapper = HtmlMapper::new();
//! assert_eq!(mapper.map_content(&note.content), "<p>Hi</p>");
//! ```

use std::fmt;

use boxdocx_ast::{Mark, Node};

use crate::image::ImageMapping;
use crate::stylesheet::STYLESHEET;
use crate::style::{escape_html, sanitize_color, sanitize_size};
use crate::tags::{mark_tag, node_tag, MarkKind, NodeKind};

/// Why a node rendered as nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapWarning {
    /// The node's type has no handler
    UnsupportedType(String),
    /// An image node carries no usable source attribute
    ImageWithoutSource,
    /// An image's source has no entry in the image mapping
    UnresolvedImage(String),
}

impl fmt::Display for MapWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapWarning::UnsupportedType(t) => write!(f, "Unsupported element type: {}", t),
            MapWarning::ImageWithoutSource => write!(f, "Image element found without source"),
            MapWarning::UnresolvedImage(key) => {
                write!(f, "No local file mapping found for image: {}", key)
            }
        }
    }
}

/// Outcome of rendering one node
pub type NodeResult = Result<String, MapWarning>;

/// Glyphs prefixed to checklist items
const CHECKED_GLYPH: &str = "\u{2611}";
const UNCHECKED_GLYPH: &str = "\u{2610}";

/// BoxNote to HTML mapper
#[derive(Debug, Default)]
pub struct HtmlMapper {
    images: ImageMapping,
    warnings: Vec<MapWarning>,
}

impl HtmlMapper {
    /// Create a mapper with no resolved images
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mapper that renders images found in `images`
    pub fn with_images(images: ImageMapping) -> Self {
        Self {
            images,
            warnings: Vec::new(),
        }
    }

    /// Warnings collected so far
    pub fn warnings(&self) -> &[MapWarning] {
        &self.warnings
    }

    /// Drain collected warnings
    pub fn take_warnings(&mut self) -> Vec<MapWarning> {
        std::mem::take(&mut self.warnings)
    }

    /// Map a list of nodes to an HTML fragment
    pub fn map_content(&mut self, nodes: &[Node]) -> String {
        nodes.iter().map(|node| self.map_node(node)).collect()
    }

    /// Map a list of nodes to a complete HTML document with the stylesheet
    pub fn render_document(&mut self, nodes: &[Node]) -> String {
        let body = self.map_content(nodes);
        let mut html = String::with_capacity(body.len() + STYLESHEET.len() + 128);
        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>");
        html.push_str(STYLESHEET);
        html.push_str("</style>\n</head>\n<body>\n");
        html.push_str(&body);
        html.push_str("\n</body>\n</html>\n");
        html
    }

    /// Map a single node; failures are logged and render as ""
    pub fn map_node(&mut self, node: &Node) -> String {
        match self.render_node(node) {
            Ok(html) => html,
            Err(warning) => {
                log::warn!("{}", warning);
                self.warnings.push(warning);
                String::new()
            }
        }
    }

    fn render_node(&mut self, node: &Node) -> NodeResult {
        if !node.is_typed() {
            return Ok(String::new());
        }
        let Some(kind) = NodeKind::from_type(&node.node_type) else {
            return Err(MapWarning::UnsupportedType(node.node_type.clone()));
        };

        match kind {
            NodeKind::Text => Ok(self.render_text(node)),
            NodeKind::Paragraph => {
                let style = paragraph_style(node);
                Ok(self.wrap_children(kind, node, &[("style", style.as_str())]))
            }
            NodeKind::Heading => {
                let level = node.attr_u32("level").unwrap_or(1).clamp(1, 6).to_string();
                Ok(self.wrap_children(kind, node, &[("level", level.as_str())]))
            }
            NodeKind::CheckListItem => Ok(self.render_check_item(node)),
            NodeKind::TableCell | NodeKind::TableHeader => Ok(self.render_cell(kind, node)),
            NodeKind::Image | NodeKind::BoxImage => self.render_image(node),
            NodeKind::HardBreak | NodeKind::HorizontalRule => {
                Ok(node_tag(kind).map(|t| t.render_open(&[])).unwrap_or_default())
            }
            NodeKind::BulletList
            | NodeKind::OrderedList
            | NodeKind::ListItem
            | NodeKind::CheckList
            | NodeKind::Table
            | NodeKind::TableRow
            | NodeKind::Blockquote
            | NodeKind::CodeBlock => Ok(self.wrap_children(kind, node, &[])),
        }
    }

    fn wrap_children(&mut self, kind: NodeKind, node: &Node, values: &[(&str, &str)]) -> String {
        let inner = self.map_content(node.children());
        match node_tag(kind) {
            Some(template) => template.wrap(&inner, values),
            None => inner,
        }
    }

    fn render_text(&self, node: &Node) -> String {
        let Some(text) = node.text.as_deref().filter(|t| !t.is_empty()) else {
            return String::new();
        };
        let mut html = escape_html(text);

        let mut marks: Vec<(u8, &Mark)> = node
            .marks
            .iter()
            .map(|m| {
                let rank = MarkKind::from_type(&m.mark_type).map_or(99, MarkKind::priority);
                (rank, m)
            })
            .collect();
        marks.sort_by_key(|(rank, _)| *rank);

        // Innermost first, so the highest-priority mark ends up outermost
        for (_, mark) in marks.iter().rev() {
            html = apply_mark(html, mark);
        }
        html
    }

    fn render_check_item(&mut self, node: &Node) -> String {
        let checked = node.attr_bool("checked");
        let (state, glyph) = if checked {
            ("checked", CHECKED_GLYPH)
        } else {
            ("unchecked", UNCHECKED_GLYPH)
        };
        let mut inner = format!("{} ", glyph);
        inner.push_str(&self.map_content(node.children()));
        match node_tag(NodeKind::CheckListItem) {
            Some(template) => template.wrap(&inner, &[("state", state)]),
            None => inner,
        }
    }

    fn render_cell(&mut self, kind: NodeKind, node: &Node) -> String {
        let kind = if node.attr_bool("header") {
            NodeKind::TableHeader
        } else {
            kind
        };

        let mut attrs = String::new();
        for key in ["colspan", "rowspan"] {
            if let Some(n) = node.attr_u32(key).filter(|n| *n > 1) {
                attrs.push_str(&format!(" {}=\"{}\"", key, n));
            }
        }
        let background = node
            .attr_str("background")
            .or_else(|| node.attr_str("backgroundColor"))
            .and_then(sanitize_color);
        if let Some(color) = background {
            attrs.push_str(&format!(" style=\"background-color:{}\"", color));
        }

        self.wrap_children(kind, node, &[("attrs", attrs.as_str())])
    }

    fn render_image(&self, node: &Node) -> NodeResult {
        let key = node.image_key().ok_or(MapWarning::ImageWithoutSource)?;
        let path = self
            .images
            .get(&key)
            .ok_or_else(|| MapWarning::UnresolvedImage(key.clone()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| MapWarning::UnresolvedImage(key.clone()))?;

        let mut html = format!("<img src=\"images/{}\"", escape_html(&name));
        for attr in ["alt", "title"] {
            html.push_str(&format!(
                " {}=\"{}\"",
                attr,
                escape_html(node.attr_str(attr).unwrap_or_default())
            ));
        }
        for attr in ["width", "height"] {
            let size = node.attrs.get(attr).and_then(|v| match v {
                serde_json::Value::Number(n) => sanitize_size(&n.to_string()),
                serde_json::Value::String(s) => sanitize_size(s),
                _ => None,
            });
            if let Some(px) = size {
                html.push_str(&format!(" {}=\"{}\"", attr, px));
            }
        }
        html.push_str(" />");
        log::debug!("Created img tag for {}", key);
        Ok(html)
    }
}

fn apply_mark(text: String, mark: &Mark) -> String {
    let Some(kind) = MarkKind::from_type(&mark.mark_type) else {
        return text;
    };
    let Some(template) = mark_tag(kind) else {
        return text;
    };

    match kind {
        MarkKind::Color => match mark.attr_str("color").and_then(sanitize_color) {
            Some(color) => template.wrap(&text, &[("color", color.as_str())]),
            None => text,
        },
        MarkKind::Link => {
            let href = escape_html(mark.attr_str("href").unwrap_or("#"));
            template.wrap(&text, &[("href", href.as_str())])
        }
        _ => template.wrap(&text, &[]),
    }
}

/// Inline style for a paragraph from its `align` and `indent` attributes
fn paragraph_style(node: &Node) -> String {
    let mut styles = Vec::new();
    if let Some(align) = node.attr_str("align") {
        let align = align.to_ascii_lowercase();
        if matches!(align.as_str(), "left" | "center" | "right" | "justify") {
            styles.push(format!("text-align:{}", align));
        }
    }
    if let Some(indent) = node.attr_u32("indent").filter(|n| *n > 0) {
        styles.push(format!("margin-left:{}em", indent));
    }

    if styles.is_empty() {
        String::new()
    } else {
        format!(" style=\"{}\"", styles.join(";"))
    }
}
