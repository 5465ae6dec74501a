//! Tag mapping table
//!
//! Static registry from BoxNote node and mark types to the HTML wrappers the
//! mapper emits. Templates may contain `{name}` placeholders; values are
//! supplied by the mapper (already escaped) or fall back to the template's
//! defaults, and unknown placeholders render as nothing.

/// Node types the mapper knows how to render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Text,
    Paragraph,
    Heading,
    BulletList,
    OrderedList,
    ListItem,
    CheckList,
    CheckListItem,
    Table,
    TableRow,
    TableCell,
    TableHeader,
    Image,
    BoxImage,
    HardBreak,
    HorizontalRule,
    Blockquote,
    CodeBlock,
}

impl NodeKind {
    /// Look up a node type tag
    pub fn from_type(node_type: &str) -> Option<Self> {
        Some(match node_type {
            "text" => NodeKind::Text,
            "paragraph" => NodeKind::Paragraph,
            "heading" => NodeKind::Heading,
            "bullet_list" => NodeKind::BulletList,
            "ordered_list" => NodeKind::OrderedList,
            "list_item" => NodeKind::ListItem,
            "check_list" => NodeKind::CheckList,
            "check_list_item" => NodeKind::CheckListItem,
            "table" => NodeKind::Table,
            "table_row" => NodeKind::TableRow,
            "table_cell" => NodeKind::TableCell,
            "table_header" => NodeKind::TableHeader,
            "image" => NodeKind::Image,
            "box_image" => NodeKind::BoxImage,
            "hard_break" => NodeKind::HardBreak,
            "horizontal_rule" => NodeKind::HorizontalRule,
            "blockquote" => NodeKind::Blockquote,
            "code_block" => NodeKind::CodeBlock,
            _ => return None,
        })
    }
}

/// Inline mark types, in nesting priority order (outermost first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkKind {
    Color,
    Bold,
    Italic,
    Underline,
    Link,
    Strike,
    Highlight,
}

impl MarkKind {
    /// Look up a mark type tag, accepting the common aliases
    pub fn from_type(mark_type: &str) -> Option<Self> {
        Some(match mark_type {
            "color" | "font_color" | "text_color" => MarkKind::Color,
            "bold" | "strong" => MarkKind::Bold,
            "italic" | "em" => MarkKind::Italic,
            "underline" => MarkKind::Underline,
            "link" => MarkKind::Link,
            "strike" | "strikethrough" => MarkKind::Strike,
            "highlight" => MarkKind::Highlight,
            _ => return None,
        })
    }

    /// Sort key; lower values wrap further out. Unranked marks share 99.
    pub fn priority(self) -> u8 {
        match self {
            MarkKind::Color => 1,
            MarkKind::Bold => 2,
            MarkKind::Italic => 3,
            MarkKind::Underline => 4,
            MarkKind::Link => 5,
            MarkKind::Strike | MarkKind::Highlight => 99,
        }
    }
}

/// Open/close template pair with placeholder defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagTemplate {
    pub open: &'static str,
    pub close: &'static str,
    pub defaults: &'static [(&'static str, &'static str)],
}

impl TagTemplate {
    const fn new(open: &'static str, close: &'static str) -> Self {
        Self {
            open,
            close,
            defaults: &[],
        }
    }

    const fn with_defaults(
        open: &'static str,
        close: &'static str,
        defaults: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self {
            open,
            close,
            defaults,
        }
    }

    /// Render the opening tag
    pub fn render_open(&self, values: &[(&str, &str)]) -> String {
        fill(self.open, values, self.defaults)
    }

    /// Render the closing tag
    pub fn render_close(&self, values: &[(&str, &str)]) -> String {
        fill(self.close, values, self.defaults)
    }

    /// Wrap already-rendered content
    pub fn wrap(&self, content: &str, values: &[(&str, &str)]) -> String {
        let mut out = self.render_open(values);
        out.push_str(content);
        out.push_str(&self.render_close(values));
        out
    }
}

static NODE_TAGS: &[(NodeKind, TagTemplate)] = &[
    (NodeKind::Paragraph, TagTemplate::new("<p{style}>", "</p>")),
    (
        NodeKind::Heading,
        TagTemplate::with_defaults("<h{level}>", "</h{level}>", &[("level", "1")]),
    ),
    (NodeKind::BulletList, TagTemplate::new("<ul>", "</ul>")),
    (NodeKind::OrderedList, TagTemplate::new("<ol>", "</ol>")),
    (NodeKind::ListItem, TagTemplate::new("<li>", "</li>")),
    (
        NodeKind::CheckList,
        TagTemplate::new("<ul class=\"checklist\">", "</ul>"),
    ),
    (
        NodeKind::CheckListItem,
        TagTemplate::with_defaults(
            "<li class=\"{state}\">",
            "</li>",
            &[("state", "unchecked")],
        ),
    ),
    (
        NodeKind::Table,
        TagTemplate::new("<table border=\"1\" cellspacing=\"0\">", "</table>"),
    ),
    (NodeKind::TableRow, TagTemplate::new("<tr>", "</tr>")),
    (NodeKind::TableCell, TagTemplate::new("<td{attrs}>", "</td>")),
    (NodeKind::TableHeader, TagTemplate::new("<th{attrs}>", "</th>")),
    (NodeKind::HardBreak, TagTemplate::new("<br>", "")),
    (NodeKind::HorizontalRule, TagTemplate::new("<hr>", "")),
    (
        NodeKind::Blockquote,
        TagTemplate::new("<blockquote>", "</blockquote>"),
    ),
    (
        NodeKind::CodeBlock,
        TagTemplate::new("<pre><code>", "</code></pre>"),
    ),
];

static MARK_TAGS: &[(MarkKind, TagTemplate)] = &[
    (
        MarkKind::Color,
        TagTemplate::new("<span style=\"color:{color}\">", "</span>"),
    ),
    (MarkKind::Bold, TagTemplate::new("<strong>", "</strong>")),
    (MarkKind::Italic, TagTemplate::new("<em>", "</em>")),
    (MarkKind::Underline, TagTemplate::new("<u>", "</u>")),
    (
        MarkKind::Link,
        TagTemplate::with_defaults("<a href=\"{href}\">", "</a>", &[("href", "#")]),
    ),
    (MarkKind::Strike, TagTemplate::new("<s>", "</s>")),
    (MarkKind::Highlight, TagTemplate::new("<mark>", "</mark>")),
];

/// Wrapper template for a node kind, if it has one
pub fn node_tag(kind: NodeKind) -> Option<&'static TagTemplate> {
    NODE_TAGS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, template)| template)
}

/// Wrapper template for a mark kind
pub fn mark_tag(kind: MarkKind) -> Option<&'static TagTemplate> {
    MARK_TAGS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, template)| template)
}

fn fill(template: &str, values: &[(&str, &str)], defaults: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        let value = lookup(values, name)
            .or_else(|| lookup(defaults, name))
            .unwrap_or_default();
        out.push_str(value);
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

fn lookup<'a>(pairs: &[(&str, &'a str)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, v)| *k == name && !v.is_empty())
        .map(|(_, v)| *v)
}
