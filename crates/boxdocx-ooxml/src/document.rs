//! Output document model
//!
//! A flat list of body blocks plus the package resources they reference.
//! The reconstructor builds it incrementally; the writer serializes it.

use std::fs;
use std::path::Path;

use crate::error::{OoxmlError, Result};
use crate::image::{inches_to_emu, MediaPart, Picture};
use crate::relationships::Relationships;

/// The document being built
#[derive(Debug, Clone)]
pub struct Document {
    /// Body content in order
    pub blocks: Vec<Block>,
    /// Relationships of `word/document.xml`
    pub relationships: Relationships,
    /// Embedded media parts
    pub media: Vec<MediaPart>,
    /// Optional title for the core properties
    pub title: Option<String>,
    next_picture_id: u32,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document with its fixed part relationships
    pub fn new() -> Self {
        let mut relationships = Relationships::new();
        relationships.add(
            "styles.xml".to_string(),
            Relationships::TYPE_STYLES.to_string(),
        );
        relationships.add(
            "numbering.xml".to_string(),
            Relationships::TYPE_NUMBERING.to_string(),
        );
        relationships.add(
            "settings.xml".to_string(),
            Relationships::TYPE_SETTINGS.to_string(),
        );

        Self {
            blocks: Vec::new(),
            relationships,
            media: Vec::new(),
            title: None,
            next_picture_id: 1,
        }
    }

    /// Append a paragraph and return its block index
    pub fn add_paragraph(&mut self, paragraph: Paragraph) -> usize {
        self.blocks.push(Block::Paragraph(paragraph));
        self.blocks.len() - 1
    }

    /// Append a table and return its block index
    pub fn add_table(&mut self, table: Table) -> usize {
        self.blocks.push(Block::Table(table));
        self.blocks.len() - 1
    }

    /// Paragraph at a block index
    pub fn paragraph_mut(&mut self, index: usize) -> Option<&mut Paragraph> {
        match self.blocks.get_mut(index) {
            Some(Block::Paragraph(p)) => Some(p),
            _ => None,
        }
    }

    /// All top-level paragraphs
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        })
    }

    /// All tables
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            Block::Paragraph(_) => None,
        })
    }

    /// Embed an image file and return a picture sized to `width` × `height` inches
    ///
    /// The bytes are copied into a new `word/media/imageN.ext` part and an
    /// image relationship is registered for it.
    pub fn add_picture_from_file(
        &mut self,
        path: &Path,
        width: f64,
        height: f64,
        descr: &str,
    ) -> Result<Picture> {
        let data = fs::read(path)?;
        if data.is_empty() {
            return Err(OoxmlError::Image(format!("{} is empty", path.display())));
        }

        let id = self.next_picture_id;
        self.next_picture_id += 1;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_else(|| "png".to_string());
        let target = format!("media/image{}.{}", id, ext);
        let rel_id = self.relationships.add_image(&target);

        self.media.push(MediaPart {
            path: format!("word/{}", target),
            data,
        });

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Picture {}", id));

        Ok(Picture {
            id,
            rel_id,
            target,
            name,
            descr: descr.to_string(),
            width_emu: inches_to_emu(width),
            height_emu: inches_to_emu(height),
        })
    }

    /// Drop top-level paragraphs with no text and no picture
    pub fn remove_empty_paragraphs(&mut self) -> usize {
        let before = self.blocks.len();
        self.blocks.retain(|block| match block {
            Block::Paragraph(p) => !p.is_empty(),
            Block::Table(_) => true,
        });
        before - self.blocks.len()
    }
}

/// A body-level block
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

/// Paragraph alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    /// Map a CSS `text-align` value; `left` and unknown values mean default
    pub fn from_css(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "center" => Some(Alignment::Center),
            "right" => Some(Alignment::Right),
            "justify" => Some(Alignment::Justify),
            _ => None,
        }
    }

    /// Value of `w:jc`
    pub fn as_ooxml(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "both",
        }
    }
}

/// A paragraph border line
#[derive(Debug, Clone, PartialEq)]
pub struct Border {
    /// Line style (`single`, `double`, ...)
    pub style: String,
    /// Width in eighths of a point
    pub size: u32,
    /// Spacing to text in points
    pub space: u32,
    /// Hex color or `auto`
    pub color: String,
}

impl Border {
    pub fn single(size: u32, color: &str) -> Self {
        Self {
            style: "single".to_string(),
            size,
            space: 4,
            color: color.to_string(),
        }
    }
}

/// Borders on each side of a paragraph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParagraphBorders {
    pub top: Option<Border>,
    pub left: Option<Border>,
    pub bottom: Option<Border>,
    pub right: Option<Border>,
}

impl ParagraphBorders {
    /// The same border on all four sides
    pub fn all(border: Border) -> Self {
        Self {
            top: Some(border.clone()),
            left: Some(border.clone()),
            bottom: Some(border.clone()),
            right: Some(border),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_none() && self.left.is_none() && self.bottom.is_none() && self.right.is_none()
    }
}

/// Reference into `word/numbering.xml`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberingRef {
    pub num_id: u32,
    pub ilvl: u32,
}

/// A paragraph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    /// Style ID (e.g. "Heading1", "ListBullet")
    pub style_id: Option<String>,
    pub alignment: Option<Alignment>,
    /// Left indent in inches
    pub indent_left: Option<f64>,
    /// Right indent in inches
    pub indent_right: Option<f64>,
    pub borders: ParagraphBorders,
    /// Paragraph background as hex RGB
    pub shading: Option<String>,
    pub numbering: Option<NumberingRef>,
    pub children: Vec<ParagraphChild>,
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(style_id: impl Into<String>) -> Self {
        Self {
            style_id: Some(style_id.into()),
            ..Self::default()
        }
    }

    /// Append a run and return its index among the children
    pub fn add_run(&mut self, run: Run) -> usize {
        self.children.push(ParagraphChild::Run(run));
        self.children.len() - 1
    }

    /// Run at a child index
    pub fn run_mut(&mut self, index: usize) -> Option<&mut Run> {
        match self.children.get_mut(index) {
            Some(ParagraphChild::Run(r)) => Some(r),
            _ => None,
        }
    }

    /// Every run, including those inside hyperlinks
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.children.iter().flat_map(|child| match child {
            ParagraphChild::Run(r) => std::slice::from_ref(r).iter(),
            ParagraphChild::Hyperlink(h) => h.runs.iter(),
        })
    }

    /// Text content; line breaks appear as `\n`
    pub fn text(&self) -> String {
        self.runs().map(|r| r.text.as_str()).collect()
    }

    pub fn has_drawing(&self) -> bool {
        self.runs().any(|r| r.picture.is_some())
    }

    /// No text and no picture
    pub fn is_empty(&self) -> bool {
        !self.has_drawing() && self.runs().all(|r| r.text.is_empty())
    }
}

/// Inline content of a paragraph
#[derive(Debug, Clone, PartialEq)]
pub enum ParagraphChild {
    Run(Run),
    Hyperlink(Hyperlink),
}

/// Where a hyperlink points
#[derive(Debug, Clone, PartialEq)]
pub enum HyperlinkTarget {
    /// External target through a relationship ID
    Relationship(String),
    /// Bookmark inside the document
    Anchor(String),
}

/// A `w:hyperlink` wrapper
#[derive(Debug, Clone, PartialEq)]
pub struct Hyperlink {
    pub target: HyperlinkTarget,
    pub runs: Vec<Run>,
}

/// Vertical alignment of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertAlign {
    Superscript,
    Subscript,
}

impl VertAlign {
    pub fn as_ooxml(self) -> &'static str {
        match self {
            VertAlign::Superscript => "superscript",
            VertAlign::Subscript => "subscript",
        }
    }
}

/// Character formatting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunProps {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    pub vert_align: Option<VertAlign>,
    /// Highlight color name (`yellow`)
    pub highlight: Option<String>,
    /// Font color as hex RGB
    pub color: Option<String>,
    /// Run background as hex RGB
    pub shading: Option<String>,
    /// Font size in points
    pub size_pt: Option<f64>,
    pub font: Option<String>,
}

impl RunProps {
    /// Layer `other` on top of these properties
    pub fn overlay(&self, other: &RunProps) -> RunProps {
        RunProps {
            bold: self.bold || other.bold,
            italic: self.italic || other.italic,
            underline: self.underline || other.underline,
            strike: self.strike || other.strike,
            vert_align: other.vert_align.or(self.vert_align),
            highlight: other.highlight.clone().or_else(|| self.highlight.clone()),
            color: other.color.clone().or_else(|| self.color.clone()),
            shading: other.shading.clone().or_else(|| self.shading.clone()),
            size_pt: other.size_pt.or(self.size_pt),
            font: other.font.clone().or_else(|| self.font.clone()),
        }
    }
}

/// A run of uniformly formatted text, or a picture
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Run {
    /// Text; `\n` is written as a line break
    pub text: String,
    pub props: RunProps,
    pub picture: Option<Picture>,
}

impl Run {
    pub fn new(text: impl Into<String>, props: RunProps) -> Self {
        Self {
            text: text.into(),
            props,
            picture: None,
        }
    }

    pub fn picture(picture: Picture) -> Self {
        Self {
            picture: Some(picture),
            ..Self::default()
        }
    }
}

/// Vertical merge state of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VMerge {
    /// First cell of a vertical merge
    Restart,
    /// Cell continued from above
    Continue,
}

/// A table cell
#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    pub paragraphs: Vec<Paragraph>,
    /// Number of grid columns spanned
    pub grid_span: u32,
    pub v_merge: Option<VMerge>,
    /// Background as hex RGB
    pub shading: Option<String>,
    /// Swallowed by a horizontal merge to its left; not written
    pub covered: bool,
}

impl Default for TableCell {
    fn default() -> Self {
        Self {
            paragraphs: vec![Paragraph::new()],
            grid_span: 1,
            v_merge: None,
            shading: None,
            covered: false,
        }
    }
}

impl TableCell {
    /// Replace the cell content; `\n` starts a new paragraph
    pub fn set_text(&mut self, text: &str, bold: bool) {
        let props = RunProps {
            bold,
            ..RunProps::default()
        };
        self.paragraphs = text
            .split('\n')
            .map(|line| {
                let mut p = Paragraph::new();
                if !line.is_empty() {
                    p.add_run(Run::new(line, props.clone()));
                }
                p
            })
            .collect();
    }

    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A fixed-size table
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub style_id: Option<String>,
    pub rows: Vec<Vec<TableCell>>,
    /// Column count of the grid
    pub grid_cols: usize,
}

impl Table {
    /// An empty `rows` × `cols` table
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            style_id: None,
            rows: (0..rows)
                .map(|_| (0..cols).map(|_| TableCell::default()).collect())
                .collect(),
            grid_cols: cols,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&TableCell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut TableCell> {
        self.rows.get_mut(row).and_then(|r| r.get_mut(col))
    }

    /// Merge the `rowspan` × `colspan` block whose top-left is (`row`, `col`)
    ///
    /// Spans are clipped to the table bounds.
    pub fn merge(&mut self, row: usize, col: usize, rowspan: usize, colspan: usize) {
        if row >= self.rows.len() || col >= self.grid_cols {
            return;
        }
        let last_row = (row + rowspan.max(1)).min(self.rows.len());
        let last_col = (col + colspan.max(1)).min(self.grid_cols);
        let span = (last_col - col) as u32;

        for r in row..last_row {
            for c in col..last_col {
                let cell = &mut self.rows[r][c];
                if c == col {
                    cell.grid_span = span;
                    if last_row - row > 1 {
                        cell.v_merge = Some(if r == row {
                            VMerge::Restart
                        } else {
                            VMerge::Continue
                        });
                    }
                } else {
                    cell.covered = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_registers_parts() {
        let doc = Document::new();
        assert_eq!(doc.relationships.get("rId1"), Some("styles.xml"));
        assert_eq!(doc.relationships.get("rId2"), Some("numbering.xml"));
        assert_eq!(doc.relationships.get("rId3"), Some("settings.xml"));
    }

    // ==================== Paragraphs ====================

    #[test]
    fn test_paragraph_text_includes_hyperlink_runs() {
        let mut p = Paragraph::new();
        p.add_run(Run::new("see ", RunProps::default()));
        p.children.push(ParagraphChild::Hyperlink(Hyperlink {
            target: HyperlinkTarget::Relationship("rId4".to_string()),
            runs: vec![Run::new("docs", RunProps::default())],
        }));
        assert_eq!(p.text(), "see docs");
    }

    #[test]
    fn test_remove_empty_paragraphs() {
        let mut doc = Document::new();
        doc.add_paragraph(Paragraph::new());
        let mut kept = Paragraph::new();
        kept.add_run(Run::new("x", RunProps::default()));
        doc.add_paragraph(kept);
        let mut empty_run = Paragraph::new();
        empty_run.add_run(Run::new("", RunProps::default()));
        doc.add_paragraph(empty_run);
        let mut picture = Paragraph::new();
        picture.add_run(Run::picture(Picture {
            id: 1,
            rel_id: "rId9".to_string(),
            target: "media/image1.png".to_string(),
            name: "a.png".to_string(),
            descr: String::new(),
            width_emu: 1,
            height_emu: 1,
        }));
        doc.add_paragraph(picture);
        doc.add_table(Table::new(1, 1));

        assert_eq!(doc.remove_empty_paragraphs(), 2);
        assert_eq!(doc.paragraphs().count(), 2);
        assert_eq!(doc.tables().count(), 1);
    }

    #[test]
    fn test_line_break_counts_as_text() {
        let mut p = Paragraph::new();
        p.add_run(Run::new("\n", RunProps::default()));
        assert!(!p.is_empty());
    }

    #[test]
    fn test_run_props_overlay() {
        let base = RunProps {
            bold: true,
            color: Some("FF0000".to_string()),
            ..RunProps::default()
        };
        let top = RunProps {
            italic: true,
            color: Some("00FF00".to_string()),
            ..RunProps::default()
        };
        let merged = base.overlay(&top);
        assert!(merged.bold && merged.italic);
        assert_eq!(merged.color.as_deref(), Some("00FF00"));
    }

    #[test]
    fn test_alignment_from_css() {
        assert_eq!(Alignment::from_css(" Center "), Some(Alignment::Center));
        assert_eq!(Alignment::from_css("justify").map(Alignment::as_ooxml), Some("both"));
        assert_eq!(Alignment::from_css("left"), None);
    }

    // ==================== Tables ====================

    #[test]
    fn test_cell_set_text() {
        let mut cell = TableCell::default();
        cell.set_text("Name\nRole", true);
        assert_eq!(cell.paragraphs.len(), 2);
        assert_eq!(cell.text(), "Name\nRole");
        assert!(cell.paragraphs[0].runs().all(|r| r.props.bold));
    }

    #[test]
    fn test_horizontal_merge() {
        let mut table = Table::new(2, 3);
        table.merge(0, 0, 1, 2);
        let first = table.cell(0, 0).unwrap();
        assert_eq!(first.grid_span, 2);
        assert!(table.cell(0, 1).unwrap().covered);
        assert!(!table.cell(0, 2).unwrap().covered);
        assert_eq!(first.v_merge, None);
    }

    #[test]
    fn test_vertical_merge() {
        let mut table = Table::new(3, 2);
        table.merge(0, 1, 2, 1);
        assert_eq!(table.cell(0, 1).unwrap().v_merge, Some(VMerge::Restart));
        assert_eq!(table.cell(1, 1).unwrap().v_merge, Some(VMerge::Continue));
        assert_eq!(table.cell(2, 1).unwrap().v_merge, None);
    }

    #[test]
    fn test_merge_is_clipped() {
        let mut table = Table::new(2, 2);
        table.merge(1, 1, 5, 5);
        assert_eq!(table.cell(1, 1).unwrap().grid_span, 1);
        assert_eq!(table.cell(1, 1).unwrap().v_merge, None);
    }
}
