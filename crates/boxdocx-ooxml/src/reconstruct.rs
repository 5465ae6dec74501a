//! HTML to DOCX reconstruction
//!
//! A single left-to-right pass over the tag stream produced by
//! [`quick_xml::Reader`]. There is no DOM: start tags, end tags and text
//! drive a small state machine that appends paragraphs, runs, tables and
//! pictures to a [`Document`].
//!
//! Tables are the exception to purely incremental output. Their rows and
//! cells are buffered until `</table>` because the output table needs its
//! dimensions up front.
//!
//! # Example
//!
//! ```
//! use boxdocx_ooxml::{HtmlReconstructor, ReconstructOptions};
//!
//! let mut reconstructor = HtmlReconstructor::new(ReconstructOptions::default());
//! let doc = reconstructor
//!     .reconstruct("<html><body><p>Hello <strong>world</strong></p></body></html>")
//!     .unwrap();
//! assert_eq!(doc.paragraphs().next().unwrap().text(), "Hello world");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Reader;

use boxdocx_core::style::{color_to_hex, parse_style_string, sanitize_size, Length};

use crate::document::{
    Alignment, Border, Document, Hyperlink, HyperlinkTarget, NumberingRef, Paragraph,
    ParagraphBorders, ParagraphChild, Run, RunProps, Table, VertAlign,
};
use crate::error::{OoxmlError, Result};
use crate::image::{fit_size, natural_size, Picture};
use crate::numbering::{NUM_BULLET, NUM_DECIMAL};
use crate::options::ReconstructOptions;
use crate::styles::{StyleSheet, StyleType};

const BLOCKQUOTE_BORDER_COLOR: &str = "CCCCCC";
const LINK_COLOR: &str = "0000EE";
const CODE_SHADING: &str = "F0F0F0";
const CODE_SIZE_PT: f64 = 10.0;
const FALLBACK_TABLE_STYLE: &str = "TableGrid";

/// A recoverable problem met while reconstructing
#[derive(Debug, Clone, PartialEq)]
pub enum ReconstructWarning {
    /// `<img>` without a usable `src`
    ImageWithoutSource,
    /// Remote image URLs are never fetched
    RemoteImage(String),
    /// Image file not found under the assets directory
    MissingImage(PathBuf),
    /// Image file that could not be read or measured
    InvalidImage(String),
    /// Link kept as plain text
    InvalidHyperlink(String),
    /// Configured table style missing from the style sheet
    UnknownTableStyle(String),
    /// Tokenizer error; parsing resumed after it
    MalformedHtml(String),
}

impl fmt::Display for ReconstructWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImageWithoutSource => write!(f, "image tag without src skipped"),
            Self::RemoteImage(src) => write!(f, "remote image not embedded: {}", src),
            Self::MissingImage(path) => write!(f, "image file not found: {}", path.display()),
            Self::InvalidImage(msg) => write!(f, "image not embedded: {}", msg),
            Self::InvalidHyperlink(href) => {
                write!(f, "hyperlink {:?} kept as plain text", href)
            }
            Self::UnknownTableStyle(style) => {
                write!(f, "table style {:?} not defined, using {}", style, FALLBACK_TABLE_STYLE)
            }
            Self::MalformedHtml(msg) => write!(f, "malformed HTML: {}", msg),
        }
    }
}

/// Converts HTML into a [`Document`]
pub struct HtmlReconstructor {
    options: ReconstructOptions,
    assets_dir: PathBuf,
    table_style: String,
    warnings: Vec<ReconstructWarning>,
}

impl HtmlReconstructor {
    /// Create a reconstructor resolving images against the current directory
    pub fn new(options: ReconstructOptions) -> Self {
        let mut warnings = Vec::new();
        let styles = StyleSheet::builtin(&options);
        let table_style = if styles.has_style_of_type(&options.table_style, StyleType::Table) {
            options.table_style.clone()
        } else {
            let warning = ReconstructWarning::UnknownTableStyle(options.table_style.clone());
            warn!("{}", warning);
            warnings.push(warning);
            FALLBACK_TABLE_STYLE.to_string()
        };

        Self {
            options,
            assets_dir: PathBuf::from("."),
            table_style,
            warnings,
        }
    }

    /// Resolve `<img src>` relative to `dir`
    pub fn with_assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.assets_dir = dir.into();
        self
    }

    pub fn options(&self) -> &ReconstructOptions {
        &self.options
    }

    /// Warnings collected so far
    pub fn warnings(&self) -> &[ReconstructWarning] {
        &self.warnings
    }

    /// Take and clear the collected warnings
    pub fn take_warnings(&mut self) -> Vec<ReconstructWarning> {
        std::mem::take(&mut self.warnings)
    }

    /// Reconstruct a complete HTML document
    ///
    /// Fails with [`OoxmlError::MissingBody`] when no `<body>` is opened.
    pub fn reconstruct(&mut self, html: &str) -> Result<Document> {
        let (doc, seen_body) = self.run(html);
        if !seen_body {
            return Err(OoxmlError::MissingBody);
        }
        Ok(doc)
    }

    /// Reconstruct an HTML fragment that has no `<body>`
    pub fn reconstruct_fragment(&mut self, html: &str) -> Document {
        self.run(html).0
    }

    fn run(&mut self, html: &str) -> (Document, bool) {
        let mut state = State::new(&self.options, &self.assets_dir, &self.table_style);
        state.feed(html);
        let seen_body = state.seen_body;
        let (doc, warnings) = state.finish();
        self.warnings.extend(warnings);
        (doc, seen_body)
    }
}

// ==================== Tags ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Bullet,
    Ordered,
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Body,
    Skip,
    Block,
    Heading(u8),
    List(ListKind),
    ListItem,
    Blockquote,
    Pre,
    Format,
    Break,
    Rule,
    Link,
    Image,
    Table,
    Row,
    Cell { header: bool },
    Ignored,
}

impl Tag {
    fn classify(name: &str, attrs: &Attrs) -> Tag {
        match name {
            "body" => Tag::Body,
            "head" | "style" | "script" | "title" => Tag::Skip,
            "p" | "div" => Tag::Block,
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Tag::Heading(name.as_bytes()[1] - b'0'),
            "ul" if attr_has_class(attrs, "checklist") => Tag::List(ListKind::Check),
            "ul" => Tag::List(ListKind::Bullet),
            "ol" => Tag::List(ListKind::Ordered),
            "li" => Tag::ListItem,
            "blockquote" => Tag::Blockquote,
            "pre" => Tag::Pre,
            "strong" | "b" | "em" | "i" | "u" | "ins" | "s" | "strike" | "del" | "sup"
            | "sub" | "mark" | "code" | "span" => Tag::Format,
            "br" => Tag::Break,
            "hr" => Tag::Rule,
            "a" => Tag::Link,
            "img" => Tag::Image,
            "table" => Tag::Table,
            "tr" => Tag::Row,
            "td" => Tag::Cell { header: false },
            "th" => Tag::Cell { header: true },
            _ => Tag::Ignored,
        }
    }

    /// Tags that never have content or an end tag
    fn is_void(name: &str) -> bool {
        matches!(
            name,
            "br" | "img" | "hr" | "meta" | "link" | "input" | "col" | "wbr" | "area" | "base"
        )
    }
}

type Attrs = HashMap<String, String>;

fn attr_has_class(attrs: &Attrs, class: &str) -> bool {
    attrs
        .get("class")
        .map(|c| c.split_whitespace().any(|c| c == class))
        .unwrap_or(false)
}

/// Run formatting implied by an inline tag
fn format_props(name: &str, attrs: &Attrs, options: &ReconstructOptions) -> RunProps {
    let mut props = match name {
        "strong" | "b" => RunProps {
            bold: true,
            ..RunProps::default()
        },
        "em" | "i" => RunProps {
            italic: true,
            ..RunProps::default()
        },
        "u" | "ins" => RunProps {
            underline: true,
            ..RunProps::default()
        },
        "s" | "strike" | "del" => RunProps {
            strike: true,
            ..RunProps::default()
        },
        "sup" => RunProps {
            vert_align: Some(VertAlign::Superscript),
            ..RunProps::default()
        },
        "sub" => RunProps {
            vert_align: Some(VertAlign::Subscript),
            ..RunProps::default()
        },
        "mark" => RunProps {
            highlight: Some("yellow".to_string()),
            ..RunProps::default()
        },
        "code" => RunProps {
            font: Some(options.code_font.clone()),
            ..RunProps::default()
        },
        _ => RunProps::default(),
    };
    if let Some(style) = attrs.get("style") {
        props = props.overlay(&style_run_props(style));
    }
    props
}

/// Run formatting from an inline `style` attribute
fn style_run_props(style: &str) -> RunProps {
    let styles = parse_style_string(style);
    let mut props = RunProps::default();

    if let Some(color) = styles.get("color") {
        props.color = color_to_hex(color);
        if props.color.is_none() {
            debug!("Ignoring color {:?}", color);
        }
    }
    if let Some(background) = styles.get("background-color") {
        props.shading = color_to_hex(background);
    }
    if let Some(size) = styles.get("font-size") {
        props.size_pt = Length::parse(size)
            .map(Length::to_points)
            .filter(|pt| *pt > 0.0 && *pt <= 1638.0);
    }
    match styles.get("font-weight").map(String::as_str) {
        Some("bold") | Some("bolder") | Some("600") | Some("700") | Some("800") | Some("900") => {
            props.bold = true
        }
        _ => {}
    }
    if styles.get("font-style").map(String::as_str) == Some("italic") {
        props.italic = true;
    }
    if let Some(decoration) = styles.get("text-decoration") {
        props.underline = decoration.contains("underline");
        props.strike = decoration.contains("line-through");
    }
    props
}

// ==================== Tables ====================

#[derive(Debug, Default)]
struct CellBuf {
    text: String,
    is_header: bool,
    colspan: usize,
    rowspan: usize,
    shading: Option<String>,
}

/// Rows and cells of a table seen so far
#[derive(Debug, Default)]
struct TableBuilder {
    rows: Vec<Vec<CellBuf>>,
    row_open: bool,
    cell: Option<CellBuf>,
}

impl TableBuilder {
    fn start_row(&mut self) {
        self.end_row();
        self.rows.push(Vec::new());
        self.row_open = true;
    }

    fn end_row(&mut self) {
        self.end_cell();
        self.row_open = false;
    }

    fn start_cell(&mut self, cell: CellBuf) {
        self.end_cell();
        if !self.row_open {
            self.start_row();
        }
        self.cell = Some(cell);
    }

    fn end_cell(&mut self) {
        if let Some(mut cell) = self.cell.take() {
            cell.text = cell.text.trim().to_string();
            if let Some(row) = self.rows.last_mut() {
                row.push(cell);
            }
        }
    }

    fn in_cell(&self) -> bool {
        self.cell.is_some()
    }

    fn push_text(&mut self, text: &str) {
        if let Some(cell) = self.cell.as_mut() {
            if cell.text.is_empty() || cell.text.ends_with('\n') {
                cell.text.push_str(text.trim_start());
            } else {
                cell.text.push_str(text);
            }
        }
    }

    /// Start a new line in the open cell unless it is empty or already broken
    fn push_break(&mut self) {
        if let Some(cell) = self.cell.as_mut() {
            let trimmed = cell.text.trim_end_matches(' ').len();
            cell.text.truncate(trimmed);
            if !cell.text.is_empty() && !cell.text.ends_with('\n') {
                cell.text.push('\n');
            }
        }
    }

    fn push_separator(&mut self) {
        if let Some(cell) = self.cell.as_mut() {
            if !cell.text.is_empty() && !cell.text.ends_with(char::is_whitespace) {
                cell.text.push(' ');
            }
        }
    }

    /// Lay the buffered cells out on a grid and build the table
    ///
    /// Returns `None` when there are no rows or no columns.
    fn build(mut self, style: &str) -> Option<Table> {
        self.end_row();
        let rows: Vec<Vec<CellBuf>> = self.rows.into_iter().filter(|r| !r.is_empty()).collect();
        let row_count = rows.len();
        if row_count == 0 {
            return None;
        }

        // Place cells left to right, skipping slots taken by earlier rowspans
        let mut occupied: Vec<Vec<bool>> = vec![Vec::new(); row_count];
        let mut placed: Vec<(usize, usize, CellBuf)> = Vec::new();
        let mut col_count = 0;

        for (r, row) in rows.into_iter().enumerate() {
            let mut c = 0;
            for cell in row {
                while occupied[r].get(c).copied().unwrap_or(false) {
                    c += 1;
                }
                let colspan = cell.colspan.max(1);
                let rowspan = cell.rowspan.max(1).min(row_count - r);
                for slots in occupied.iter_mut().skip(r).take(rowspan) {
                    if slots.len() < c + colspan {
                        slots.resize(c + colspan, false);
                    }
                    for slot in &mut slots[c..c + colspan] {
                        *slot = true;
                    }
                }
                col_count = col_count.max(c + colspan);
                placed.push((r, c, CellBuf { rowspan, ..cell }));
                c += colspan;
            }
        }

        if col_count == 0 {
            return None;
        }

        let mut table = Table::new(row_count, col_count);
        table.style_id = Some(style.to_string());
        for (r, c, cell) in placed {
            if let Some(target) = table.cell_mut(r, c) {
                target.set_text(&cell.text, cell.is_header);
                target.shading = cell.shading;
            }
            if cell.colspan > 1 || cell.rowspan > 1 {
                table.merge(r, c, cell.rowspan, cell.colspan.max(1));
            }
        }
        Some(table)
    }
}

// ==================== State ====================

/// An inline formatting element that is still open
#[derive(Debug)]
struct FormatFrame {
    tag: String,
    props: RunProps,
}

#[derive(Debug)]
struct PendingLink {
    href: String,
    text: String,
    props: RunProps,
}

/// Everything one conversion carries between events
struct State<'a> {
    options: &'a ReconstructOptions,
    assets_dir: &'a Path,
    table_style: &'a str,
    doc: Document,
    warnings: Vec<ReconstructWarning>,
    /// Block index of the open paragraph
    paragraph: Option<usize>,
    /// Child index of the run text is appended to
    run: Option<usize>,
    formats: Vec<FormatFrame>,
    lists: Vec<ListKind>,
    /// The open paragraph was started by `<li>` and has no content yet
    li_pending: bool,
    table: Option<TableBuilder>,
    table_depth: usize,
    deferred_pictures: Vec<Picture>,
    blockquote_depth: usize,
    pre_depth: usize,
    skip: Option<(String, usize)>,
    link: Option<PendingLink>,
    in_title: bool,
    seen_body: bool,
}

impl<'a> State<'a> {
    fn new(options: &'a ReconstructOptions, assets_dir: &'a Path, table_style: &'a str) -> Self {
        Self {
            options,
            assets_dir,
            table_style,
            doc: Document::new(),
            warnings: Vec::new(),
            paragraph: None,
            run: None,
            formats: Vec::new(),
            lists: Vec::new(),
            li_pending: false,
            table: None,
            table_depth: 0,
            deferred_pictures: Vec::new(),
            blockquote_depth: 0,
            pre_depth: 0,
            skip: None,
            link: None,
            in_title: false,
            seen_body: false,
        }
    }

    fn warn(&mut self, warning: ReconstructWarning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    fn feed(&mut self, html: &str) {
        let mut offset = 0;
        while offset < html.len() {
            match self.feed_from(html, offset) {
                Some(resume) => offset = resume,
                None => break,
            }
        }
    }

    /// Read events from `html[offset..]`
    ///
    /// Returns the offset to resume from when a `<` turned out to be text
    /// rather than markup. The `<` itself is emitted as text first.
    fn feed_from(&mut self, html: &str, offset: usize) -> Option<usize> {
        let input = &html[offset..];
        let mut reader = Reader::from_str(input);
        let config = reader.config_mut();
        config.trim_text(false);
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        config.check_comments = false;

        let mut last_error_at = None;
        loop {
            let event_start = reader.buffer_position() as usize;
            match reader.read_event() {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                    if !starts_with_tag_name(e) && input[event_start..].starts_with('<') =>
                {
                    debug!("Stray '<' at byte {} kept as text", offset + event_start);
                    return Some(self.stray_angle(offset + event_start));
                }
                Ok(Event::Start(ref e)) => {
                    let (name, attrs) = tag_parts(e);
                    self.handle_start(&name, &attrs);
                }
                Ok(Event::Empty(ref e)) => {
                    let (name, attrs) = tag_parts(e);
                    self.handle_start(&name, &attrs);
                    if !Tag::is_void(&name) {
                        self.handle_end(&name);
                    }
                }
                Ok(Event::End(ref e)) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).to_ascii_lowercase();
                    self.handle_end(&name);
                }
                Ok(Event::Text(ref e)) => {
                    let text = decode_text(e);
                    self.handle_text(&text);
                }
                Ok(Event::CData(ref e)) => {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    self.handle_text(&text);
                }
                Ok(Event::Eof) => return None,
                Ok(_) => {}
                Err(e) => {
                    let at = reader.error_position() as usize;
                    if input.get(at..).is_some_and(|rest| rest.starts_with('<')) {
                        self.warn(ReconstructWarning::MalformedHtml(format!(
                            "{} (byte {} kept as text)",
                            e,
                            offset + at
                        )));
                        return Some(self.stray_angle(offset + at));
                    }
                    let position = reader.buffer_position();
                    if last_error_at == Some(position) {
                        self.warn(ReconstructWarning::MalformedHtml(format!(
                            "{} (stopped at byte {})",
                            e,
                            offset as u64 + position
                        )));
                        return None;
                    }
                    last_error_at = Some(position);
                    self.warn(ReconstructWarning::MalformedHtml(e.to_string()));
                }
            }
        }
    }

    /// Emit the `<` at `at` as text and return where reading resumes
    fn stray_angle(&mut self, at: usize) -> usize {
        self.handle_text("<");
        at + 1
    }

    fn finish(mut self) -> (Document, Vec<ReconstructWarning>) {
        self.close_paragraph();
        if self.table.is_some() {
            debug!("Flushing unterminated table");
            self.finish_table();
        }
        let removed = self.doc.remove_empty_paragraphs();
        debug!("Removed {} empty paragraphs", removed);
        (self.doc, self.warnings)
    }

    // ==================== Events ====================

    fn handle_start(&mut self, name: &str, attrs: &Attrs) {
        if name == "title" {
            self.in_title = true;
        }
        if let Some((skip_tag, depth)) = self.skip.as_mut() {
            if skip_tag == name {
                *depth += 1;
            }
            return;
        }

        let tag = Tag::classify(name, attrs);
        if self.table.is_some() {
            self.handle_table_start(name, tag, attrs);
            return;
        }

        match tag {
            Tag::Body => self.seen_body = true,
            Tag::Skip => self.skip = Some((name.to_string(), 1)),
            Tag::Block => self.start_block(name, attrs),
            Tag::Heading(level) => {
                self.close_paragraph();
                self.open_paragraph(Paragraph::with_style(format!("Heading{}", level)));
                self.push_format(name, style_attr_props(attrs));
            }
            Tag::List(kind) => {
                self.close_paragraph();
                self.lists.push(kind);
            }
            Tag::ListItem => self.start_list_item(),
            Tag::Blockquote => {
                self.close_paragraph();
                self.blockquote_depth += 1;
            }
            Tag::Pre => {
                self.close_paragraph();
                self.pre_depth += 1;
                let props = RunProps {
                    font: Some(self.options.code_font.clone()),
                    size_pt: Some(CODE_SIZE_PT),
                    ..RunProps::default()
                };
                self.push_format(name, props);
            }
            Tag::Format => {
                let props = format_props(name, attrs, self.options);
                self.push_format(name, props);
            }
            Tag::Break => self.line_break(),
            Tag::Rule => self.close_paragraph(),
            Tag::Link => self.start_link(attrs),
            Tag::Image => self.handle_image(attrs),
            Tag::Table => {
                self.close_paragraph();
                self.table = Some(TableBuilder::default());
                self.table_depth = 1;
            }
            Tag::Row | Tag::Cell { .. } => {
                debug!("<{}> outside a table ignored", name);
            }
            Tag::Ignored => {}
        }
    }

    fn handle_end(&mut self, name: &str) {
        if name == "title" {
            self.in_title = false;
        }
        if let Some((skip_tag, depth)) = self.skip.as_mut() {
            if skip_tag == name {
                *depth -= 1;
                if *depth == 0 {
                    self.skip = None;
                }
            }
            return;
        }

        if self.table.is_some() {
            self.handle_table_end(name);
            return;
        }

        match Tag::classify(name, &Attrs::new()) {
            Tag::Block => {
                self.pop_format(name);
                self.close_paragraph();
            }
            Tag::Heading(_) => {
                self.pop_format(name);
                self.close_paragraph();
            }
            Tag::List(_) => {
                self.close_paragraph();
                self.lists.pop();
            }
            Tag::ListItem => self.close_paragraph(),
            Tag::Blockquote => {
                self.close_paragraph();
                self.blockquote_depth = self.blockquote_depth.saturating_sub(1);
            }
            Tag::Pre => {
                self.pop_format(name);
                self.close_paragraph();
                self.pre_depth = self.pre_depth.saturating_sub(1);
            }
            Tag::Format => self.pop_format(name),
            Tag::Link => self.finish_link(),
            _ => {}
        }
    }

    fn handle_text(&mut self, raw: &str) {
        if self.skip.is_some() {
            if self.in_title {
                let title = raw.trim();
                if !title.is_empty() {
                    self.doc.title = Some(title.to_string());
                }
            }
            return;
        }

        let text = if self.pre_depth > 0 {
            raw.replace("\r\n", "\n").replace('\r', "\n")
        } else {
            collapse_whitespace(raw)
        };

        if let Some(table) = self.table.as_mut() {
            if table.in_cell() {
                table.push_text(&text);
            }
            return;
        }

        if let Some(link) = self.link.as_mut() {
            link.text.push_str(&text);
            return;
        }

        let at_paragraph_start = self.current_paragraph_text_is_empty();
        let text = if self.pre_depth > 0 {
            if at_paragraph_start {
                text.strip_prefix('\n').unwrap_or(&text).to_string()
            } else {
                text
            }
        } else if at_paragraph_start {
            text.trim_start().to_string()
        } else {
            text
        };
        if text.is_empty() {
            return;
        }

        self.append_text(&text);
    }

    // ==================== Paragraphs ====================

    fn current_paragraph_text_is_empty(&mut self) -> bool {
        match self.paragraph {
            Some(index) => self
                .doc
                .paragraph_mut(index)
                .map(|p| p.runs().all(|r| r.text.is_empty() && r.picture.is_none()))
                .unwrap_or(true),
            None => true,
        }
    }

    /// Add `paragraph` with the enclosing blockquote/pre decoration and make it current
    fn open_paragraph(&mut self, mut paragraph: Paragraph) -> usize {
        if self.blockquote_depth > 0 {
            let indent = self.options.clamp_indent(self.options.blockquote_indent);
            paragraph.indent_left.get_or_insert(indent);
            paragraph.indent_right.get_or_insert(indent);
            paragraph.borders.left = Some(Border::single(24, BLOCKQUOTE_BORDER_COLOR));
        }
        if self.pre_depth > 0 {
            paragraph.borders = ParagraphBorders::all(Border::single(4, "auto"));
            paragraph.shading = Some(CODE_SHADING.to_string());
        }

        let index = self.doc.add_paragraph(paragraph);
        self.paragraph = Some(index);
        self.run = None;
        self.li_pending = false;
        index
    }

    fn ensure_paragraph(&mut self) -> usize {
        match self.paragraph {
            Some(index) => index,
            None => self.open_paragraph(Paragraph::new()),
        }
    }

    fn close_paragraph(&mut self) {
        self.finish_link();
        self.paragraph = None;
        self.run = None;
        self.li_pending = false;
    }

    fn start_block(&mut self, name: &str, attrs: &Attrs) {
        let index = if self.li_pending && self.paragraph.is_some() {
            self.li_pending = false;
            self.ensure_paragraph()
        } else {
            self.close_paragraph();
            self.open_paragraph(Paragraph::new())
        };

        if let Some(style) = attrs.get("style") {
            let styles = parse_style_string(style);
            let max_indent = self.options.max_indent;
            if let Some(paragraph) = self.doc.paragraph_mut(index) {
                if let Some(align) = styles.get("text-align") {
                    paragraph.alignment = Alignment::from_css(align);
                }
                if let Some(margin) = styles.get("margin-left") {
                    match Length::parse(margin).map(Length::to_inches) {
                        Some(inches) if inches > 0.0 => {
                            paragraph.indent_left = Some(inches.min(max_indent));
                        }
                        _ => debug!("Ignoring margin-left {:?}", margin),
                    }
                }
            }
        }
        self.push_format(name, style_attr_props(attrs));
    }

    fn start_list_item(&mut self) {
        self.close_paragraph();
        let depth = self.lists.len().max(1);
        let kind = self.lists.last().copied().unwrap_or(ListKind::Bullet);

        let mut paragraph = match kind {
            ListKind::Bullet => Paragraph::with_style("ListBullet"),
            ListKind::Ordered => Paragraph::with_style("ListNumber"),
            ListKind::Check => Paragraph::new(),
        };
        paragraph.indent_left = Some(
            self.options
                .clamp_indent(depth as f64 * self.options.list_indent),
        );
        paragraph.numbering = match kind {
            ListKind::Bullet => Some(NumberingRef {
                num_id: NUM_BULLET,
                ilvl: (depth - 1).min(8) as u32,
            }),
            ListKind::Ordered => Some(NumberingRef {
                num_id: NUM_DECIMAL,
                ilvl: (depth - 1).min(8) as u32,
            }),
            ListKind::Check => None,
        };

        self.open_paragraph(paragraph);
        self.li_pending = true;
    }

    // ==================== Runs ====================

    fn push_format(&mut self, tag: &str, props: RunProps) {
        self.formats.push(FormatFrame {
            tag: tag.to_string(),
            props,
        });
        self.run = None;
    }

    fn pop_format(&mut self, tag: &str) {
        match self.formats.iter().rposition(|f| f.tag == tag) {
            Some(pos) => {
                self.formats.remove(pos);
            }
            None => debug!("Unmatched </{}> ignored", tag),
        }
        self.run = None;
    }

    fn effective_props(&self) -> RunProps {
        self.formats
            .iter()
            .fold(RunProps::default(), |acc, frame| acc.overlay(&frame.props))
    }

    fn append_text(&mut self, text: &str) {
        let index = self.ensure_paragraph();
        self.li_pending = false;
        let props = self.effective_props();
        let run = self.run;

        let Some(paragraph) = self.doc.paragraph_mut(index) else {
            return;
        };
        match run.and_then(|i| paragraph.run_mut(i)) {
            Some(run) => run.text.push_str(text),
            None => {
                self.run = Some(paragraph.add_run(Run::new(text, props)));
            }
        }
    }

    fn line_break(&mut self) {
        if let Some(table) = self.table.as_mut() {
            table.push_break();
            return;
        }
        if let Some(link) = self.link.as_mut() {
            link.text.push('\n');
            return;
        }
        self.append_text("\n");
    }

    // ==================== Links ====================

    fn start_link(&mut self, attrs: &Attrs) {
        self.finish_link();
        self.link = Some(PendingLink {
            href: attrs.get("href").cloned().unwrap_or_default(),
            text: String::new(),
            props: self.effective_props(),
        });
    }

    fn finish_link(&mut self) {
        let Some(link) = self.link.take() else {
            return;
        };
        if link.text.is_empty() {
            return;
        }

        let href = link.href.trim();
        let target = match href.strip_prefix('#') {
            Some(anchor) if !anchor.is_empty() => Ok(HyperlinkTarget::Anchor(anchor.to_string())),
            _ => self
                .doc
                .relationships
                .add_hyperlink(href)
                .map(HyperlinkTarget::Relationship),
        };

        let index = self.ensure_paragraph();
        let child = match target {
            Ok(target) => {
                let props = link.props.overlay(&RunProps {
                    color: Some(LINK_COLOR.to_string()),
                    underline: true,
                    ..RunProps::default()
                });
                ParagraphChild::Hyperlink(Hyperlink {
                    target,
                    runs: vec![Run::new(link.text, props)],
                })
            }
            Err(e) => {
                self.warn(ReconstructWarning::InvalidHyperlink(link.href.clone()));
                debug!("{}", e);
                ParagraphChild::Run(Run::new(link.text, link.props))
            }
        };

        if let Some(paragraph) = self.doc.paragraph_mut(index) {
            paragraph.children.push(child);
        }
        self.run = None;
    }

    // ==================== Images ====================

    fn handle_image(&mut self, attrs: &Attrs) {
        let src = attrs.get("src").map(|s| s.trim()).unwrap_or_default();
        if src.is_empty() {
            self.warn(ReconstructWarning::ImageWithoutSource);
            return;
        }
        let lower = src.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("data:")
        {
            self.warn(ReconstructWarning::RemoteImage(src.to_string()));
            return;
        }

        let path = self.assets_dir.join(src);
        if !path.is_file() {
            self.warn(ReconstructWarning::MissingImage(path));
            return;
        }

        let width = attrs.get("width").and_then(|w| sanitize_size(w)).map(f64::from);
        let height = attrs.get("height").and_then(|h| sanitize_size(h)).map(f64::from);
        let natural = if width.is_some() && height.is_some() {
            None
        } else {
            match natural_size(&path) {
                Ok(size) => Some(size),
                Err(e) => {
                    self.warn(ReconstructWarning::InvalidImage(e.to_string()));
                    return;
                }
            }
        };
        let Some((w, h)) = fit_size(width, height, natural, self.options.max_image_width) else {
            self.warn(ReconstructWarning::InvalidImage(format!(
                "{}: no usable size",
                path.display()
            )));
            return;
        };

        let descr = attrs
            .get("alt")
            .or_else(|| attrs.get("title"))
            .cloned()
            .unwrap_or_default();
        let picture = match self.doc.add_picture_from_file(&path, w, h, &descr) {
            Ok(picture) => picture,
            Err(e) => {
                self.warn(ReconstructWarning::InvalidImage(e.to_string()));
                return;
            }
        };
        debug!("Embedded {} at {:.2}in x {:.2}in", path.display(), w, h);

        if self.table.is_some() {
            self.deferred_pictures.push(picture);
            return;
        }
        self.place_picture(picture);
    }

    /// Put a picture in its own paragraph
    ///
    /// An open paragraph with no content yet is reused so its alignment and
    /// list formatting carry over.
    fn place_picture(&mut self, picture: Picture) {
        self.finish_link();
        let index = if self.current_paragraph_text_is_empty() && self.paragraph.is_some() {
            self.ensure_paragraph()
        } else {
            self.close_paragraph();
            self.open_paragraph(Paragraph::new())
        };
        if let Some(paragraph) = self.doc.paragraph_mut(index) {
            paragraph.add_run(Run::picture(picture));
        }
        self.paragraph = None;
        self.run = None;
        self.li_pending = false;
    }

    // ==================== Tables ====================

    fn handle_table_start(&mut self, name: &str, tag: Tag, attrs: &Attrs) {
        let nested = self.table_depth > 1;
        match tag {
            Tag::Table => {
                self.table_depth += 1;
                if let Some(table) = self.table.as_mut() {
                    table.push_break();
                }
            }
            Tag::Row if !nested => {
                if let Some(table) = self.table.as_mut() {
                    table.start_row();
                }
            }
            Tag::Cell { header } if !nested => {
                let cell = CellBuf {
                    text: String::new(),
                    is_header: header,
                    colspan: attrs.get("colspan").and_then(|v| parse_span(v)).unwrap_or(1),
                    rowspan: attrs.get("rowspan").and_then(|v| parse_span(v)).unwrap_or(1),
                    shading: cell_shading(attrs),
                };
                if let Some(table) = self.table.as_mut() {
                    table.start_cell(cell);
                }
            }
            Tag::Row | Tag::Block | Tag::ListItem | Tag::Heading(_) | Tag::Break => {
                if let Some(table) = self.table.as_mut() {
                    table.push_break();
                }
            }
            Tag::Cell { .. } => {
                if let Some(table) = self.table.as_mut() {
                    table.push_separator();
                }
            }
            Tag::Image => self.handle_image(attrs),
            Tag::Skip => {
                debug!("Skipping <{}> inside a table", name);
                self.skip = Some((name.to_string(), 1));
            }
            _ => {}
        }
    }

    fn handle_table_end(&mut self, name: &str) {
        let nested = self.table_depth > 1;
        match Tag::classify(name, &Attrs::new()) {
            Tag::Table => {
                self.table_depth -= 1;
                if self.table_depth == 0 {
                    self.finish_table();
                } else if let Some(table) = self.table.as_mut() {
                    table.push_break();
                }
            }
            Tag::Row if !nested => {
                if let Some(table) = self.table.as_mut() {
                    table.end_row();
                }
            }
            Tag::Cell { .. } if !nested => {
                if let Some(table) = self.table.as_mut() {
                    table.end_cell();
                }
            }
            _ => {}
        }
    }

    fn finish_table(&mut self) {
        self.table_depth = 0;
        let Some(builder) = self.table.take() else {
            return;
        };
        match builder.build(self.table_style) {
            Some(table) => {
                debug!(
                    "Table {} x {} built",
                    table.row_count(),
                    table.grid_cols
                );
                self.doc.add_table(table);
            }
            None => debug!("Empty table dropped"),
        }
        self.paragraph = None;
        self.run = None;

        for picture in std::mem::take(&mut self.deferred_pictures) {
            self.place_picture(picture);
        }
    }
}

// ==================== Helpers ====================

fn tag_parts(e: &BytesStart) -> (String, Attrs) {
    let name = String::from_utf8_lossy(e.local_name().as_ref()).to_ascii_lowercase();
    let mut attrs = Attrs::new();
    for attr in e.html_attributes().with_checks(false).flatten() {
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_ascii_lowercase();
        let value = attr
            .unescape_value_with(resolve_entity)
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
        attrs.entry(key).or_insert(value);
    }
    (name, attrs)
}

/// Whether a start tag has a real element name, as in `<p` but not `< 6`
fn starts_with_tag_name(e: &BytesStart) -> bool {
    e.local_name()
        .as_ref()
        .first()
        .is_some_and(|b| b.is_ascii_alphabetic())
}

fn decode_text(e: &BytesText) -> String {
    e.unescape_with(resolve_entity)
        .map(|t| t.into_owned())
        .unwrap_or_else(|_| String::from_utf8_lossy(e.as_ref()).into_owned())
}

/// Named character references understood in text and attributes
fn resolve_entity(name: &str) -> Option<&'static str> {
    Some(match name {
        "lt" => "<",
        "gt" => ">",
        "amp" => "&",
        "apos" => "'",
        "quot" => "\"",
        "nbsp" => "\u{a0}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "hellip" => "\u{2026}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "bull" => "\u{2022}",
        "middot" => "\u{b7}",
        "copy" => "\u{a9}",
        "reg" => "\u{ae}",
        "trade" => "\u{2122}",
        "times" => "\u{d7}",
        "euro" => "\u{20ac}",
        _ => return None,
    })
}

/// Collapse runs of ASCII whitespace into single spaces
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_ascii_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

fn style_attr_props(attrs: &Attrs) -> RunProps {
    attrs
        .get("style")
        .map(|s| style_run_props(s))
        .unwrap_or_default()
}

fn parse_span(value: &str) -> Option<usize> {
    value
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|n| *n >= 1)
        .map(|n| n.min(1000))
}

fn cell_shading(attrs: &Attrs) -> Option<String> {
    attrs
        .get("style")
        .and_then(|style| {
            parse_style_string(style)
                .get("background-color")
                .and_then(|c| color_to_hex(c))
        })
        .or_else(|| attrs.get("bgcolor").and_then(|c| color_to_hex(c)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Block, VMerge};

    fn reconstruct(body: &str) -> Document {
        HtmlReconstructor::new(ReconstructOptions::default())
            .reconstruct(&format!("<html><body>{}</body></html>", body))
            .unwrap()
    }

    fn texts(doc: &Document) -> Vec<String> {
        doc.paragraphs().map(Paragraph::text).collect()
    }

    #[test]
    fn test_missing_body_is_fatal() {
        let mut reconstructor = HtmlReconstructor::new(ReconstructOptions::default());
        assert!(matches!(
            reconstructor.reconstruct("<p>no body here</p>"),
            Err(OoxmlError::MissingBody)
        ));
        let doc = reconstructor.reconstruct_fragment("<p>no body here</p>");
        assert_eq!(texts(&doc), vec!["no body here"]);
    }

    #[test]
    fn test_head_and_style_are_skipped() {
        let mut reconstructor = HtmlReconstructor::new(ReconstructOptions::default());
        let doc = reconstructor
            .reconstruct(
                "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Notes</title>\
                 <style>p { color: red; }</style></head><body><p>kept</p>\
                 <style>.x{}</style></body></html>",
            )
            .unwrap();
        assert_eq!(texts(&doc), vec!["kept"]);
        assert_eq!(doc.title.as_deref(), Some("Notes"));
    }

    // ==================== Paragraphs ====================

    #[test]
    fn test_paragraph_alignment_and_margin() {
        let doc = reconstruct(
            r#"<p style="text-align: center; margin-left: 96px">a</p><p style="margin-left: 9in">b</p>"#,
        );
        let paragraphs: Vec<_> = doc.paragraphs().collect();
        assert_eq!(paragraphs[0].alignment, Some(Alignment::Center));
        assert_eq!(paragraphs[0].indent_left, Some(1.0));
        assert_eq!(paragraphs[1].indent_left, Some(5.5));
    }

    #[test]
    fn test_margin_units() {
        let doc = reconstruct(
            r#"<p style="margin-left:36pt">pt</p><p style="margin-left:3em">em</p><p style="margin-left:2">bare</p>"#,
        );
        let indents: Vec<_> = doc.paragraphs().map(|p| p.indent_left).collect();
        assert_eq!(indents, vec![Some(0.5), Some(0.5), Some(2.0)]);
    }

    #[test]
    fn test_headings() {
        let doc = reconstruct("<h2>Plan</h2><h6>Fine print</h6>");
        let styles: Vec<_> = doc.paragraphs().map(|p| p.style_id.clone()).collect();
        assert_eq!(
            styles,
            vec![Some("Heading2".to_string()), Some("Heading6".to_string())]
        );
    }

    #[test]
    fn test_empty_paragraphs_removed() {
        let doc = reconstruct("<p></p><p><span></span></p><p>x</p><p> </p>");
        assert_eq!(texts(&doc), vec!["x"]);
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        let doc = reconstruct("<p>\n   one\n   two  </p>");
        assert_eq!(texts(&doc), vec!["one two "]);
    }

    #[test]
    fn test_entities() {
        let doc = reconstruct("<p>a&nbsp;&amp;&nbsp;b &lt;c&gt; &#x27;d&#x27;</p>");
        assert_eq!(texts(&doc), vec!["a\u{a0}&\u{a0}b <c> 'd'"]);
    }

    // ==================== Inline formatting ====================

    #[test]
    fn test_format_stack() {
        let doc = reconstruct("<p>plain <strong>bold <em>both</em> bold</strong> plain</p>");
        let p = doc.paragraphs().next().unwrap();
        let runs: Vec<_> = p.runs().map(|r| (r.text.as_str(), r.props.bold, r.props.italic)).collect();
        assert_eq!(
            runs,
            vec![
                ("plain ", false, false),
                ("bold ", true, false),
                ("both", true, true),
                (" bold", true, false),
                (" plain", false, false),
            ]
        );
    }

    #[test]
    fn test_span_styles() {
        let doc = reconstruct(
            r#"<p><span style="color: rgb(255, 0, 0); background-color:#ff0; font-size: 16px">x</span></p>"#,
        );
        let run = doc.paragraphs().next().unwrap().runs().next().unwrap().clone();
        assert_eq!(run.props.color.as_deref(), Some("FF0000"));
        assert_eq!(run.props.shading.as_deref(), Some("FFFF00"));
        assert_eq!(run.props.size_pt, Some(12.0));
    }

    #[test]
    fn test_other_inline_tags() {
        let doc = reconstruct(
            "<p><s>s</s><sup>2</sup><sub>i</sub><mark>m</mark><code>c</code><u>u</u></p>",
        );
        let p = doc.paragraphs().next().unwrap();
        let runs: Vec<_> = p.runs().collect();
        assert!(runs[0].props.strike);
        assert_eq!(runs[1].props.vert_align, Some(VertAlign::Superscript));
        assert_eq!(runs[2].props.vert_align, Some(VertAlign::Subscript));
        assert_eq!(runs[3].props.highlight.as_deref(), Some("yellow"));
        assert_eq!(runs[4].props.font.as_deref(), Some("Courier New"));
        assert!(runs[5].props.underline);
    }

    #[test]
    fn test_line_break() {
        let doc = reconstruct("<p>one<br>two</p>");
        assert_eq!(texts(&doc), vec!["one\ntwo"]);
    }

    #[test]
    fn test_stray_angle_bracket_is_text() {
        let doc = reconstruct("<p>5 < 6 ok</p><p>a<3 b</p><p>next</p>");
        assert_eq!(texts(&doc), vec!["5 < 6 ok", "a<3 b", "next"]);
    }

    #[test]
    fn test_unclosed_angle_bracket_at_end_is_text() {
        let mut reconstructor = HtmlReconstructor::new(ReconstructOptions::default());
        let doc = reconstructor.reconstruct_fragment("<p>x</p>tail <");
        assert_eq!(texts(&doc), vec!["x", "tail <"]);
    }

    #[test]
    fn test_unmatched_close_tags_are_tolerated() {
        let doc = reconstruct("<p>a</em></strong>b</p></div><p>c</p>");
        assert_eq!(texts(&doc), vec!["ab", "c"]);
    }

    // ==================== Lists ====================

    #[test]
    fn test_nested_list_indent() {
        let doc = reconstruct("<ul><li>A<ul><li>B</li></ul></li></ul>");
        let paragraphs: Vec<_> = doc.paragraphs().collect();
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].text(), "A");
        assert_eq!(paragraphs[1].text(), "B");
        assert_eq!(paragraphs[0].style_id.as_deref(), Some("ListBullet"));
        assert_eq!(paragraphs[1].style_id.as_deref(), Some("ListBullet"));
        assert!(paragraphs[1].indent_left > paragraphs[0].indent_left);
        assert_eq!(paragraphs[1].numbering.map(|n| n.ilvl), Some(1));
    }

    #[test]
    fn test_list_item_paragraph_is_reused() {
        let doc = reconstruct("<ol><li><p>first</p></li><li><p>second</p></li></ol>");
        let paragraphs: Vec<_> = doc.paragraphs().collect();
        assert_eq!(paragraphs.len(), 2);
        assert!(paragraphs
            .iter()
            .all(|p| p.style_id.as_deref() == Some("ListNumber")));
        assert_eq!(paragraphs[0].numbering.map(|n| n.num_id), Some(NUM_DECIMAL));
    }

    #[test]
    fn test_list_indent_is_capped() {
        let html = "<ul><li>x".repeat(14) + &"</li></ul>".repeat(14);
        let doc = reconstruct(&html);
        let deepest = doc.paragraphs().last().unwrap();
        assert_eq!(deepest.indent_left, Some(5.5));
        assert_eq!(deepest.numbering.map(|n| n.ilvl), Some(8));
    }

    #[test]
    fn test_checklist_has_no_numbering() {
        let doc = reconstruct(
            "<ul class=\"checklist\"><li class=\"checked\"><p>\u{2611} done</p></li></ul>",
        );
        let p = doc.paragraphs().next().unwrap();
        assert_eq!(p.numbering, None);
        assert_eq!(p.text(), "\u{2611} done");
        assert_eq!(p.indent_left, Some(0.5));
    }

    // ==================== Blocks ====================

    #[test]
    fn test_blockquote_decoration() {
        let doc = reconstruct("<blockquote><p>quoted</p></blockquote><p>after</p>");
        let paragraphs: Vec<_> = doc.paragraphs().collect();
        let quoted = paragraphs[0];
        assert_eq!(quoted.indent_left, Some(0.5));
        assert_eq!(quoted.indent_right, Some(0.5));
        let border = quoted.borders.left.as_ref().unwrap();
        assert_eq!((border.size, border.color.as_str()), (24, "CCCCCC"));
        assert!(paragraphs[1].borders.is_empty());
    }

    #[test]
    fn test_pre_keeps_newlines() {
        let doc = reconstruct("<pre><code>\nfn main() {\n    run();\n}</code></pre>");
        let p = doc.paragraphs().next().unwrap();
        assert_eq!(p.text(), "fn main() {\n    run();\n}");
        assert_eq!(p.shading.as_deref(), Some("F0F0F0"));
        assert!(p.borders.top.is_some() && p.borders.right.is_some());
        let run = p.runs().next().unwrap();
        assert_eq!(run.props.font.as_deref(), Some("Courier New"));
        assert_eq!(run.props.size_pt, Some(10.0));
    }

    // ==================== Links ====================

    #[test]
    fn test_hyperlink() {
        let doc = reconstruct(r#"<p>see <a href="https://example.com">docs</a>.</p>"#);
        let p = doc.paragraphs().next().unwrap();
        assert_eq!(p.text(), "see docs.");
        let ParagraphChild::Hyperlink(link) = &p.children[1] else {
            panic!("expected hyperlink, got {:?}", p.children[1]);
        };
        let HyperlinkTarget::Relationship(id) = &link.target else {
            panic!("expected relationship target");
        };
        assert_eq!(doc.relationships.get(id), Some("https://example.com"));
        assert_eq!(link.runs[0].props.color.as_deref(), Some("0000EE"));
        assert!(link.runs[0].props.underline);
    }

    #[test]
    fn test_invalid_hyperlink_keeps_text() {
        let mut reconstructor = HtmlReconstructor::new(ReconstructOptions::default());
        let doc = reconstructor
            .reconstruct(r##"<body><p><a href="javascript:alert(1)">click</a> <a href="#">top</a></p></body>"##)
            .unwrap();
        let p = doc.paragraphs().next().unwrap();
        assert_eq!(p.text(), "click top");
        assert!(p.children.iter().all(|c| matches!(c, ParagraphChild::Run(_))));
        assert_eq!(
            reconstructor
                .warnings()
                .iter()
                .filter(|w| matches!(w, ReconstructWarning::InvalidHyperlink(_)))
                .count(),
            2
        );
    }

    #[test]
    fn test_anchor_link() {
        let doc = reconstruct(r##"<p><a href="#summary">jump</a></p>"##);
        let p = doc.paragraphs().next().unwrap();
        assert!(matches!(
            &p.children[0],
            ParagraphChild::Hyperlink(Hyperlink { target: HyperlinkTarget::Anchor(a), .. }) if a == "summary"
        ));
    }

    // ==================== Tables ====================

    #[test]
    fn test_table_with_colspan() {
        let doc = reconstruct(
            "<table><tr><th colspan=\"2\">Name</th><th>Role</th></tr>\
             <tr><td>a</td><td>b</td><td>c</td></tr></table>",
        );
        let table = doc.tables().next().unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.grid_cols, 3);
        assert_eq!(table.style_id.as_deref(), Some("TableGrid"));
        let header = table.cell(0, 0).unwrap();
        assert_eq!(header.grid_span, 2);
        assert_eq!(header.text(), "Name");
        assert!(header.paragraphs[0].runs().all(|r| r.props.bold));
        assert!(table.cell(0, 1).unwrap().covered);
        assert_eq!(table.cell(0, 2).unwrap().text(), "Role");
        assert!(!table.cell(1, 0).unwrap().paragraphs[0].runs().any(|r| r.props.bold));
    }

    #[test]
    fn test_table_with_rowspan() {
        let doc = reconstruct(
            "<table><tr><td rowspan=\"2\">tall</td><td>x</td></tr><tr><td>y</td></tr></table>",
        );
        let table = doc.tables().next().unwrap();
        assert_eq!((table.row_count(), table.grid_cols), (2, 2));
        assert_eq!(table.cell(0, 0).unwrap().v_merge, Some(VMerge::Restart));
        assert_eq!(table.cell(1, 0).unwrap().v_merge, Some(VMerge::Continue));
        assert_eq!(table.cell(1, 1).unwrap().text(), "y");
    }

    #[test]
    fn test_empty_table_is_dropped() {
        let doc = reconstruct("<table></table><table><tr></tr></table><p>x</p>");
        assert_eq!(doc.tables().count(), 0);
        assert_eq!(texts(&doc), vec!["x"]);
    }

    #[test]
    fn test_cell_shading_and_paragraphs() {
        let doc = reconstruct(
            r#"<table><tr><td style="background-color: rgb(0, 128, 0)"><p>one</p><p>two</p></td></tr></table>"#,
        );
        let cell = doc.tables().next().unwrap().cell(0, 0).unwrap().clone();
        assert_eq!(cell.shading.as_deref(), Some("008000"));
        assert_eq!(cell.text(), "one\ntwo");
    }

    #[test]
    fn test_nested_table_is_flattened() {
        let doc = reconstruct(
            "<table><tr><td>outer<table><tr><td>in1</td><td>in2</td></tr></table></td></tr></table>",
        );
        assert_eq!(doc.tables().count(), 1);
        let table = doc.tables().next().unwrap();
        assert_eq!((table.row_count(), table.grid_cols), (1, 1));
        assert_eq!(table.cell(0, 0).unwrap().text(), "outer\nin1 in2");
    }

    #[test]
    fn test_skip_elements_inside_table() {
        let doc = reconstruct(
            "<table><tr><td>a<style>.x{color:red}</style></td>\
             <td><script>var t = '<td>';</script>b</td></tr></table><p>after</p>",
        );
        let table = doc.tables().next().unwrap();
        assert_eq!(table.grid_cols, 2);
        assert_eq!(table.cell(0, 0).unwrap().text(), "a");
        assert_eq!(table.cell(0, 1).unwrap().text(), "b");
        assert_eq!(texts(&doc), vec!["after"]);
    }

    #[test]
    fn test_unterminated_table_is_flushed() {
        let mut reconstructor = HtmlReconstructor::new(ReconstructOptions::default());
        let doc = reconstructor.reconstruct_fragment("<table><tr><td>a</td><td>b");
        let table = doc.tables().next().unwrap();
        assert_eq!(table.grid_cols, 2);
        assert_eq!(table.cell(0, 1).unwrap().text(), "b");
    }

    #[test]
    fn test_block_order_around_table() {
        let doc = reconstruct("<p>before</p><table><tr><td>x</td></tr></table><p>after</p>");
        let kinds: Vec<_> = doc
            .blocks
            .iter()
            .map(|b| matches!(b, Block::Table(_)))
            .collect();
        assert_eq!(kinds, vec![false, true, false]);
    }

    #[test]
    fn test_unknown_table_style_falls_back() {
        let options = ReconstructOptions {
            table_style: "FancyGrid".to_string(),
            ..Default::default()
        };
        let mut reconstructor = HtmlReconstructor::new(options);
        assert_eq!(
            reconstructor.warnings(),
            &[ReconstructWarning::UnknownTableStyle("FancyGrid".to_string())]
        );
        let doc = reconstructor
            .reconstruct("<body><table><tr><td>x</td></tr></table></body>")
            .unwrap();
        assert_eq!(
            doc.tables().next().unwrap().style_id.as_deref(),
            Some("TableGrid")
        );
    }

    // ==================== Images ====================

    #[test]
    fn test_missing_image_is_skipped() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut reconstructor =
            HtmlReconstructor::new(ReconstructOptions::default()).with_assets_dir(dir.path());
        let doc = reconstructor
            .reconstruct(r#"<body><p>before</p><img src="images/nope.png"><p>after</p></body>"#)
            .unwrap();
        assert!(doc.media.is_empty());
        assert_eq!(texts(&doc), vec!["before", "after"]);
        assert!(matches!(
            reconstructor.warnings(),
            [ReconstructWarning::MissingImage(_)]
        ));
    }

    #[test]
    fn test_remote_image_is_not_fetched() {
        let mut reconstructor = HtmlReconstructor::new(ReconstructOptions::default());
        let doc = reconstructor
            .reconstruct(r#"<body><img src="https://example.com/a.png"></body>"#)
            .unwrap();
        assert!(doc.media.is_empty());
        assert!(matches!(
            reconstructor.warnings(),
            [ReconstructWarning::RemoteImage(_)]
        ));
    }

    #[test]
    fn test_image_sizes() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("images")).unwrap();
        ::image::RgbImage::new(1152, 288)
            .save(dir.path().join("images/wide.png"))
            .unwrap();

        let mut reconstructor =
            HtmlReconstructor::new(ReconstructOptions::default()).with_assets_dir(dir.path());
        let doc = reconstructor
            .reconstruct(
                r#"<body><img src="images/wide.png" alt="wide"><p><img src="images/wide.png" width="192" height="96"/></p><img src="images/wide.png" width="96"></body>"#,
            )
            .unwrap();

        let pictures: Vec<_> = doc
            .paragraphs()
            .flat_map(|p| p.runs())
            .filter_map(|r| r.picture.as_ref())
            .collect();
        assert_eq!(pictures.len(), 3);
        assert_eq!(pictures[0].width_inches(), 6.0);
        assert_eq!(pictures[0].height_inches(), 1.5);
        assert_eq!(pictures[0].descr, "wide");
        assert_eq!((pictures[1].width_inches(), pictures[1].height_inches()), (2.0, 1.0));
        assert_eq!((pictures[2].width_inches(), pictures[2].height_inches()), (1.0, 0.25));
        assert_eq!(doc.media.len(), 3);
        // Each picture sits in its own paragraph
        assert_eq!(doc.paragraphs().count(), 3);
    }

    #[test]
    fn test_image_inside_table_follows_table() {
        let dir = tempfile::TempDir::new().unwrap();
        ::image::RgbImage::new(10, 10).save(dir.path().join("dot.png")).unwrap();

        let mut reconstructor =
            HtmlReconstructor::new(ReconstructOptions::default()).with_assets_dir(dir.path());
        let doc = reconstructor
            .reconstruct(r#"<body><table><tr><td>cell<img src="dot.png"></td></tr></table></body>"#)
            .unwrap();
        assert!(matches!(doc.blocks[0], Block::Table(_)));
        assert!(matches!(&doc.blocks[1], Block::Paragraph(p) if p.has_drawing()));
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("a \n\t b"), "a b");
        assert_eq!(collapse_whitespace("\u{a0}x"), "\u{a0}x");
    }
}
