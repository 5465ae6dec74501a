//! DOCX writer
//!
//! Serializes a [`Document`] into `word/document.xml` and assembles the
//! full package on top of the base [`Template`].

use std::path::Path;

use log::debug;

use crate::archive::OoxmlArchive;
use crate::document::{
    Block, Border, Document, Hyperlink, HyperlinkTarget, Paragraph, ParagraphChild, Run, RunProps,
    Table, VMerge,
};
use crate::error::Result;
use crate::image::{content_type_for_extension, Picture};
use crate::options::ReconstructOptions;
use crate::template::{core_properties, Template};

/// Twips per inch
pub const TWIPS_PER_INCH: f64 = 1440.0;

/// Text width of a Letter page with 1in margins, in twips
const TEXT_WIDTH_TWIPS: usize = 9360;

/// Writer for DOCX packages
pub struct DocxWriter {
    output: String,
}

impl Default for DocxWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl DocxWriter {
    pub fn new() -> Self {
        Self {
            output: String::new(),
        }
    }

    /// Build the complete DOCX package as bytes
    pub fn generate(doc: &Document, options: &ReconstructOptions) -> Result<Vec<u8>> {
        Self::generate_archive(doc, options)?.to_bytes()
    }

    /// Build the package and write it to `path`
    pub fn write_to_file<P: AsRef<Path>>(
        doc: &Document,
        options: &ReconstructOptions,
        path: P,
    ) -> Result<()> {
        Self::generate_archive(doc, options)?.write_to_file(path)
    }

    /// Build the package without serializing it
    pub fn generate_archive(doc: &Document, options: &ReconstructOptions) -> Result<OoxmlArchive> {
        let mut archive = Template::new(options).into_archive();

        let mut writer = DocxWriter::new();
        archive.set_string("word/document.xml", writer.generate_document_xml(doc));
        archive.set_string("word/_rels/document.xml.rels", doc.relationships.to_xml());

        for part in &doc.media {
            archive.set(part.path.clone(), part.data.clone());
        }
        if !doc.media.is_empty() {
            update_content_types(&mut archive, doc);
        }

        if let Some(title) = doc.title.as_deref() {
            archive.set_string("docProps/core.xml", core_properties(Some(title)));
        }

        debug!(
            "Assembled package: {} blocks, {} relationships, {} media parts",
            doc.blocks.len(),
            doc.relationships.len(),
            doc.media.len()
        );
        Ok(archive)
    }

    /// Generate the complete document.xml content
    fn generate_document_xml(&mut self, doc: &Document) -> String {
        self.output.clear();

        self.output
            .push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        self.output.push('\n');
        self.output.push_str(r#"<w:document "#);
        self.output
            .push_str(r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#);
        self.output.push_str(
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
        );
        self.output.push_str(
            r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
        );
        self.output
            .push_str(r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#);
        self.output
            .push_str(r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#);
        self.output.push('\n');
        self.output.push_str("<w:body>\n");

        for block in &doc.blocks {
            self.generate_block(block);
        }

        // Letter, 1in margins
        self.output.push_str(r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr>"#);
        self.output.push('\n');
        self.output.push_str("</w:body>\n");
        self.output.push_str("</w:document>");

        std::mem::take(&mut self.output)
    }

    fn generate_block(&mut self, block: &Block) {
        match block {
            Block::Paragraph(p) => self.generate_paragraph(p),
            Block::Table(t) => self.generate_table(t),
        }
    }

    fn generate_paragraph(&mut self, para: &Paragraph) {
        self.output.push_str("<w:p>");

        let mut ppr = String::new();
        if let Some(style) = &para.style_id {
            ppr.push_str(&format!(r#"<w:pStyle w:val="{}"/>"#, escape_xml(style)));
        }
        if let Some(num) = para.numbering {
            ppr.push_str(&format!(
                r#"<w:numPr><w:ilvl w:val="{}"/><w:numId w:val="{}"/></w:numPr>"#,
                num.ilvl, num.num_id
            ));
        }
        if !para.borders.is_empty() {
            ppr.push_str("<w:pBdr>");
            for (side, border) in [
                ("top", &para.borders.top),
                ("left", &para.borders.left),
                ("bottom", &para.borders.bottom),
                ("right", &para.borders.right),
            ] {
                if let Some(border) = border {
                    ppr.push_str(&border_xml(side, border));
                }
            }
            ppr.push_str("</w:pBdr>");
        }
        if let Some(fill) = &para.shading {
            ppr.push_str(&shading_xml(fill));
        }
        if para.indent_left.is_some() || para.indent_right.is_some() {
            ppr.push_str("<w:ind");
            if let Some(left) = para.indent_left {
                ppr.push_str(&format!(r#" w:left="{}""#, inches_to_twips(left)));
            }
            if let Some(right) = para.indent_right {
                ppr.push_str(&format!(r#" w:right="{}""#, inches_to_twips(right)));
            }
            // List paragraphs keep the bullet hanging in the indent
            if para.numbering.is_some() {
                ppr.push_str(r#" w:hanging="360""#);
            }
            ppr.push_str("/>");
        }
        if let Some(alignment) = para.alignment {
            ppr.push_str(&format!(r#"<w:jc w:val="{}"/>"#, alignment.as_ooxml()));
        }
        if !ppr.is_empty() {
            self.output.push_str("<w:pPr>");
            self.output.push_str(&ppr);
            self.output.push_str("</w:pPr>");
        }

        for child in &para.children {
            match child {
                ParagraphChild::Run(run) => self.generate_run(run, None),
                ParagraphChild::Hyperlink(link) => self.generate_hyperlink(link),
            }
        }

        self.output.push_str("</w:p>\n");
    }

    fn generate_hyperlink(&mut self, link: &Hyperlink) {
        match &link.target {
            HyperlinkTarget::Relationship(id) => {
                self.output
                    .push_str(&format!(r#"<w:hyperlink r:id="{}">"#, escape_xml(id)));
            }
            HyperlinkTarget::Anchor(anchor) => {
                self.output
                    .push_str(&format!(r#"<w:hyperlink w:anchor="{}">"#, escape_xml(anchor)));
            }
        }
        for run in &link.runs {
            self.generate_run(run, Some("Hyperlink"));
        }
        self.output.push_str("</w:hyperlink>");
    }

    fn generate_run(&mut self, run: &Run, style: Option<&str>) {
        self.output.push_str("<w:r>");
        let rpr = run_properties_xml(&run.props, style);
        if !rpr.is_empty() {
            self.output.push_str("<w:rPr>");
            self.output.push_str(&rpr);
            self.output.push_str("</w:rPr>");
        }

        if let Some(picture) = &run.picture {
            self.generate_picture(picture);
        }

        for (i, segment) in run.text.split('\n').enumerate() {
            if i > 0 {
                self.output.push_str("<w:br/>");
            }
            if !segment.is_empty() {
                self.output.push_str(&format!(
                    r#"<w:t xml:space="preserve">{}</w:t>"#,
                    escape_xml(segment)
                ));
            }
        }
        self.output.push_str("</w:r>");
    }

    fn generate_picture(&mut self, picture: &Picture) {
        let name = escape_xml(&picture.name);
        let (cx, cy) = (picture.width_emu, picture.height_emu);

        self.output.push_str("<w:drawing>");
        self.output
            .push_str(r#"<wp:inline distT="0" distB="0" distL="0" distR="0">"#);
        self.output
            .push_str(&format!(r#"<wp:extent cx="{}" cy="{}"/>"#, cx, cy));
        self.output
            .push_str(r#"<wp:effectExtent l="0" t="0" r="0" b="0"/>"#);
        self.output.push_str(&format!(
            r#"<wp:docPr id="{}" name="{}" descr="{}"/>"#,
            picture.id,
            name,
            escape_xml(&picture.descr)
        ));
        self.output.push_str(r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr>"#);
        self.output.push_str("<a:graphic>");
        self.output.push_str(
            r#"<a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
        );
        self.output.push_str("<pic:pic>");
        self.output.push_str(&format!(
            r#"<pic:nvPicPr><pic:cNvPr id="{}" name="{}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            picture.id, name
        ));
        self.output.push_str(&format!(
            r#"<pic:blipFill><a:blip r:embed="{}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
            escape_xml(&picture.rel_id)
        ));
        self.output.push_str(&format!(
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{}" cy="{}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
            cx, cy
        ));
        self.output.push_str("</pic:pic>");
        self.output.push_str("</a:graphicData>");
        self.output.push_str("</a:graphic>");
        self.output.push_str("</wp:inline>");
        self.output.push_str("</w:drawing>");
    }

    fn generate_table(&mut self, table: &Table) {
        let cols = table.grid_cols.max(1);
        self.output.push_str("<w:tbl>\n");

        self.output.push_str("<w:tblPr>");
        if let Some(style) = &table.style_id {
            self.output
                .push_str(&format!(r#"<w:tblStyle w:val="{}"/>"#, escape_xml(style)));
        }
        self.output.push_str(r#"<w:tblW w:w="5000" w:type="pct"/>"#);
        self.output.push_str(r#"<w:tblLook w:val="04A0" w:firstRow="1" w:lastRow="0" w:firstColumn="1" w:lastColumn="0" w:noHBand="0" w:noVBand="1"/>"#);
        self.output.push_str("</w:tblPr>\n");

        self.output.push_str("<w:tblGrid>");
        for _ in 0..cols {
            self.output
                .push_str(&format!(r#"<w:gridCol w:w="{}"/>"#, TEXT_WIDTH_TWIPS / cols));
        }
        self.output.push_str("</w:tblGrid>\n");

        for row in &table.rows {
            self.output.push_str("<w:tr>");
            for cell in row.iter().filter(|c| !c.covered) {
                self.output.push_str("<w:tc>");

                self.output.push_str("<w:tcPr>");
                self.output.push_str(&format!(
                    r#"<w:tcW w:w="{}" w:type="dxa"/>"#,
                    TEXT_WIDTH_TWIPS / cols * cell.grid_span.max(1) as usize
                ));
                if cell.grid_span > 1 {
                    self.output
                        .push_str(&format!(r#"<w:gridSpan w:val="{}"/>"#, cell.grid_span));
                }
                match cell.v_merge {
                    Some(VMerge::Restart) => self.output.push_str(r#"<w:vMerge w:val="restart"/>"#),
                    Some(VMerge::Continue) => self.output.push_str("<w:vMerge/>"),
                    None => {}
                }
                if let Some(fill) = &cell.shading {
                    self.output.push_str(&shading_xml(fill));
                }
                self.output.push_str("</w:tcPr>");

                // A cell must contain at least one paragraph
                if cell.paragraphs.is_empty() {
                    self.output.push_str("<w:p/>");
                }
                for para in &cell.paragraphs {
                    self.generate_paragraph(para);
                }

                self.output.push_str("</w:tc>");
            }
            self.output.push_str("</w:tr>\n");
        }

        self.output.push_str("</w:tbl>\n");
    }
}

fn run_properties_xml(props: &RunProps, style: Option<&str>) -> String {
    let mut rpr = String::new();
    if let Some(style) = style {
        rpr.push_str(&format!(r#"<w:rStyle w:val="{}"/>"#, escape_xml(style)));
    }
    if let Some(font) = &props.font {
        rpr.push_str(&format!(
            r#"<w:rFonts w:ascii="{0}" w:hAnsi="{0}" w:cs="{0}"/>"#,
            escape_xml(font)
        ));
    }
    if props.bold {
        rpr.push_str("<w:b/>");
    }
    if props.italic {
        rpr.push_str("<w:i/>");
    }
    if props.strike {
        rpr.push_str("<w:strike/>");
    }
    if let Some(color) = &props.color {
        rpr.push_str(&format!(r#"<w:color w:val="{}"/>"#, escape_xml(color)));
    }
    if let Some(size) = props.size_pt {
        rpr.push_str(&format!(
            r#"<w:sz w:val="{0}"/><w:szCs w:val="{0}"/>"#,
            half_points(size)
        ));
    }
    if let Some(highlight) = &props.highlight {
        rpr.push_str(&format!(r#"<w:highlight w:val="{}"/>"#, escape_xml(highlight)));
    }
    if props.underline {
        rpr.push_str(r#"<w:u w:val="single"/>"#);
    }
    if let Some(fill) = &props.shading {
        rpr.push_str(&shading_xml(fill));
    }
    if let Some(vert) = props.vert_align {
        rpr.push_str(&format!(r#"<w:vertAlign w:val="{}"/>"#, vert.as_ooxml()));
    }
    rpr
}

fn border_xml(side: &str, border: &Border) -> String {
    format!(
        r#"<w:{} w:val="{}" w:sz="{}" w:space="{}" w:color="{}"/>"#,
        side,
        escape_xml(&border.style),
        border.size,
        border.space,
        escape_xml(&border.color)
    )
}

fn shading_xml(fill: &str) -> String {
    format!(
        r#"<w:shd w:val="clear" w:color="auto" w:fill="{}"/>"#,
        escape_xml(fill)
    )
}

/// Register a `Default` content type for every media extension in use
fn update_content_types(archive: &mut OoxmlArchive, doc: &Document) {
    let Some(mut content_types) = archive.get_string("[Content_Types].xml") else {
        return;
    };
    for part in &doc.media {
        let ext = part.extension();
        let marker = format!("Extension=\"{}\"", ext);
        if ext.is_empty() || content_types.contains(&marker) {
            continue;
        }
        content_types = content_types.replace(
            "</Types>",
            &format!(
                "  <Default Extension=\"{}\" ContentType=\"{}\"/>\n</Types>",
                ext,
                content_type_for_extension(&ext)
            ),
        );
    }
    archive.set_string("[Content_Types].xml", content_types);
}

/// Convert inches to twips
pub fn inches_to_twips(inches: f64) -> i64 {
    (inches * TWIPS_PER_INCH).round() as i64
}

/// Convert points to half-points (`w:sz`)
pub fn half_points(points: f64) -> u32 {
    (points * 2.0).round().max(1.0) as u32
}

/// Escape special XML characters
pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
