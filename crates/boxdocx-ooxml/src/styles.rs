//! Style definitions (word/styles.xml)
//!
//! The output document carries a fixed set of styles: Normal in the
//! configured body font, six headings, the two list styles, the table grid
//! and the hyperlink character style. [`StyleSheet::parse`] reads a styles
//! part back, which the tests use to check generated packages.

use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{OoxmlError, Result};
use crate::options::ReconstructOptions;
use crate::writer::{escape_xml, half_points};

/// Collection of styles, keyed by style ID
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    styles: BTreeMap<String, Style>,
    /// Default paragraph style ID
    pub default_paragraph: Option<String>,
}

/// A Word style definition
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    /// Style ID (used in document references)
    pub id: String,
    /// Display name
    pub name: String,
    pub style_type: StyleType,
    /// Base style ID
    pub based_on: Option<String>,
    /// Style of the following paragraph
    pub next: Option<String>,
    pub ui_priority: Option<u32>,
    /// Outline level (0 = Heading 1)
    pub outline_level: Option<u8>,
    /// Raw `w:pPr` children
    ppr: String,
    /// Raw `w:rPr` children
    rpr: String,
    /// Raw `w:tblPr` children
    tblpr: String,
}

/// Type of style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleType {
    Paragraph,
    Character,
    Table,
}

impl StyleType {
    fn as_ooxml(self) -> &'static str {
        match self {
            StyleType::Paragraph => "paragraph",
            StyleType::Character => "character",
            StyleType::Table => "table",
        }
    }
}

impl Style {
    fn new(id: &str, name: &str, style_type: StyleType) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            style_type,
            based_on: None,
            next: None,
            ui_priority: None,
            outline_level: None,
            ppr: String::new(),
            rpr: String::new(),
            tblpr: String::new(),
        }
    }

    fn based_on(mut self, id: &str) -> Self {
        self.based_on = Some(id.to_string());
        self
    }

    fn next(mut self, id: &str) -> Self {
        self.next = Some(id.to_string());
        self
    }

    fn priority(mut self, priority: u32) -> Self {
        self.ui_priority = Some(priority);
        self
    }

    fn ppr(mut self, xml: &str) -> Self {
        self.ppr.push_str(xml);
        self
    }

    fn rpr(mut self, xml: &str) -> Self {
        self.rpr.push_str(xml);
        self
    }

    fn tblpr(mut self, xml: &str) -> Self {
        self.tblpr.push_str(xml);
        self
    }
}

/// Heading sizes in points, Heading1 to Heading6
const HEADING_SIZES: [f64; 6] = [16.0, 13.0, 12.0, 11.0, 11.0, 11.0];

impl StyleSheet {
    /// The styles every generated document carries
    pub fn builtin(options: &ReconstructOptions) -> Self {
        let mut sheet = StyleSheet {
            default_paragraph: Some("Normal".to_string()),
            ..Default::default()
        };

        sheet.insert(
            Style::new("Normal", "Normal", StyleType::Paragraph)
                .priority(0)
                .ppr(r#"<w:spacing w:after="120" w:line="264" w:lineRule="auto"/>"#)
                .rpr(&format!(
                    r#"<w:rFonts w:ascii="{0}" w:hAnsi="{0}" w:cs="{0}"/><w:sz w:val="{1}"/><w:szCs w:val="{1}"/>"#,
                    escape_xml(&options.font_name),
                    half_points(options.font_size)
                )),
        );

        for (i, size) in HEADING_SIZES.iter().enumerate() {
            let level = i + 1;
            let mut style = Style::new(
                &format!("Heading{}", level),
                &format!("heading {}", level),
                StyleType::Paragraph,
            )
            .based_on("Normal")
            .next("Normal")
            .priority(9)
            .ppr(&format!(
                r#"<w:keepNext/><w:spacing w:before="240" w:after="60"/><w:outlineLvl w:val="{}"/>"#,
                i
            ))
            .rpr(&format!(
                r#"<w:b/><w:color w:val="2F5496"/><w:sz w:val="{0}"/><w:szCs w:val="{0}"/>"#,
                half_points(*size)
            ));
            style.outline_level = Some(i as u8);
            sheet.insert(style);
        }

        sheet.insert(
            Style::new("ListBullet", "List Bullet", StyleType::Paragraph)
                .based_on("Normal")
                .priority(36)
                .ppr(r#"<w:numPr><w:numId w:val="1"/></w:numPr><w:contextualSpacing/>"#),
        );
        sheet.insert(
            Style::new("ListNumber", "List Number", StyleType::Paragraph)
                .based_on("Normal")
                .priority(37)
                .ppr(r#"<w:numPr><w:numId w:val="2"/></w:numPr><w:contextualSpacing/>"#),
        );
        sheet.insert(
            Style::new("DefaultParagraphFont", "Default Paragraph Font", StyleType::Character)
                .priority(1),
        );
        sheet.insert(
            Style::new("Hyperlink", "Hyperlink", StyleType::Character)
                .based_on("DefaultParagraphFont")
                .priority(99)
                .rpr(r#"<w:color w:val="0000EE"/><w:u w:val="single"/>"#),
        );
        sheet.insert(
            Style::new("TableNormal", "Normal Table", StyleType::Table)
                .priority(99)
                .tblpr(
                    r#"<w:tblInd w:w="0" w:type="dxa"/><w:tblCellMar><w:top w:w="0" w:type="dxa"/><w:left w:w="108" w:type="dxa"/><w:bottom w:w="0" w:type="dxa"/><w:right w:w="108" w:type="dxa"/></w:tblCellMar>"#,
                ),
        );
        sheet.insert(
            Style::new("TableGrid", "Table Grid", StyleType::Table)
                .based_on("TableNormal")
                .priority(39)
                .ppr(r#"<w:spacing w:after="0" w:line="240" w:lineRule="auto"/>"#)
                .tblpr(
                    r#"<w:tblBorders><w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/></w:tblBorders>"#,
                ),
        );

        sheet
    }

    fn insert(&mut self, style: Style) {
        self.styles.insert(style.id.clone(), style);
    }

    /// Get a style by ID
    pub fn get(&self, id: &str) -> Option<&Style> {
        self.styles.get(id)
    }

    /// Check if a style ID exists
    pub fn contains(&self, id: &str) -> bool {
        self.styles.contains_key(id)
    }

    /// Check that a style exists with the given type
    pub fn has_style_of_type(&self, id: &str, style_type: StyleType) -> bool {
        self.get(id).map(|s| s.style_type == style_type).unwrap_or(false)
    }

    /// All styles, ordered by ID
    pub fn all(&self) -> impl Iterator<Item = &Style> {
        self.styles.values()
    }

    /// Get the heading level (1-9) for a style, if it's a heading
    pub fn heading_level(&self, style_id: &str) -> Option<u8> {
        self.get(style_id)
            .and_then(|s| s.outline_level)
            .map(|l| l + 1)
    }

    /// Serialize to a styles part with the document defaults from `options`
    pub fn to_xml(&self, options: &ReconstructOptions) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(
            r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
        );
        xml.push('\n');

        let font = escape_xml(&options.font_name);
        xml.push_str("<w:docDefaults><w:rPrDefault><w:rPr>");
        xml.push_str(&format!(
            r#"<w:rFonts w:ascii="{0}" w:hAnsi="{0}" w:eastAsia="{0}" w:cs="{0}"/>"#,
            font
        ));
        xml.push_str(&format!(
            r#"<w:sz w:val="{0}"/><w:szCs w:val="{0}"/>"#,
            half_points(options.font_size)
        ));
        xml.push_str(r#"<w:lang w:val="en-US"/>"#);
        xml.push_str("</w:rPr></w:rPrDefault><w:pPrDefault/></w:docDefaults>\n");

        for style in self.styles.values() {
            let is_default = self.default_paragraph.as_deref() == Some(style.id.as_str())
                || style.id == "DefaultParagraphFont"
                || style.id == "TableNormal";
            xml.push_str(&format!(
                r#"<w:style w:type="{}"{} w:styleId="{}">"#,
                style.style_type.as_ooxml(),
                if is_default { r#" w:default="1""# } else { "" },
                escape_xml(&style.id)
            ));
            xml.push_str(&format!(r#"<w:name w:val="{}"/>"#, escape_xml(&style.name)));
            if let Some(base) = &style.based_on {
                xml.push_str(&format!(r#"<w:basedOn w:val="{}"/>"#, escape_xml(base)));
            }
            if let Some(next) = &style.next {
                xml.push_str(&format!(r#"<w:next w:val="{}"/>"#, escape_xml(next)));
            }
            if let Some(priority) = style.ui_priority {
                xml.push_str(&format!(r#"<w:uiPriority w:val="{}"/>"#, priority));
            }
            xml.push_str("<w:qFormat/>");
            if !style.ppr.is_empty() {
                xml.push_str(&format!("<w:pPr>{}</w:pPr>", style.ppr));
            }
            if !style.rpr.is_empty() {
                xml.push_str(&format!("<w:rPr>{}</w:rPr>", style.rpr));
            }
            if !style.tblpr.is_empty() {
                xml.push_str(&format!("<w:tblPr>{}</w:tblPr>", style.tblpr));
            }
            xml.push_str("</w:style>\n");
        }

        xml.push_str("</w:styles>");
        xml
    }

    /// Parse styles from XML bytes
    ///
    /// Only the identifying fields are read; formatting is not kept.
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut sheet = StyleSheet::default();
        let mut buf = Vec::new();
        let mut current: Option<(Style, bool)> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                    if e.local_name().as_ref() == b"style" =>
                {
                    let style_type = match get_attr(e, b"w:type").as_deref() {
                        Some("character") => StyleType::Character,
                        Some("table") => StyleType::Table,
                        _ => StyleType::Paragraph,
                    };
                    let id = get_attr(e, b"w:styleId").unwrap_or_default();
                    let is_default = get_attr(e, b"w:default").as_deref() == Some("1");
                    current = Some((Style::new(&id, &id, style_type), is_default));
                }
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                    if let Some((style, _)) = current.as_mut() {
                        let val = get_attr(e, b"w:val");
                        match e.local_name().as_ref() {
                            b"name" => {
                                if let Some(val) = val {
                                    style.name = val;
                                }
                            }
                            b"basedOn" => style.based_on = val,
                            b"next" => style.next = val,
                            b"uiPriority" => style.ui_priority = val.and_then(|v| v.parse().ok()),
                            b"outlineLvl" => {
                                style.outline_level = val.and_then(|v| v.parse().ok())
                            }
                            _ => {}
                        }
                    }
                }
                Ok(Event::End(ref e)) if e.local_name().as_ref() == b"style" => {
                    if let Some((style, is_default)) = current.take() {
                        if !style.id.is_empty() {
                            if is_default && style.style_type == StyleType::Paragraph {
                                sheet.default_paragraph = Some(style.id.clone());
                            }
                            sheet.insert(style);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(OoxmlError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(sheet)
    }
}

fn get_attr(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| a.unescape_value().ok().map(|v| v.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_styles() {
        let sheet = StyleSheet::builtin(&ReconstructOptions::default());
        for id in [
            "Normal",
            "Heading1",
            "Heading6",
            "ListBullet",
            "ListNumber",
            "Hyperlink",
            "TableGrid",
        ] {
            assert!(sheet.contains(id), "missing {id}");
        }
        assert!(sheet.has_style_of_type("TableGrid", StyleType::Table));
        assert!(!sheet.has_style_of_type("Normal", StyleType::Table));
        assert_eq!(sheet.heading_level("Heading3"), Some(3));
        assert_eq!(sheet.heading_level("Normal"), None);
    }

    #[test]
    fn test_to_xml_uses_configured_font() {
        let options = ReconstructOptions {
            font_name: "Georgia".to_string(),
            font_size: 12.0,
            ..Default::default()
        };
        let sheet = StyleSheet::builtin(&options);
        let normal = sheet.get("Normal").unwrap();
        assert!(normal.rpr.contains(r#"w:ascii="Georgia""#));
        assert!(normal.rpr.contains(r#"<w:sz w:val="24"/>"#));

        let xml = sheet.to_xml(&options);
        assert!(xml.contains(r#"<w:rPrDefault><w:rPr><w:rFonts w:ascii="Georgia""#));
        assert!(xml.contains(r#"<w:sz w:val="24"/>"#));
    }

    #[test]
    fn test_generated_xml_parses_back() {
        let options = ReconstructOptions::default();
        let original = StyleSheet::builtin(&options);
        let parsed = StyleSheet::parse(original.to_xml(&options).as_bytes()).unwrap();

        assert_eq!(parsed.all().count(), original.all().count());
        assert_eq!(parsed.default_paragraph.as_deref(), Some("Normal"));
        let heading = parsed.get("Heading2").unwrap();
        assert_eq!(heading.name, "heading 2");
        assert_eq!(heading.based_on.as_deref(), Some("Normal"));
        assert_eq!(heading.outline_level, Some(1));
        assert_eq!(parsed.get("Hyperlink").unwrap().style_type, StyleType::Character);
    }
}
