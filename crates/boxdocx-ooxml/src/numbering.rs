//! List numbering definitions (word/numbering.xml)
//!
//! Two abstract definitions are emitted, one bulleted and one decimal, each
//! with nine levels. List paragraphs reference them through [`NUM_BULLET`]
//! and [`NUM_DECIMAL`].

/// `w:numId` of bulleted lists
pub const NUM_BULLET: u32 = 1;

/// `w:numId` of numbered lists
pub const NUM_DECIMAL: u32 = 2;

const BULLET_GLYPHS: [&str; 3] = ["\u{2022}", "o", "\u{25AA}"];
const DECIMAL_FORMATS: [&str; 3] = ["decimal", "lowerLetter", "lowerRoman"];

/// Twips of indent per level inside the numbering definition
const LEVEL_INDENT_TWIPS: u32 = 720;
const HANGING_TWIPS: u32 = 360;

/// Build the numbering part
pub fn numbering_xml() -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');
    xml.push_str(
        r#"<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    );
    xml.push('\n');

    // Bullets
    xml.push_str(r#"<w:abstractNum w:abstractNumId="0"><w:multiLevelType w:val="hybridMultilevel"/>"#);
    for ilvl in 0..9u32 {
        let glyph = BULLET_GLYPHS[ilvl as usize % BULLET_GLYPHS.len()];
        let font = if glyph == "o" { "Courier New" } else { "Symbol" };
        xml.push_str(&format!(
            r#"<w:lvl w:ilvl="{}"><w:start w:val="1"/><w:numFmt w:val="bullet"/><w:lvlText w:val="{}"/><w:lvlJc w:val="left"/>"#,
            ilvl, glyph
        ));
        push_level_indent(&mut xml, ilvl);
        xml.push_str(&format!(
            r#"<w:rPr><w:rFonts w:ascii="{0}" w:hAnsi="{0}" w:hint="default"/></w:rPr></w:lvl>"#,
            font
        ));
    }
    xml.push_str("</w:abstractNum>\n");

    // Decimal, letter, roman
    xml.push_str(r#"<w:abstractNum w:abstractNumId="1"><w:multiLevelType w:val="hybridMultilevel"/>"#);
    for ilvl in 0..9u32 {
        let format = DECIMAL_FORMATS[ilvl as usize % DECIMAL_FORMATS.len()];
        xml.push_str(&format!(
            r#"<w:lvl w:ilvl="{0}"><w:start w:val="1"/><w:numFmt w:val="{1}"/><w:lvlText w:val="%{2}."/><w:lvlJc w:val="left"/>"#,
            ilvl,
            format,
            ilvl + 1
        ));
        push_level_indent(&mut xml, ilvl);
        xml.push_str("</w:lvl>");
    }
    xml.push_str("</w:abstractNum>\n");

    xml.push_str(&format!(
        r#"<w:num w:numId="{}"><w:abstractNumId w:val="0"/></w:num>"#,
        NUM_BULLET
    ));
    xml.push('\n');
    xml.push_str(&format!(
        r#"<w:num w:numId="{}"><w:abstractNumId w:val="1"/></w:num>"#,
        NUM_DECIMAL
    ));
    xml.push('\n');
    xml.push_str("</w:numbering>");
    xml
}

fn push_level_indent(xml: &mut String, ilvl: u32) {
    xml.push_str(&format!(
        r#"<w:pPr><w:ind w:left="{}" w:hanging="{}"/></w:pPr>"#,
        LEVEL_INDENT_TWIPS * (ilvl + 1),
        HANGING_TWIPS
    ));
}
