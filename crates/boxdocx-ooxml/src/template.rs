//! Base package for generated documents
//!
//! Every DOCX the writer produces starts from the same set of parts; the
//! writer then adds the body, its relationships and the media.

use crate::archive::OoxmlArchive;
use crate::numbering::numbering_xml;
use crate::options::ReconstructOptions;
use crate::relationships::Relationships;
use crate::styles::StyleSheet;
use crate::writer::escape_xml;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
  <Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/>
  <Override PartName="/word/settings.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml"/>
  <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
  <Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
</Types>"#;

const SETTINGS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:settings xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:defaultTabStop w:val="720"/>
  <w:characterSpacingControl w:val="doNotCompress"/>
  <w:compat><w:compatSetting w:name="compatibilityMode" w:uri="http://schemas.microsoft.com/office/word" w:val="15"/></w:compat>
</w:settings>"#;

const APP_PROPERTIES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
  <Application>boxdocx</Application>
</Properties>"#;

/// The fixed parts of a generated package
#[derive(Debug)]
pub struct Template {
    archive: OoxmlArchive,
    stylesheet: StyleSheet,
}

impl Template {
    /// Build the base package for `options`
    pub fn new(options: &ReconstructOptions) -> Self {
        let stylesheet = StyleSheet::builtin(options);
        let mut archive = OoxmlArchive::new();

        archive.set_string("[Content_Types].xml", CONTENT_TYPES);
        archive.set_string("_rels/.rels", package_relationships().to_xml());
        archive.set_string("docProps/app.xml", APP_PROPERTIES);
        archive.set_string("docProps/core.xml", core_properties(None));
        archive.set_string("word/settings.xml", SETTINGS);
        archive.set_string("word/styles.xml", stylesheet.to_xml(options));
        archive.set_string("word/numbering.xml", numbering_xml());

        Self {
            archive,
            stylesheet,
        }
    }

    /// Styles defined by this package
    pub fn styles(&self) -> &StyleSheet {
        &self.stylesheet
    }

    /// Get the underlying archive
    pub fn archive(&self) -> &OoxmlArchive {
        &self.archive
    }

    /// Consume the template and return the archive
    pub fn into_archive(self) -> OoxmlArchive {
        self.archive
    }
}

fn package_relationships() -> Relationships {
    let mut rels = Relationships::new();
    rels.add(
        "word/document.xml".to_string(),
        Relationships::TYPE_OFFICE_DOCUMENT.to_string(),
    );
    rels.add(
        "docProps/core.xml".to_string(),
        Relationships::TYPE_CORE_PROPERTIES.to_string(),
    );
    rels.add(
        "docProps/app.xml".to_string(),
        Relationships::TYPE_EXTENDED_PROPERTIES.to_string(),
    );
    rels
}

/// Core properties part, with an optional title
pub fn core_properties(title: Option<&str>) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');
    xml.push_str(r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#);
    if let Some(title) = title {
        xml.push_str(&format!("<dc:title>{}</dc:title>", escape_xml(title)));
    }
    xml.push_str("<dc:creator>boxdocx</dc:creator>");
    xml.push_str("</cp:coreProperties>");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_package_parts() {
        let template = Template::new(&ReconstructOptions::default());
        let archive = template.archive();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/core.xml",
            "docProps/app.xml",
            "word/settings.xml",
            "word/styles.xml",
            "word/numbering.xml",
        ] {
            assert!(archive.contains(part), "missing {part}");
        }
        assert!(template.styles().contains("TableGrid"));
    }

    #[test]
    fn test_package_relationships_point_at_document() {
        let template = Template::new(&ReconstructOptions::default());
        let rels_xml = template.archive().get("_rels/.rels").unwrap();
        let rels = Relationships::parse(rels_xml).unwrap();
        assert_eq!(rels.get("rId1"), Some("word/document.xml"));
    }

    #[test]
    fn test_core_properties_escapes_title() {
        let xml = core_properties(Some("Q&A <draft>"));
        assert!(xml.contains("<dc:title>Q&amp;A &lt;draft&gt;</dc:title>"));
    }
}
