//! Relationship parts for OOXML packages
//!
//! Every reference from `word/document.xml` to something outside the part
//! (styles, numbering, pictures, external hyperlinks) goes through an ID
//! registered in `word/_rels/document.xml.rels`.
//!
//! # Example
//!
//! ```
//! use boxdocx_ooxml::relationships::Relationships;
//!
//! let mut rels = Relationships::new();
//! let id = rels.add_hyperlink("https://example.com/report").unwrap();
//! assert_eq!(id, "rId1");
//! assert!(rels.to_xml().contains(r#"TargetMode="External""#));
//!
//! assert!(rels.add_hyperlink("javascript:alert(1)").is_err());
//! ```

use std::collections::HashMap;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{OoxmlError, Result};
use crate::writer::escape_xml;

/// OOXML namespace for relationships
pub const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Relationship type URIs
impl Relationships {
    /// Hyperlink relationship type
    pub const TYPE_HYPERLINK: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
    /// Image relationship type
    pub const TYPE_IMAGE: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    /// Styles relationship type
    pub const TYPE_STYLES: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
    /// Numbering relationship type
    pub const TYPE_NUMBERING: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering";
    /// Settings relationship type
    pub const TYPE_SETTINGS: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/settings";
    /// Main document part (package-level)
    pub const TYPE_OFFICE_DOCUMENT: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    /// Core properties (package-level)
    pub const TYPE_CORE_PROPERTIES: &'static str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    /// Extended properties (package-level)
    pub const TYPE_EXTENDED_PROPERTIES: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
}

/// Relationships of one part, in insertion order
#[derive(Debug, Clone)]
pub struct Relationships {
    order: Vec<String>,
    map: HashMap<String, RelationshipTarget>,
    next_id_counter: u32,
}

impl Default for Relationships {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            map: HashMap::new(),
            next_id_counter: 1,
        }
    }
}

/// A relationship target with its type and mode
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipTarget {
    /// The target URL or part path
    pub target: String,
    /// The relationship type URI
    pub rel_type: String,
    /// "External" for URLs, None for parts inside the package
    pub target_mode: Option<String>,
}

impl Relationships {
    /// Create an empty relationships map
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse relationships from XML bytes
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut rels = Self::new();
        let mut max_id: u32 = 0;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    if e.local_name().as_ref() != b"Relationship" {
                        buf.clear();
                        continue;
                    }
                    let mut id = None;
                    let mut target = None;
                    let mut rel_type = None;
                    let mut target_mode = None;

                    for attr in e.attributes().filter_map(|a| a.ok()) {
                        let value = attr.unescape_value().ok().map(|s| s.to_string());
                        match attr.key.as_ref() {
                            b"Id" => id = value,
                            b"Target" => target = value,
                            b"Type" => rel_type = value,
                            b"TargetMode" => target_mode = value,
                            _ => {}
                        }
                    }

                    if let (Some(id), Some(target)) = (id, target) {
                        if let Some(num) = extract_id_number(&id) {
                            max_id = max_id.max(num);
                        }
                        rels.order.push(id.clone());
                        rels.map.insert(
                            id,
                            RelationshipTarget {
                                target,
                                rel_type: rel_type.unwrap_or_default(),
                                target_mode,
                            },
                        );
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(OoxmlError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        rels.next_id_counter = max_id + 1;
        Ok(rels)
    }

    /// Add a relationship and return the generated ID
    ///
    /// Hyperlinks to `http(s)` targets are marked as external.
    pub fn add(&mut self, target: String, rel_type: String) -> String {
        let target_mode = if rel_type == Self::TYPE_HYPERLINK && target.contains("://") {
            Some("External".to_string())
        } else {
            None
        };
        self.add_with_mode(target, rel_type, target_mode)
    }

    /// Add a relationship with an explicit target mode
    pub fn add_with_mode(
        &mut self,
        target: String,
        rel_type: String,
        target_mode: Option<String>,
    ) -> String {
        let id = format!("rId{}", self.next_id_counter);
        self.next_id_counter += 1;

        self.order.push(id.clone());
        self.map.insert(
            id.clone(),
            RelationshipTarget {
                target,
                rel_type,
                target_mode,
            },
        );

        id
    }

    /// Register an external hyperlink target
    ///
    /// Targets that cannot become a usable relationship (empty, a bare `#`,
    /// script or data URLs, embedded whitespace or control characters) are
    /// rejected so the caller can fall back to plain text.
    pub fn add_hyperlink(&mut self, url: &str) -> Result<String> {
        let url = url.trim();
        validate_hyperlink(url)?;

        // Reuse an existing relationship for the same target
        if let Some(id) = self.order.iter().find(|id| {
            self.map
                .get(*id)
                .map(|r| r.rel_type == Self::TYPE_HYPERLINK && r.target == url)
                .unwrap_or(false)
        }) {
            return Ok(id.clone());
        }

        Ok(self.add_with_mode(
            url.to_string(),
            Self::TYPE_HYPERLINK.to_string(),
            Some("External".to_string()),
        ))
    }

    /// Register an embedded picture, `target` relative to `word/`
    pub fn add_image(&mut self, target: &str) -> String {
        self.add(target.to_string(), Self::TYPE_IMAGE.to_string())
    }

    /// Serialize to a `.rels` part
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<Relationships xmlns="{}">"#, RELATIONSHIPS_NS));
        xml.push('\n');

        for (id, rel) in self.iter() {
            xml.push_str("  <Relationship");
            xml.push_str(&format!(r#" Id="{}""#, escape_xml(id)));
            xml.push_str(&format!(r#" Type="{}""#, escape_xml(&rel.rel_type)));
            xml.push_str(&format!(r#" Target="{}""#, escape_xml(&rel.target)));
            if let Some(mode) = &rel.target_mode {
                xml.push_str(&format!(r#" TargetMode="{}""#, escape_xml(mode)));
            }
            xml.push_str("/>\n");
        }

        xml.push_str("</Relationships>");
        xml
    }

    /// Get the target for a relationship ID
    pub fn get(&self, id: &str) -> Option<&str> {
        self.map.get(id).map(|r| r.target.as_str())
    }

    /// Get the full relationship for an ID
    pub fn get_target(&self, id: &str) -> Option<&RelationshipTarget> {
        self.map.get(id)
    }

    /// Check if a relationship is a hyperlink
    pub fn is_hyperlink(&self, id: &str) -> bool {
        self.map
            .get(id)
            .map(|r| r.rel_type == Self::TYPE_HYPERLINK)
            .unwrap_or(false)
    }

    /// Check if a relationship is an image
    pub fn is_image(&self, id: &str) -> bool {
        self.map
            .get(id)
            .map(|r| r.rel_type == Self::TYPE_IMAGE)
            .unwrap_or(false)
    }

    /// Number of relationships
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if there are no relationships
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RelationshipTarget)> {
        self.order
            .iter()
            .filter_map(|id| self.map.get(id).map(|rel| (id.as_str(), rel)))
    }
}

fn validate_hyperlink(url: &str) -> Result<()> {
    let invalid = || OoxmlError::InvalidHyperlink(url.to_string());

    if url.is_empty() || url == "#" {
        return Err(invalid());
    }
    if url.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(invalid());
    }
    let lower = url.to_ascii_lowercase();
    if ["javascript:", "vbscript:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return Err(invalid());
    }
    Ok(())
}

/// Numeric portion of a relationship ID ("rId5" -> 5)
fn extract_id_number(id: &str) -> Option<u32> {
    id.strip_prefix("rId")
        .or_else(|| id.strip_prefix("RId"))
        .or_else(|| id.strip_prefix("rid"))
        .and_then(|num_str| num_str.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_relationships() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
        <Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
            <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com" TargetMode="External"/>
            <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
        </Relationships>"#;

        let rels = Relationships::parse(xml).unwrap();

        assert_eq!(rels.get("rId1"), Some("https://example.com"));
        assert_eq!(rels.get("rId2"), Some("styles.xml"));
        assert!(rels.is_hyperlink("rId1"));
        assert!(!rels.is_hyperlink("rId2"));
        assert_eq!(rels.len(), 2);
    }

    #[test]
    fn test_add_continues_from_existing() {
        let xml = br#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
            <Relationship Id="rId1" Type="x" Target="styles.xml"/>
            <Relationship Id="rId5" Type="y" Target="numbering.xml"/>
        </Relationships>"#;

        let mut rels = Relationships::parse(xml).unwrap();
        assert_eq!(rels.add_image("media/image1.png"), "rId6");
    }

    #[test]
    fn test_add_image_is_internal() {
        let mut rels = Relationships::new();
        let id = rels.add_image("media/image1.png");
        assert!(rels.is_image(&id));
        assert_eq!(rels.get_target(&id).unwrap().target_mode, None);
    }

    // ==================== Hyperlinks ====================

    #[test]
    fn test_add_hyperlink_external() {
        let mut rels = Relationships::new();
        let id = rels.add_hyperlink("  https://example.com/a?b=1&c=2 ").unwrap();
        let target = rels.get_target(&id).unwrap();
        assert_eq!(target.target, "https://example.com/a?b=1&c=2");
        assert_eq!(target.target_mode.as_deref(), Some("External"));
        assert!(rels.to_xml().contains("a?b=1&amp;c=2"));
    }

    #[test]
    fn test_add_hyperlink_reuses_same_target() {
        let mut rels = Relationships::new();
        let a = rels.add_hyperlink("https://example.com").unwrap();
        let b = rels.add_hyperlink("https://example.com").unwrap();
        assert_eq!(a, b);
        assert_eq!(rels.len(), 1);
    }

    #[test]
    fn test_add_hyperlink_rejects_unusable_targets() {
        let mut rels = Relationships::new();
        for bad in [
            "",
            "   ",
            "#",
            "javascript:alert(1)",
            "JavaScript:void(0)",
            "vbscript:msgbox",
            "data:text/html,hi",
            "https://exa mple.com",
            "https://example.com/\u{7}",
        ] {
            assert!(
                matches!(rels.add_hyperlink(bad), Err(OoxmlError::InvalidHyperlink(_))),
                "accepted {bad:?}"
            );
        }
        assert!(rels.is_empty());
    }

    #[test]
    fn test_mailto_is_accepted() {
        let mut rels = Relationships::new();
        assert!(rels.add_hyperlink("mailto:team@example.com").is_ok());
    }

    #[test]
    fn test_to_xml_round_trips() {
        let mut rels = Relationships::new();
        rels.add("styles.xml".to_string(), Relationships::TYPE_STYLES.to_string());
        rels.add_hyperlink("https://example.com").unwrap();

        let reparsed = Relationships::parse(rels.to_xml().as_bytes()).unwrap();
        assert_eq!(reparsed.len(), 2);
        assert_eq!(reparsed.get("rId1"), Some("styles.xml"));
        assert!(reparsed.is_hyperlink("rId2"));
    }
}
