//! Shared test helpers for boxdocx-ooxml

use crate::archive::OoxmlArchive;

/// The main document part as text
pub fn document_xml(archive: &OoxmlArchive) -> String {
    archive
        .get_string("word/document.xml")
        .expect("package has no word/document.xml")
}

/// Every `<w:p>...</w:p>` element of a document part, in order
///
/// Paragraphs are never nested, so a linear scan is enough.
pub fn paragraphs(xml: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut rest = xml;
    while let Some(start) = rest.find("<w:p>") {
        let Some(len) = rest[start..].find("</w:p>") else {
            break;
        };
        let end = start + len + "</w:p>".len();
        found.push(&rest[start..end]);
        rest = &rest[end..];
    }
    found
}

/// Concatenated `w:t` text of one XML fragment
fn text_of(fragment: &str) -> String {
    let mut text = String::new();
    let mut rest = fragment;
    while let Some(start) = rest.find("<w:t xml:space=\"preserve\">") {
        let from = start + "<w:t xml:space=\"preserve\">".len();
        let Some(len) = rest[from..].find("</w:t>") else {
            break;
        };
        text.push_str(&rest[from..from + len]);
        rest = &rest[from + len..];
    }
    text
}

/// The paragraph whose text equals `text`
pub fn paragraph_with_text<'a>(xml: &'a str, text: &str) -> Option<&'a str> {
    paragraphs(xml).into_iter().find(|p| text_of(p) == text)
}
