//! # boxdocx-ooxml
//!
//! OOXML (Office Open XML) generation for boxdocx.
//!
//! This crate provides the second conversion stage:
//! - Stream HTML into an in-memory [`Document`] ([`HtmlReconstructor`])
//! - Write that document as a DOCX package ([`DocxWriter`])
//!
//! ## Example
//!
//! ```
//! use boxdocx_ooxml::{html_to_docx, OoxmlArchive, ReconstructOptions};
//!
//! let html = "<html><body><h1>Notes</h1><p>First line</p></body></html>";
//! let bytes = html_to_docx(html, &ReconstructOptions::default(), ".")?;
//!
//! let archive = OoxmlArchive::from_bytes(&bytes)?;
//! assert!(archive.contains("word/document.xml"));
//! # Ok::<(), boxdocx_ooxml::OoxmlError>(())
//! ```

pub mod archive;
pub mod document;
pub mod error;
pub mod image;
pub mod numbering;
pub mod options;
pub mod reconstruct;
pub mod relationships;
pub mod styles;
pub mod template;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_utils;

use std::path::Path;

pub use archive::OoxmlArchive;
pub use document::{
    Alignment, Block, Document, Hyperlink, HyperlinkTarget, Paragraph, ParagraphChild, Run,
    RunProps, Table, TableCell,
};
pub use error::{OoxmlError, Result};
pub use image::{MediaPart, Picture};
pub use options::ReconstructOptions;
pub use reconstruct::{HtmlReconstructor, ReconstructWarning};
pub use relationships::Relationships;
pub use styles::{Style, StyleSheet, StyleType};
pub use template::Template;
pub use writer::DocxWriter;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Convert a complete HTML document to DOCX bytes
///
/// Image sources are resolved relative to `assets_dir`. Recoverable
/// problems are logged and do not fail the conversion.
pub fn html_to_docx(
    html: &str,
    options: &ReconstructOptions,
    assets_dir: impl AsRef<Path>,
) -> Result<Vec<u8>> {
    let mut reconstructor =
        HtmlReconstructor::new(options.clone()).with_assets_dir(assets_dir.as_ref());
    let doc = reconstructor.reconstruct(html)?;
    DocxWriter::generate(&doc, options)
}
