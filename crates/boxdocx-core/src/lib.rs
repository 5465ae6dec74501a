//! boxdocx-core - BoxNote to HTML
//!
//! Core library for boxdocx, providing the first conversion stage: a
//! BoxNote content tree is mapped to a small, self-contained HTML document.
//!
//! # Example
//!
//! ```
//! use boxdocx_ast::BoxNote;
//! use boxdocx_core::{map_to_html, ImageMapping};
//!
//! let note = BoxNote::parse(r#"{"doc":{"content":[
//!     {"type":"heading","attrs":{"level":2},"content":[{"type":"text","text":"Plan"}]}
//! ]}}"#);
//!
//! let html = map_to_html(&note, ImageMapping::new());
//! assert!(html.contains("<h2>Plan</h2>"));
//! ```

pub mod error;
pub mod image;
pub mod mapper;
pub mod style;
pub mod stylesheet;
pub mod tags;

use boxdocx_ast::BoxNote;

// Re-export main types and functions
pub use error::{CoreError, Result};
pub use image::{
    build_image_mapping, generate_image_filename, ImageMapping, ImageResolver, LocalImageResolver,
};
pub use mapper::{HtmlMapper, MapWarning, NodeResult};
pub use style::{escape_html, parse_style_string, sanitize_color, sanitize_filename, sanitize_size};
pub use stylesheet::STYLESHEET;
pub use tags::{MarkKind, NodeKind, TagTemplate};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Map a loaded note to a complete HTML document
pub fn map_to_html(note: &BoxNote, images: ImageMapping) -> String {
    HtmlMapper::with_images(images).render_document(&note.content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, "1.0.0");
    }

    #[test]
    fn test_malformed_json_still_yields_html_with_literal_text() {
        let note = BoxNote::parse("{{ definitely <not> json");
        let html = map_to_html(&note, ImageMapping::new());
        assert!(html.contains("<body>"));
        assert!(html.contains("<p>{{ definitely &lt;not&gt; json</p>"));
    }
}
