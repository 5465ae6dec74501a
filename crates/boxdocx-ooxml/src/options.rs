//! Reconstruction options
//!
//! Loaded from the `[docx]` table of `boxdocx.toml`; every key is optional.

use serde::Deserialize;

/// Tunables for the HTML to DOCX stage
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReconstructOptions {
    /// Table style applied to every table
    pub table_style: String,
    /// Left indent per list nesting level, in inches
    pub list_indent: f64,
    /// Left and right indent of blockquote paragraphs, in inches
    pub blockquote_indent: f64,
    /// Upper bound for any computed left indent, in inches
    pub max_indent: f64,
    /// Body font
    pub font_name: String,
    /// Body font size in points
    pub font_size: f64,
    /// Pictures wider than this (inches) are scaled down
    pub max_image_width: f64,
    /// Font for `<pre>` and `<code>`
    pub code_font: String,
}

impl Default for ReconstructOptions {
    fn default() -> Self {
        Self {
            table_style: "TableGrid".to_string(),
            list_indent: 0.5,
            blockquote_indent: 0.5,
            max_indent: 5.5,
            font_name: "Calibri".to_string(),
            font_size: 11.0,
            max_image_width: 6.0,
            code_font: "Courier New".to_string(),
        }
    }
}

impl ReconstructOptions {
    /// Clamp an indent to `[0, max_indent]`
    pub fn clamp_indent(&self, inches: f64) -> f64 {
        inches.max(0.0).min(self.max_indent)
    }
}
