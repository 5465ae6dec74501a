//! Fixed stylesheet embedded in every generated HTML document

/// Inline CSS for tables, blockquotes, code blocks, checklists, images and
/// headings
pub const STYLESHEET: &str = r#"
body { font-family: Calibri, Arial, sans-serif; font-size: 11pt; line-height: 1.4; }
h1, h2, h3, h4, h5, h6 { font-weight: bold; margin: 1em 0 0.5em 0; }
h1 { font-size: 20pt; }
h2 { font-size: 16pt; }
h3 { font-size: 14pt; }
table { border-collapse: collapse; width: 100%; margin: 0.5em 0; }
th, td { border: 1px solid #000000; padding: 4px 8px; vertical-align: top; }
th { font-weight: bold; background-color: #f2f2f2; }
blockquote { margin: 0.5em 0.5in; padding-left: 1em; border-left: 4px solid #cccccc; color: #555555; }
pre { background-color: #f0f0f0; border: 1px solid #cccccc; padding: 8px; }
code { font-family: "Courier New", monospace; font-size: 10pt; }
ul.checklist { list-style-type: none; padding-left: 1em; }
ul.checklist li.checked { color: #666666; }
img { max-width: 6in; height: auto; }
"#;
