//! Error types for OOXML operations

use thiserror::Error;

/// Errors that can occur during OOXML operations
#[derive(Error, Debug)]
pub enum OoxmlError {
    /// Error reading or writing the ZIP archive
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Error reading or writing files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing XML content
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The HTML input never opened a `<body>`
    #[error("HTML has no <body> element")]
    MissingBody,

    /// A hyperlink target that cannot be expressed as a relationship
    #[error("Invalid hyperlink target: {0:?}")]
    InvalidHyperlink(String),

    /// An image that cannot be embedded
    #[error("Image error: {0}")]
    Image(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

/// Result type for OOXML operations
pub type Result<T> = std::result::Result<T, OoxmlError>;
