//! boxdocx CLI - Command-line interface library
//!
//! This library provides the CLI functionality for boxdocx, including:
//! - Convert: BoxNote to DOCX, one file or a whole directory
//! - Html: BoxNote to the intermediate HTML only
//! - Check: strict BoxNote shape validation
//!
//! # Binary Usage
//!
//! ```bash
//! # Convert one note, keeping the intermediate HTML
//! boxdocx convert "Team Plan.boxnote" -o plan.docx --keep-html
//!
//! # Convert every note under a directory
//! boxdocx batch exports/ --config boxdocx.toml
//!
//! # Validate a note without converting it
//! boxdocx check "Team Plan.boxnote"
//! ```

pub mod app;
pub mod config;

// Re-export main entry point and types
pub use app::{
    batch_command, check_command, convert_command, html_command, init_logging, run_cli,
    BatchSummary, ConversionReport,
};
pub use config::{load_settings, ImageSettings, Settings, CONFIG_FILE_NAME};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
