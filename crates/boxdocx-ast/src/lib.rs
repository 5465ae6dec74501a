//! boxdocx-ast - BoxNote document tree definitions
//!
//! This crate provides the node types used by boxdocx for representing
//! BoxNote documents, together with the lenient loader that turns raw
//! (possibly damaged) BoxNote JSON into a tree the mapper can walk.

pub mod boxnote;
pub mod node;

pub use boxnote::{validate_boxnote, BoxNote, ImageSource, ParseOutcome, BOX_FILE_URL_PREFIX};
pub use node::{Attrs, Mark, Node};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
