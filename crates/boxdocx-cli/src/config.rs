//! boxdocx.toml configuration
//!
//! Every key is optional:
//!
//! ```toml
//! [docx]
//! table_style = "TableGrid"
//! list_indent = 0.5
//! blockquote_indent = 0.5
//! max_indent = 5.5
//! font_name = "Calibri"
//! font_size = 11.0
//! max_image_width = 6.0
//!
//! [images]
//! search_dirs = ["./downloads"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use boxdocx_ooxml::ReconstructOptions;

/// File name looked up when no `--config` is given
pub const CONFIG_FILE_NAME: &str = "boxdocx.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// DOCX generation options
    pub docx: ReconstructOptions,
    /// Image lookup
    pub images: ImageSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    /// Directories searched for image files referenced by notes
    pub search_dirs: Vec<PathBuf>,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}

/// Load settings from `path`, or from `boxdocx.toml` in `fallback_dir`
///
/// An explicit path must exist and parse. The fallback file is optional;
/// when it is missing or broken the defaults are used.
pub fn load_settings(path: Option<&Path>, fallback_dir: &Path) -> Result<Settings> {
    match path {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            Settings::from_toml_str(&content)
                .with_context(|| format!("Failed to parse config: {}", path.display()))
        }
        None => {
            let candidate = fallback_dir.join(CONFIG_FILE_NAME);
            if let Ok(content) = fs::read_to_string(&candidate) {
                match Settings::from_toml_str(&content) {
                    Ok(settings) => {
                        log::debug!("Loaded config: {}", candidate.display());
                        return Ok(settings);
                    }
                    Err(e) => {
                        log::warn!("Ignoring {}: {}", candidate.display(), e);
                    }
                }
            }
            Ok(Settings::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_gives_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.docx.table_style, "TableGrid");
        assert_eq!(settings.docx.max_image_width, 6.0);
    }

    #[test]
    fn test_partial_sections() {
        let toml = r#"
[docx]
font_name = "Arial"
list_indent = 0.25

[images]
search_dirs = ["downloads", "/tmp/box"]
"#;
        let settings = Settings::from_toml_str(toml).unwrap();
        assert_eq!(settings.docx.font_name, "Arial");
        assert_eq!(settings.docx.list_indent, 0.25);
        assert_eq!(settings.docx.font_size, 11.0);
        assert_eq!(
            settings.images.search_dirs,
            vec![PathBuf::from("downloads"), PathBuf::from("/tmp/box")]
        );
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        assert!(Settings::from_toml_str("this is not valid { toml").is_err());
        assert!(Settings::from_toml_str("[docx]\nlist_indent = \"wide\"").is_err());
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let toml = r#"
[docx]
future_field = "value"

[future_section]
something = true
"#;
        assert!(Settings::from_toml_str(toml).is_ok());
    }

    #[test]
    fn test_load_settings_fallback() {
        let dir = tempfile::TempDir::new().unwrap();
        assert_eq!(load_settings(None, dir.path()).unwrap(), Settings::default());

        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[docx]\ntable_style = \"TableNormal\"\n",
        )
        .unwrap();
        let settings = load_settings(None, dir.path()).unwrap();
        assert_eq!(settings.docx.table_style, "TableNormal");
    }

    #[test]
    fn test_load_settings_explicit_path_must_exist() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_settings(Some(&missing), dir.path()).is_err());
    }
}
