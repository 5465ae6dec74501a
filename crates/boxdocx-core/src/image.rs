//! Image mapping and resolution
//!
//! The mapper never fetches images itself. Before mapping, every image
//! reference in the note is offered to an [`ImageResolver`]; hits are
//! recorded in an [`ImageMapping`] keyed by the reference's URL, and the
//! mapper consults that mapping read-only.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use boxdocx_ast::{BoxNote, ImageSource};
use sha2::{Digest, Sha256};

use crate::error::{CoreError, Result};
use crate::style::sanitize_filename;

/// Image extensions the converter recognises
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Lookup from image reference key to a local file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageMapping {
    entries: HashMap<String, PathBuf>,
}

impl ImageMapping {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a resolved image
    pub fn insert(&mut self, key: impl Into<String>, path: impl Into<PathBuf>) {
        self.entries.insert(key.into(), path.into());
    }

    /// Exact-key lookup
    pub fn get(&self, key: &str) -> Option<&Path> {
        self.entries.get(key).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entries (unordered)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_path()))
    }
}

/// Resolves an image reference to a local file
pub trait ImageResolver {
    /// Return the local path of the image, or `None` when it is unavailable
    fn resolve(&mut self, source: &ImageSource) -> Option<PathBuf>;
}

/// Offer every image in `note` to `resolver` and collect the hits
pub fn build_image_mapping<R: ImageResolver + ?Sized>(
    note: &BoxNote,
    resolver: &mut R,
) -> ImageMapping {
    let mut mapping = ImageMapping::new();
    let sources = note.collect_image_sources();
    log::info!("Found {} image reference(s)", sources.len());

    for source in &sources {
        if mapping.get(&source.key).is_some() {
            continue;
        }
        match resolver.resolve(source) {
            Some(path) => {
                log::debug!("Image mapping: {} -> {}", source.key, path.display());
                mapping.insert(source.key.clone(), path);
            }
            None => log::warn!("Could not resolve image: {}", source.key),
        }
    }

    mapping
}

/// Resolver that looks for image files in local directories and copies
/// hits into `<assets>/images/`
#[derive(Debug, Clone)]
pub struct LocalImageResolver {
    search_dirs: Vec<PathBuf>,
    images_dir: PathBuf,
    copied: HashMap<PathBuf, PathBuf>,
}

impl LocalImageResolver {
    /// Create a resolver that copies into `assets_dir/images`
    pub fn new(assets_dir: impl AsRef<Path>) -> Self {
        Self {
            search_dirs: Vec::new(),
            images_dir: assets_dir.as_ref().join("images"),
            copied: HashMap::new(),
        }
    }

    /// Add a directory to search for image files
    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    /// Add several search directories
    pub fn with_search_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.search_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    /// Directory that receives copied images
    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    fn find(&self, source: &ImageSource) -> Option<PathBuf> {
        let mut names = Vec::new();
        if let Some(name) = &source.file_name {
            names.push(sanitize_filename(name));
        }
        if let Some(name) = url_basename(&source.key) {
            names.push(sanitize_filename(&name));
        }
        if let Some(id) = &source.file_id {
            for ext in IMAGE_EXTENSIONS {
                names.push(format!("{}.{}", sanitize_filename(id), ext));
            }
        }
        names.retain(|n| !n.is_empty());

        self.search_dirs
            .iter()
            .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
            .find(|candidate| candidate.is_file())
    }

    fn copy_into_assets(&mut self, found: &Path, source: &ImageSource) -> Result<PathBuf> {
        if let Some(existing) = self.copied.get(found) {
            return Ok(existing.clone());
        }

        fs::create_dir_all(&self.images_dir)?;
        let preferred = source
            .file_name
            .as_deref()
            .map(|name| normalize_image_filename(name, &source.key))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| generate_image_filename(&source.key));
        let target = unique_path(&self.images_dir, &preferred);

        fs::copy(found, &target).map_err(|e| {
            CoreError::Image(format!(
                "failed to copy {} to {}: {}",
                found.display(),
                target.display(),
                e
            ))
        })?;

        self.copied.insert(found.to_path_buf(), target.clone());
        Ok(target)
    }
}

impl ImageResolver for LocalImageResolver {
    fn resolve(&mut self, source: &ImageSource) -> Option<PathBuf> {
        let found = self.find(source)?;
        match self.copy_into_assets(&found, source) {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        }
    }
}

/// Stable file name for an image known only by URL:
/// `image_<first 10 hex chars of sha256(url)>.<ext>`
pub fn generate_image_filename(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let hash: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    format!("image_{}.{}", &hash[..10], extension_from_url(url))
}

/// Clean a recorded file name and make sure it ends in a known image
/// extension (`.jpeg` becomes `.jpg`; a missing extension is taken from the
/// URL)
pub fn normalize_image_filename(name: &str, url: &str) -> String {
    let clean = sanitize_filename(name);
    if clean.is_empty() {
        return clean;
    }
    match clean.rsplit_once('.') {
        Some((stem, ext)) if IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) => {
            let ext = ext.to_ascii_lowercase();
            let ext = if ext == "jpeg" { "jpg".to_string() } else { ext };
            format!("{}.{}", stem, ext)
        }
        _ => format!("{}.{}", clean, extension_from_url(url)),
    }
}

/// Image extension implied by a URL path, defaulting to `jpg`
pub fn extension_from_url(url: &str) -> &'static str {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    if path.ends_with(".jpg") || path.ends_with(".jpeg") {
        "jpg"
    } else if path.ends_with(".png") {
        "png"
    } else if path.ends_with(".gif") {
        "gif"
    } else if path.ends_with(".bmp") {
        "bmp"
    } else if path.ends_with(".webp") {
        "webp"
    } else {
        "jpg"
    }
}

fn url_basename(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let name = path.trim_end_matches('/').rsplit('/').next()?;
    let has_ext = name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
    has_ext.then(|| name.to_string())
}

/// `dir/name`, or `dir/stem_N.ext` for the first N that does not exist yet
fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) => (stem, format!(".{}", ext)),
        None => (name, String::new()),
    };
    let mut counter = 1;
    loop {
        let candidate = dir.join(format!("{}_{}{}", stem, counter, ext));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}
