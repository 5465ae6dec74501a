//! Embedded pictures
//!
//! Pictures are written as inline `<w:drawing>` elements:
//!
//! ```xml
//! <w:drawing>
//!   <wp:inline>
//!     <wp:extent cx="..." cy="..."/>               <!-- EMUs -->
//!     <wp:docPr id="..." name="..." descr="..."/>
//!     <a:graphic>
//!       <a:graphicData uri="...picture">
//!         <pic:pic>
//!           <pic:blipFill><a:blip r:embed="rIdNN"/></pic:blipFill>
//!         </pic:pic>
//!       </a:graphicData>
//!     </a:graphic>
//!   </wp:inline>
//! </w:drawing>
//! ```
//!
//! Sizes are computed in inches and stored as EMUs:
//! - 914400 EMUs = 1 inch
//! - 9525 EMUs = 1 pixel (at 96 DPI)

use std::path::Path;

use crate::error::{OoxmlError, Result};

/// EMUs per inch (914400)
pub const EMU_PER_INCH: i64 = 914400;

/// EMUs per pixel at 96 DPI (9525)
pub const EMU_PER_PIXEL: i64 = 9525;

/// Pixels per inch assumed for HTML sizes
pub const PIXELS_PER_INCH: f64 = 96.0;

/// A picture placed in a run
#[derive(Debug, Clone, PartialEq)]
pub struct Picture {
    /// Drawing object id, unique within the document
    pub id: u32,
    /// Relationship ID of the media part
    pub rel_id: String,
    /// Target relative to `word/` (e.g. "media/image1.png")
    pub target: String,
    /// Name shown in the selection pane
    pub name: String,
    /// Alternative text
    pub descr: String,
    /// Width in EMUs
    pub width_emu: i64,
    /// Height in EMUs
    pub height_emu: i64,
}

impl Picture {
    /// Width in inches
    pub fn width_inches(&self) -> f64 {
        emu_to_inches(self.width_emu)
    }

    /// Height in inches
    pub fn height_inches(&self) -> f64 {
        emu_to_inches(self.height_emu)
    }
}

/// Binary content stored under `word/media/`
#[derive(Debug, Clone, PartialEq)]
pub struct MediaPart {
    /// Path inside the package, e.g. "word/media/image1.png"
    pub path: String,
    /// Raw file bytes
    pub data: Vec<u8>,
}

impl MediaPart {
    /// Lowercased file extension of the part
    pub fn extension(&self) -> String {
        self.path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default()
    }
}

/// Work out a picture size in inches
///
/// Both explicit dimensions win outright. A single explicit dimension is
/// completed from the natural aspect ratio. Without explicit dimensions
/// the natural size is used, scaled down to `max_width` if wider.
pub fn fit_size(
    width_px: Option<f64>,
    height_px: Option<f64>,
    natural_px: Option<(u32, u32)>,
    max_width: f64,
) -> Option<(f64, f64)> {
    let natural = natural_px
        .filter(|(w, h)| *w > 0 && *h > 0)
        .map(|(w, h)| (w as f64, h as f64));

    match (width_px, height_px, natural) {
        (Some(w), Some(h), _) => Some((w / PIXELS_PER_INCH, h / PIXELS_PER_INCH)),
        (Some(w), None, Some((nw, nh))) => {
            Some((w / PIXELS_PER_INCH, w * nh / nw / PIXELS_PER_INCH))
        }
        (None, Some(h), Some((nw, nh))) => {
            Some((h * nw / nh / PIXELS_PER_INCH, h / PIXELS_PER_INCH))
        }
        (Some(w), None, None) => Some((w / PIXELS_PER_INCH, w / PIXELS_PER_INCH)),
        (None, Some(h), None) => Some((h / PIXELS_PER_INCH, h / PIXELS_PER_INCH)),
        (None, None, Some((nw, nh))) => {
            let (w, h) = (nw / PIXELS_PER_INCH, nh / PIXELS_PER_INCH);
            if max_width > 0.0 && w > max_width {
                Some((max_width, h * max_width / w))
            } else {
                Some((w, h))
            }
        }
        (None, None, None) => None,
    }
}

/// Read the pixel dimensions of an image file
pub fn natural_size(path: &Path) -> Result<(u32, u32)> {
    image::image_dimensions(path)
        .map_err(|e| OoxmlError::Image(format!("{}: {}", path.display(), e)))
}

/// Convert pixels to EMUs at 96 DPI
pub fn pixels_to_emu(pixels: i64) -> i64 {
    pixels * EMU_PER_PIXEL
}

/// Convert EMUs to inches
pub fn emu_to_inches(emu: i64) -> f64 {
    emu as f64 / EMU_PER_INCH as f64
}

/// Convert inches to EMUs
pub fn inches_to_emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH as f64).round() as i64
}

/// Get the MIME content type for an image extension
pub fn content_type_for_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "tiff" | "tif" => "image/tiff",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unit_conversions() {
        assert_eq!(pixels_to_emu(96), EMU_PER_INCH);
        assert_eq!(inches_to_emu(1.5), 1371600);
        assert!((emu_to_inches(457200) - 0.5).abs() < 1e-9);
    }

    // ==================== Sizing ====================

    #[test]
    fn test_explicit_size_wins() {
        let size = fit_size(Some(192.0), Some(96.0), Some((10, 10)), 6.0).unwrap();
        assert_eq!(size, (2.0, 1.0));
    }

    #[test]
    fn test_explicit_size_is_not_capped() {
        let size = fit_size(Some(960.0), Some(96.0), None, 6.0).unwrap();
        assert_eq!(size, (10.0, 1.0));
    }

    #[test]
    fn test_single_dimension_keeps_aspect_ratio() {
        let (w, h) = fit_size(Some(96.0), None, Some((400, 200)), 6.0).unwrap();
        assert_eq!((w, h), (1.0, 0.5));

        let (w, h) = fit_size(None, Some(96.0), Some((400, 200)), 6.0).unwrap();
        assert_eq!((w, h), (2.0, 1.0));
    }

    #[test]
    fn test_natural_size_scaled_to_max_width() {
        let (w, h) = fit_size(None, None, Some((1152, 576)), 6.0).unwrap();
        assert_eq!((w, h), (6.0, 3.0));

        let (w, h) = fit_size(None, None, Some((192, 96)), 6.0).unwrap();
        assert_eq!((w, h), (2.0, 1.0));
    }

    #[test]
    fn test_no_information_gives_no_size() {
        assert_eq!(fit_size(None, None, None, 6.0), None);
        assert_eq!(fit_size(None, None, Some((0, 10)), 6.0), None);
    }

    #[test]
    fn test_natural_size_reads_png_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pixel.png");
        image::RgbImage::new(30, 20).save(&path).unwrap();
        assert_eq!(natural_size(&path).unwrap(), (30, 20));
    }

    #[test]
    fn test_natural_size_rejects_non_images() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fake.png");
        std::fs::write(&path, b"plain text").unwrap();
        assert!(matches!(natural_size(&path), Err(OoxmlError::Image(_))));
    }

    #[test]
    fn test_content_type_for_extension() {
        assert_eq!(content_type_for_extension("PNG"), "image/png");
        assert_eq!(content_type_for_extension("jpg"), "image/jpeg");
        assert_eq!(content_type_for_extension("webp"), "image/webp");
        assert_eq!(content_type_for_extension("xyz"), "application/octet-stream");
    }

    #[test]
    fn test_media_part_extension() {
        let part = MediaPart {
            path: "word/media/image1.JPG".to_string(),
            data: Vec::new(),
        };
        assert_eq!(part.extension(), "jpg");
    }
}
