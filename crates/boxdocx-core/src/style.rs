//! Style and attribute utilities
//!
//! Pure helpers shared by the mapper and the DOCX reconstructor: inline
//! CSS parsing, color/length/file-name sanitizing and HTML escaping.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

/// Characters that may not appear in a generated file name
const INVALID_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Parse an inline `style` attribute into lowercase keys and trimmed values.
///
/// Declarations without a colon are skipped. Any `rgb(r, g, b)` value is
/// rewritten as `#rrggbb`.
pub fn parse_style_string(style: &str) -> BTreeMap<String, String> {
    let mut styles = BTreeMap::new();

    for declaration in style.split(';') {
        let Some((key, value)) = declaration.split_once(':') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() {
            continue;
        }
        let mut value = value.trim().to_string();
        if value.to_ascii_lowercase().contains("rgb") {
            if let Some(hex) = rgb_to_hex(&value) {
                value = hex;
            }
        }
        styles.insert(key, value);
    }

    styles
}

/// Convert `rgb(r, g, b)` / `rgba(r, g, b, a)` to `#rrggbb`
pub fn rgb_to_hex(value: &str) -> Option<String> {
    static RGB_RE: OnceLock<Regex> = OnceLock::new();
    let rgb_re = RGB_RE.get_or_init(|| {
        Regex::new(r"(?i)rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})").unwrap()
    });

    let caps = rgb_re.captures(value)?;
    let channel = |i: usize| -> Option<u8> {
        let n: u32 = caps.get(i)?.as_str().parse().ok()?;
        Some(n.min(255) as u8)
    };
    Some(format!(
        "#{:02x}{:02x}{:02x}",
        channel(1)?,
        channel(2)?,
        channel(3)?
    ))
}

/// Normalize a CSS color for use in generated HTML.
///
/// Accepts `#rgb`, `#rrggbb`, `rgb(...)` and plain color names. Returns
/// `None` for anything that could break out of an attribute value.
pub fn sanitize_color(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if value.to_ascii_lowercase().starts_with("rgb") {
        return rgb_to_hex(value);
    }
    if let Some(hex) = value.strip_prefix('#') {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        return match hex.len() {
            3 => {
                let expanded: String = hex.chars().flat_map(|c| [c, c]).collect();
                Some(format!("#{}", expanded.to_ascii_lowercase()))
            }
            6 => Some(format!("#{}", hex.to_ascii_lowercase())),
            _ => None,
        };
    }
    if value.chars().all(|c| c.is_ascii_alphabetic()) {
        return Some(value.to_ascii_lowercase());
    }
    None
}

/// Convert a CSS color to the upper-case `RRGGBB` form OOXML expects
pub fn color_to_hex(value: &str) -> Option<String> {
    let color = sanitize_color(value)?;
    if let Some(hex) = color.strip_prefix('#') {
        return Some(hex.to_ascii_uppercase());
    }
    let named = match color.as_str() {
        "black" => "000000",
        "white" => "FFFFFF",
        "red" => "FF0000",
        "green" => "008000",
        "blue" => "0000FF",
        "yellow" => "FFFF00",
        "orange" => "FFA500",
        "purple" => "800080",
        "gray" | "grey" => "808080",
        "silver" => "C0C0C0",
        "navy" => "000080",
        "teal" => "008080",
        "maroon" => "800000",
        _ => return None,
    };
    Some(named.to_string())
}

/// A CSS length with its unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    /// Pixels (96 per inch)
    Px(f64),
    /// Points (72 per inch)
    Pt(f64),
    /// Em (taken as 16px)
    Em(f64),
    /// Inches
    In(f64),
    /// Centimetres
    Cm(f64),
    /// A bare number; its meaning depends on the property
    Number(f64),
}

impl Length {
    /// Parse the first number in a CSS value together with its unit
    pub fn parse(value: &str) -> Option<Self> {
        static LENGTH_RE: OnceLock<Regex> = OnceLock::new();
        let length_re = LENGTH_RE.get_or_init(|| {
            Regex::new(r"(?i)([-+]?(?:\d+\.?\d*|\.\d+))\s*(px|pt|em|rem|in|cm)?").unwrap()
        });

        let caps = length_re.captures(value.trim())?;
        let number: f64 = caps.get(1)?.as_str().parse().ok()?;
        if !number.is_finite() {
            return None;
        }
        let unit = caps.get(2).map(|m| m.as_str().to_ascii_lowercase());
        Some(match unit.as_deref() {
            Some("px") => Length::Px(number),
            Some("pt") => Length::Pt(number),
            Some("em") | Some("rem") => Length::Em(number),
            Some("in") => Length::In(number),
            Some("cm") => Length::Cm(number),
            _ => Length::Number(number),
        })
    }

    /// Size in inches; bare numbers are read as inches
    pub fn to_inches(self) -> f64 {
        match self {
            Length::Px(v) => v / 96.0,
            Length::Pt(v) => v / 72.0,
            Length::Em(v) => v * 16.0 / 96.0,
            Length::In(v) | Length::Number(v) => v,
            Length::Cm(v) => v / 2.54,
        }
    }

    /// Size in points; bare numbers are read as points
    pub fn to_points(self) -> f64 {
        match self {
            Length::Px(v) => v * 0.75,
            Length::Pt(v) | Length::Number(v) => v,
            Length::Em(v) => v * 12.0,
            Length::In(v) => v * 72.0,
            Length::Cm(v) => v / 2.54 * 72.0,
        }
    }

    /// Size in pixels; bare numbers are read as pixels
    pub fn to_pixels(self) -> f64 {
        match self {
            Length::Px(v) | Length::Number(v) => v,
            Length::Pt(v) => v * 96.0 / 72.0,
            Length::Em(v) => v * 16.0,
            Length::In(v) => v * 96.0,
            Length::Cm(v) => v / 2.54 * 96.0,
        }
    }
}

/// Normalize a size (HTML `width`/`height` style) to whole pixels.
///
/// Returns `None` for unparsable, non-positive or absurdly large values.
pub fn sanitize_size(value: &str) -> Option<u32> {
    let px = Length::parse(value)?.to_pixels().round();
    if px >= 1.0 && px <= 100_000.0 {
        Some(px as u32)
    } else {
        None
    }
}

/// Strip characters that are invalid in file names on common platforms
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !INVALID_FILENAME_CHARS.contains(c) && !c.is_control())
        .collect();
    cleaned.trim().trim_matches('.').to_string()
}

/// Escape text for HTML element content and quoted attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_style_string() {
        let styles = parse_style_string("Text-Align: center; margin-left:96px;;bogus");
        assert_eq!(styles.get("text-align").map(String::as_str), Some("center"));
        assert_eq!(styles.get("margin-left").map(String::as_str), Some("96px"));
        assert_eq!(styles.len(), 2);
    }

    #[test]
    fn test_parse_style_string_rgb() {
        let styles = parse_style_string("color: rgb(255, 0, 16); background-color: RGB(1,2,3)");
        assert_eq!(styles["color"], "#ff0010");
        assert_eq!(styles["background-color"], "#010203");
    }

    #[test]
    fn test_parse_style_string_empty() {
        assert!(parse_style_string("").is_empty());
        assert!(parse_style_string(":value").is_empty());
    }

    #[test]
    fn test_sanitize_color() {
        assert_eq!(sanitize_color("#FF0000"), Some("#ff0000".to_string()));
        assert_eq!(sanitize_color("#abc"), Some("#aabbcc".to_string()));
        assert_eq!(sanitize_color("rgb(0, 128, 255)"), Some("#0080ff".to_string()));
        assert_eq!(sanitize_color("Red"), Some("red".to_string()));
        assert_eq!(sanitize_color("#12345"), None);
        assert_eq!(sanitize_color("red\" onclick=\"x"), None);
        assert_eq!(sanitize_color(""), None);
    }

    #[test]
    fn test_color_to_hex() {
        assert_eq!(color_to_hex("#ff0000"), Some("FF0000".to_string()));
        assert_eq!(color_to_hex("blue"), Some("0000FF".to_string()));
        assert_eq!(color_to_hex("chartreuse"), None);
    }

    #[test]
    fn test_length_conversions() {
        assert_eq!(Length::parse("96px"), Some(Length::Px(96.0)));
        assert_eq!(Length::parse("96px").unwrap().to_inches(), 1.0);
        assert_eq!(Length::parse("72pt").unwrap().to_inches(), 1.0);
        assert_eq!(Length::parse("16px").unwrap().to_points(), 12.0);
        assert_eq!(Length::parse("2").unwrap().to_inches(), 2.0);
        assert_eq!(Length::parse("1.5in"), Some(Length::In(1.5)));
        assert_eq!(Length::parse("abc"), None);
    }

    #[test]
    fn test_sanitize_size() {
        assert_eq!(sanitize_size("200"), Some(200));
        assert_eq!(sanitize_size("150px"), Some(150));
        assert_eq!(sanitize_size("1in"), Some(96));
        assert_eq!(sanitize_size("0"), None);
        assert_eq!(sanitize_size("-5px"), None);
        assert_eq!(sanitize_size("auto"), None);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("a<b>:c\"d/e\\f|g?h*.png"), "abcdefgh.png");
        assert_eq!(sanitize_filename("  report.jpg "), "report.jpg");
        assert_eq!(sanitize_filename("../.."), "");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;"
        );
    }
}
