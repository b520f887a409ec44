//! Image format identification and output naming.
//!
//! Formats are identified by file extension, never by content sniffing —
//! the decode path re-checks the actual container anyway, and extension-driven
//! dispatch keeps `derived_filename` a pure function of the chain.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Image container formats the pipeline knows about.
///
/// `Other` covers anything decodable but not individually handled (TIFF,
/// BMP, ...). It can be read but never selected as a conversion target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[serde(alias = "jpg")]
    Jpeg,
    Png,
    Webp,
    Gif,
    Other,
}

impl ImageFormat {
    /// Identify a format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Self::Jpeg,
            "png" => Self::Png,
            "webp" => Self::Webp,
            "gif" => Self::Gif,
            _ => Self::Other,
        }
    }

    /// Identify a format from a path's extension. No extension → `Other`.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Other)
    }

    /// Parse a user-supplied format name (CLI `--convert`, config entries).
    ///
    /// Returns `None` for unknown names and for "other", which is not a
    /// nameable conversion target.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Canonical file extension, or `None` for `Other`.
    pub fn extension(self) -> Option<&'static str> {
        match self {
            Self::Jpeg => Some("jpg"),
            Self::Png => Some("png"),
            Self::Webp => Some("webp"),
            Self::Gif => Some("gif"),
            Self::Other => None,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Gif => "gif",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// Output filename for a source path under an optional format override.
///
/// With an override, the extension is swapped to the target format's
/// canonical one; without, the filename is returned as-is. Returns `None`
/// only when the path has no filename component.
pub fn derived_filename(source: &Path, format_override: Option<ImageFormat>) -> Option<String> {
    let name = source.file_name()?.to_string_lossy().into_owned();
    let Some(ext) = format_override.and_then(ImageFormat::extension) else {
        return Some(name);
    };
    let stem = source.file_stem()?.to_string_lossy();
    Some(format!("{stem}.{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_extension_case_insensitive() {
        assert_eq!(ImageFormat::from_extension("JPG"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_extension("jpeg"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_extension("Png"), ImageFormat::Png);
        assert_eq!(ImageFormat::from_extension("webp"), ImageFormat::Webp);
        assert_eq!(ImageFormat::from_extension("gif"), ImageFormat::Gif);
        assert_eq!(ImageFormat::from_extension("tiff"), ImageFormat::Other);
    }

    #[test]
    fn from_path_reads_extension() {
        assert_eq!(
            ImageFormat::from_path(Path::new("/uploads/photo.JPEG")),
            ImageFormat::Jpeg
        );
        assert_eq!(
            ImageFormat::from_path(Path::new("/uploads/noext")),
            ImageFormat::Other
        );
    }

    #[test]
    fn parse_rejects_unknown_and_other() {
        assert_eq!(ImageFormat::parse("jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::parse("jpg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::parse("bmp"), None);
        assert_eq!(ImageFormat::parse("other"), None);
    }

    #[test]
    fn derived_filename_without_override_keeps_name() {
        assert_eq!(
            derived_filename(Path::new("/up/photo.jpg"), None),
            Some("photo.jpg".to_string())
        );
    }

    #[test]
    fn derived_filename_swaps_extension_on_convert() {
        assert_eq!(
            derived_filename(Path::new("/up/photo.jpg"), Some(ImageFormat::Png)),
            Some("photo.png".to_string())
        );
        assert_eq!(
            derived_filename(Path::new("photo.png"), Some(ImageFormat::Jpeg)),
            Some("photo.jpg".to_string())
        );
    }

    #[test]
    fn derived_filename_handles_missing_extension() {
        assert_eq!(
            derived_filename(Path::new("/up/photo"), Some(ImageFormat::Png)),
            Some("photo.png".to_string())
        );
    }

    #[test]
    fn serde_aliases_jpg_to_jpeg() {
        #[derive(serde::Deserialize)]
        struct Wrapper {
            v: Vec<ImageFormat>,
        }
        let w: Wrapper = toml::from_str(r#"v = ["jpg", "png"]"#).unwrap();
        assert_eq!(w.v, vec![ImageFormat::Jpeg, ImageFormat::Png]);
    }
}
