//! Content-type inference for served files.

use std::path::Path;

/// Content-type constants used by the live server.
pub mod types {
    pub const HTML: &str = "text/html; charset=utf-8";
    pub const PLAIN: &str = "text/plain; charset=utf-8";
    pub const JSON: &str = "application/json";

    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const GIF: &str = "image/gif";
    pub const SVG: &str = "image/svg+xml";
    pub const WEBP: &str = "image/webp";
    pub const ICO: &str = "image/x-icon";
}

/// Guess an image content type from a file path.
///
/// Anything that is not a known image extension is served as an icon.
pub fn image_type_from_path(path: &Path) -> &'static str {
    image_type_from_extension(path.extension().and_then(|e| e.to_str()))
}

/// Guess an image content type from an extension (without the dot).
pub fn image_type_from_extension(ext: Option<&str>) -> &'static str {
    use types::*;

    let Some(ext) = ext else { return ICO };
    match ext.to_ascii_lowercase().as_str() {
        "png" => PNG,
        "jpg" | "jpeg" => JPEG,
        "gif" => GIF,
        "svg" => SVG,
        "webp" => WEBP,
        _ => ICO,
    }
}
