//! MIME type detection module
//!
//! Returns the corresponding Content-Type based on file extension.

use std::path::Path;

const DEFAULT_MIME: &str = "application/octet-stream";

/// No charset is appended for these: clients fail to render them with one.
const NON_CHARSET_EXTENSIONS: &[&str] = &["wasm", "usdz"];

/// Get the bare MIME type (no parameters) for a file extension
///
/// Common build artifacts are matched directly, everything else falls back
/// to the `mime_guess` database.
///
/// # Examples
/// ```
/// use devserve::http::mime::get_mime_type;
/// assert_eq!(get_mime_type(Some("html")), "text/html");
/// assert_eq!(get_mime_type(Some("wasm")), "application/wasm");
/// assert_eq!(get_mime_type(None), "application/octet-stream");
/// ```
pub fn get_mime_type(extension: Option<&str>) -> &'static str {
    let Some(ext) = extension else {
        return DEFAULT_MIME;
    };

    match ext.to_ascii_lowercase().as_str() {
        // Text
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "txt" | "md" => "text/plain",
        "xml" => "application/xml",

        // JavaScript/WASM
        "js" | "mjs" | "cjs" => "application/javascript",
        "json" | "map" => "application/json",
        "wasm" => "application/wasm",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",

        // 3D
        "usdz" => "model/vnd.usdz+zip",
        "glb" => "model/gltf-binary",

        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",

        other => mime_guess::from_ext(other).first_raw().unwrap_or(DEFAULT_MIME),
    }
}

/// Whether `; charset=UTF-8` may be appended for this extension
pub fn wants_charset(extension: Option<&str>) -> bool {
    !extension.is_some_and(|ext| {
        NON_CHARSET_EXTENSIONS
            .iter()
            .any(|n| ext.eq_ignore_ascii_case(n))
    })
}

/// Full `Content-Type` header value for a served file.
///
/// Files of unknown type are sent as bare `application/octet-stream`.
pub fn content_type_for(path: &Path) -> String {
    let extension = path.extension().and_then(|e| e.to_str());
    let mime = get_mime_type(extension);
    if mime != DEFAULT_MIME && wants_charset(extension) {
        format!("{mime}; charset=UTF-8")
    } else {
        mime.to_string()
    }
}
