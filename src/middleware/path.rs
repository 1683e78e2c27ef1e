//! Request URL to virtual filename resolution

use percent_encoding::percent_decode_str;
use std::path::{PathBuf, MAIN_SEPARATOR};
use url::Url;

use crate::fs::normalize;

/// The URL space the build output is mounted at.
///
/// Either a plain path (`/assets/`) or an absolute URL
/// (`http://cdn.local/assets/`). With an absolute URL, requests whose target
/// is itself absolute must name the same hostname. Ports are not compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicPath {
    /// Lowercased hostname when configured as an absolute URL
    pub host: Option<String>,
    /// Path prefix, always starting with `/`
    pub prefix: String,
}

impl PublicPath {
    pub fn parse(raw: &str) -> Self {
        if let Ok(url) = Url::parse(raw) {
            if let Some(host) = url.host_str() {
                return Self {
                    host: Some(host.to_ascii_lowercase()),
                    prefix: url.path().to_string(),
                };
            }
        }

        let prefix = if raw.starts_with('/') {
            raw.to_string()
        } else {
            format!("/{raw}")
        };
        Self { host: None, prefix }
    }

    /// Part of `path` below the prefix, or `None` when outside it
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.strip_prefix(self.prefix.as_str())
    }

    /// `request_host` is the hostname of an absolute-form request target
    fn host_matches(&self, request_host: Option<&str>) -> bool {
        match (&self.host, request_host) {
            (Some(expected), Some(actual)) => expected.eq_ignore_ascii_case(actual),
            _ => true,
        }
    }
}

/// Map a request onto a filename inside the output directory.
///
/// Returns `None` when the request is outside the public path or would
/// escape `output_path`.
pub fn filename_from_request(
    public_path: &PublicPath,
    output_path: &std::path::Path,
    request_path: &str,
    request_host: Option<&str>,
) -> Option<PathBuf> {
    if !public_path.host_matches(request_host) {
        return None;
    }

    let remainder = public_path.strip(request_path)?;
    let decoded = percent_decode_str(remainder).decode_utf8_lossy();
    let relative = normalize_separators(decoded.trim_start_matches('/'));

    let output_path = normalize(output_path);
    if relative.is_empty() {
        return Some(output_path);
    }

    let filename = normalize(&output_path.join(relative));
    filename.starts_with(&output_path).then_some(filename)
}

/// Use the platform separator for both `/` and `\`
fn normalize_separators(path: &str) -> String {
    path.chars()
        .map(|c| if c == '/' || c == '\\' { MAIN_SEPARATOR } else { c })
        .collect()
}
