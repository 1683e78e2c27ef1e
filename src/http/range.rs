//! HTTP Range request module
//!
//! Single byte-range support (RFC 7233 subset) for served artifacts.

use hyper::body::Bytes;

/// Parsed Range request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeRequest {
    /// Start byte position
    pub start: usize,
    /// End byte position, None means until end of file
    pub end: Option<usize>,
}

impl RangeRequest {
    /// Calculate actual end position (considering file size)
    #[inline]
    pub fn end_position(&self, file_size: usize) -> usize {
        self.end.unwrap_or_else(|| file_size.saturating_sub(1))
    }

    /// Calculate content length (for test validation only)
    #[cfg(test)]
    pub fn content_length(&self, file_size: usize) -> usize {
        let end = self.end_position(file_size);
        end.saturating_sub(self.start) + 1
    }
}

/// Range header parse result
#[derive(Debug)]
pub enum RangeParseResult {
    /// Valid range request
    Valid(RangeRequest),
    /// Malformed `bytes=` range or outside the content - should return 416
    NotSatisfiable,
    /// No Range header, foreign unit or multi-range list (serve full content)
    None,
}

/// Parse HTTP Range header (single range only, bytes unit)
///
/// Supported formats:
/// - `bytes=start-end` - Specific range
/// - `bytes=start-` - From start to end
/// - `bytes=-suffix` - Last suffix bytes
///
/// # Examples
/// ```
/// use devserve::http::range::{parse_range_header, RangeParseResult};
///
/// let result = parse_range_header(Some("bytes=0-3"), 10);
/// assert!(matches!(result, RangeParseResult::Valid(_)));
///
/// let result = parse_range_header(Some("bytes=20-30"), 10);
/// assert!(matches!(result, RangeParseResult::NotSatisfiable));
///
/// let result = parse_range_header(None, 10);
/// assert!(matches!(result, RangeParseResult::None));
/// ```
pub fn parse_range_header(range_header: Option<&str>, file_size: usize) -> RangeParseResult {
    let Some(header) = range_header else {
        return RangeParseResult::None;
    };

    let Some(spec) = header.trim().strip_prefix("bytes=") else {
        return RangeParseResult::None; // Not bytes unit, ignore
    };

    if spec.contains(',') {
        return RangeParseResult::None;
    }

    let Some((start_str, end_str)) = spec.split_once('-') else {
        return RangeParseResult::NotSatisfiable;
    };

    if file_size == 0 {
        return RangeParseResult::NotSatisfiable;
    }

    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    // Suffix range: "-500" means last 500 bytes
    if start_str.is_empty() {
        return parse_suffix_range(end_str, file_size);
    }

    parse_standard_range(start_str, end_str, file_size)
}

/// Parse suffix range (e.g., "-500")
fn parse_suffix_range(suffix_str: &str, file_size: usize) -> RangeParseResult {
    let Ok(suffix) = suffix_str.parse::<usize>() else {
        return RangeParseResult::NotSatisfiable;
    };

    if suffix == 0 {
        return RangeParseResult::NotSatisfiable;
    }

    // Suffix larger than file selects the whole file
    RangeParseResult::Valid(RangeRequest {
        start: file_size.saturating_sub(suffix),
        end: Some(file_size - 1),
    })
}

/// Parse standard range (e.g., "0-99" or "100-")
fn parse_standard_range(start_str: &str, end_str: &str, file_size: usize) -> RangeParseResult {
    let Ok(start) = start_str.parse::<usize>() else {
        return RangeParseResult::NotSatisfiable;
    };

    if start >= file_size {
        return RangeParseResult::NotSatisfiable;
    }

    let end = if end_str.is_empty() {
        None
    } else {
        let Ok(e) = end_str.parse::<usize>() else {
            return RangeParseResult::NotSatisfiable;
        };
        if start > e {
            return RangeParseResult::NotSatisfiable;
        }
        Some(e.min(file_size - 1))
    };

    RangeParseResult::Valid(RangeRequest { start, end })
}

/// Content after range handling
#[derive(Debug, PartialEq, Eq)]
pub enum Ranged {
    /// No usable Range header
    Full(Bytes),
    /// Inclusive `[start, end]` slice of a `total`-byte body
    Partial {
        body: Bytes,
        start: usize,
        end: usize,
        total: usize,
    },
    /// 416 with an empty body
    Unsatisfiable { total: usize },
}

/// Apply a Range header to the full content
pub fn apply_range(content: Bytes, range_header: Option<&str>) -> Ranged {
    let total = content.len();
    match parse_range_header(range_header, total) {
        RangeParseResult::Valid(range) => {
            let end = range.end_position(total);
            Ranged::Partial {
                body: content.slice(range.start..=end),
                start: range.start,
                end,
                total,
            }
        }
        RangeParseResult::NotSatisfiable => Ranged::Unsatisfiable { total },
        RangeParseResult::None => Ranged::Full(content),
    }
}
