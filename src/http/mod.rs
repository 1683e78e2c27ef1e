//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from the
//! artifact middleware and the request pipeline.

pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::{apply_range, parse_range_header, Ranged};
pub use response::{build_404_response, build_html_response, build_text_response};
