//! Request handler module
//!
//! The request pipeline: health probes, the dev middleware, and the
//! fallback handler for requests the middleware defers.

pub mod fallback;
pub mod router;

// Re-export main entry point
pub use router::{handle_request, route_request};
