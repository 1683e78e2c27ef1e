//! devserve
//!
//! Development server that serves build artifacts from an in-memory
//! filesystem, holding requests until the current build has finished.

pub mod build;
pub mod config;
pub mod fs;
pub mod handler;
pub mod http;
pub mod logger;
pub mod middleware;
pub mod server;
