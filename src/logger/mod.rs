//! Logger module
//!
//! Provides logging utilities for the dev server including:
//! - Server and build lifecycle logging
//! - Access logging with multiple formats
//! - Error, warning and debug logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::{AccessLogEntry, ServedBy};

use crate::build::BuildStats;
use crate::config::Config;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};

/// Set from `logging.level` at init
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    DEBUG_ENABLED.store(
        config.logging.level.eq_ignore_ascii_case("debug")
            || config.logging.level.eq_ignore_ascii_case("trace"),
        Ordering::Relaxed,
    );
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

pub fn debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::Relaxed)
}

/// Write to info/access log
fn write_info(message: &str) {
    if let Some(writer) = writer::get() {
        writer.write_info(message);
    } else {
        println!("{message}");
    }
}

/// Write to error log
fn write_error(message: &str) {
    if let Some(writer) = writer::get() {
        writer.write_error(message);
    } else {
        eprintln!("{message}");
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    if let Some(writer) = writer::get() {
        writer.write_access(message);
    } else {
        println!("{message}");
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("Dev server started successfully");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Public path: {}", config.middleware.public_path));
    write_info(&format!(
        "Serving {} from {}",
        config.build.output_path, config.build.source_dir
    ));
    write_info(&format!(
        "Mode: {}",
        if config.middleware.lazy { "lazy" } else { "watch" }
    ));
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================\n");
}

pub fn log_build_started(generation: u64) {
    write_info(&format!("[Build] Generation {generation} started"));
}

pub fn log_build_finished(stats: &BuildStats) {
    let outcome = if stats.has_errors() {
        format!("with {} error(s)", stats.errors.len())
    } else {
        "successfully".to_string()
    };
    write_info(&format!(
        "[Build] Generation {} finished {outcome} in {}ms: {} asset(s), {} bytes",
        stats.generation,
        stats.duration_ms,
        stats.assets.len(),
        stats.total_size()
    ));
    if debug_enabled() {
        match serde_json::to_string(stats) {
            Ok(json) => write_info(&format!("[DEBUG] [Build] {json}")),
            Err(e) => log_warning(&format!("Cannot serialize build stats: {e}")),
        }
    }
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    log_debug(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_shutdown() {
    write_info("\n[Shutdown] Stopping dev server");
}

pub fn log_info(message: &str) {
    write_info(message);
}

pub fn log_debug(message: &str) {
    if debug_enabled() {
        write_info(&format!("[DEBUG] {message}"));
    }
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}
