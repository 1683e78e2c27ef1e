// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub middleware: MiddlewareConfig,
    pub build: BuildConfig,
    #[serde(default)]
    pub health: HealthConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// `debug` enables per-request middleware lines
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// `[middleware]` section, validated into `MiddlewareOptions` at startup
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MiddlewareConfig {
    /// Accepted methods, empty means GET and HEAD
    #[serde(default)]
    pub methods: Vec<String>,
    pub public_path: String,
    /// `true`/absent: `index.html`, `false`: disabled, string: that name
    #[serde(default)]
    pub index: Option<IndexSetting>,
    /// Static extra response headers
    #[serde(default)]
    pub headers: HashMap<String, String>,
    pub lazy: bool,
    /// Regex restricting which filenames trigger a lazy rebuild
    #[serde(default)]
    pub filename: Option<String>,
    pub server_side_render: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum IndexSetting {
    Flag(bool),
    Name(String),
}

/// `[build]` section
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BuildConfig {
    /// Directory mirrored into the virtual filesystem
    pub source_dir: String,
    /// Virtual directory the build writes to
    pub output_path: String,
    /// Quiet period after a source change before rebuilding in watch mode
    pub debounce_ms: u64,
}

/// Health check configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HealthConfig {
    /// Enable health check endpoints
    #[serde(default = "default_health_enabled")]
    pub enabled: bool,
    /// Liveness probe path (default: /healthz)
    #[serde(default = "default_healthz_path")]
    pub liveness_path: String,
    /// Readiness probe path (default: /readyz)
    #[serde(default = "default_readyz_path")]
    pub readiness_path: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_health_enabled() -> bool {
    true
}

#[allow(clippy::missing_const_for_fn)]
fn default_healthz_path() -> String {
    "/healthz".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_readyz_path() -> String {
    "/readyz".to_string()
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: default_health_enabled(),
            liveness_path: default_healthz_path(),
            readiness_path: default_readyz_path(),
        }
    }
}
