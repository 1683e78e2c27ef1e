// Configuration module entry point
// Loads application configuration and holds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;
use std::time::Duration;

// Re-export public types
pub use state::AppState;
pub use types::{
    BuildConfig, Config, HealthConfig, IndexSetting, LoggingConfig, MiddlewareConfig,
    PerformanceConfig, ServerConfig,
};

/// Prefix for environment overrides, e.g. `DEVSERVE_SERVER__PORT=3000`
pub const ENV_PREFIX: &str = "DEVSERVE";

/// Environment source. Values are typed (`false` is a bool) and
/// `DEVSERVE_MIDDLEWARE__METHODS` takes a comma-separated list.
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("middleware.methods")
}

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::load_with_env(config_path, environment())
    }

    fn load_with_env(
        config_path: &str,
        env: config::Environment,
    ) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(env)
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("middleware.public_path", "/")?
            .set_default("middleware.lazy", false)?
            .set_default("middleware.server_side_render", false)?
            .set_default("build.source_dir", "public")?
            .set_default("build.output_path", "/dist")?
            .set_default("build.debounce_ms", 100)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

impl BuildConfig {
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
