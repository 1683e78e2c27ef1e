// Application state module
// Everything a request handler needs, shared behind one Arc

use std::sync::Arc;

use super::types::Config;
use crate::build::ReadinessGate;
use crate::middleware::DevMiddleware;

/// Application state
pub struct AppState {
    pub config: Config,
    pub gate: Arc<ReadinessGate>,
    pub middleware: DevMiddleware,
}

impl AppState {
    pub fn new(config: Config, gate: Arc<ReadinessGate>, middleware: DevMiddleware) -> Self {
        Self {
            config,
            gate,
            middleware,
        }
    }

    /// Whether each request gets an access log line
    pub const fn access_log_enabled(&self) -> bool {
        self.config.logging.access_log
    }
}
