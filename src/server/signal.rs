// Signal handling module
//
// Supported signals:
// - SIGHUP:  Rebuild (same as a source change in watch mode)
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::build::RebuildTrigger;
use crate::logger;

/// Signal handler state
pub struct SignalHandler {
    /// Shutdown signal (SIGTERM, SIGINT)
    pub shutdown: Arc<Notify>,
    /// Whether shutdown has been requested
    pub shutdown_requested: Arc<AtomicBool>,
}

impl SignalHandler {
    pub fn new() -> Self {
        Self {
            shutdown: Arc::new(Notify::new()),
            shutdown_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Mark shutdown and wake the accept loop
    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::SeqCst);
        self.shutdown.notify_waiters();
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Start signal handlers (Unix only)
///
/// | Signal  | Action         |
/// |---------|----------------|
/// | SIGHUP  | Rebuild        |
/// | SIGTERM | Graceful stop  |
/// | SIGINT  | Graceful stop  |
#[cfg(unix)]
pub fn start_signal_handler(handler: Arc<SignalHandler>, trigger: Arc<dyn RebuildTrigger>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let registered = (|| {
            Ok::<_, std::io::Error>((
                signal(SignalKind::hangup())?,
                signal(SignalKind::terminate())?,
                signal(SignalKind::interrupt())?,
            ))
        })();
        let (mut sighup, mut sigterm, mut sigint) = match registered {
            Ok(signals) => signals,
            Err(e) => {
                logger::log_error(&format!("Failed to register signal handlers: {e}"));
                return;
            }
        };

        logger::log_info(&format!(
            "[SIGNAL] kill -HUP {} to rebuild, SIGTERM/Ctrl+C to stop",
            std::process::id()
        ));

        loop {
            tokio::select! {
                _ = sighup.recv() => {
                    logger::log_info("[SIGNAL] SIGHUP received, rebuilding");
                    trigger.rebuild();
                }

                _ = sigterm.recv() => {
                    logger::log_info("[SIGNAL] SIGTERM received, shutting down");
                    handler.request_shutdown();
                    break;
                }

                _ = sigint.recv() => {
                    logger::log_info("[SIGNAL] SIGINT received, shutting down");
                    handler.request_shutdown();
                    break;
                }
            }
        }
    });
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(handler: Arc<SignalHandler>, _trigger: Arc<dyn RebuildTrigger>) {
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            logger::log_info("[SIGNAL] Ctrl+C received, shutting down");
            handler.request_shutdown();
        }
    });
}
