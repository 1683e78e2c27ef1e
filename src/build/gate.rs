//! Build readiness gate
//!
//! Tracks requested vs. completed build generations on a `watch` channel so
//! any number of request tasks can wait for the next "build complete"
//! transition and be released together. A rebuild requested while tasks
//! are waiting does not hold them past the build that is currently running.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use super::stats::BuildStats;
use crate::logger;

/// Waiting longer than this gets a warning (but no timeout)
const SLOW_WAIT: Duration = Duration::from_secs(5);

/// Snapshot of the build lifecycle
#[derive(Debug, Clone, Default)]
pub struct BuildState {
    /// Highest generation anyone asked for
    pub requested: u64,
    /// Highest generation that finished
    pub completed: u64,
    /// Stats of the last finished generation
    pub stats: Option<Arc<BuildStats>>,
}

impl BuildState {
    #[inline]
    pub const fn is_ready(&self) -> bool {
        self.completed >= self.requested
    }
}

/// Broadcast gate between the build driver and request handlers
#[derive(Debug)]
pub struct ReadinessGate {
    tx: watch::Sender<BuildState>,
}

impl ReadinessGate {
    /// Create a gate that is ready and has no build yet
    pub fn new() -> Self {
        let (tx, _) = watch::channel(BuildState::default());
        Self { tx }
    }

    /// Mark a new generation as wanted. Returns that generation.
    ///
    /// The gate is not ready from this call until the driver finishes a
    /// build of at least this generation.
    pub fn request_build(&self) -> u64 {
        let mut generation = 0;
        self.tx.send_modify(|state| {
            state.requested += 1;
            generation = state.requested;
        });
        generation
    }

    /// Record a finished build. Completions older than the current one are ignored.
    pub fn finish(&self, generation: u64, stats: BuildStats) -> bool {
        let updated = self.tx.send_if_modified(|state| {
            if generation <= state.completed {
                return false;
            }
            state.completed = generation;
            state.stats = Some(Arc::new(stats));
            true
        });
        if !updated {
            logger::log_debug(&format!("[Build] Ignoring stale completion of generation {generation}"));
        }
        updated
    }

    pub fn is_ready(&self) -> bool {
        self.tx.borrow().is_ready()
    }

    pub fn snapshot(&self) -> BuildState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BuildState> {
        self.tx.subscribe()
    }

    /// Wait for the next build completion.
    ///
    /// Returns immediately when no build is outstanding. Otherwise returns as
    /// soon as any generation finishes, even if more were requested since.
    /// There is no timeout: a build that never finishes keeps the caller
    /// waiting.
    pub async fn wait_ready(&self) -> Option<Arc<BuildStats>> {
        let mut rx = self.tx.subscribe();
        let seen = rx.borrow_and_update().completed;
        let slow = tokio::time::sleep(SLOW_WAIT);
        tokio::pin!(slow);
        let mut warned = false;

        loop {
            tokio::select! {
                stats = async {
                    rx.wait_for(|state| state.is_ready() || state.completed > seen)
                        .await
                        .ok()
                        .and_then(|state| state.stats.clone())
                } => return stats,
                () = &mut slow, if !warned => {
                    warned = true;
                    let state = self.snapshot();
                    logger::log_warning(&format!(
                        "Request still waiting for build generation {} after {}s",
                        state.requested,
                        SLOW_WAIT.as_secs()
                    ));
                }
            }
        }
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}
