//! Build driver
//!
//! A single task that runs the compiler whenever the gate has an
//! outstanding generation. Requests arriving mid-build are coalesced into
//! one follow-up build.

use chrono::Local;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;

use super::compiler::Compiler;
use super::gate::ReadinessGate;
use super::stats::BuildStats;
use super::RebuildTrigger;
use crate::fs::MemoryFs;
use crate::logger;

/// Owns the compiler and the filesystem it writes into
pub struct BuildDriver {
    compiler: Arc<dyn Compiler>,
    fs: Arc<MemoryFs>,
    gate: Arc<ReadinessGate>,
}

/// Cheap handle used to request rebuilds
#[derive(Clone)]
pub struct BuildHandle {
    gate: Arc<ReadinessGate>,
}

impl RebuildTrigger for BuildHandle {
    fn rebuild(&self) {
        let generation = self.gate.request_build();
        logger::log_debug(&format!("[Build] Rebuild requested (generation {generation})"));
    }
}

impl BuildDriver {
    pub fn new(compiler: Arc<dyn Compiler>, fs: Arc<MemoryFs>, gate: Arc<ReadinessGate>) -> Self {
        Self { compiler, fs, gate }
    }

    pub fn handle(&self) -> BuildHandle {
        BuildHandle {
            gate: Arc::clone(&self.gate),
        }
    }

    /// Run the build loop on the current runtime
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    async fn run(self) {
        let mut rx = self.gate.subscribe();
        loop {
            let target = match rx.wait_for(|state| !state.is_ready()).await {
                Ok(state) => state.requested,
                Err(_) => return,
            };
            let stats = self.build_once(target).await;
            self.gate.finish(target, stats);
        }
    }

    /// Compile one generation. Failures still produce stats so that waiting
    /// requests are released.
    pub async fn build_once(&self, generation: u64) -> BuildStats {
        let started_at = Local::now();
        let start = Instant::now();
        logger::log_build_started(generation);

        let mut stats = BuildStats {
            generation,
            started_at,
            duration_ms: 0,
            assets: Vec::new(),
            errors: Vec::new(),
        };

        match self.compiler.compile(&self.fs).await {
            Ok(output) => {
                for warning in &output.warnings {
                    logger::log_warning(&format!("[Build] {warning}"));
                }
                stats.assets = output.assets;
            }
            Err(e) => {
                logger::log_error(&format!("[Build] Generation {generation} failed: {e}"));
                stats.errors.push(e.to_string());
            }
        }

        stats.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        logger::log_build_finished(&stats);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{BuildError, CompileOutput, DirectoryCompiler};
    use crate::fs::FileSystem;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::Semaphore;
    use tokio::time::timeout;

    /// Compiler that blocks until a permit is released and counts runs
    struct GatedCompiler {
        output: PathBuf,
        permits: Arc<Semaphore>,
        runs: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Compiler for GatedCompiler {
        fn output_path(&self) -> &Path {
            &self.output
        }

        async fn compile(&self, _fs: &MemoryFs) -> Result<CompileOutput, BuildError> {
            self.permits.acquire().await.unwrap().forget();
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(CompileOutput::default())
        }
    }

    #[tokio::test]
    async fn test_initial_build_populates_fs() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("app.js"), "let a = 1;").unwrap();

        let fs = Arc::new(MemoryFs::new());
        let gate = Arc::new(ReadinessGate::new());
        let driver = BuildDriver::new(
            Arc::new(DirectoryCompiler::new(temp.path(), "/dist")),
            Arc::clone(&fs),
            Arc::clone(&gate),
        );
        let handle = driver.handle();
        driver.spawn();

        handle.rebuild();
        let stats = timeout(Duration::from_secs(5), gate.wait_ready())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(stats.generation, 1);
        assert_eq!(stats.assets.len(), 1);
        assert!(fs.stat(Path::new("/dist/app.js")).unwrap().is_file());
    }

    #[tokio::test]
    async fn test_failed_build_still_releases_waiters() {
        let temp = TempDir::new().unwrap();
        let gate = Arc::new(ReadinessGate::new());
        let driver = BuildDriver::new(
            Arc::new(DirectoryCompiler::new(temp.path().join("missing"), "/dist")),
            Arc::new(MemoryFs::new()),
            Arc::clone(&gate),
        );
        let handle = driver.handle();
        driver.spawn();

        handle.rebuild();
        let stats = timeout(Duration::from_secs(5), gate.wait_ready())
            .await
            .unwrap()
            .unwrap();
        assert!(stats.has_errors());
    }

    #[tokio::test]
    async fn test_requests_during_build_coalesce() {
        let permits = Arc::new(Semaphore::new(0));
        let runs = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(ReadinessGate::new());
        let driver = BuildDriver::new(
            Arc::new(GatedCompiler {
                output: PathBuf::from("/dist"),
                permits: Arc::clone(&permits),
                runs: Arc::clone(&runs),
            }),
            Arc::new(MemoryFs::new()),
            Arc::clone(&gate),
        );
        let handle = driver.handle();
        driver.spawn();

        handle.rebuild();
        tokio::task::yield_now().await;
        // Three more requests while generation 1 is still compiling
        handle.rebuild();
        handle.rebuild();
        handle.rebuild();

        permits.add_permits(1);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!gate.is_ready());

        permits.add_permits(10);
        let stats = timeout(Duration::from_secs(5), gate.wait_ready())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stats.generation, 4);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }
}
