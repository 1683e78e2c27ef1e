//! Build module
//!
//! Everything on the producing side of the virtual filesystem: the compiler
//! that writes artifacts, the driver task that runs it, the readiness gate
//! requests wait on, and the source watcher that requests rebuilds.

pub mod compiler;
pub mod driver;
pub mod gate;
pub mod stats;
pub mod watcher;

pub use compiler::{BuildError, CompileOutput, Compiler, DirectoryCompiler};
pub use driver::{BuildDriver, BuildHandle};
pub use gate::{BuildState, ReadinessGate};
pub use stats::{AssetInfo, BuildStats};

/// Asks the build system to start a new build cycle.
///
/// Must not block: the build runs elsewhere. Calling it while a build is
/// already running schedules exactly one follow-up build.
pub trait RebuildTrigger: Send + Sync {
    fn rebuild(&self);
}
