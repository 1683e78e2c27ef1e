use std::sync::Arc;

use devserve::build::{
    watcher, BuildDriver, Compiler, DirectoryCompiler, ReadinessGate, RebuildTrigger,
};
use devserve::config::{AppState, Config};
use devserve::fs::{FileSystem, MemoryFs};
use devserve::logger;
use devserve::middleware::{DevMiddleware, MiddlewareOptions};
use devserve::server::{self, SignalHandler};

/// Config file (without extension) used when none is given
const DEFAULT_CONFIG: &str = "config";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    // Tokio runtime, thread count from `server.workers`
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let options = MiddlewareOptions::from_config(&cfg.middleware)?;

    let fs = Arc::new(MemoryFs::new());
    let gate = Arc::new(ReadinessGate::new());
    let compiler = Arc::new(DirectoryCompiler::new(
        &cfg.build.source_dir,
        &cfg.build.output_path,
    ));
    let watch_root = compiler.source_dir().to_path_buf();
    let output_path = compiler.output_path().to_path_buf();

    let driver = BuildDriver::new(compiler, Arc::clone(&fs), Arc::clone(&gate));
    let trigger: Arc<dyn RebuildTrigger> = Arc::new(driver.handle());
    driver.spawn();

    // Watch mode builds up front and on every source change; lazy mode
    // waits for the first matching request
    if !options.lazy {
        trigger.rebuild();
        if let Err(e) =
            watcher::spawn_watcher(watch_root.clone(), cfg.build.debounce(), Arc::clone(&trigger))
        {
            logger::log_warning(&format!(
                "[Watch] Not watching '{}': {e}",
                watch_root.display()
            ));
        }
    }

    let middleware = DevMiddleware::new(
        options,
        output_path,
        fs as Arc<dyn FileSystem>,
        Arc::clone(&gate),
        Arc::clone(&trigger),
    );

    let listener = server::create_reusable_listener(addr)?;
    logger::log_server_start(&addr, &cfg);

    let signals = Arc::new(SignalHandler::new());
    server::start_signal_handler(Arc::clone(&signals), trigger);

    let state = Arc::new(AppState::new(cfg, gate, middleware));
    server::start_server_loop(listener, state, Arc::clone(&signals.shutdown)).await?;
    Ok(())
}
