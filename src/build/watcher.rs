//! Source watcher
//!
//! Watches the source tree with `notify` and requests a rebuild once a
//! burst of changes has settled.

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::RebuildTrigger;
use crate::logger;

/// Whether an event should cause a rebuild.
///
/// Only creations, modifications and removals count, and only for paths
/// under `root` without a hidden component (editor swap files, `.git`).
pub fn is_relevant(event: &Event, root: &Path) -> bool {
    let kind_matches = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    );
    kind_matches && event.paths.iter().any(|path| !is_hidden(path, root))
}

fn is_hidden(path: &Path, root: &Path) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return true;
    };
    relative
        .components()
        .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
}

/// Start watching `root` recursively.
///
/// Events arriving within `debounce` of each other are folded into a single
/// `rebuild()`. The returned task owns the watcher; aborting it stops
/// watching.
pub fn spawn_watcher(
    root: PathBuf,
    debounce: Duration,
    trigger: Arc<dyn RebuildTrigger>,
) -> notify::Result<JoinHandle<()>> {
    let root = root.canonicalize()?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let filter_root = root.clone();

    let mut watcher: RecommendedWatcher =
        notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) if is_relevant(&event, &filter_root) => {
                let _ = tx.send(event.paths);
            }
            Ok(_) => {}
            Err(e) => logger::log_warning(&format!("[Watch] {e}")),
        })?;
    watcher.watch(&root, RecursiveMode::Recursive)?;
    logger::log_info(&format!("[Watch] Watching '{}'", root.display()));

    Ok(tokio::spawn(async move {
        let _watcher = watcher;

        while let Some(paths) = rx.recv().await {
            let mut changed = paths.len();
            // Settle: keep absorbing events until the tree is quiet
            while let Ok(Some(more)) = tokio::time::timeout(debounce, rx.recv()).await {
                changed += more.len();
            }

            logger::log_info(&format!(
                "[Watch] {changed} change(s) in '{}'",
                root.display()
            ));
            trigger.rebuild();
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingTrigger(AtomicUsize);

    impl RebuildTrigger for CountingTrigger {
        fn rebuild(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_relevant_kinds() {
        let root = Path::new("/src");
        assert!(is_relevant(&event(EventKind::Create(CreateKind::File), "/src/a.js"), root));
        assert!(is_relevant(&event(EventKind::Modify(ModifyKind::Any), "/src/a.js"), root));
        assert!(!is_relevant(&event(EventKind::Access(AccessKind::Any), "/src/a.js"), root));
    }

    #[test]
    fn test_hidden_and_foreign_paths_ignored() {
        let root = Path::new("/src");
        let modify = EventKind::Modify(ModifyKind::Any);
        assert!(!is_relevant(&event(modify, "/src/.app.js.swp"), root));
        assert!(!is_relevant(&event(modify, "/src/.git/index"), root));
        assert!(!is_relevant(&event(modify, "/elsewhere/a.js"), root));
        assert!(is_relevant(&event(modify, "/src/css/site.css"), root));
    }

    #[tokio::test]
    async fn test_watcher_triggers_on_new_file() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();
        std::fs::write(root.join("a.js"), "a").unwrap();

        let trigger = Arc::new(CountingTrigger(AtomicUsize::new(0)));
        let task = spawn_watcher(
            root.clone(),
            Duration::from_millis(20),
            Arc::clone(&trigger) as Arc<dyn RebuildTrigger>,
        )
        .unwrap();

        std::fs::write(root.join("b.js"), "bb").unwrap();
        let mut triggered = false;
        for _ in 0..200 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if trigger.0.load(Ordering::SeqCst) > 0 {
                triggered = true;
                break;
            }
        }
        task.abort();
        assert!(triggered);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let temp = TempDir::new().unwrap();
        let trigger: Arc<dyn RebuildTrigger> = Arc::new(CountingTrigger(AtomicUsize::new(0)));
        let result = spawn_watcher(temp.path().join("missing"), Duration::from_millis(10), trigger);
        assert!(result.is_err());
    }
}
