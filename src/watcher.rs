//! Recursive project-tree watcher with debounced `didChange` delivery
//! recursively under a project root, debounced into batches.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

const DEBOUNCE: Duration = Duration::from_millis(500);

const EXCLUDED_DIR_NAMES: &[&str] = &[
    "build",
    "cmake-build-debug",
    "cmake-build-release",
    "out",
    "bin",
    "obj",
];

const SOURCE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cxx", "c++", "h", "hh", "hpp", "hxx", "h++"];

/// Owns the underlying OS watch handle; dropping this stops watching.
pub struct FileWatcher {
    _inner: RecommendedWatcher,
}

fn is_excluded_path(path: &Path) -> bool {
    path.components().any(|c| {
        let s = c.as_os_str().to_string_lossy();
        (s.starts_with('.') && s != "." && s != "..") || EXCLUDED_DIR_NAMES.contains(&s.as_ref())
    })
}

fn is_watched_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| SOURCE_EXTENSIONS.contains(&ext.to_string_lossy().as_ref()))
        .unwrap_or(false)
}

/// Start watching `root` recursively. `on_batch` is invoked (from a tokio
/// task, not the notify callback thread) with every set of distinct file
/// paths whose create/write events were coalesced within a single 500ms
/// debounce window.
///
/// Newly created subdirectories are picked up automatically: notify's
/// recommended backend re-arms its recursive watch on directory creation,
/// so no explicit `add_directory` call is needed here.
pub fn start<F>(root: PathBuf, on_batch: F) -> notify::Result<FileWatcher>
where
    F: Fn(Vec<PathBuf>) + Send + Sync + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel::<PathBuf>();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let Ok(event) = res else { return };
        if !matches!(
            event.kind,
            notify::EventKind::Create(_) | notify::EventKind::Modify(_)
        ) {
            return;
        }
        for path in event.paths {
            if is_excluded_path(&path) || !is_watched_extension(&path) {
                continue;
            }
            let _ = tx.send(path);
        }
    })?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    tokio::spawn(debounce_loop(rx, on_batch));

    Ok(FileWatcher { _inner: watcher })
}

async fn debounce_loop<F>(mut rx: mpsc::UnboundedReceiver<PathBuf>, on_batch: F)
where
    F: Fn(Vec<PathBuf>) + Send + Sync + 'static,
{
    let mut pending: HashSet<PathBuf> = HashSet::new();

    loop {
        let Some(first) = rx.recv().await else {
            return;
        };
        pending.insert(first);

        loop {
            match tokio::time::timeout(DEBOUNCE, rx.recv()).await {
                Ok(Some(path)) => {
                    pending.insert(path);
                }
                Ok(None) => {
                    if !pending.is_empty() {
                        on_batch(pending.drain().collect());
                    }
                    return;
                }
                Err(_elapsed) => break,
            }
        }

        if !pending.is_empty() {
            on_batch(pending.drain().collect());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excludes_dot_directories() {
        assert!(is_excluded_path(Path::new("/proj/.git/HEAD")));
        assert!(!is_excluded_path(Path::new("/proj/src/main.cpp")));
    }

    #[test]
    fn excludes_known_build_directories() {
        assert!(is_excluded_path(Path::new("/proj/build/CMakeFiles/foo")));
        assert!(is_excluded_path(Path::new("/proj/cmake-build-debug/x.o")));
    }

    #[test]
    fn filters_by_source_extension() {
        assert!(is_watched_extension(Path::new("foo.cpp")));
        assert!(is_watched_extension(Path::new("foo.hpp")));
        assert!(!is_watched_extension(Path::new("foo.txt")));
        assert!(!is_watched_extension(Path::new("CMakeLists.txt")));
    }

    #[tokio::test]
    async fn debounces_bursts_into_one_batch() {
        let (tx, rx) = mpsc::unbounded_channel::<PathBuf>();
        let batches: std::sync::Arc<std::sync::Mutex<Vec<Vec<PathBuf>>>> =
            Default::default();
        let batches_clone = batches.clone();

        tokio::spawn(debounce_loop(rx, move |batch| {
            batches_clone.lock().unwrap().push(batch);
        }));

        let path = PathBuf::from("/proj/src/main.cpp");
        for _ in 0..5 {
            tx.send(path.clone()).unwrap();
        }
        drop(tx);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let recorded = batches.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0], vec![path]);
    }
}
