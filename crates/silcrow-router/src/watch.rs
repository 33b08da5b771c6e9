use anyhow::Result;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::shared::SharedRouteTable;
use crate::table::RouteTable;

/// Quiet period that ends a burst of filesystem events
pub const DEBOUNCE: Duration = Duration::from_millis(100);

/// Rebuilds and republishes the route table when page files change
///
/// The table is rebuilt from scratch by the caller's `rebuild` closure, which
/// usually re-runs manual registration followed by discovery. Events arriving
/// within [`DEBOUNCE`] of each other are coalesced into one rebuild, which runs
/// on a dedicated thread. A failed rebuild leaves the published table untouched.
pub struct RouteWatcher {
    root: PathBuf,
    watching: bool,
    _watcher: notify::RecommendedWatcher,
}

impl RouteWatcher {
    /// Starts watching `root` recursively
    pub fn spawn<F>(root: impl Into<PathBuf>, shared: Arc<SharedRouteTable>, rebuild: F) -> Result<Self>
    where
        F: Fn() -> crate::error::Result<RouteTable> + Send + 'static,
    {
        let root = root.into();
        let (tx, rx) = mpsc::channel::<Vec<PathBuf>>();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    // Access events never change the tree
                    if matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    ) {
                        // receiver only goes away with the watcher
                        let _ = tx.send(event.paths);
                    }
                }
                Err(e) => error!("Watch error: {:?}", e),
            }
        })?;

        // exits once the watcher, and with it the sender, is dropped
        thread::Builder::new()
            .name("route-watcher".into())
            .spawn(move || {
                while let Some(paths) = next_burst(&rx, DEBOUNCE) {
                    info!("Pages changed: {:?}, rebuilding routes", paths);
                    // rebuild logs its own failure
                    let _ = shared.rebuild(&rebuild);
                }
            })?;

        let watching = root.exists();
        if watching {
            watcher.watch(&root, RecursiveMode::Recursive)?;
            info!("Watching: {:?}", root);
        } else {
            warn!("Path does not exist: {:?}", root);
        }

        Ok(Self {
            root,
            watching,
            _watcher: watcher,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// False when the root did not exist at spawn time
    pub fn is_watching(&self) -> bool {
        self.watching
    }
}

/// Blocks for the next event, then drains everything that follows within `quiet`
///
/// Returns the changed paths of the whole burst, deduplicated, or `None` once
/// the sending side is gone.
fn next_burst(rx: &Receiver<Vec<PathBuf>>, quiet: Duration) -> Option<Vec<PathBuf>> {
    let mut paths = rx.recv().ok()?;
    let mut events = 1;

    loop {
        match rx.recv_timeout(quiet) {
            Ok(more) => {
                paths.extend(more);
                events += 1;
            }
            Err(RecvTimeoutError::Timeout) => break,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    paths.sort();
    paths.dedup();
    debug!("Coalesced {} filesystem events", events);
    Some(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Handler;
    use serde_json::json;

    fn rebuild() -> crate::error::Result<RouteTable> {
        let mut table = RouteTable::new();
        table.page("/", Handler::new(|_| Ok(json!("home"))))?;
        Ok(table)
    }

    #[test]
    fn test_spawn_on_existing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let shared = Arc::new(SharedRouteTable::default());

        let watcher = RouteWatcher::spawn(dir.path(), Arc::clone(&shared), rebuild).unwrap();
        assert!(watcher.is_watching());
        assert_eq!(watcher.root(), dir.path());
    }

    #[test]
    fn test_missing_root_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("pages");
        let shared = Arc::new(SharedRouteTable::default());

        let watcher = RouteWatcher::spawn(&missing, shared, rebuild).unwrap();
        assert!(!watcher.is_watching());
    }

    #[test]
    fn test_burst_is_coalesced() {
        let (tx, rx) = mpsc::channel();
        tx.send(vec![PathBuf::from("pages/about.page")]).unwrap();
        tx.send(vec![PathBuf::from("pages/about.page")]).unwrap();
        tx.send(vec![PathBuf::from("pages/.about.page.swp")]).unwrap();

        let burst = next_burst(&rx, Duration::from_millis(20)).unwrap();
        assert_eq!(
            burst,
            vec![PathBuf::from("pages/.about.page.swp"), PathBuf::from("pages/about.page")]
        );

        // queue is empty now; a later event starts a new burst
        tx.send(vec![PathBuf::from("pages/contact.page")]).unwrap();
        let burst = next_burst(&rx, Duration::from_millis(20)).unwrap();
        assert_eq!(burst, vec![PathBuf::from("pages/contact.page")]);
    }

    #[test]
    fn test_burst_ends_when_sender_dropped() {
        let (tx, rx) = mpsc::channel::<Vec<PathBuf>>();
        drop(tx);
        assert!(next_burst(&rx, Duration::from_millis(20)).is_none());
    }
}
