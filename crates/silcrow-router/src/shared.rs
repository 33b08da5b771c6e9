//! Atomically published route table
//!
//! Requests read a snapshot without locking. Re-discovery builds a new
//! [`RouteTable`] off to the side and swaps it in with one pointer store, so a
//! lookup sees either the old table or the new one, never a mix.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use http::Method;
use tracing::{error, info};

use crate::table::RouteTable;
use crate::RouteMatch;

pub struct SharedRouteTable {
    inner: ArcSwap<RouteTable>,
}

impl SharedRouteTable {
    pub fn new(table: RouteTable) -> Self {
        Self {
            inner: ArcSwap::from_pointee(table),
        }
    }

    /// Current table; stays valid after later publishes
    pub fn load(&self) -> Arc<RouteTable> {
        self.inner.load_full()
    }

    pub fn lookup(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.inner.load().lookup(method, path)
    }

    pub fn resolve(&self, path: &str, method: &Method) -> Option<RouteMatch> {
        self.lookup(method, path)
    }

    /// Replaces the current table, returning the previous one
    pub fn publish(&self, table: RouteTable) -> Arc<RouteTable> {
        let routes = table.len();
        let previous = self.inner.swap(Arc::new(table));
        info!("Route table published ({} routes, was {})", routes, previous.len());
        previous
    }

    /// Builds a replacement with `build` and publishes it
    ///
    /// On error the current table stays in place and the error is returned.
    pub fn rebuild<F, E>(&self, build: F) -> Result<Arc<RouteTable>, E>
    where
        F: FnOnce() -> Result<RouteTable, E>,
        E: fmt::Display,
    {
        match build() {
            Ok(table) => Ok(self.publish(table)),
            Err(err) => {
                error!("Route rebuild failed, keeping current table: {}", err);
                Err(err)
            }
        }
    }
}

impl Default for SharedRouteTable {
    fn default() -> Self {
        Self::new(RouteTable::new())
    }
}

impl fmt::Debug for SharedRouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedRouteTable")
            .field("routes", &self.inner.load().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RouterError;
    use crate::handler::Handler;
    use serde_json::json;
    use std::thread;

    fn table_with(paths: &[&str]) -> RouteTable {
        let mut table = RouteTable::new();
        for path in paths {
            table.page(path, Handler::new(|_| Ok(json!(null)))).unwrap();
        }
        table
    }

    #[test]
    fn test_publish_swaps_whole_table() {
        let shared = SharedRouteTable::new(table_with(&["/old"]));
        let snapshot = shared.load();

        let previous = shared.publish(table_with(&["/new", "/other"]));
        assert_eq!(previous.len(), 1);

        assert!(shared.lookup(&Method::GET, "/old").is_none());
        assert!(shared.resolve("/new", &Method::GET).is_some());
        // readers holding the old snapshot keep a consistent view
        assert!(snapshot.lookup(&Method::GET, "/old").is_some());
        assert!(snapshot.lookup(&Method::GET, "/new").is_none());
    }

    #[test]
    fn test_failed_rebuild_keeps_current() {
        let shared = SharedRouteTable::new(table_with(&["/keep"]));

        let result = shared.rebuild(|| {
            let mut table = RouteTable::new();
            table.page("/users/:1", Handler::new(|_| Ok(json!(null))))?;
            Ok::<_, RouterError>(table)
        });

        assert!(matches!(result, Err(RouterError::InvalidPattern { .. })));
        assert!(shared.lookup(&Method::GET, "/keep").is_some());
    }

    #[test]
    fn test_concurrent_readers_during_publish() {
        let shared = Arc::new(SharedRouteTable::new(table_with(&["/a", "/b"])));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    for _ in 0..200 {
                        // each snapshot is one complete table, never a mix
                        let table = shared.load();
                        let a = table.lookup(&Method::GET, "/a").is_some();
                        let c = table.lookup(&Method::GET, "/c").is_some();
                        assert!(a != c);
                    }
                })
            })
            .collect();

        for _ in 0..50 {
            shared.publish(table_with(&["/c", "/d"]));
            shared.publish(table_with(&["/a", "/b"]));
        }
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
