//! Request resolution over a route table's storage.
//!
//! # Precedence
//! 1. An exact literal match on the normalized path beats every dynamic
//!    pattern, whatever the registration order.
//! 2. Dynamic routes are scanned in insertion order and the first pattern
//!    that fits wins. Overlapping dynamic patterns (`/posts/:id` and
//!    `/posts/:slug`) therefore resolve to whichever was registered first.
//! 3. Nothing fits: `None`. The dispatcher decides between 404 and a fallback.
//!
//! Method acceptance is governed by [`MethodMatching`].

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;

use crate::config::MethodMatching;
use crate::path::{normalize_path, segments};
use crate::{Params, Route};

/// Static routes grouped by canonical path, one entry per method
pub type ExactRoutes = HashMap<String, Vec<Arc<Route>>>;

/// Pure lookup over a table's exact map and dynamic sequence
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchEngine {
    method_matching: MethodMatching,
}

impl MatchEngine {
    pub fn new(method_matching: MethodMatching) -> Self {
        Self { method_matching }
    }

    pub fn method_matching(&self) -> MethodMatching {
        self.method_matching
    }

    /// Whether a route declared for `declared` may serve a `requested` request
    ///
    /// Under [`MethodMatching::GetMatchesAny`] a GET request is accepted by a
    /// route of any method. This is the legacy convenience, kept on purpose.
    pub fn accepts(&self, declared: &Method, requested: &Method) -> bool {
        declared == requested
            || (self.method_matching == MethodMatching::GetMatchesAny && *requested == Method::GET)
    }

    /// Resolves `method` + `path` against the given storage
    pub fn find<'r>(
        &self,
        exact: &'r ExactRoutes,
        dynamic: &'r [Arc<Route>],
        method: &Method,
        path: &str,
    ) -> Option<(&'r Arc<Route>, Params)> {
        let path = normalize_path(path);

        if let Some(route) = exact
            .get(&*path)
            .and_then(|bucket| self.pick_exact(bucket, method))
        {
            return Some((route, Params::new()));
        }

        let request: Vec<&str> = segments(&path).collect();
        dynamic
            .iter()
            .filter(|route| self.accepts(&route.method, method))
            .find_map(|route| route.pattern.capture(&request).map(|params| (route, params)))
    }

    /// Same-method route first, then (if allowed) any route at that path
    fn pick_exact<'r>(&self, bucket: &'r [Arc<Route>], method: &Method) -> Option<&'r Arc<Route>> {
        bucket
            .iter()
            .find(|route| route.method == *method)
            .or_else(|| bucket.iter().find(|route| self.accepts(&route.method, method)))
    }
}
