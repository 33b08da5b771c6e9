//! The authoritative route table.
//!
//! Static routes live in a map keyed by canonical path; dynamic routes live in
//! a vector whose order is registration order, which is also match order.
//! Replacing a dynamic route keeps its position.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use http::Method;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{DiscoveryConfig, DuplicatePolicy, RoutingConfig};
use crate::discovery::{DiscoveryReport, FileTreeDiscovery, ModuleLoader};
use crate::error::{Result, RouterError};
use crate::handler::{Handler, Layout, Middleware};
use crate::layout::LayoutResolver;
use crate::matcher::{ExactRoutes, MatchEngine};
use crate::path::join_path;
use crate::route::PathPattern;
use crate::{Route, RouteMatch, RouteSource};

/// Per-route extras for [`RouteTable::register`]
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    pub layout: Option<Layout>,
    pub middleware: Vec<Middleware>,
}

impl RouteOptions {
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn with_middleware(mut self, middleware: Middleware) -> Self {
        self.middleware.push(middleware);
        self
    }
}

/// What [`RouteTable::insert`] did with a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// New (method, path)
    Inserted,
    /// An earlier route with the same (method, path) was replaced in place
    Replaced,
    /// A discovered route lost to an existing manual registration
    Shadowed,
}

/// Diagnostic view of a route
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
    pub path: String,
    pub method: String,
    pub is_dynamic: bool,
    pub is_api: bool,
    pub params: Vec<String>,
    pub origin_file: Option<PathBuf>,
}

impl From<&Route> for RouteInfo {
    fn from(route: &Route) -> Self {
        RouteInfo {
            path: route.path().to_string(),
            method: route.method.to_string(),
            is_dynamic: route.is_dynamic(),
            is_api: route.is_api,
            params: route.params().to_vec(),
            origin_file: route.origin_file().map(Path::to_path_buf),
        }
    }
}

/// Route table built at startup and read concurrently afterwards
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    config: RoutingConfig,
    engine: MatchEngine,
    exact: ExactRoutes,
    dynamic: Vec<Arc<Route>>,
    layouts: LayoutResolver,
}

impl RouteTable {
    /// Empty table: no prefix, last-registration-wins, strict methods
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RoutingConfig) -> Self {
        Self {
            engine: MatchEngine::new(config.method_matching),
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Registers `handler` for `method` + `path`
    ///
    /// Replaces an earlier route with the same method and canonical path,
    /// unless the table rejects duplicates. Fails on malformed patterns.
    ///
    /// ```
    /// use silcrow_router::{Handler, Method, RouteOptions, RouteTable};
    /// use serde_json::json;
    ///
    /// let mut table = RouteTable::new();
    /// table
    ///     .register(Method::GET, "/about", Handler::new(|_| Ok(json!("v1"))), RouteOptions::default())?
    ///     .register(Method::GET, "/about/", Handler::new(|_| Ok(json!("v2"))), RouteOptions::default())?;
    /// assert_eq!(table.len(), 1);
    /// # Ok::<(), silcrow_router::RouterError>(())
    /// ```
    pub fn register(
        &mut self,
        method: Method,
        path: &str,
        handler: Handler,
        options: RouteOptions,
    ) -> Result<&mut Self> {
        let route = self.build_route(method, path, handler, RouteSource::Manual, options)?;
        self.insert(route)?;
        Ok(self)
    }

    /// GET shorthand with default options
    pub fn page(&mut self, path: &str, handler: Handler) -> Result<&mut Self> {
        self.register(Method::GET, path, handler, RouteOptions::default())
    }

    /// Registers under the API prefix, adding it when `path` lacks it
    ///
    /// `register_api(GET, "/users", ..)` registers `/api/users`.
    pub fn register_api(
        &mut self,
        method: Method,
        path: &str,
        handler: Handler,
        options: RouteOptions,
    ) -> Result<&mut Self> {
        let local = PathPattern::parse(path)?;
        let path = if local.starts_with_segment(&self.config.api_prefix) {
            local.as_str().to_string()
        } else {
            join_path(&self.config.api_prefix, local.as_str())
        };
        self.register(method, &path, handler, options)
    }

    /// Declares the layout for every route at or below `prefix`
    pub fn register_layout(&mut self, prefix: &str, layout: Layout) -> Result<&mut Self> {
        let prefix = if prefix.is_empty() { "/" } else { prefix };
        let (pattern, _) = self.compile(prefix)?;
        if let Some(previous) = self.layouts.insert(pattern.as_str(), layout)? {
            debug!(prefix = %pattern, previous = previous.name(), "Layout replaced");
        }
        Ok(self)
    }

    /// Builds a route the way `register` would, without inserting it
    pub fn build_route(
        &self,
        method: Method,
        path: &str,
        handler: Handler,
        source: RouteSource,
        options: RouteOptions,
    ) -> Result<Route> {
        let (pattern, is_api) = self.compile(path)?;
        let mut route = Route::new(method, pattern, handler, source);
        route.is_api = is_api;
        route.layout = options.layout;
        route.middleware = options.middleware;
        Ok(route)
    }

    /// Canonical, mounted pattern plus the API flag of the unmounted path
    fn compile(&self, path: &str) -> Result<(PathPattern, bool)> {
        let local = PathPattern::parse(path)?;
        let is_api = local.starts_with_segment(&self.config.api_prefix);

        if self.config.prefix.trim_matches('/').is_empty() {
            return Ok((local, is_api));
        }
        let mounted = PathPattern::parse(&join_path(&self.config.prefix, local.as_str()))?;
        Ok((mounted, is_api))
    }

    /// Inserts an already-built route, applying the duplicate rules
    ///
    /// - new (method, path): inserted
    /// - duplicate, table rejects duplicates: `DuplicateRoute`
    /// - discovered route over a manual one: shadowed, table unchanged
    /// - otherwise: replaced in place
    pub fn insert(&mut self, route: Route) -> Result<InsertOutcome> {
        let duplicates = self.config.duplicates;
        let route = Arc::new(route);

        let bucket = if route.is_dynamic() {
            &mut self.dynamic
        } else {
            self.exact.entry(route.path().to_string()).or_default()
        };

        let position = bucket
            .iter()
            .position(|r| r.method == route.method && r.pattern == route.pattern);

        let Some(position) = position else {
            debug!(method = %route.method, path = route.path(), "Route registered");
            bucket.push(route);
            return Ok(InsertOutcome::Inserted);
        };

        let existing = &bucket[position];
        if duplicates == DuplicatePolicy::Reject {
            return Err(RouterError::DuplicateRoute {
                method: route.method.to_string(),
                path: route.path().to_string(),
            });
        }

        if route.is_discovered() && !existing.is_discovered() {
            warn!(
                method = %route.method,
                path = route.path(),
                file = ?route.origin_file(),
                "Discovered route shadowed by manual registration"
            );
            return Ok(InsertOutcome::Shadowed);
        }

        debug!(method = %route.method, path = route.path(), "Route replaced");
        bucket[position] = route;
        Ok(InsertOutcome::Replaced)
    }

    /// Walks `root` and registers every page file (see [`FileTreeDiscovery`])
    ///
    /// Returns the discovery report; `report.added` is the number of routes added.
    pub fn discover(
        &mut self,
        root: impl AsRef<Path>,
        loader: &dyn ModuleLoader,
    ) -> Result<DiscoveryReport> {
        FileTreeDiscovery::new(DiscoveryConfig::default(), loader).discover(root.as_ref(), self)
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Resolves a request; `None` means no route
    pub fn lookup(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let (route, params) = self.engine.find(&self.exact, &self.dynamic, method, path)?;
        Some(RouteMatch {
            layout: self.layout_for(route).cloned(),
            route: Arc::clone(route),
            params,
        })
    }

    /// [`lookup`](Self::lookup) with path-first argument order
    pub fn resolve(&self, path: &str, method: &Method) -> Option<RouteMatch> {
        self.lookup(method, path)
    }

    /// Explicit route layout, else the closest directory layout
    pub fn layout_for<'a>(&'a self, route: &'a Route) -> Option<&'a Layout> {
        route
            .layout
            .as_ref()
            .or_else(|| self.layouts.resolve(route.path()))
    }

    pub fn layouts(&self) -> &LayoutResolver {
        &self.layouts
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// All routes sorted by path, then method
    ///
    /// The iterator is `Clone`, so it can be walked more than once.
    pub fn all(&self) -> impl Iterator<Item = &Route> + Clone + '_ {
        let mut routes: Vec<&Route> = self
            .exact
            .values()
            .flatten()
            .chain(self.dynamic.iter())
            .map(Arc::as_ref)
            .collect();
        routes.sort_by(|a, b| {
            a.path()
                .cmp(b.path())
                .then_with(|| a.method.as_str().cmp(b.method.as_str()))
        });
        routes.into_iter()
    }

    pub fn list_routes(&self) -> Vec<RouteInfo> {
        self.all().map(RouteInfo::from).collect()
    }

    pub fn len(&self) -> usize {
        self.exact.values().map(Vec::len).sum::<usize>() + self.dynamic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dynamic routes in match order
    pub fn dynamic_routes(&self) -> impl Iterator<Item = &Route> {
        self.dynamic.iter().map(Arc::as_ref)
    }
}

impl fmt::Display for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Routes:")?;
        for route in self.all() {
            let marker = if route.is_api { "API " } else { "PAGE" };
            write!(f, "  {} {:7} {}", marker, route.method.as_str(), route.path())?;
            if route.is_dynamic() {
                write!(f, " (params: {})", route.params().join(", "))?;
            }
            if let Some(file) = route.origin_file() {
                write!(f, " <- {}", file.display())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
