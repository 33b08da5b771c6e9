//! # Silcrow Router
//!
//! One route table fed from two sources:
//! - **Manual registration** (`table.register(Method::GET, "/about", handler, options)`)
//! - **File-tree discovery** (`pages/blog/[slug].page` → `/blog/:slug`)
//!
//! Both end up as [`Route`]s in a [`RouteTable`]. At request time the table
//! resolves `(method, path)` to a [`RouteMatch`]: the route, its bound
//! parameters and the closest enclosing layout.
//!
//! ## Precedence
//!
//! - Exact literal paths beat dynamic patterns (`/users/new` over `/users/:id`).
//! - Dynamic patterns are tried in registration order; first fit wins.
//! - Registering the same `(method, path)` again replaces the earlier route,
//!   except that a discovered file never replaces a manual registration.
//!
//! ## Lifecycle
//!
//! Tables are built single-threaded at startup and are read-only afterwards,
//! so `&RouteTable` can be shared across request threads. Re-discovery builds
//! a fresh table and publishes it through [`SharedRouteTable`].
//!
//! ## Example
//!
//! ```
//! use silcrow_router::{Handler, Method, RouteOptions, RouteTable};
//! use serde_json::json;
//!
//! let mut table = RouteTable::new();
//! table
//!     .page("/", Handler::new(|_| Ok(json!("home"))))?
//!     .register(
//!         Method::GET,
//!         "/users/:id",
//!         Handler::new(|ctx| Ok(json!({ "user": ctx.param("id") }))),
//!         RouteOptions::default(),
//!     )?;
//!
//! let found = table.lookup(&Method::GET, "/users/42").unwrap();
//! assert_eq!(found.params.get("id"), Some(&"42".to_string()));
//! # Ok::<(), silcrow_router::RouterError>(())
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ============================================================================
// Module Declarations
// ============================================================================

pub mod config;
pub mod crud;
pub mod discovery;
pub mod error;
pub mod handler;
pub mod layout;
pub mod matcher;
pub mod path;
pub mod route;
pub mod shared;
pub mod table;
pub mod watch;

pub use config::{DiscoveryConfig, DuplicatePolicy, MethodMatching, RouterConfig, RoutingConfig};
pub use crud::{CrudGenerator, Entity, Repository};
pub use discovery::{
    DiscoveryReport, FileTreeDiscovery, ManifestEntry, ModuleLoader, ModuleRegistry, PageModule,
    SkippedFile, SourceFile,
};
pub use error::RouterError;
pub use handler::{Handler, HandlerError, HandlerResult, Layout, Middleware, Payload, RequestContext};
pub use http::Method;
pub use layout::LayoutResolver;
pub use matcher::MatchEngine;
pub use path::{normalize_path, PathHierarchy};
pub use route::{PathPattern, Segment};
pub use shared::SharedRouteTable;
pub use table::{InsertOutcome, RouteInfo, RouteOptions, RouteTable};
pub use watch::RouteWatcher;

/// Parameter name → captured path segment
pub type Params = HashMap<String, String>;

// ============================================================================
// Core Types
// ============================================================================

/// Where a route came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteSource {
    /// Registered through the table API
    Manual,
    /// Produced by file-tree discovery from this page file
    Discovered(PathBuf),
}

/// A (method, path pattern) → handler binding
#[derive(Debug, Clone)]
pub struct Route {
    pub method: Method,
    /// Canonical pattern like "/users/:id"
    pub pattern: PathPattern,
    pub handler: Handler,
    pub source: RouteSource,
    /// First segment is the reserved API segment
    pub is_api: bool,
    /// Explicit layout; takes precedence over the directory layout
    pub layout: Option<Layout>,
    /// Run in order before the handler
    pub middleware: Vec<Middleware>,
}

impl Route {
    pub fn new(method: Method, pattern: PathPattern, handler: Handler, source: RouteSource) -> Self {
        Route {
            method,
            pattern,
            handler,
            source,
            is_api: false,
            layout: None,
            middleware: Vec::new(),
        }
    }

    pub fn path(&self) -> &str {
        self.pattern.as_str()
    }

    /// Parameter names in pattern order
    pub fn params(&self) -> &[String] {
        self.pattern.params()
    }

    pub fn is_dynamic(&self) -> bool {
        self.pattern.is_dynamic()
    }

    pub fn is_discovered(&self) -> bool {
        matches!(self.source, RouteSource::Discovered(_))
    }

    /// Page file this route was discovered from (diagnostics only)
    pub fn origin_file(&self) -> Option<&Path> {
        match &self.source {
            RouteSource::Discovered(file) => Some(file),
            RouteSource::Manual => None,
        }
    }
}

/// Result of resolving a request against a [`RouteTable`]
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// The matched route
    pub route: Arc<Route>,
    /// One entry per pattern parameter
    pub params: Params,
    /// Explicit route layout, else the closest directory layout
    pub layout: Option<Layout>,
}

impl RouteMatch {
    pub fn middleware(&self) -> &[Middleware] {
        &self.route.middleware
    }

    /// Runs the route for `ctx`
    ///
    /// Binds the matched params into the context, runs middleware in order
    /// (the first refusal is returned as-is), calls the handler and wraps the
    /// payload in the layout, if any.
    pub fn invoke(&self, mut ctx: RequestContext) -> HandlerResult {
        ctx.params = self.params.clone();

        for middleware in &self.route.middleware {
            middleware.check(&ctx)?;
        }

        let payload = self.route.handler.call(&ctx)?;
        Ok(match &self.layout {
            Some(layout) => layout.wrap(payload, &ctx),
            None => payload,
        })
    }
}
