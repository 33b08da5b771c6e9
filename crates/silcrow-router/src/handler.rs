//! Handler invocation contract
//!
//! The router stores handlers, layouts and middleware as opaque callables and
//! never inspects them. A dispatcher resolves a [`RouteMatch`](crate::RouteMatch)
//! and hands it a [`RequestContext`]; the types here define that hand-off.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::Method;

use crate::Params;

/// Value produced by handlers and transformed by layouts
pub type Payload = serde_json::Value;

pub type HandlerResult = Result<Payload, HandlerError>;

/// Failure signalled by a handler or middleware to the dispatcher
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The addressed resource does not exist; dispatchers usually answer 404
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    /// Middleware refused the request
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Already-parsed request as seen by handlers
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    /// Filled in from the match before the handler runs
    pub params: Params,
    pub query: HashMap<String, String>,
    pub body: Option<Payload>,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Params::new(),
            query: HashMap::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Payload) -> Self {
        self.body = Some(body);
        self
    }

    /// Bound path parameter by name
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

type HandlerFn = dyn Fn(&RequestContext) -> HandlerResult + Send + Sync;
type LayoutFn = dyn Fn(Payload, &RequestContext) -> Payload + Send + Sync;
type MiddlewareFn = dyn Fn(&RequestContext) -> Result<(), HandlerError> + Send + Sync;

/// Opaque, cheaply clonable route handler
#[derive(Clone)]
pub struct Handler(Arc<HandlerFn>);

impl Handler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&RequestContext) -> HandlerResult + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, ctx: &RequestContext) -> HandlerResult {
        (self.0)(ctx)
    }

    /// Whether both handles point at the same callable
    pub fn ptr_eq(&self, other: &Handler) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler(..)")
    }
}

/// Wraps a handler's payload, e.g. in a page shell
///
/// The name is only used for diagnostics.
#[derive(Clone)]
pub struct Layout {
    name: String,
    wrap: Arc<LayoutFn>,
}

impl Layout {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Payload, &RequestContext) -> Payload + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            wrap: Arc::new(f),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn wrap(&self, content: Payload, ctx: &RequestContext) -> Payload {
        (self.wrap)(content, ctx)
    }

    pub fn ptr_eq(&self, other: &Layout) -> bool {
        Arc::ptr_eq(&self.wrap, &other.wrap)
    }
}

impl fmt::Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Layout").field(&self.name).finish()
    }
}

/// Guard run before the handler; an error short-circuits the chain
#[derive(Clone)]
pub struct Middleware {
    name: String,
    guard: Arc<MiddlewareFn>,
}

impl Middleware {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&RequestContext) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            guard: Arc::new(f),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn check(&self, ctx: &RequestContext) -> Result<(), HandlerError> {
        (self.guard)(ctx)
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Middleware").field(&self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_handler_reads_params() {
        let handler = Handler::new(|ctx| Ok(json!({ "id": ctx.param("id") })));
        let mut ctx = RequestContext::new(Method::GET, "/users/9");
        ctx.params.insert("id".into(), "9".into());

        assert_eq!(handler.call(&ctx).unwrap(), json!({ "id": "9" }));
        assert!(handler.ptr_eq(&handler.clone()));
    }

    #[test]
    fn test_layout_wraps_payload() {
        let layout = Layout::new("shell", |content, _| json!({ "shell": content }));
        let ctx = RequestContext::new(Method::GET, "/");

        assert_eq!(layout.wrap(json!("hi"), &ctx), json!({ "shell": "hi" }));
        assert_eq!(format!("{:?}", layout), "Layout(\"shell\")");
    }

    #[test]
    fn test_middleware_can_refuse() {
        let auth = Middleware::new("auth", |ctx| match ctx.query.get("token") {
            Some(_) => Ok(()),
            None => Err(HandlerError::Forbidden("missing token".into())),
        });

        let anonymous = RequestContext::new(Method::GET, "/admin");
        assert!(matches!(auth.check(&anonymous), Err(HandlerError::Forbidden(_))));

        let signed = anonymous.with_query("token", "abc");
        assert!(auth.check(&signed).is_ok());
    }
}
