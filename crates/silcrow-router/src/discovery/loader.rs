/// Page modules and the loaders that resolve discovered files to them
///
/// Discovery never executes files. Each page file found on disk is described by
/// a [`SourceFile`] and resolved through a [`ModuleLoader`]; the usual loader is
/// a [`ModuleRegistry`] populated at startup with one [`PageModule`] per file.
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;

use crate::handler::{Handler, Layout, Middleware};

/// Export names searched for a page handler, in order; first found wins
pub const HANDLER_EXPORTS: [&str; 5] = ["page", "default", "view", "get", "handler"];

/// Export name a layout file must provide
pub const LAYOUT_EXPORT: &str = "layout";

/// A page file found during discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the pages root, `/`-separated (e.g. `blog/[slug].page`)
    pub id: String,
    /// Full path on disk
    pub path: PathBuf,
}

/// Capabilities a page file provides
#[derive(Debug, Clone, Default)]
pub struct PageModule {
    exports: HashMap<String, Handler>,
    layout: Option<Layout>,
    middleware: Vec<Middleware>,
}

impl PageModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Module exposing `handler` under the conventional `page` export
    pub fn page(handler: Handler) -> Self {
        Self::new().with_export("page", handler)
    }

    /// Module exposing only a layout
    pub fn layout_only(layout: Layout) -> Self {
        Self::new().with_layout(layout)
    }

    pub fn with_export(mut self, name: impl Into<String>, handler: Handler) -> Self {
        self.exports.insert(name.into(), handler);
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn with_middleware(mut self, middleware: Middleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub fn export(&self, name: &str) -> Option<&Handler> {
        self.exports.get(name)
    }

    /// First handler found under [`HANDLER_EXPORTS`], with the export name
    pub fn handler(&self) -> Option<(&'static str, &Handler)> {
        HANDLER_EXPORTS
            .iter()
            .find_map(|name| self.exports.get(*name).map(|handler| (*name, handler)))
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    pub fn middleware(&self) -> &[Middleware] {
        &self.middleware
    }
}

/// Resolves a discovered file to its page module
///
/// An `Err` is reported for that file only; discovery carries on with the rest.
pub trait ModuleLoader: Send + Sync {
    fn load(&self, source: &SourceFile) -> anyhow::Result<PageModule>;
}

impl<F> ModuleLoader for F
where
    F: Fn(&SourceFile) -> anyhow::Result<PageModule> + Send + Sync,
{
    fn load(&self, source: &SourceFile) -> anyhow::Result<PageModule> {
        self(source)
    }
}

type ModuleFactory = Arc<dyn Fn() -> anyhow::Result<PageModule> + Send + Sync>;

/// Startup-time table mapping source ids to page modules
///
/// ```
/// use silcrow_router::{Handler, ModuleLoader, ModuleRegistry, PageModule, SourceFile};
/// use serde_json::json;
///
/// let registry = ModuleRegistry::new()
///     .with_module("contact.page", PageModule::page(Handler::new(|_| Ok(json!("contact")))));
///
/// let source = SourceFile { id: "contact.page".into(), path: "pages/contact.page".into() };
/// assert!(registry.load(&source).is_ok());
/// ```
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, ModuleFactory>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, id: impl Into<String>, module: PageModule) -> Self {
        self.insert(id, module);
        self
    }

    /// Registers a factory evaluated on every load; it may fail
    pub fn with_factory<F>(mut self, id: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> anyhow::Result<PageModule> + Send + Sync + 'static,
    {
        self.modules.insert(id.into(), Arc::new(factory));
        self
    }

    pub fn insert(&mut self, id: impl Into<String>, module: PageModule) {
        let factory = move || -> anyhow::Result<PageModule> { Ok(module.clone()) };
        self.modules.insert(id.into(), Arc::new(factory));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.modules.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ModuleLoader for ModuleRegistry {
    fn load(&self, source: &SourceFile) -> anyhow::Result<PageModule> {
        match self.modules.get(&source.id) {
            Some(factory) => factory(),
            None => bail!("no page module registered for `{}`", source.id),
        }
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&String> = self.modules.keys().collect();
        ids.sort();
        f.debug_struct("ModuleRegistry").field("modules", &ids).finish()
    }
}
