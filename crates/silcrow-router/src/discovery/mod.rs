//! File-tree discovery
//!
//! Walks a pages directory and turns its layout into routes:
//!
//! ```text
//! pages/index.page             → /
//! pages/about.page             → /about
//! pages/blog/index.page        → /blog
//! pages/blog/[slug].page       → /blog/:slug
//! pages/users/[id]/edit.page   → /users/:id/edit
//! pages/blog/_layout.page      → layout for /blog and below
//! pages/_drafts/...            → ignored
//! ```
//!
//! Entries are visited sorted by name at every level, so two runs over the same
//! tree produce the same table whatever order the filesystem lists files in.
//! Files are never executed: each one is resolved through a [`ModuleLoader`].

pub mod loader;

pub use loader::{ModuleLoader, ModuleRegistry, PageModule, SourceFile, HANDLER_EXPORTS, LAYOUT_EXPORT};

use std::io;
use std::path::{Component, Path, PathBuf};

use http::Method;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::DiscoveryConfig;
use crate::error::{Result, RouterError};
use crate::route::{file_segment, PathPattern};
use crate::table::{InsertOutcome, RouteOptions, RouteTable};
use crate::RouteSource;

/// A page file that produced a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Source id handed to the loader (e.g. `blog/[slug].page`)
    pub source_id: String,
    pub path: PathBuf,
    /// Route pattern before the table's mount prefix
    pub route: String,
    /// Export the handler was taken from
    pub export: &'static str,
    pub outcome: InsertOutcome,
}

/// A file left out of the table, with the reason
#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub error: RouterError,
}

/// Summary of one discovery run
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Routes new to the table
    pub added: usize,
    /// Routes that replaced an earlier route with the same method and path
    pub replaced: usize,
    /// One entry per page file, in visit order
    pub manifest: Vec<ManifestEntry>,
    /// Directory prefixes a layout was registered for
    pub layouts: Vec<String>,
    pub skipped: Vec<SkippedFile>,
}

impl DiscoveryReport {
    /// Routes that lost to an existing manual registration
    pub fn shadowed(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.manifest
            .iter()
            .filter(|entry| entry.outcome == InsertOutcome::Shadowed)
    }

    pub fn has_skipped(&self) -> bool {
        !self.skipped.is_empty()
    }
}

/// Directory walker feeding a [`RouteTable`]
pub struct FileTreeDiscovery<'l> {
    config: DiscoveryConfig,
    loader: &'l dyn ModuleLoader,
}

impl<'l> FileTreeDiscovery<'l> {
    pub fn new(config: DiscoveryConfig, loader: &'l dyn ModuleLoader) -> Self {
        Self { config, loader }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Pages directory under an application base directory
    pub fn pages_root(&self, base: impl AsRef<Path>) -> PathBuf {
        base.as_ref().join(&self.config.pages_dir)
    }

    /// Registers every page file and layout under `root` into `table`
    ///
    /// Malformed bracket names and rejected duplicates abort the run. A file
    /// that fails to load, or exposes no handler, is skipped and reported.
    /// A missing root yields an empty report.
    pub fn discover(&self, root: &Path, table: &mut RouteTable) -> Result<DiscoveryReport> {
        let mut report = DiscoveryReport::default();

        if !root.is_dir() {
            warn!("Pages directory does not exist: {:?}", root);
            return Ok(report);
        }

        let walker = WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_private(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().unwrap_or(root).to_path_buf();
                    let source = err
                        .into_io_error()
                        .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "filesystem loop"));
                    warn!("Skipping unreadable entry: {:?}", path);
                    report.skipped.push(SkippedFile {
                        path: path.clone(),
                        error: RouterError::Io { path, source },
                    });
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }
            let extension = entry.path().extension().and_then(|ext| ext.to_str());
            if !self.config.accepts_extension(extension) {
                debug!("Ignoring {:?}: extension not accepted", entry.path());
                continue;
            }

            let Some(source) = source_file(root, entry.path()) else {
                continue;
            };
            if self.is_layout(entry.path()) {
                self.discover_layout(&source, table, &mut report)?;
            } else {
                self.discover_page(&source, table, &mut report)?;
            }
        }

        info!(
            "Discovered {} routes ({} replaced) and {} layouts in {:?} ({} skipped)",
            report.added,
            report.replaced,
            report.layouts.len(),
            root,
            report.skipped.len()
        );
        Ok(report)
    }

    fn discover_page(
        &self,
        source: &SourceFile,
        table: &mut RouteTable,
        report: &mut DiscoveryReport,
    ) -> Result<()> {
        let route = self.route_path(&source.id)?;

        let module = match self.load(source) {
            Ok(module) => module,
            Err(error) => {
                report.skipped.push(SkippedFile {
                    path: source.path.clone(),
                    error,
                });
                return Ok(());
            }
        };

        let Some((export, handler)) = module.handler() else {
            let reason = format!("no handler export (expected one of {})", HANDLER_EXPORTS.join(", "));
            warn!("Skipping {:?}: {}", source.path, reason);
            report.skipped.push(SkippedFile {
                path: source.path.clone(),
                error: RouterError::ModuleLoad {
                    path: source.path.clone(),
                    reason,
                },
            });
            return Ok(());
        };

        let options = RouteOptions {
            layout: module.layout().cloned(),
            middleware: module.middleware().to_vec(),
        };
        let built = table.build_route(
            Method::GET,
            route.as_str(),
            handler.clone(),
            RouteSource::Discovered(source.path.clone()),
            options,
        )?;
        let outcome = table.insert(built)?;

        match outcome {
            InsertOutcome::Inserted => {
                report.added += 1;
                info!("Discovered route: {} <- {}", route, source.id);
            }
            InsertOutcome::Replaced => {
                report.replaced += 1;
                info!("Discovered route (replacing): {} <- {}", route, source.id);
            }
            InsertOutcome::Shadowed => {}
        }
        report.manifest.push(ManifestEntry {
            source_id: source.id.clone(),
            path: source.path.clone(),
            route: route.as_str().to_string(),
            export,
            outcome,
        });
        Ok(())
    }

    fn discover_layout(
        &self,
        source: &SourceFile,
        table: &mut RouteTable,
        report: &mut DiscoveryReport,
    ) -> Result<()> {
        let prefix = self.directory_prefix(&source.id)?;

        let layout = match self.load(source) {
            Ok(module) => module.layout().cloned(),
            Err(error) => {
                report.skipped.push(SkippedFile {
                    path: source.path.clone(),
                    error,
                });
                return Ok(());
            }
        };

        match layout {
            Some(layout) => {
                table.register_layout(prefix.as_str(), layout)?;
                info!("Discovered layout: {} <- {}", prefix, source.id);
                report.layouts.push(prefix.as_str().to_string());
            }
            None => {
                let reason = format!("layout file exposes no `{}` export", LAYOUT_EXPORT);
                warn!("Skipping {:?}: {}", source.path, reason);
                report.skipped.push(SkippedFile {
                    path: source.path.clone(),
                    error: RouterError::ModuleLoad {
                        path: source.path.clone(),
                        reason,
                    },
                });
            }
        }
        Ok(())
    }

    fn load(&self, source: &SourceFile) -> Result<PageModule> {
        self.loader.load(source).map_err(|err| {
            warn!("Failed to load {:?}: {:#}", source.path, err);
            RouterError::ModuleLoad {
                path: source.path.clone(),
                reason: format!("{:#}", err),
            }
        })
    }

    /// Route pattern for a page file id like `blog/[slug].page`
    fn route_path(&self, source_id: &str) -> Result<PathPattern> {
        let (dirs, file) = split_source_id(source_id);
        let stem = file_stem(file);

        let mut segments: Vec<String> = dirs.iter().map(|dir| file_segment(dir)).collect();
        if stem != self.config.index_name {
            segments.push(file_segment(stem));
        }
        PathPattern::parse(&format!("/{}", segments.join("/")))
    }

    /// Directory prefix a layout file declares
    fn directory_prefix(&self, source_id: &str) -> Result<PathPattern> {
        let (dirs, _) = split_source_id(source_id);
        let segments: Vec<String> = dirs.iter().map(|dir| file_segment(dir)).collect();
        PathPattern::parse(&format!("/{}", segments.join("/")))
    }

    fn is_layout(&self, path: &Path) -> bool {
        path.file_stem().and_then(|stem| stem.to_str()) == Some(self.config.layout_name.as_str())
    }

    /// `_private` and `.hidden` entries, except layout files
    fn is_private(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        let reserved = name.starts_with('_') || name.starts_with('.');
        reserved && !(entry.file_type().is_file() && self.is_layout(entry.path()))
    }
}

/// `/`-separated id of `path` relative to `root`; `None` for non-UTF-8 names
fn source_file(root: &Path, path: &Path) -> Option<SourceFile> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = relative
        .components()
        .map(|component| match component {
            Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .collect();

    let Some(parts) = parts else {
        warn!("Skipping non UTF-8 path: {:?}", path);
        return None;
    };
    Some(SourceFile {
        id: parts.join("/"),
        path: path.to_path_buf(),
    })
}

fn split_source_id(source_id: &str) -> (Vec<&str>, &str) {
    let mut parts: Vec<&str> = source_id.split('/').collect();
    let file = parts.pop().unwrap_or_default();
    (parts, file)
}

fn file_stem(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    }
}
