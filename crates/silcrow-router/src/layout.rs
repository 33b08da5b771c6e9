//! Closest-enclosing layout resolution

use std::collections::HashMap;

use crate::error::Result;
use crate::handler::Layout;
use crate::path::PathHierarchy;
use crate::route::PathPattern;

/// Layouts keyed by the path prefix of the directory that declared them
///
/// A layout applies to every route at or below its prefix unless a deeper
/// prefix declares its own. The root prefix is `/`.
#[derive(Debug, Clone, Default)]
pub struct LayoutResolver {
    layouts: HashMap<String, Layout>,
}

impl LayoutResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `layout` for `prefix`, replacing any layout already there
    ///
    /// The prefix is normalized with the same rules as route patterns, so
    /// `blog/[id]` style prefixes must already be translated to `/blog/:id`.
    pub fn insert(&mut self, prefix: &str, layout: Layout) -> Result<Option<Layout>> {
        let prefix = if prefix.is_empty() { "/" } else { prefix };
        let pattern = PathPattern::parse(prefix)?;
        Ok(self.layouts.insert(pattern.as_str().to_string(), layout))
    }

    /// Closest layout for a canonical route pattern, longest prefix first
    pub fn resolve(&self, pattern: &str) -> Option<&Layout> {
        PathHierarchy::new(pattern).find_map(|prefix| self.layouts.get(prefix))
    }

    /// Prefix the layout for `pattern` was declared at
    pub fn resolve_prefix<'a>(&self, pattern: &'a str) -> Option<&'a str> {
        PathHierarchy::new(pattern).find(|prefix| self.layouts.contains_key(*prefix))
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    /// Registered prefixes, sorted
    pub fn prefixes(&self) -> Vec<&str> {
        let mut prefixes: Vec<&str> = self.layouts.keys().map(String::as_str).collect();
        prefixes.sort_unstable();
        prefixes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn layout(name: &str) -> Layout {
        Layout::new(name, |content: Value, _| content)
    }

    #[test]
    fn test_nested_layouts_closest_wins() {
        let mut resolver = LayoutResolver::new();
        resolver.insert("/", layout("root")).unwrap();
        resolver.insert("/blog", layout("blog")).unwrap();
        resolver.insert("/blog/post/:id", layout("post")).unwrap();

        assert_eq!(resolver.resolve("/").map(Layout::name), Some("root"));
        assert_eq!(resolver.resolve("/about").map(Layout::name), Some("root"));
        assert_eq!(resolver.resolve("/blog").map(Layout::name), Some("blog"));
        assert_eq!(resolver.resolve("/blog/post").map(Layout::name), Some("blog"));
        assert_eq!(
            resolver.resolve("/blog/post/:id/comments").map(Layout::name),
            Some("post")
        );
        assert_eq!(resolver.resolve_prefix("/blog/archive"), Some("/blog"));
    }

    #[test]
    fn test_no_layout_is_valid() {
        let mut resolver = LayoutResolver::new();
        resolver.insert("/admin", layout("admin")).unwrap();

        assert!(resolver.resolve("/shop/cart").is_none());
        assert!(resolver.resolve("/administrator").is_none());
    }

    #[test]
    fn test_empty_prefix_means_root() {
        let mut resolver = LayoutResolver::new();
        resolver.insert("", layout("root")).unwrap();
        assert_eq!(resolver.prefixes(), vec!["/"]);

        let previous = resolver.insert("/", layout("root2")).unwrap();
        assert_eq!(previous.map(|l| l.name().to_string()), Some("root".into()));
        assert_eq!(resolver.len(), 1);
    }
}
