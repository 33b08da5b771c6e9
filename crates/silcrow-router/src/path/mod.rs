/// Path utilities shared by registration, discovery and matching
///
/// All functions are pure and allocation-free when the input is already canonical.
use std::borrow::Cow;

pub mod hierarchy;
pub use hierarchy::PathHierarchy;

/// Checks whether a path is already in canonical form
///
/// # Rules
///
/// - Starts with a single `/`
/// - Contains no `//` and no `\`
/// - No trailing `/` (except the root `/`)
///
/// # Examples
///
/// ```
/// use silcrow_router::path::is_valid_path;
///
/// assert!(is_valid_path("/"));
/// assert!(is_valid_path("/blog/:slug"));
///
/// assert!(!is_valid_path(""));
/// assert!(!is_valid_path("blog"));
/// assert!(!is_valid_path("/blog/"));
/// assert!(!is_valid_path("/blog//post"));
/// ```
pub fn is_valid_path(path: &str) -> bool {
    if !path.starts_with('/') {
        return false;
    }
    if path.contains("//") {
        return false;
    }
    path == "/" || !path.ends_with('/')
}

/// Normalizes a path to canonical form
///
/// Collapses repeated separators, forces one leading `/` and strips the
/// trailing `/` except for the root. Only `/` separates segments; any other
/// character, backslash included, stays inside its segment.
///
/// Returns `Cow::Borrowed` when the input is already canonical.
///
/// # Examples
///
/// ```
/// use silcrow_router::path::normalize_path;
/// use std::borrow::Cow;
///
/// assert!(matches!(normalize_path("/about"), Cow::Borrowed("/about")));
/// assert_eq!(normalize_path("about/"), "/about");
/// assert_eq!(normalize_path("//blog///post/"), "/blog/post");
/// assert_eq!(normalize_path(""), "/");
/// ```
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    if is_valid_path(path) {
        return Cow::Borrowed(path);
    }

    let joined = path
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if joined.is_empty() {
        Cow::Borrowed("/")
    } else {
        Cow::Owned(format!("/{}", joined))
    }
}

/// Joins a mount prefix and a path, normalizing the result
///
/// An empty or root prefix leaves the path untouched (apart from normalization).
///
/// ```
/// use silcrow_router::path::join_path;
///
/// assert_eq!(join_path("/app", "/users"), "/app/users");
/// assert_eq!(join_path("/app/", "/"), "/app");
/// assert_eq!(join_path("", "users"), "/users");
/// ```
pub fn join_path(prefix: &str, path: &str) -> String {
    let prefix = normalize_path(prefix);
    let path = normalize_path(path);

    match (prefix.as_ref(), path.as_ref()) {
        ("/", p) => p.to_string(),
        (pre, "/") => pre.to_string(),
        (pre, p) => format!("{}{}", pre, p),
    }
}

/// Splits a canonical path into its segments (the root has none)
pub fn segments(path: &str) -> impl Iterator<Item = &str> + Clone {
    path.split('/').filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_path() {
        assert!(is_valid_path("/"));
        assert!(is_valid_path("/users/:id"));

        assert!(!is_valid_path(""));
        assert!(!is_valid_path("users"));
        assert!(!is_valid_path("/users/"));
        assert!(!is_valid_path("/users//1"));
        assert!(is_valid_path("/files/a\\b"));
    }

    #[test]
    fn test_normalize_path_borrowed_when_canonical() {
        assert!(matches!(normalize_path("/"), Cow::Borrowed("/")));
        assert!(matches!(normalize_path("/blog/:slug"), Cow::Borrowed("/blog/:slug")));
    }

    #[test]
    fn test_normalize_path_repairs() {
        assert_eq!(normalize_path("blog"), "/blog");
        assert_eq!(normalize_path("/blog/"), "/blog");
        assert_eq!(normalize_path("///blog//post///"), "/blog/post");
        assert_eq!(normalize_path("files/a\\b/"), "/files/a\\b");
        assert_eq!(normalize_path("//"), "/");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "/"), "/");
        assert_eq!(join_path("/", "/about"), "/about");
        assert_eq!(join_path("app", "about/"), "/app/about");
        assert_eq!(join_path("/app", ""), "/app");
    }

    #[test]
    fn test_segments() {
        assert_eq!(segments("/").count(), 0);
        assert_eq!(segments("/a/:b").collect::<Vec<_>>(), vec!["a", ":b"]);
    }
}
