/// Lazy walk from a route path up to the root
///
/// For `/blog/post/:id`, yields `/blog/post/:id` → `/blog/post` → `/blog` → `/`.
/// The layout resolver uses it to find the closest enclosing layout: the first
/// prefix with a registered layout wins, so deeper layouts override shallower ones.
///
/// Only borrows from the input; no allocation.
///
/// # Examples
///
/// ```
/// use silcrow_router::path::PathHierarchy;
///
/// let prefixes: Vec<&str> = PathHierarchy::new("/blog/post/:id").collect();
/// assert_eq!(prefixes, vec!["/blog/post/:id", "/blog/post", "/blog", "/"]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PathHierarchy<'a> {
    next: Option<&'a str>,
}

impl<'a> PathHierarchy<'a> {
    /// Starts the walk at `path`, which is expected to be canonical
    pub fn new(path: &'a str) -> Self {
        Self { next: Some(path) }
    }
}

impl<'a> Iterator for PathHierarchy<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        self.next = match current.rfind('/') {
            _ if current == "/" => None,
            Some(0) => Some("/"),
            Some(pos) => Some(&current[..pos]),
            None => None,
        };

        Some(current)
    }
}
