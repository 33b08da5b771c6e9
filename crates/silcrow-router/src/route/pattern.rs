/// Compiled route patterns
///
/// A pattern is a canonical path whose segments are either literals or
/// `:name` placeholders. Each placeholder captures exactly one non-empty
/// path segment; there is no catch-all.
use std::fmt;

use crate::error::{Result, RouterError};
use crate::path::{normalize_path, segments};
use crate::Params;

/// One segment of a compiled pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Literal text, compared exactly (case-sensitive)
    Static(String),
    /// `:name` placeholder
    Param(String),
}

/// A route path compiled into a segment matcher
///
/// # Examples
///
/// ```
/// use silcrow_router::PathPattern;
///
/// let pattern = PathPattern::parse("//users/:id/posts/:post_id/").unwrap();
/// assert_eq!(pattern.as_str(), "/users/:id/posts/:post_id");
/// assert_eq!(pattern.params(), ["id", "post_id"]);
///
/// let params = pattern.matches("/users/7/posts/42").unwrap();
/// assert_eq!(params["post_id"], "42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathPattern {
    path: String,
    segments: Vec<Segment>,
    params: Vec<String>,
}

impl PathPattern {
    /// Normalizes and compiles `raw`
    ///
    /// Fails with [`RouterError::InvalidPattern`] when `raw` is empty, when a
    /// placeholder is not a valid identifier, or when a placeholder name repeats.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(RouterError::invalid_pattern(raw, "pattern is empty"));
        }

        let path = normalize_path(raw).into_owned();
        let mut compiled = Vec::new();
        let mut params: Vec<String> = Vec::new();

        for segment in segments(&path) {
            match segment.strip_prefix(':') {
                Some(name) => {
                    if !is_identifier(name) {
                        return Err(RouterError::invalid_pattern(
                            raw,
                            format!("`:{}` is not a valid parameter name", name),
                        ));
                    }
                    if params.iter().any(|p| p == name) {
                        return Err(RouterError::invalid_pattern(
                            raw,
                            format!("parameter `{}` appears more than once", name),
                        ));
                    }
                    params.push(name.to_string());
                    compiled.push(Segment::Param(name.to_string()));
                }
                None => compiled.push(Segment::Static(segment.to_string())),
            }
        }

        Ok(Self {
            path,
            segments: compiled,
            params,
        })
    }

    /// Canonical text of the pattern
    pub fn as_str(&self) -> &str {
        &self.path
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Placeholder names in left-to-right order
    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn is_dynamic(&self) -> bool {
        !self.params.is_empty()
    }

    /// Whether the first segment is the literal `segment`
    pub fn starts_with_segment(&self, segment: &str) -> bool {
        matches!(self.segments.first(), Some(Segment::Static(s)) if s == segment)
    }

    /// Matches a request path, normalizing it first
    pub fn matches(&self, path: &str) -> Option<Params> {
        let normalized = normalize_path(path);
        let request: Vec<&str> = segments(&normalized).collect();
        self.capture(&request)
    }

    /// Matches already-split request segments
    ///
    /// Segment counts must be equal; literals compare exactly and every
    /// placeholder binds the corresponding segment.
    pub fn capture(&self, request: &[&str]) -> Option<Params> {
        if request.len() != self.segments.len() {
            return None;
        }

        let mut params = Params::with_capacity(self.params.len());
        for (segment, value) in self.segments.iter().zip(request) {
            match segment {
                Segment::Static(literal) if literal.as_str() != *value => return None,
                Segment::Static(_) => {}
                Segment::Param(_) if value.is_empty() => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), (*value).to_string());
                }
            }
        }
        Some(params)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Letters, digits and underscores, not starting with a digit
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Translates a directory or file stem into a pattern segment
///
/// `[slug]` becomes `:slug`; anything else is returned as a literal.
///
/// ```
/// use silcrow_router::route::pattern::file_segment;
///
/// assert_eq!(file_segment("[slug]"), ":slug");
/// assert_eq!(file_segment("blog"), "blog");
/// ```
pub fn file_segment(name: &str) -> String {
    match name.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        Some(param) => format!(":{}", param),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_static() {
        let pattern = PathPattern::parse("/about").unwrap();
        assert_eq!(pattern.as_str(), "/about");
        assert!(!pattern.is_dynamic());
        assert_eq!(pattern.segments(), [Segment::Static("about".into())]);
    }

    #[test]
    fn test_parse_root() {
        let pattern = PathPattern::parse("/").unwrap();
        assert_eq!(pattern.as_str(), "/");
        assert!(pattern.segments().is_empty());
        assert_eq!(pattern.matches("/"), Some(Params::new()));
        assert_eq!(pattern.matches(""), Some(Params::new()));
    }

    #[test]
    fn test_params_in_textual_order() {
        let pattern = PathPattern::parse("/org/:org/repo/:repo/:_rev2").unwrap();
        assert_eq!(pattern.params(), ["org", "repo", "_rev2"]);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("/users/:")]
    #[case("/users/:1st")]
    #[case("/users/:first-name")]
    #[case("/a/:id/b/:id")]
    fn test_invalid_patterns(#[case] raw: &str) {
        assert!(matches!(
            PathPattern::parse(raw),
            Err(RouterError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_colon_inside_segment_is_literal() {
        let pattern = PathPattern::parse("/time/12:30").unwrap();
        assert!(!pattern.is_dynamic());
        assert!(pattern.matches("/time/12:30").is_some());
    }

    #[rstest]
    #[case("/users/:id", "/users/42", Some(vec![("id", "42")]))]
    #[case("/users/:id", "/users/42/", Some(vec![("id", "42")]))]
    #[case("/users/:id", "/users", None)]
    #[case("/users/:id", "/users/42/edit", None)]
    #[case("/users/:id", "/Users/42", None)]
    #[case("/a/:x/c/:y", "/a/1/c/2", Some(vec![("x", "1"), ("y", "2")]))]
    #[case("/a/:x/c/:y", "/a/1/d/2", None)]
    fn test_matching(
        #[case] pattern: &str,
        #[case] path: &str,
        #[case] expected: Option<Vec<(&str, &str)>>,
    ) {
        let pattern = PathPattern::parse(pattern).unwrap();
        let expected = expected.map(|pairs| {
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Params>()
        });
        assert_eq!(pattern.matches(path), expected);
    }

    #[test]
    fn test_capture_rejects_empty_segment() {
        let pattern = PathPattern::parse("/users/:id").unwrap();
        assert_eq!(pattern.capture(&["users", ""]), None);
    }

    #[test]
    fn test_starts_with_segment() {
        let pattern = PathPattern::parse("/api/users").unwrap();
        assert!(pattern.starts_with_segment("api"));
        assert!(!PathPattern::parse("/apiary").unwrap().starts_with_segment("api"));
        assert!(!PathPattern::parse("/:api").unwrap().starts_with_segment("api"));
    }

    #[test]
    fn test_file_segment() {
        assert_eq!(file_segment("[id]"), ":id");
        assert_eq!(file_segment("[id"), "[id");
        assert_eq!(file_segment("contact"), "contact");
    }
}
