//! Error taxonomy for route construction and discovery.
//!
//! Match-time "no route" is not represented here: lookups return `None`.

use std::path::PathBuf;

/// Errors raised while building a [`RouteTable`](crate::RouteTable).
///
/// `InvalidPattern` and `DuplicateRoute` are structural and abort startup.
/// `ModuleLoad` is recoverable during discovery: the file is skipped and
/// reported in the [`DiscoveryReport`](crate::DiscoveryReport).
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("route {method} {path} is already registered")]
    DuplicateRoute { method: String, path: String },

    #[error("failed to load page module {}: {reason}", path.display())]
    ModuleLoad { path: PathBuf, reason: String },

    #[error("i/o error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RouterError {
    pub(crate) fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> Self {
        RouterError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether discovery may skip the offending file and keep scanning.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RouterError::ModuleLoad { .. } | RouterError::Io { .. })
    }
}

pub type Result<T, E = RouterError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = RouterError::invalid_pattern("/users/:1d", "bad identifier");
        assert_eq!(
            err.to_string(),
            "invalid route pattern `/users/:1d`: bad identifier"
        );

        let err = RouterError::DuplicateRoute {
            method: "GET".into(),
            path: "/about".into(),
        };
        assert_eq!(err.to_string(), "route GET /about is already registered");
    }

    #[test]
    fn test_recoverable_classification() {
        let load = RouterError::ModuleLoad {
            path: PathBuf::from("pages/broken.page"),
            reason: "boom".into(),
        };
        assert!(load.is_recoverable());
        assert!(!RouterError::invalid_pattern("", "empty").is_recoverable());
    }
}
