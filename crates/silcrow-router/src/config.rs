// File: src/config.rs
// Purpose: Router configuration parsed from the `[routing]` and `[discovery]` tables

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Router configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RouterConfig {
    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

/// What to do when a (method, path) pair is registered twice
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Last registration wins
    #[default]
    Replace,
    /// Fail with `RouterError::DuplicateRoute`
    Reject,
}

/// Which request methods a route accepts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MethodMatching {
    /// Request method must equal the declared method
    #[default]
    Strict,
    /// Legacy: a GET request also matches routes declared for any method
    GetMatchesAny,
}

/// Route table configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutingConfig {
    /// Mount prefix prepended to every route (e.g. "/app")
    #[serde(default)]
    pub prefix: String,

    /// Reserved first segment marking API routes (default: "api")
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    #[serde(default)]
    pub duplicates: DuplicatePolicy,

    #[serde(default)]
    pub method_matching: MethodMatching,
}

/// File-tree discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscoveryConfig {
    /// Directory containing page files (default: "pages")
    #[serde(default = "default_pages_dir")]
    pub pages_dir: String,

    /// File stem mapped to its directory's own path (default: "index")
    #[serde(default = "default_index_name")]
    pub index_name: String,

    /// File stem declaring a directory layout (default: "_layout")
    #[serde(default = "default_layout_name")]
    pub layout_name: String,

    /// Page file extensions to consider; empty accepts any extension
    #[serde(default)]
    pub extensions: Vec<String>,
}

fn default_api_prefix() -> String {
    "api".to_string()
}

fn default_pages_dir() -> String {
    "pages".to_string()
}

fn default_index_name() -> String {
    "index".to_string()
}

fn default_layout_name() -> String {
    "_layout".to_string()
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            api_prefix: default_api_prefix(),
            duplicates: DuplicatePolicy::default(),
            method_matching: MethodMatching::default(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            pages_dir: default_pages_dir(),
            index_name: default_index_name(),
            layout_name: default_layout_name(),
            extensions: Vec::new(),
        }
    }
}

impl RoutingConfig {
    /// Builder: reject duplicate registrations instead of replacing
    pub fn reject_duplicates(mut self) -> Self {
        self.duplicates = DuplicatePolicy::Reject;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_method_matching(mut self, method_matching: MethodMatching) -> Self {
        self.method_matching = method_matching;
        self
    }
}

impl DiscoveryConfig {
    /// Whether a page file with this extension takes part in discovery
    pub fn accepts_extension(&self, extension: Option<&str>) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        extension.is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }
}

impl RouterConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read router config: {:?}", path))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse router config: {:?}", path))
    }

    /// Load configuration from a TOML file, falling back to defaults if it is missing
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RouterConfig::default();
        assert_eq!(config.routing.api_prefix, "api");
        assert_eq!(config.routing.duplicates, DuplicatePolicy::Replace);
        assert_eq!(config.routing.method_matching, MethodMatching::Strict);
        assert_eq!(config.discovery.pages_dir, "pages");
        assert_eq!(config.discovery.index_name, "index");
        assert_eq!(config.discovery.layout_name, "_layout");
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = RouterConfig::from_toml_str(
            r#"
            [routing]
            prefix = "/app"
            duplicates = "reject"
            method_matching = "get_matches_any"

            [discovery]
            extensions = ["page"]
            "#,
        )
        .unwrap();

        assert_eq!(config.routing.prefix, "/app");
        assert_eq!(config.routing.api_prefix, "api");
        assert_eq!(config.routing.duplicates, DuplicatePolicy::Reject);
        assert_eq!(config.routing.method_matching, MethodMatching::GetMatchesAny);
        assert_eq!(config.discovery.pages_dir, "pages");
        assert!(config.discovery.accepts_extension(Some("page")));
        assert!(!config.discovery.accepts_extension(Some("md")));
        assert!(!config.discovery.accepts_extension(None));
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(RouterConfig::from_toml_str("").unwrap(), RouterConfig::default());
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let err = RouterConfig::from_toml_str("[routing]\nduplicates = \"sometimes\"");
        assert!(err.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[discovery]\npages_dir = \"app/pages\"").unwrap();

        let config = RouterConfig::load(file.path()).unwrap();
        assert_eq!(config.discovery.pages_dir, "app/pages");

        let missing = file.path().with_extension("missing");
        assert!(RouterConfig::load(&missing).is_err());
        assert_eq!(RouterConfig::load_or_default(&missing).unwrap(), RouterConfig::default());
    }
}
