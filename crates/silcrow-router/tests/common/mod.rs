//! Shared helpers for the integration tests

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use serde_json::json;
use silcrow_router::{Handler, Layout};

/// Routes `tracing` output through the test harness; safe to call repeatedly
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Handler returning a fixed tag, to tell routes apart
pub fn tagged(tag: &'static str) -> Handler {
    Handler::new(move |_| Ok(json!(tag)))
}

/// Layout recording its name around the content
pub fn named_layout(name: &'static str) -> Layout {
    Layout::new(name, move |content, _| json!({ "layout": name, "content": content }))
}

/// Creates empty files (and their parent directories) under `root`
pub fn write_tree(root: &Path, files: &[&str]) {
    for file in files {
        let path = root.join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, "").unwrap();
    }
}
