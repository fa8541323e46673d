//! JSON output envelope for CLI commands

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::TestGenieError;

/// Every command prints exactly one JSON document to stdout.
#[derive(Debug, Clone)]
pub struct OutputContext {
    /// Project root for relative path calculation
    root: PathBuf,
}

impl OutputContext {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relative to the project root when inside it, absolute otherwise
    pub fn relative_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| path.display().to_string())
    }

    /// Print a successful response with data fields at top level
    pub fn print_success_flat<T: Serialize>(&self, data: T) {
        print_json(&success_envelope(data));
    }

    pub fn print_error(&self, message: &str) {
        print_json(&error_envelope(message, None));
    }
}

pub fn success_envelope<T: Serialize>(data: T) -> serde_json::Value {
    let mut response = serde_json::to_value(data).unwrap_or(serde_json::json!({}));
    match response.as_object_mut() {
        Some(obj) => {
            obj.insert("success".to_string(), serde_json::json!(true));
            response
        }
        None => serde_json::json!({ "success": true, "data": response }),
    }
}

pub fn error_envelope(message: &str, category: Option<&str>) -> serde_json::Value {
    let mut response = serde_json::json!({
        "success": false,
        "error": message
    });
    if let (Some(category), Some(obj)) = (category, response.as_object_mut()) {
        obj.insert("category".to_string(), serde_json::json!(category));
    }
    response
}

/// Envelope for a top-level failure, categorized when it is a library error
pub fn failure_envelope(err: &anyhow::Error) -> serde_json::Value {
    let category = err.downcast_ref::<TestGenieError>().map(|e| e.category());
    error_envelope(&err.to_string(), category)
}

pub fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Failed to serialize output: {e}"),
    }
}
