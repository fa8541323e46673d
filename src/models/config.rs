//! Configuration model for testgenie

use serde::{Deserialize, Serialize};

/// testgenie configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TestGenieConfig {
    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub tracker: TrackerConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Generation service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "defaults::backend_url")]
    pub backend_url: String,

    #[serde(default = "defaults::timeout_secs")]
    pub timeout_secs: u64,

    /// Passed through to the service, never interpreted locally
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            backend_url: defaults::backend_url(),
            timeout_secs: defaults::timeout_secs(),
            api_key: None,
        }
    }
}

impl GenerationConfig {
    pub fn require_api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

/// Issue tracker credentials
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TrackerConfig {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Complete tracker credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerCredentials {
    pub url: String,
    pub email: String,
    pub token: String,
}

impl TrackerConfig {
    /// All three fields present and non-empty
    pub fn credentials(&self) -> Option<TrackerCredentials> {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
        Some(TrackerCredentials {
            url: non_empty(&self.url)?,
            email: non_empty(&self.email)?,
            token: non_empty(&self.token)?,
        })
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "defaults::format")]
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: defaults::format(),
        }
    }
}

mod defaults {
    pub fn backend_url() -> String {
        "http://127.0.0.1:8000".to_string()
    }
    pub fn timeout_secs() -> u64 {
        120
    }
    pub fn format() -> String {
        "json".to_string()
    }
}
