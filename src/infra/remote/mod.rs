//! Remote services: the test generation backend and the issue tracker

pub mod generation;
pub mod tracker;

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::models::generation::{GenerationRequest, GenerationResponse};
use crate::models::story::{Story, StoryId};

pub use generation::{HttpGenerationClient, strip_code_fences};
pub use tracker::{JiraClient, adf_to_text};

/// One synchronous generation call, never retried
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, request: &GenerationRequest)
    -> Result<GenerationResponse, RemoteError>;
}

#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn fetch_story(&self, id: &StoryId) -> Result<Story, RemoteError>;
}

fn map_send_error(err: reqwest::Error, timeout_secs: u64) -> RemoteError {
    if err.is_timeout() {
        RemoteError::Timeout(timeout_secs)
    } else {
        RemoteError::Network(err.to_string())
    }
}
