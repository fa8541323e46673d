//! Notification and confirmation surface
//!
//! Everything the orchestrator asks of a user goes through [`Interaction`].
//! Choices that return `None` mean the user dismissed the prompt.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message shown to the user during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

/// One entry of a pick list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickOption {
    pub label: String,
    pub description: String,
}

impl PickOption {
    pub fn new(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
        }
    }
}

/// Input check; `Err` carries the inline message and the prompt repeats
pub type Validator<'a> = &'a (dyn Fn(&str) -> Result<(), String> + Send + Sync);

pub trait Interaction: Send + Sync {
    fn notify(&self, notice: &Notice);

    /// Modal question; returns the index of the chosen option
    fn confirm(&self, message: &str, options: &[&str]) -> Option<usize>;

    fn pick_one(&self, title: &str, options: &[PickOption]) -> Option<usize>;

    /// Returns only input the validator accepted
    fn text_input(&self, prompt: &str, placeholder: &str, validator: Validator<'_>)
    -> Option<String>;

    /// Observation only; never affects control flow
    fn progress(&self, _fraction: f32, _message: &str) {}
}
