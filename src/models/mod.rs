//! Data models for testgenie
//!
//! Contains core type definitions used throughout the application.

pub mod config;
pub mod generation;
pub mod language;
pub mod story;
pub mod symbol;

// Re-export commonly used types
pub use config::TestGenieConfig;
pub use generation::{
    ConflictChoice, ContinuationContext, EditorContext, FileConflict, GenerationRequest,
    GenerationResponse, GenerationResult,
};
pub use language::{Grammar, Language, LanguageConfig};
pub use story::{Story, StoryId};
pub use symbol::{Symbol, SymbolKind};
