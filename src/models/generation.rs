//! Generation pipeline data types

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::language::{Language, LanguageConfig};
use super::story::StoryId;
use super::symbol::Symbol;
use crate::error::{TestGenieError, TestGenieResult};

/// Snapshot of the source buffer a run targets, captured once per run
#[derive(Debug, Clone, Serialize)]
pub struct EditorContext {
    pub file_content: String,
    pub language_id: String,
    pub file_path: PathBuf,
    pub file_name: String,
    pub project_root: PathBuf,
}

impl EditorContext {
    /// Base name without extension, used as the request's file name
    pub fn file_stem(&self) -> &str {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.file_name)
    }
}

/// Earlier generated files carried forward as extra input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContinuationContext {
    pub previous_story_id: StoryId,
    pub previous_test_code: Option<String>,
    pub previous_production_code: Option<String>,
}

impl ContinuationContext {
    pub fn has_code(&self) -> bool {
        self.previous_test_code.is_some() || self.previous_production_code.is_some()
    }
}

/// Story identity attached to requirement-driven requests
#[derive(Debug, Clone, Serialize)]
pub struct StoryRef {
    pub id: StoryId,
    pub title: String,
    pub requirement_count: usize,
}

/// One request to the generation service
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    source_text: String,
    pub language: Language,
    pub test_framework: String,
    pub framework_hints: String,
    pub symbols: Vec<Symbol>,
    pub file_name: Option<String>,
    pub file_path: Option<PathBuf>,
    pub project_root: PathBuf,
    pub story: Option<StoryRef>,
    pub continuation: Option<ContinuationContext>,
}

impl GenerationRequest {
    /// Build a request; empty source or requirements text is rejected
    pub fn new(
        source_text: impl Into<String>,
        config: &LanguageConfig,
        project_root: impl Into<PathBuf>,
    ) -> TestGenieResult<Self> {
        let source_text = source_text.into();
        if source_text.trim().is_empty() {
            return Err(TestGenieError::Precondition(
                "Refusing to generate from empty source".to_string(),
            ));
        }
        Ok(Self {
            source_text,
            language: config.language,
            test_framework: config.test_framework.to_string(),
            framework_hints: config.framework_hints.to_string(),
            symbols: Vec::new(),
            file_name: None,
            file_path: None,
            project_root: project_root.into(),
            story: None,
            continuation: None,
        })
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn with_framework(mut self, framework: impl Into<String>, hints: impl Into<String>) -> Self {
        self.test_framework = framework.into();
        self.framework_hints = hints.into();
        self
    }

    pub fn with_symbols(mut self, symbols: Vec<Symbol>) -> Self {
        self.symbols = symbols;
        self
    }

    pub fn with_source_file(mut self, context: &EditorContext) -> Self {
        self.file_name = Some(context.file_stem().to_string());
        self.file_path = Some(context.file_path.clone());
        self
    }

    pub fn with_story(mut self, story: StoryRef) -> Self {
        self.story = Some(story);
        self
    }

    pub fn with_continuation(mut self, continuation: Option<ContinuationContext>) -> Self {
        self.continuation = continuation;
        self
    }

    /// Wire body for the generation service
    pub fn to_body(&self, api_key: Option<&str>) -> GenerateRequestBody {
        GenerateRequestBody {
            source: self.source_text.clone(),
            language: self.language,
            test_framework: self.test_framework.clone(),
            framework_hints: self.framework_hints.clone(),
            symbols: self.symbols.clone(),
            filename: self.file_name.clone(),
            file_path: self
                .file_path
                .as_ref()
                .map(|p| p.display().to_string()),
            project_root: self.project_root.display().to_string(),
            story_id: self.story.as_ref().map(|s| s.id.to_string()),
            story_title: self.story.as_ref().map(|s| s.title.clone()),
            previous_story_id: self
                .continuation
                .as_ref()
                .map(|c| c.previous_story_id.to_string()),
            previous_test_code: self
                .continuation
                .as_ref()
                .and_then(|c| c.previous_test_code.clone()),
            previous_production_code: self
                .continuation
                .as_ref()
                .and_then(|c| c.previous_production_code.clone()),
            api_key: api_key.map(str::to_string),
        }
    }
}

/// JSON request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequestBody {
    pub source: String,
    pub language: Language,
    pub test_framework: String,
    pub framework_hints: String,
    #[serde(default)]
    pub symbols: Vec<Symbol>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    pub project_root: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_title: Option<String>,
    pub previous_story_id: Option<String>,
    pub previous_test_code: Option<String>,
    pub previous_production_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// JSON success body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationResponse {
    #[serde(alias = "content")]
    pub test_code: String,
    #[serde(default)]
    pub production_code: Option<String>,
    #[serde(default)]
    pub test_filename: Option<String>,
    #[serde(default)]
    pub production_filename: Option<String>,
    #[serde(default)]
    pub requirement_count: Option<usize>,
    #[serde(default)]
    pub title: Option<String>,
}

/// JSON error body
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub detail: Option<String>,
}

/// Generated content bound to its output paths, consumed once by the writer
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub test_file_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production_file_path: Option<PathBuf>,
    #[serde(skip)]
    pub test_code: String,
    #[serde(skip)]
    pub production_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_title: Option<String>,
}

/// Conflict gate answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictChoice {
    Overwrite,
    Cancel,
}

/// Decision record for one existing output path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileConflict {
    pub path: PathBuf,
    pub existed: bool,
    pub choice: ConflictChoice,
}

impl FileConflict {
    pub fn allows_overwrite_of(&self, path: &Path) -> bool {
        self.existed && self.choice == ConflictChoice::Overwrite && self.path == path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> EditorContext {
        EditorContext {
            file_content: "def add(a, b): return a + b".to_string(),
            language_id: "python".to_string(),
            file_path: PathBuf::from("/proj/src/utils.py"),
            file_name: "utils.py".to_string(),
            project_root: PathBuf::from("/proj"),
        }
    }

    #[test]
    fn test_empty_source_rejected() {
        let err = GenerationRequest::new("  \n", Language::Python.config(), "/proj").unwrap_err();
        assert!(matches!(err, TestGenieError::Precondition(_)));
    }

    #[test]
    fn test_request_body() {
        let ctx = context();
        let request = GenerationRequest::new(&ctx.file_content, Language::Python.config(), "/proj")
            .unwrap()
            .with_source_file(&ctx)
            .with_symbols(vec![Symbol::function("add")]);

        let body = serde_json::to_value(request.to_body(Some("sk-test"))).unwrap();
        assert_eq!(body["language"], "python");
        assert_eq!(body["filename"], "utils");
        assert_eq!(body["test_framework"], "pytest");
        assert_eq!(body["symbols"][0]["name"], "add");
        assert_eq!(body["api_key"], "sk-test");
        assert!(body["previous_story_id"].is_null());
        assert!(body.get("story_id").is_none());
    }

    #[test]
    fn test_request_body_with_continuation() {
        let request = GenerationRequest::new("## Requirements", Language::Java.config(), "/proj")
            .unwrap()
            .with_continuation(Some(ContinuationContext {
                previous_story_id: "PROJ-8".parse().unwrap(),
                previous_test_code: Some("class T {}".to_string()),
                previous_production_code: None,
            }));
        let body = request.to_body(None);
        assert_eq!(body.previous_story_id.as_deref(), Some("PROJ-8"));
        assert_eq!(body.previous_test_code.as_deref(), Some("class T {}"));
        assert!(body.api_key.is_none());
    }

    #[test]
    fn test_response_optional_fields() {
        let response: GenerationResponse =
            serde_json::from_str(r#"{"test_code": "def test_x(): pass"}"#).unwrap();
        assert_eq!(response.test_code, "def test_x(): pass");
        assert!(response.production_code.is_none());
        assert!(response.requirement_count.is_none());
    }

    #[test]
    fn test_conflict_allows_only_exact_path() {
        let conflict = FileConflict {
            path: PathBuf::from("/proj/a_test.py"),
            existed: true,
            choice: ConflictChoice::Overwrite,
        };
        assert!(conflict.allows_overwrite_of(Path::new("/proj/a_test.py")));
        assert!(!conflict.allows_overwrite_of(Path::new("/proj/b_test.py")));

        let cancelled = FileConflict {
            choice: ConflictChoice::Cancel,
            ..conflict
        };
        assert!(!cancelled.allows_overwrite_of(Path::new("/proj/a_test.py")));
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(context().file_stem(), "utils");
    }
}
