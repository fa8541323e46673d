//! Error types for testgenie

use std::path::PathBuf;

use thiserror::Error;

pub type TestGenieResult<T> = std::result::Result<T, TestGenieError>;

#[derive(Debug, Error)]
pub enum TestGenieError {
    /// No active source, no workspace, missing credentials, run already in flight
    #[error("{0}")]
    Precondition(String),

    #[error("{0}")]
    Validation(String),

    #[error("Language \"{language}\" is not supported yet. Supported: {}.", .supported.join(", "))]
    UnsupportedLanguage {
        language: String,
        supported: Vec<&'static str>,
    },

    #[error("{0}")]
    Remote(#[from] RemoteError),

    #[error("{0}")]
    Write(#[from] WriteError),

    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TestGenieError {
    pub fn unsupported_language(language: impl Into<String>) -> Self {
        Self::UnsupportedLanguage {
            language: language.into(),
            supported: crate::models::language::supported_ids(),
        }
    }

    /// Short machine-readable category
    pub fn category(&self) -> &'static str {
        match self {
            Self::Precondition(_) => "precondition",
            Self::Validation(_) => "validation",
            Self::UnsupportedLanguage { .. } => "unsupported_language",
            Self::Remote(_) => "remote",
            Self::Write(_) | Self::Io(_) => "io",
            Self::Parse(_) => "parse",
            Self::Config(_) => "config",
        }
    }
}

#[derive(Debug, Error)]
pub enum RemoteError {
    /// Non-success response; `detail` is the service's message, verbatim
    #[error("{detail}")]
    Service { status: u16, detail: String },

    #[error("Generation service timed out after {0}s")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response from {service}: {message}")]
    InvalidResponse {
        service: &'static str,
        message: String,
    },

    #[error("{0}")]
    Tracker(String),
}

impl RemoteError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Service { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No parent directory for {0}")]
    NoParent(PathBuf),
}

impl WriteError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Io { path, .. } | Self::NoParent(path) => path,
        }
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to load grammar {grammar}: {message}")]
    Grammar {
        grammar: &'static str,
        message: String,
    },

    #[error("Parser produced no tree")]
    NoTree,

    #[error("Parser lock poisoned")]
    LockPoisoned,

    #[error("Invalid symbol query for {language}: {message}")]
    InvalidQuery { language: String, message: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Config already exists: {}. Use --force to overwrite.", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Editor '{editor}' failed: {message}")]
    Editor { editor: String, message: String },

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_language_lists_supported_set() {
        let err = TestGenieError::unsupported_language("cobol");
        let msg = err.to_string();
        assert!(msg.contains("\"cobol\""));
        assert!(msg.contains("python, javascript, javascriptreact"));
        assert_eq!(err.category(), "unsupported_language");
    }

    #[test]
    fn test_remote_detail_is_verbatim() {
        let err: TestGenieError = RemoteError::Service {
            status: 429,
            detail: "rate limited".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "rate limited");
        assert_eq!(err.category(), "remote");
    }

    #[test]
    fn test_write_error_keeps_path() {
        let err = WriteError::io(
            "/proj/a_test.py",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.path(), std::path::Path::new("/proj/a_test.py"));
        assert!(err.to_string().contains("/proj/a_test.py"));
    }

    #[test]
    fn test_remote_status() {
        assert_eq!(
            RemoteError::Service {
                status: 500,
                detail: "boom".to_string()
            }
            .status(),
            Some(500)
        );
        assert_eq!(RemoteError::Timeout(5).status(), None);
    }
}
