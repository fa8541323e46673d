//! File Writer
//!
//! Output path derivation and collision-safe atomic writes.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::WriteError;
use crate::models::generation::FileConflict;
use crate::models::language::{Language, LanguageConfig};
use crate::models::story::StoryId;

/// Result of one write attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "path", rename_all = "lowercase")]
pub enum WriteOutcome {
    Written(PathBuf),
    /// Path exists and no overwrite was granted for it; nothing was written
    Conflict(PathBuf),
}

impl WriteOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written(_))
    }
}

/// `dir(source) / stem(source) + suffix + extension`
pub fn derive_path(source: &Path, config: &LanguageConfig) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = format!(
        "{}{}{}",
        stem, config.test_file_suffix, config.test_file_extension
    );

    match source.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// `(test, production)` paths for a story, both in the project root
pub fn story_paths(root: &Path, id: &StoryId, language: Language) -> (PathBuf, PathBuf) {
    let (test, production) = id.file_names(language);
    (root.join(test), root.join(production))
}

pub trait FileWriter: Send + Sync {
    /// Persist `content` at `path`. An existing path is only replaced when
    /// `resolution` grants Overwrite for that exact path.
    fn write(
        &self,
        path: &Path,
        content: &str,
        resolution: Option<&FileConflict>,
    ) -> Result<WriteOutcome, WriteError>;
}

/// Writes through a sibling temp file and a rename
#[derive(Debug, Default, Clone, Copy)]
pub struct AtomicFileWriter;

impl AtomicFileWriter {
    pub fn new() -> Self {
        Self
    }

    fn temp_path(path: &Path) -> Result<PathBuf, WriteError> {
        let parent = path
            .parent()
            .ok_or_else(|| WriteError::NoParent(path.to_path_buf()))?;
        let name = path
            .file_name()
            .ok_or_else(|| WriteError::NoParent(path.to_path_buf()))?
            .to_string_lossy();
        Ok(parent.join(format!(".{}.{}.tmp", name, std::process::id())))
    }

    fn stage(temp: &Path, content: &str) -> std::io::Result<()> {
        let mut file = File::create(temp)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()
    }

    /// Publish without ever clobbering: a hard link fails if `path` exists
    fn publish_new(temp: &Path, path: &Path) -> std::io::Result<bool> {
        match fs::hard_link(temp, path) {
            Ok(()) => {
                // Target is already published; a stale temp file is not a failed write
                Self::discard_temp(temp);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            // Filesystems without hard links
            Err(_) if !path.exists() => fs::rename(temp, path).map(|_| true),
            Err(e) => Err(e),
        }
    }

    fn discard_temp(temp: &Path) {
        if let Err(e) = fs::remove_file(temp) {
            tracing::warn!("Failed to remove {}: {}", temp.display(), e);
        }
    }
}

impl FileWriter for AtomicFileWriter {
    fn write(
        &self,
        path: &Path,
        content: &str,
        resolution: Option<&FileConflict>,
    ) -> Result<WriteOutcome, WriteError> {
        let overwrite = resolution.is_some_and(|r| r.allows_overwrite_of(path));

        if path.exists() && !overwrite {
            tracing::debug!("Refusing to overwrite {}", path.display());
            return Ok(WriteOutcome::Conflict(path.to_path_buf()));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| WriteError::io(parent, e))?;
        }

        let temp = Self::temp_path(path)?;
        Self::stage(&temp, content).map_err(|e| {
            let _ = fs::remove_file(&temp);
            WriteError::io(path, e)
        })?;

        let published = if overwrite {
            fs::rename(&temp, path).map(|_| true)
        } else {
            Self::publish_new(&temp, path)
        };

        match published {
            Ok(true) => {
                tracing::info!("Wrote {}", path.display());
                Ok(WriteOutcome::Written(path.to_path_buf()))
            }
            Ok(false) => {
                let _ = fs::remove_file(&temp);
                tracing::debug!("{} appeared before publish", path.display());
                Ok(WriteOutcome::Conflict(path.to_path_buf()))
            }
            Err(e) => {
                let _ = fs::remove_file(&temp);
                Err(WriteError::io(path, e))
            }
        }
    }
}
