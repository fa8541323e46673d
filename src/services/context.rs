//! Editor context capture and workspace root resolution

use std::path::{Path, PathBuf};

use crate::error::{TestGenieError, TestGenieResult};
use crate::models::generation::EditorContext;
use crate::models::language::Language;

/// Nearest ancestor holding a `.git` directory, else `start` itself
pub fn find_project_root(start: &Path) -> PathBuf {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .unwrap_or(start)
        .to_path_buf()
}

/// Exactly one root directory for a run
pub fn resolve_workspace_root(explicit: Option<&Path>) -> TestGenieResult<PathBuf> {
    let root = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let cwd = std::env::current_dir().map_err(|e| {
                TestGenieError::Precondition(format!("No workspace folder available: {}", e))
            })?;
            find_project_root(&cwd)
        }
    };

    if !root.is_dir() {
        return Err(TestGenieError::Precondition(format!(
            "Please open a workspace folder first ({} is not a directory).",
            root.display()
        )));
    }

    Ok(root.canonicalize().unwrap_or(root))
}

/// Snapshot a saved source file for one run
pub fn capture_editor_context(
    file: &Path,
    explicit_root: Option<&Path>,
    language_id: Option<&str>,
) -> TestGenieResult<EditorContext> {
    if !file.is_file() {
        return Err(TestGenieError::Precondition(format!(
            "No source file found at {}. Please open a saved file first.",
            file.display()
        )));
    }

    let file_path = file.canonicalize()?;
    let bytes = std::fs::read(&file_path)?;
    let file_content = String::from_utf8(bytes).map_err(|_| {
        TestGenieError::Precondition(format!("{} is not valid UTF-8 text.", file.display()))
    })?;

    if file_content.trim().is_empty() {
        return Err(TestGenieError::Precondition(format!(
            "{} is empty; nothing to generate tests for.",
            file.display()
        )));
    }

    let language_id = match language_id {
        Some(id) => id.to_string(),
        None => editor_language_id(&file_path),
    };

    let file_dir = file_path.parent().unwrap_or(Path::new("/"));
    let project_root = match explicit_root {
        Some(root) => resolve_workspace_root(Some(root))?,
        None => find_project_root(file_dir),
    };

    let file_name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    tracing::debug!(
        "Captured {} ({}) under {}",
        file_name,
        language_id,
        project_root.display()
    );

    Ok(EditorContext {
        file_content,
        language_id,
        file_path,
        file_name,
        project_root,
    })
}

/// Registry id for known extensions, the bare extension otherwise
fn editor_language_id(path: &Path) -> String {
    match Language::from_path(path) {
        Some(lang) => lang.id().to_string(),
        None => path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_else(|| "plaintext".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_capture_context() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join(".git")).unwrap();
        let src = temp.path().join("src");
        std::fs::create_dir(&src).unwrap();
        let file = src.join("utils.py");
        std::fs::write(&file, "def add(a, b):\n    return a + b\n").unwrap();

        let ctx = capture_editor_context(&file, None, None).unwrap();
        assert_eq!(ctx.language_id, "python");
        assert_eq!(ctx.file_name, "utils.py");
        assert_eq!(ctx.file_stem(), "utils");
        assert_eq!(ctx.project_root, temp.path().canonicalize().unwrap());
    }

    #[test]
    fn test_root_falls_back_to_file_directory() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("Calc.java");
        std::fs::write(&file, "class Calc {}").unwrap();

        let ctx = capture_editor_context(&file, None, None).unwrap();
        // tempdirs normally live outside any repository
        if !temp.path().ancestors().any(|d| d.join(".git").exists()) {
            assert_eq!(ctx.project_root, temp.path().canonicalize().unwrap());
        }
        assert_eq!(ctx.language_id, "java");
    }

    #[test]
    fn test_explicit_language_and_unknown_extension() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("script.rb");
        std::fs::write(&file, "puts 1").unwrap();

        let ctx = capture_editor_context(&file, Some(temp.path()), None).unwrap();
        assert_eq!(ctx.language_id, "rb");

        let ctx = capture_editor_context(&file, Some(temp.path()), Some("python")).unwrap();
        assert_eq!(ctx.language_id, "python");
    }

    #[test]
    fn test_missing_or_empty_source_is_precondition() {
        let temp = TempDir::new().unwrap();
        let missing = capture_editor_context(&temp.path().join("nope.py"), None, None);
        assert!(matches!(missing, Err(TestGenieError::Precondition(_))));

        let blank = temp.path().join("blank.py");
        std::fs::write(&blank, "  \n\t\n").unwrap();
        assert!(matches!(
            capture_editor_context(&blank, None, None),
            Err(TestGenieError::Precondition(_))
        ));

        let binary = temp.path().join("data.py");
        std::fs::write(&binary, [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(
            capture_editor_context(&binary, None, None),
            Err(TestGenieError::Precondition(_))
        ));
    }

    #[test]
    fn test_workspace_root_must_be_directory() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.txt");
        std::fs::write(&file, "x").unwrap();

        assert!(resolve_workspace_root(Some(temp.path())).is_ok());
        assert!(matches!(
            resolve_workspace_root(Some(&file)),
            Err(TestGenieError::Precondition(_))
        ));
    }
}
