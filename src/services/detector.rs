//! Context Detector
//!
//! Infers the dominant language of a project directory from manifest files,
//! falling back to the extensions of top-level files.

use std::collections::HashSet;
use std::path::Path;

use serde_json::Value;

use crate::models::language::Language;

const PACKAGE_MANIFEST: &str = "package.json";
const JVM_MANIFESTS: &[&str] = &["pom.xml", "build.gradle", "build.gradle.kts"];
const PYTHON_MANIFESTS: &[&str] = &[
    "requirements.txt",
    "pyproject.toml",
    "setup.py",
    "setup.cfg",
    "Pipfile",
];
const TYPESCRIPT_CONFIG: &str = "tsconfig.json";

/// UI libraries that select the React variant of a script language
const UI_LIBRARIES: &[&str] = &["react", "react-dom", "next"];

/// Extension fallback, most diagnostic first
const EXTENSION_PRIORITY: &[(&str, Language)] = &[
    ("py", Language::Python),
    ("tsx", Language::TypeScriptReact),
    ("ts", Language::TypeScript),
    ("jsx", Language::JavaScriptReact),
    ("js", Language::JavaScript),
    ("java", Language::Java),
];

pub trait ContextDetector: Send + Sync {
    /// `None` means "ask the user", never a silent default
    fn detect_project_language(&self, root: &Path) -> Option<Language>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultContextDetector;

impl DefaultContextDetector {
    pub fn new() -> Self {
        Self
    }

    /// Names of regular files directly under `root`
    fn top_level_files(root: &Path) -> HashSet<String> {
        walkdir::WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .collect()
    }

    fn from_package_manifest(root: &Path, files: &HashSet<String>) -> Language {
        let deps = read_package_dependencies(root);
        let has_ui = UI_LIBRARIES.iter().any(|lib| deps.contains(*lib));
        let typed = files.contains(TYPESCRIPT_CONFIG) || deps.contains("typescript");

        match (typed, has_ui) {
            (true, true) => Language::TypeScriptReact,
            (true, false) => Language::TypeScript,
            (false, true) => Language::JavaScriptReact,
            (false, false) => Language::JavaScript,
        }
    }

    fn from_extensions(files: &HashSet<String>) -> Option<Language> {
        EXTENSION_PRIORITY.iter().find_map(|(ext, lang)| {
            files
                .iter()
                .any(|f| {
                    Path::new(f)
                        .extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
                })
                .then_some(*lang)
        })
    }
}

impl ContextDetector for DefaultContextDetector {
    fn detect_project_language(&self, root: &Path) -> Option<Language> {
        if !root.is_dir() {
            tracing::debug!("Not a directory: {}", root.display());
            return None;
        }

        let files = Self::top_level_files(root);

        let detected = if files.contains(PACKAGE_MANIFEST) {
            Some(Self::from_package_manifest(root, &files))
        } else if JVM_MANIFESTS.iter().any(|m| files.contains(*m)) {
            Some(Language::Java)
        } else if PYTHON_MANIFESTS.iter().any(|m| files.contains(*m)) {
            Some(Language::Python)
        } else if files.contains(TYPESCRIPT_CONFIG) {
            Some(Language::TypeScript)
        } else {
            Self::from_extensions(&files)
        };

        tracing::debug!("Detected project language for {}: {:?}", root.display(), detected);
        detected
    }
}

/// Parsed `package.json`, or `None` if absent or malformed
pub(crate) fn read_package_manifest(root: &Path) -> Option<Value> {
    let content = std::fs::read_to_string(root.join(PACKAGE_MANIFEST)).ok()?;
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Ignoring malformed {}: {}", PACKAGE_MANIFEST, e);
            None
        }
    }
}

/// Union of `dependencies` and `devDependencies` keys
pub(crate) fn read_package_dependencies(root: &Path) -> HashSet<String> {
    let Some(manifest) = read_package_manifest(root) else {
        return HashSet::new();
    };

    ["dependencies", "devDependencies"]
        .iter()
        .filter_map(|section| manifest.get(section).and_then(Value::as_object))
        .flat_map(|deps| deps.keys().cloned())
        .collect()
}
