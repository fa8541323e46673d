//! Test framework detection
//!
//! Looks at a project's build and dependency files to find which test
//! framework it already uses, so generated tests match it.

use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use super::detector::read_package_manifest;
use crate::models::language::{Language, LanguageConfig};

pub const PYTEST: &str = "pytest";
pub const UNITTEST: &str = "unittest";
pub const NOSE: &str = "nose";
pub const JEST: &str = "Jest";
pub const VITEST: &str = "Vitest";
pub const MOCHA: &str = "Mocha";
pub const JASMINE: &str = "Jasmine";
pub const JEST_RTL: &str = "Jest + React Testing Library";
pub const JUNIT5: &str = "JUnit 5";
pub const JUNIT4: &str = "JUnit 4";
pub const TESTNG: &str = "TestNG";

const DEFAULT_HINTS: &str = "Write clean, descriptive unit tests.";

const REQUIREMENTS_FILES: &[&str] = &[
    "requirements.txt",
    "requirements-dev.txt",
    "requirements-test.txt",
];
const GRADLE_FILES: &[&str] = &["build.gradle", "build.gradle.kts"];

/// Script runners checked in `package.json` scripts, first match wins
const SCRIPT_RUNNERS: &[(&str, &str)] = &[
    ("vitest", VITEST),
    ("jest", JEST),
    ("mocha", MOCHA),
    ("jasmine", JASMINE),
];

/// Framework and hints a request is built with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestFramework {
    pub name: String,
    pub hints: String,
    /// Found in the project rather than taken from the registry
    pub detected: bool,
}

impl TestFramework {
    /// Registry defaults for a language
    pub fn from_config(config: &LanguageConfig) -> Self {
        Self {
            name: config.test_framework.to_string(),
            hints: config.framework_hints.to_string(),
            detected: false,
        }
    }
}

/// Detected framework, falling back to the registry entry
pub fn resolve_framework(root: &Path, config: &LanguageConfig) -> TestFramework {
    let Some(name) = detect_framework(root, config.language) else {
        return TestFramework::from_config(config);
    };

    let hints = if name == config.test_framework {
        config.framework_hints
    } else {
        framework_hints(name)
    };

    tracing::debug!("Detected test framework {} for {}", name, config.language);
    TestFramework {
        name: name.to_string(),
        hints: hints.to_string(),
        detected: true,
    }
}

/// `None` when the project gives no signal
pub fn detect_framework(root: &Path, language: Language) -> Option<&'static str> {
    match language {
        Language::Python => detect_python(root),
        Language::JavaScript | Language::TypeScript => detect_script(root, false),
        Language::JavaScriptReact | Language::TypeScriptReact => detect_script(root, true),
        Language::Java => detect_jvm(root),
    }
}

/// Prompt guidance for a framework name
pub fn framework_hints(framework: &str) -> &'static str {
    match framework {
        PYTEST => {
            "- Prefix all test functions with test_.\n\
             - Use pytest.raises() for exception testing.\n\
             - Use @pytest.fixture for shared setup.\n\
             - Use parametrize for data-driven tests."
        }
        UNITTEST => {
            "- Extend unittest.TestCase for all test classes.\n\
             - Use self.assertEqual(), self.assertRaises() etc.\n\
             - Use setUp() and tearDown() for setup/teardown."
        }
        JEST => {
            "- Use describe() blocks to group related tests.\n\
             - Use it() or test() for individual cases.\n\
             - Use expect() with matchers like .toBe(), .toEqual(), .toThrow().\n\
             - Use beforeEach/afterEach for setup and teardown."
        }
        VITEST => {
            "- Use describe() blocks to group related tests.\n\
             - Use it() or test() for individual cases.\n\
             - Use expect() with matchers like .toBe(), .toEqual(), .toThrow().\n\
             - Import from 'vitest': import { describe, it, expect } from 'vitest'"
        }
        MOCHA => {
            "- Use describe() and it() blocks.\n\
             - Use assert from Node.js or chai for assertions.\n\
             - Use before/after/beforeEach/afterEach hooks."
        }
        JUNIT5 => {
            "- Annotate test methods with @Test.\n\
             - Use @BeforeEach for setup and @AfterEach for teardown.\n\
             - Use Assertions.assertEquals(), assertThrows(), assertNotNull()."
        }
        JUNIT4 => {
            "- Annotate test methods with @Test.\n\
             - Use @Before for setup and @After for teardown.\n\
             - Use Assert.assertEquals(), Assert.assertNotNull() etc."
        }
        TESTNG => {
            "- Annotate test methods with @Test.\n\
             - Use @BeforeMethod for setup and @AfterMethod for teardown.\n\
             - Use Assert.assertEquals(), Assert.assertTrue() etc."
        }
        JEST_RTL => {
            "- Use describe() and it() blocks.\n\
             - Import { render, screen, fireEvent } from '@testing-library/react'.\n\
             - Use screen.getByText(), getByRole(), getByTestId() to query.\n\
             - Use fireEvent.click() to simulate interactions."
        }
        _ => DEFAULT_HINTS,
    }
}

fn read_lower(path: &Path) -> Option<String> {
    std::fs::read_to_string(path).ok().map(|s| s.to_lowercase())
}

fn detect_python(root: &Path) -> Option<&'static str> {
    if root.join("pytest.ini").is_file() {
        return Some(PYTEST);
    }

    if let Some(content) = read_lower(&root.join("pyproject.toml")) {
        if content.contains("pytest") {
            return Some(PYTEST);
        }
        if content.contains("unittest") {
            return Some(UNITTEST);
        }
    }

    if read_lower(&root.join("setup.cfg")).is_some_and(|c| c.contains("pytest")) {
        return Some(PYTEST);
    }

    REQUIREMENTS_FILES.iter().find_map(|name| {
        let content = read_lower(&root.join(name))?;
        if content.contains("pytest") {
            Some(PYTEST)
        } else if content.contains("nose") {
            Some(NOSE)
        } else {
            None
        }
    })
}

fn detect_script(root: &Path, ui: bool) -> Option<&'static str> {
    let manifest = read_package_manifest(root)?;

    let has_dep = |name: &str| {
        ["dependencies", "devDependencies"].iter().any(|section| {
            manifest
                .get(section)
                .and_then(Value::as_object)
                .is_some_and(|deps| deps.contains_key(name))
        })
    };

    let from_scripts = manifest
        .get("scripts")
        .and_then(Value::as_object)
        .and_then(|scripts| {
            scripts.values().filter_map(Value::as_str).find_map(|script| {
                SCRIPT_RUNNERS
                    .iter()
                    .find(|(needle, _)| script.contains(needle))
                    .map(|(_, framework)| *framework)
            })
        });

    let detected = from_scripts.or_else(|| {
        if has_dep("vitest") {
            Some(VITEST)
        } else if has_dep("jest") || has_dep("@jest/core") {
            Some(JEST)
        } else if has_dep("mocha") {
            Some(MOCHA)
        } else if has_dep("jasmine") {
            Some(JASMINE)
        } else if has_dep("@testing-library/react") {
            Some(JEST_RTL)
        } else if manifest.get("jest").is_some() {
            Some(JEST)
        } else {
            None
        }
    });

    match detected {
        Some(JEST) if ui && has_dep("@testing-library/react") => Some(JEST_RTL),
        other => other,
    }
}

fn jvm_framework(content: &str, jupiter_markers: &[&str]) -> Option<&'static str> {
    if content.contains("junit") {
        if jupiter_markers.iter().any(|m| content.contains(m)) {
            Some(JUNIT5)
        } else {
            Some(JUNIT4)
        }
    } else if content.contains("testng") {
        Some(TESTNG)
    } else {
        None
    }
}

fn detect_jvm(root: &Path) -> Option<&'static str> {
    if let Some(found) = read_lower(&root.join("pom.xml"))
        .and_then(|c| jvm_framework(&c, &["junit-jupiter", "junit.jupiter"]))
    {
        return Some(found);
    }

    GRADLE_FILES.iter().find_map(|name| {
        read_lower(&root.join(name)).and_then(|c| jvm_framework(&c, &["junit-jupiter", "junit5"]))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project(files: &[(&str, &str)]) -> TempDir {
        let temp = TempDir::new().unwrap();
        for (name, content) in files {
            std::fs::write(temp.path().join(name), content).unwrap();
        }
        temp
    }

    #[test]
    fn test_python_detection() {
        let temp = project(&[("pytest.ini", "[pytest]")]);
        assert_eq!(detect_framework(temp.path(), Language::Python), Some(PYTEST));

        let temp = project(&[("pyproject.toml", "# uses unittest discovery")]);
        assert_eq!(detect_framework(temp.path(), Language::Python), Some(UNITTEST));

        let temp = project(&[("requirements-dev.txt", "Nose==1.3\n")]);
        assert_eq!(detect_framework(temp.path(), Language::Python), Some(NOSE));

        let temp = project(&[]);
        assert_eq!(detect_framework(temp.path(), Language::Python), None);
    }

    #[test]
    fn test_script_detection_prefers_scripts() {
        let temp = project(&[(
            "package.json",
            r#"{"scripts": {"test": "vitest run"}, "devDependencies": {"jest": "29"}}"#,
        )]);
        assert_eq!(detect_framework(temp.path(), Language::JavaScript), Some(VITEST));
    }

    #[test]
    fn test_script_detection_from_dependencies() {
        let temp = project(&[("package.json", r#"{"devDependencies": {"mocha": "10"}}"#)]);
        assert_eq!(detect_framework(temp.path(), Language::TypeScript), Some(MOCHA));

        let temp = project(&[("package.json", r#"{"jest": {"verbose": true}}"#)]);
        assert_eq!(detect_framework(temp.path(), Language::JavaScript), Some(JEST));
    }

    #[test]
    fn test_react_variant_keeps_testing_library() {
        let manifest = r#"{"devDependencies": {"jest": "29", "@testing-library/react": "14"}}"#;
        let temp = project(&[("package.json", manifest)]);
        assert_eq!(
            detect_framework(temp.path(), Language::JavaScriptReact),
            Some(JEST_RTL)
        );
        assert_eq!(detect_framework(temp.path(), Language::JavaScript), Some(JEST));
    }

    #[test]
    fn test_malformed_manifest_gives_no_signal() {
        let temp = project(&[("package.json", "{")]);
        assert_eq!(detect_framework(temp.path(), Language::JavaScript), None);
    }

    #[test]
    fn test_jvm_detection() {
        let temp = project(&[(
            "pom.xml",
            "<artifactId>junit-jupiter</artifactId>",
        )]);
        assert_eq!(detect_framework(temp.path(), Language::Java), Some(JUNIT5));

        let temp = project(&[("build.gradle", "testImplementation 'junit:junit:4.13'")]);
        assert_eq!(detect_framework(temp.path(), Language::Java), Some(JUNIT4));

        let temp = project(&[("build.gradle.kts", "testImplementation(\"org.testng:testng\")")]);
        assert_eq!(detect_framework(temp.path(), Language::Java), Some(TESTNG));
    }

    #[test]
    fn test_resolve_falls_back_to_registry() {
        let temp = project(&[]);
        let resolved = resolve_framework(temp.path(), Language::Java.config());
        assert_eq!(resolved, TestFramework::from_config(Language::Java.config()));
        assert!(!resolved.detected);
    }

    #[test]
    fn test_resolve_replaces_registry_hints() {
        let temp = project(&[("pyproject.toml", "[tool.unittest]")]);
        let resolved = resolve_framework(temp.path(), Language::Python.config());
        assert_eq!(resolved.name, UNITTEST);
        assert!(resolved.hints.contains("unittest.TestCase"));
        assert!(resolved.detected);
    }

    #[test]
    fn test_unknown_framework_hints() {
        assert_eq!(framework_hints("Jasmine"), DEFAULT_HINTS);
        assert!(framework_hints(JUNIT5).contains("@BeforeEach"));
    }
}
