//! Language registry
//!
//! Static table of supported source languages. Each entry fully determines the
//! grammar to parse with, the symbol query, the test framework and hints sent
//! with generation requests, and the test-file naming rule.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Supported source languages (editor language ids)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    JavaScriptReact,
    TypeScript,
    TypeScriptReact,
    Java,
}

/// Grammar resource a parser is bound to.
///
/// Several languages may share one grammar; parsers are memoized per grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grammar {
    Python,
    JavaScript,
    TypeScript,
    Tsx,
    Java,
}

impl Grammar {
    pub fn resource_name(&self) -> &'static str {
        match self {
            Self::Python => "tree-sitter-python",
            Self::JavaScript => "tree-sitter-javascript",
            Self::TypeScript => "tree-sitter-typescript",
            Self::Tsx => "tree-sitter-tsx",
            Self::Java => "tree-sitter-java",
        }
    }
}

/// Per-language configuration entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LanguageConfig {
    pub language: Language,
    pub grammar: Grammar,
    /// Tree-sitter query capturing `@fn_name` and `@class_name`
    pub symbol_query: &'static str,
    pub test_framework: &'static str,
    pub framework_hints: &'static str,
    /// Appended after the suffix; may carry a marker such as `.test.js`
    pub test_file_extension: &'static str,
    pub test_file_suffix: &'static str,
    /// Extension for production files generated from stories
    pub production_extension: &'static str,
}

const PYTHON_QUERY: &str = r#"
(function_definition name: (identifier) @fn_name)
(class_definition name: (identifier) @class_name)
"#;

const JAVASCRIPT_QUERY: &str = r#"
(function_declaration name: (identifier) @fn_name)
(method_definition name: (property_identifier) @fn_name)
(class_declaration name: (identifier) @class_name)
"#;

const TYPESCRIPT_QUERY: &str = r#"
(function_declaration name: (identifier) @fn_name)
(method_definition name: (property_identifier) @fn_name)
(class_declaration name: (type_identifier) @class_name)
"#;

const JAVA_QUERY: &str = r#"
(method_declaration name: (identifier) @fn_name)
(class_declaration name: (identifier) @class_name)
"#;

const PYTEST_HINTS: &str = "\
- Prefix all test functions with test_.
- Use pytest.raises() for exception testing.
- Use fixtures for shared setup.";

const JEST_HINTS: &str = "\
- Use describe() blocks to group related tests.
- Use it() or test() for individual cases.
- Use expect() with matchers like .toBe(), .toEqual(), .toThrow().";

const JEST_REACT_HINTS: &str = "\
- Use describe() blocks to group related tests.
- Use it() or test() for individual cases.
- Use expect() with matchers like .toBe(), .toEqual(), .toThrow().
- For React components, use @testing-library/react.
- Use render() to render components, screen.getByText() to query.
- Use fireEvent.click() to simulate user interactions.
- Import { render, screen, fireEvent } from '@testing-library/react'.";

const JUNIT5_HINTS: &str = "\
- Annotate test methods with @Test.
- Use @BeforeEach for setup and @AfterEach for teardown.
- Use Assertions.assertEquals(), assertThrows(), assertNotNull().";

impl LanguageConfig {
    pub const PYTHON: Self = Self {
        language: Language::Python,
        grammar: Grammar::Python,
        symbol_query: PYTHON_QUERY,
        test_framework: "pytest",
        framework_hints: PYTEST_HINTS,
        test_file_extension: ".py",
        test_file_suffix: "_test",
        production_extension: ".py",
    };

    pub const JAVASCRIPT: Self = Self {
        language: Language::JavaScript,
        grammar: Grammar::JavaScript,
        symbol_query: JAVASCRIPT_QUERY,
        test_framework: "Jest",
        framework_hints: JEST_HINTS,
        test_file_extension: ".test.js",
        test_file_suffix: "",
        production_extension: ".js",
    };

    pub const JAVASCRIPT_REACT: Self = Self {
        language: Language::JavaScriptReact,
        grammar: Grammar::JavaScript,
        symbol_query: JAVASCRIPT_QUERY,
        test_framework: "Jest + React Testing Library",
        framework_hints: JEST_REACT_HINTS,
        test_file_extension: ".test.jsx",
        test_file_suffix: "",
        production_extension: ".jsx",
    };

    pub const TYPESCRIPT: Self = Self {
        language: Language::TypeScript,
        grammar: Grammar::TypeScript,
        symbol_query: TYPESCRIPT_QUERY,
        test_framework: "Jest",
        framework_hints: JEST_HINTS,
        test_file_extension: ".test.ts",
        test_file_suffix: "",
        production_extension: ".ts",
    };

    pub const TYPESCRIPT_REACT: Self = Self {
        language: Language::TypeScriptReact,
        grammar: Grammar::Tsx,
        symbol_query: TYPESCRIPT_QUERY,
        test_framework: "Jest + React Testing Library",
        framework_hints: JEST_REACT_HINTS,
        test_file_extension: ".test.tsx",
        test_file_suffix: "",
        production_extension: ".tsx",
    };

    pub const JAVA: Self = Self {
        language: Language::Java,
        grammar: Grammar::Java,
        symbol_query: JAVA_QUERY,
        test_framework: "JUnit 5",
        framework_hints: JUNIT5_HINTS,
        test_file_extension: ".java",
        test_file_suffix: "Test",
        production_extension: ".java",
    };
}

impl Language {
    /// Registration order; also the order offered for manual choice
    pub const ALL: [Language; 6] = [
        Self::Python,
        Self::JavaScript,
        Self::JavaScriptReact,
        Self::TypeScript,
        Self::TypeScriptReact,
        Self::Java,
    ];

    pub fn config(&self) -> &'static LanguageConfig {
        match self {
            Self::Python => &LanguageConfig::PYTHON,
            Self::JavaScript => &LanguageConfig::JAVASCRIPT,
            Self::JavaScriptReact => &LanguageConfig::JAVASCRIPT_REACT,
            Self::TypeScript => &LanguageConfig::TYPESCRIPT,
            Self::TypeScriptReact => &LanguageConfig::TYPESCRIPT_REACT,
            Self::Java => &LanguageConfig::JAVA,
        }
    }

    /// Editor language id
    pub fn id(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::JavaScriptReact => "javascriptreact",
            Self::TypeScript => "typescript",
            Self::TypeScriptReact => "typescriptreact",
            Self::Java => "java",
        }
    }

    /// Human-readable label for prompts
    pub fn label(&self) -> &'static str {
        match self {
            Self::Python => "Python",
            Self::JavaScript => "JavaScript",
            Self::JavaScriptReact => "React (JSX)",
            Self::TypeScript => "TypeScript",
            Self::TypeScriptReact => "React (TSX)",
            Self::Java => "Java",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "py" | "pyi" => Some(Self::Python),
            "js" | "mjs" | "cjs" => Some(Self::JavaScript),
            "jsx" => Some(Self::JavaScriptReact),
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            "tsx" => Some(Self::TypeScriptReact),
            "java" => Some(Self::Java),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Look up the configuration for a language id
pub fn get_config(id: &str) -> Option<&'static LanguageConfig> {
    id.parse::<Language>().ok().map(|l| l.config())
}

/// Supported language ids, in registration order
pub fn supported_ids() -> Vec<&'static str> {
    Language::ALL.iter().map(|l| l.id()).collect()
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "python" | "py" => Ok(Self::Python),
            "javascript" | "js" => Ok(Self::JavaScript),
            "javascriptreact" | "jsx" => Ok(Self::JavaScriptReact),
            "typescript" | "ts" => Ok(Self::TypeScript),
            "typescriptreact" | "tsx" => Ok(Self::TypeScriptReact),
            "java" => Ok(Self::Java),
            _ => Err(format!("Unknown language: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_language_has_matching_config() {
        for lang in Language::ALL {
            assert_eq!(lang.config().language, lang);
            assert!(!lang.config().test_framework.is_empty());
            assert!(!lang.config().framework_hints.is_empty());
        }
    }

    #[test]
    fn test_get_config_unknown_is_none() {
        assert!(get_config("cobol").is_none());
        assert!(get_config("").is_none());
        assert_eq!(get_config("python").map(|c| c.test_framework), Some("pytest"));
    }

    #[test]
    fn test_supported_ids_order() {
        assert_eq!(
            supported_ids(),
            vec![
                "python",
                "javascript",
                "javascriptreact",
                "typescript",
                "typescriptreact",
                "java"
            ]
        );
    }

    #[test]
    fn test_id_roundtrip() {
        for lang in Language::ALL {
            assert_eq!(lang.id().parse::<Language>(), Ok(lang));
        }
    }

    #[test]
    fn test_from_extension() {
        assert_eq!(Language::from_extension("PY"), Some(Language::Python));
        assert_eq!(Language::from_extension("jsx"), Some(Language::JavaScriptReact));
        assert_eq!(Language::from_extension("tsx"), Some(Language::TypeScriptReact));
        assert_eq!(Language::from_extension("rs"), None);
        assert_eq!(
            Language::from_path(Path::new("/a/Calc.java")),
            Some(Language::Java)
        );
    }

    #[test]
    fn test_shared_grammar() {
        assert_eq!(
            Language::JavaScript.config().grammar,
            Language::JavaScriptReact.config().grammar
        );
        assert_ne!(
            Language::TypeScript.config().grammar,
            Language::TypeScriptReact.config().grammar
        );
    }

    #[test]
    fn test_serde_ids() {
        let json = serde_json::to_string(&Language::JavaScriptReact).unwrap();
        assert_eq!(json, "\"javascriptreact\"");
        let lang: Language = serde_json::from_str("\"typescriptreact\"").unwrap();
        assert_eq!(lang, Language::TypeScriptReact);
    }
}
