//! Tree-sitter Node Type Mappings
//!
//! Declaration node types that produce symbols. Classification uses one fixed
//! allow-list shared by every grammar; the per-language tables document which
//! of those types each grammar actually emits.

use crate::models::language::Language;
use crate::models::symbol::SymbolKind;

/// Free functions and methods, classified uniformly
pub const FUNCTION_NODE_TYPES: &[&str] = &[
    "function_definition",
    "function_declaration",
    "method_declaration",
    "method_definition",
];

pub const CLASS_NODE_TYPES: &[&str] = &["class_definition", "class_declaration"];

/// Classify a node type via the allow-list
pub fn classify(node_type: &str) -> Option<SymbolKind> {
    if FUNCTION_NODE_TYPES.contains(&node_type) {
        Some(SymbolKind::Function)
    } else if CLASS_NODE_TYPES.contains(&node_type) {
        Some(SymbolKind::Class)
    } else {
        None
    }
}

/// Node type mapping entry
#[derive(Debug, Clone, Copy)]
pub struct NodeType {
    pub kind: SymbolKind,
    /// Actual tree-sitter node type
    pub node_type: &'static str,
    /// Example syntax
    pub example: &'static str,
}

impl NodeType {
    const fn new(kind: SymbolKind, node_type: &'static str, example: &'static str) -> Self {
        Self {
            kind,
            node_type,
            example,
        }
    }
}

/// Symbol-producing node types for a language
pub fn get_node_types(language: Language) -> &'static [NodeType] {
    match language {
        Language::Python => PYTHON,
        Language::JavaScript | Language::JavaScriptReact => JAVASCRIPT,
        Language::TypeScript | Language::TypeScriptReact => TYPESCRIPT,
        Language::Java => JAVA,
    }
}

/// Format query error with the node types the grammar offers
pub fn format_query_error(language: Language, error: &str) -> String {
    let examples: String = get_node_types(language)
        .iter()
        .map(|n| format!("  ({:<24}) # {}: {}", n.node_type, n.kind, n.example))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Invalid query: {}\n\nSymbol node types for {}:\n{}",
        error,
        language.id(),
        examples
    )
}

// tree-sitter-python/src/node-types.json
const PYTHON: &[NodeType] = &[
    NodeType::new(SymbolKind::Class, "class_definition", "class MyClass:"),
    NodeType::new(SymbolKind::Function, "function_definition", "def my_func():"),
];

// tree-sitter-javascript/src/node-types.json
const JAVASCRIPT: &[NodeType] = &[
    NodeType::new(SymbolKind::Class, "class_declaration", "class MyClass {}"),
    NodeType::new(
        SymbolKind::Function,
        "function_declaration",
        "function myFunc() {}",
    ),
    NodeType::new(SymbolKind::Function, "method_definition", "myMethod() {}"),
];

// tree-sitter-typescript/{typescript,tsx}/src/node-types.json
const TYPESCRIPT: &[NodeType] = &[
    NodeType::new(SymbolKind::Class, "class_declaration", "class MyClass {}"),
    NodeType::new(
        SymbolKind::Function,
        "function_declaration",
        "function myFunc(): void {}",
    ),
    NodeType::new(SymbolKind::Function, "method_definition", "myMethod() {}"),
];

// tree-sitter-java/src/node-types.json
const JAVA: &[NodeType] = &[
    NodeType::new(SymbolKind::Class, "class_declaration", "class MyClass {}"),
    NodeType::new(SymbolKind::Function, "method_declaration", "void m() {}"),
];
