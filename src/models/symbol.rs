//! Symbol model definitions
//!
//! Structural symbols discovered in source text.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Symbol classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    /// Free functions and methods alike
    Function,
    Class,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Class => "class",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named function or class declaration.
///
/// Identity is `(kind, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
}

impl Symbol {
    pub fn new(kind: SymbolKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn function(name: impl Into<String>) -> Self {
        Self::new(SymbolKind::Function, name)
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(SymbolKind::Class, name)
    }

    /// Count symbols of the given kind
    pub fn count_kind(symbols: &[Symbol], kind: SymbolKind) -> usize {
        symbols.iter().filter(|s| s.kind == kind).count()
    }

    /// "2 function(s), 1 class(es)"
    pub fn summary(symbols: &[Symbol]) -> String {
        format!(
            "{} function(s), {} class(es)",
            Self::count_kind(symbols, SymbolKind::Function),
            Self::count_kind(symbols, SymbolKind::Class)
        )
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_kind_and_name() {
        assert_eq!(Symbol::function("run"), Symbol::function("run"));
        assert_ne!(Symbol::function("Run"), Symbol::class("Run"));
    }

    #[test]
    fn test_summary() {
        let symbols = vec![
            Symbol::function("add"),
            Symbol::function("subtract"),
            Symbol::class("Calculator"),
        ];
        assert_eq!(Symbol::summary(&symbols), "2 function(s), 1 class(es)");
        assert_eq!(Symbol::summary(&[]), "0 function(s), 0 class(es)");
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_value(Symbol::class("Calculator")).unwrap();
        assert_eq!(json["kind"], "class");
        assert_eq!(json["name"], "Calculator");
        assert_eq!(Symbol::function("add").to_string(), "function:add");
    }
}
