//! Memoized tree-sitter parsers
//!
//! Binding a parser to a grammar is the expensive step, so each grammar gets
//! exactly one parser, created on first use and reused afterwards.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Mutex;

use tree_sitter::{Language, Parser, Tree};

use super::tree::SyntaxTree;
use crate::error::ParseError;
use crate::models::language::Grammar;

/// tree-sitter language for a grammar resource
pub fn ts_language(grammar: Grammar) -> Language {
    match grammar {
        Grammar::Python => tree_sitter_python::LANGUAGE.into(),
        Grammar::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        Grammar::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        Grammar::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        Grammar::Java => tree_sitter_java::LANGUAGE.into(),
    }
}

#[derive(Default)]
pub struct ParserCache {
    parsers: Mutex<HashMap<Grammar, Parser>>,
}

impl ParserCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn create_parser(grammar: Grammar) -> Result<Parser, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(&ts_language(grammar))
            .map_err(|e| ParseError::Grammar {
                grammar: grammar.resource_name(),
                message: e.to_string(),
            })?;
        tracing::debug!("Initialized parser for {}", grammar.resource_name());
        Ok(parser)
    }

    /// Parse into a raw tree-sitter tree
    pub fn parse_tree(&self, grammar: Grammar, source: &str) -> Result<Tree, ParseError> {
        let mut parsers = self.parsers.lock().map_err(|_| ParseError::LockPoisoned)?;

        let parser = match parsers.entry(grammar) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(Self::create_parser(grammar)?),
        };

        parser.parse(source, None).ok_or(ParseError::NoTree)
    }

    /// Parse into an arena tree
    pub fn parse(&self, grammar: Grammar, source: &str) -> Result<SyntaxTree, ParseError> {
        let tree = self.parse_tree(grammar, source)?;
        Ok(SyntaxTree::from_tree(&tree, source))
    }

    pub fn is_initialized(&self, grammar: Grammar) -> bool {
        self.parsers
            .lock()
            .map(|p| p.contains_key(&grammar))
            .unwrap_or(false)
    }

    pub fn initialized_count(&self) -> usize {
        self.parsers.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_initialization() {
        let cache = ParserCache::new();
        assert_eq!(cache.initialized_count(), 0);
        assert!(!cache.is_initialized(Grammar::Python));

        cache.parse(Grammar::Python, "x = 1\n").unwrap();
        assert!(cache.is_initialized(Grammar::Python));
        assert_eq!(cache.initialized_count(), 1);
    }

    #[test]
    fn test_parser_reused_per_grammar() {
        let cache = ParserCache::new();
        cache.parse(Grammar::JavaScript, "function a() {}").unwrap();
        cache.parse(Grammar::JavaScript, "class B {}").unwrap();
        assert_eq!(cache.initialized_count(), 1);

        cache.parse(Grammar::Java, "class C {}").unwrap();
        assert_eq!(cache.initialized_count(), 2);
    }

    #[test]
    fn test_every_grammar_loads() {
        let cache = ParserCache::new();
        for grammar in [
            Grammar::Python,
            Grammar::JavaScript,
            Grammar::TypeScript,
            Grammar::Tsx,
            Grammar::Java,
        ] {
            assert!(cache.parse(grammar, "").is_ok(), "{:?}", grammar);
        }
        assert_eq!(cache.initialized_count(), 5);
    }
}
