//! Symbol Extractor
//!
//! Turns source text into a deduplicated list of function and class symbols,
//! in the order a pre-order walk of the syntax tree meets them.

use std::collections::HashSet;

use serde::Serialize;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Query, QueryCursor};

use crate::error::{ParseError, TestGenieError, TestGenieResult};
use crate::infra::ast::{ParserCache, SyntaxTree, classify, format_query_error, ts_language};
use crate::models::language::{Language, LanguageConfig};
use crate::models::symbol::{Symbol, SymbolKind};

/// Symbols plus the configuration they were extracted with
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub symbols: Vec<Symbol>,
    #[serde(skip)]
    pub config: &'static LanguageConfig,
    /// Parser recovered from malformed input; symbols are still returned
    pub partial: bool,
}

/// One capture from a language's symbol query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryCapture {
    pub capture: String,
    pub kind: SymbolKind,
    pub name: String,
    /// 1-indexed
    pub line: u32,
}

pub trait SymbolExtractor: Send + Sync {
    fn extract(&self, language_id: &str, source: &str) -> TestGenieResult<Extraction>;
}

/// Extractor owning the memoized parsers
#[derive(Default)]
pub struct DefaultSymbolExtractor {
    parsers: ParserCache,
}

impl DefaultSymbolExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parsers(&self) -> &ParserCache {
        &self.parsers
    }

    fn resolve(language_id: &str) -> TestGenieResult<&'static LanguageConfig> {
        language_id
            .parse::<Language>()
            .map(|l| l.config())
            .map_err(|_| TestGenieError::unsupported_language(language_id))
    }

    /// Walk the tree and collect unseen `(kind, name)` pairs
    pub fn collect_symbols(tree: &SyntaxTree) -> Vec<Symbol> {
        let mut seen = HashSet::new();
        let mut symbols = Vec::new();

        for id in tree.preorder(tree.root()) {
            let Some(kind) = classify(tree.node(id).kind) else {
                continue;
            };
            let Some(name_node) = tree.field_named(id, "name") else {
                continue;
            };

            let symbol = Symbol::new(kind, tree.text(name_node));
            if seen.insert(symbol.clone()) {
                symbols.push(symbol);
            }
        }

        symbols
    }

    /// Run the language's configured symbol query
    pub fn query(&self, language: Language, source: &str) -> TestGenieResult<Vec<QueryCapture>> {
        let config = language.config();
        let query = compile_query(config)?;
        let tree = self.parsers.parse_tree(config.grammar, source)?;

        let capture_names = query.capture_names();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, tree.root_node(), source.as_bytes());
        let mut captures = Vec::new();

        while let Some(query_match) = matches.next() {
            for capture in query_match.captures {
                let capture_name = capture_names
                    .get(capture.index as usize)
                    .copied()
                    .unwrap_or("match");
                let kind = if capture_name == "class_name" {
                    SymbolKind::Class
                } else {
                    SymbolKind::Function
                };
                let node = capture.node;
                captures.push(QueryCapture {
                    capture: capture_name.to_string(),
                    kind,
                    name: source[node.start_byte()..node.end_byte()].to_string(),
                    line: node.start_position().row as u32 + 1,
                });
            }
        }

        Ok(captures)
    }
}

/// Compile a config's symbol query against its grammar
pub fn compile_query(config: &LanguageConfig) -> TestGenieResult<Query> {
    Query::new(&ts_language(config.grammar), config.symbol_query).map_err(|e| {
        ParseError::InvalidQuery {
            language: config.language.id().to_string(),
            message: format_query_error(config.language, &e.to_string()),
        }
        .into()
    })
}

impl SymbolExtractor for DefaultSymbolExtractor {
    fn extract(&self, language_id: &str, source: &str) -> TestGenieResult<Extraction> {
        let config = Self::resolve(language_id)?;
        let tree = self.parsers.parse(config.grammar, source)?;

        if tree.has_errors() {
            tracing::debug!("{} source parsed with errors", config.language);
        }

        let symbols = Self::collect_symbols(&tree);
        tracing::debug!(
            "Extracted {} symbols from {} source",
            symbols.len(),
            config.language
        );

        Ok(Extraction {
            symbols,
            config,
            partial: tree.has_errors(),
        })
    }
}
