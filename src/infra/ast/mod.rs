//! AST parsing infrastructure for testgenie
//!
//! Tree-sitter parsing into an index-addressed arena tree.

pub mod node_types;
pub mod parser;
pub mod tree;

pub use node_types::{NodeType, classify, format_query_error, get_node_types};
pub use parser::{ParserCache, ts_language};
pub use tree::{NodeId, SyntaxNode, SyntaxTree};
