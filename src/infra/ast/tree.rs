//! Arena syntax tree
//!
//! Copies a tree-sitter tree into a flat vector of nodes addressed by index.
//! Nodes are stored in pre-order, so the parent of any node has a smaller id.

use tree_sitter::{Tree, TreeCursor};

/// Index of a node in its [`SyntaxTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct SyntaxNode {
    pub kind: &'static str,
    pub named: bool,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Child occupying the grammar's `name` field
    pub name_field: Option<NodeId>,
    pub start_byte: usize,
    pub end_byte: usize,
    /// 0-indexed row of the first byte
    pub start_row: usize,
}

#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<SyntaxNode>,
    source: String,
    has_errors: bool,
}

impl SyntaxTree {
    /// Flatten a parsed tree. `source` must be the text it was parsed from.
    pub fn from_tree(tree: &Tree, source: &str) -> Self {
        let mut builder = Builder {
            nodes: Vec::new(),
        };
        let mut cursor = tree.walk();
        builder.push(&cursor, None);
        builder.walk(&mut cursor);

        Self {
            nodes: builder.nodes,
            source: source.to_string(),
            has_errors: tree.root_node().has_error(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id.0]
    }

    /// Whether the parser had to recover from malformed input
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    pub fn text(&self, id: NodeId) -> &str {
        let node = self.node(id);
        self.source
            .get(node.start_byte..node.end_byte)
            .unwrap_or_default()
    }

    pub fn field_named(&self, id: NodeId, field: &str) -> Option<NodeId> {
        match field {
            "name" => self.node(id).name_field,
            _ => None,
        }
    }

    /// Depth-first, pre-order traversal from `start`
    pub fn preorder(&self, start: NodeId) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![start],
        }
    }
}

pub struct Preorder<'a> {
    tree: &'a SyntaxTree,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.node(id).children.iter().rev().copied());
        Some(id)
    }
}

struct Builder {
    nodes: Vec<SyntaxNode>,
}

impl Builder {
    fn push(&mut self, cursor: &TreeCursor<'_>, parent: Option<NodeId>) -> NodeId {
        let node = cursor.node();
        let id = NodeId(self.nodes.len());

        self.nodes.push(SyntaxNode {
            kind: node.kind(),
            named: node.is_named(),
            parent,
            children: Vec::new(),
            name_field: None,
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start_row: node.start_position().row,
        });

        if let Some(parent) = parent {
            let parent_node = &mut self.nodes[parent.0];
            parent_node.children.push(id);
            if cursor.field_name() == Some("name") && parent_node.name_field.is_none() {
                parent_node.name_field = Some(id);
            }
        }

        id
    }

    fn walk(&mut self, cursor: &mut TreeCursor<'_>) {
        let mut current = NodeId(0);

        loop {
            if cursor.goto_first_child() {
                current = self.push(cursor, Some(current));
                continue;
            }

            loop {
                let Some(parent) = self.nodes[current.0].parent else {
                    return;
                };
                if cursor.goto_next_sibling() {
                    current = self.push(cursor, Some(parent));
                    break;
                }
                if !cursor.goto_parent() {
                    return;
                }
                current = parent;
            }
        }
    }
}
