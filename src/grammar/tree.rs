//! ASTTreeBuilder: syntax tree -> renderable hierarchy
//!
//! Depth-first structural copy of the arena into nested `TreeLayoutNode`s,
//! the `{ label, tag, children }` shape a generic tree renderer consumes.
//! Children keep their original order.
//!
//! The parser is trusted for nothing structural: a node reachable from
//! itself is reported as `CyclicTree`, nesting beyond the configured limit
//! as `TreeTooDeep`, and a link to a missing node as `MissingNode`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ast::{Ast, AstNodeId};

pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Renderer-facing tree node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeLayoutNode {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default)]
    pub children: Vec<TreeLayoutNode>,
}

impl TreeLayoutNode {
    pub fn leaf(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            tag: None,
            children: Vec::new(),
        }
    }

    /// Total nodes including this one
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TreeLayoutNode::node_count).sum::<usize>()
    }

    /// Levels including this one
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(TreeLayoutNode::depth).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("syntax tree is deeper than {limit} levels")]
    TreeTooDeep { limit: usize },
    #[error("syntax tree contains a cycle through node {0}")]
    CyclicTree(AstNodeId),
    #[error("syntax tree refers to missing node {0}")]
    MissingNode(AstNodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeBuilder {
    max_depth: usize,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl TreeBuilder {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn build(&self, ast: &Ast) -> Result<TreeLayoutNode, TreeError> {
        // Nodes on the current root-to-node path
        let mut on_path = vec![false; ast.len()];
        self.visit(ast, ast.root(), 1, &mut on_path)
    }

    fn visit(
        &self,
        ast: &Ast,
        id: AstNodeId,
        depth: usize,
        on_path: &mut [bool],
    ) -> Result<TreeLayoutNode, TreeError> {
        let node = ast.node(id).ok_or(TreeError::MissingNode(id))?;
        if on_path[id.0] {
            return Err(TreeError::CyclicTree(id));
        }
        if depth > self.max_depth {
            return Err(TreeError::TreeTooDeep {
                limit: self.max_depth,
            });
        }

        on_path[id.0] = true;
        let children = node
            .children
            .iter()
            .map(|&child| self.visit(ast, child, depth + 1, on_path))
            .collect::<Result<Vec<_>, _>>()?;
        on_path[id.0] = false;

        Ok(TreeLayoutNode {
            label: node.label.clone(),
            tag: node.tag.clone(),
            children,
        })
    }
}
