//! Grammar AST as returned by the parse service
//!
//! The service sends nested `{ name, value, children }` nodes. They are
//! lowered into an arena so that a malformed graph from a misbehaving parser
//! (shared or cyclic children, missing nodes) can be represented and then
//! rejected by the tree builder instead of being trusted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rule name the parser uses for `:tag` annotations
const ENTITY_RULE: &str = "entity";

// =============================================================================
// Wire shape
// =============================================================================

/// One node as serialized by the parser
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AstWireNode {
    /// Rule name (`expression`, `option-list`, `term`, ...)
    #[serde(default)]
    pub name: String,
    /// Matched text for terminals and entity tags, empty otherwise
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default)]
    pub children: Vec<AstWireNode>,
}

impl AstWireNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_children(mut self, children: Vec<AstWireNode>) -> Self {
        self.children = children;
        self
    }

    fn is_entity(&self) -> bool {
        self.name == ENTITY_RULE && !self.value.is_empty()
    }
}

// =============================================================================
// Arena
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AstNodeId(pub usize);

impl fmt::Display for AstNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstNode {
    pub label: String,
    pub tag: Option<String>,
    pub children: Vec<AstNodeId>,
}

impl AstNode {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            tag: None,
            children: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_children(mut self, children: Vec<AstNodeId>) -> Self {
        self.children = children;
        self
    }
}

/// Arena-backed syntax tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ast {
    nodes: Vec<AstNode>,
    root: AstNodeId,
}

impl Ast {
    /// Tree with a single root node
    pub fn new(root: AstNode) -> Self {
        Self {
            nodes: vec![root],
            root: AstNodeId(0),
        }
    }

    /// Arena as-is; links are not checked here
    pub fn from_parts(nodes: Vec<AstNode>, root: AstNodeId) -> Self {
        Self { nodes, root }
    }

    /// Add `node` under `parent`. Returns `None` if `parent` does not exist.
    pub fn add_child(&mut self, parent: AstNodeId, node: AstNode) -> Option<AstNodeId> {
        if parent.0 >= self.nodes.len() {
            return None;
        }
        let id = AstNodeId(self.nodes.len());
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        Some(id)
    }

    pub fn root(&self) -> AstNodeId {
        self.root
    }

    pub fn node(&self, id: AstNodeId) -> Option<&AstNode> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Lower the parser's nested form.
    ///
    /// The label is the node's value when it has one, its rule name
    /// otherwise. An `entity` child becomes the parent's tag.
    pub fn from_wire(root: &AstWireNode) -> Self {
        let mut ast = Self {
            nodes: Vec::new(),
            root: AstNodeId(0),
        };
        ast.root = ast.lower(root);
        ast
    }

    fn lower(&mut self, wire: &AstWireNode) -> AstNodeId {
        let label = if wire.value.is_empty() {
            wire.name.clone()
        } else {
            wire.value.clone()
        };
        let tag = wire.tag.clone().or_else(|| {
            wire.children
                .iter()
                .find(|child| child.is_entity())
                .map(|child| child.value.clone())
        });

        let id = AstNodeId(self.nodes.len());
        self.nodes.push(AstNode {
            label,
            tag,
            children: Vec::new(),
        });

        let children: Vec<AstNodeId> = wire
            .children
            .iter()
            .filter(|child| !child.is_entity())
            .map(|child| self.lower(child))
            .collect();
        self.nodes[id.0].children = children;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_parsing() {
        let json = r#"{
            "name": "expression-list",
            "value": "",
            "children": [
                {"name": "expression", "value": "", "children": [
                    {"name": "string", "value": "", "children": [
                        {"name": "term", "value": "hello", "children": []}
                    ]},
                    {"name": "entity", "value": "greeting", "children": []}
                ]}
            ]
        }"#;
        let wire: AstWireNode = serde_json::from_str(json).unwrap();
        let ast = Ast::from_wire(&wire);

        assert_eq!(ast.len(), 4);
        let root = ast.node(ast.root()).unwrap();
        assert_eq!(root.label, "expression-list");

        let expression = ast.node(root.children[0]).unwrap();
        assert_eq!(expression.label, "expression");
        assert_eq!(expression.tag.as_deref(), Some("greeting"));
        assert_eq!(expression.children.len(), 1, "entity child is lifted into the tag");

        let string = ast.node(expression.children[0]).unwrap();
        let term = ast.node(string.children[0]).unwrap();
        assert_eq!(term.label, "hello");
        assert_eq!(term.tag, None);
    }

    #[test]
    fn test_missing_fields_default() {
        let wire: AstWireNode = serde_json::from_str(r#"{"name": "term"}"#).unwrap();
        let ast = Ast::from_wire(&wire);
        assert_eq!(ast.len(), 1);
        assert!(ast.node(ast.root()).unwrap().children.is_empty());
    }

    #[test]
    fn test_explicit_tag_wins() {
        let mut wire = AstWireNode::new("expression")
            .with_children(vec![AstWireNode::new("entity").with_value("inner")]);
        wire.tag = Some("outer".to_string());
        let ast = Ast::from_wire(&wire);
        assert_eq!(ast.node(ast.root()).unwrap().tag.as_deref(), Some("outer"));
    }

    #[test]
    fn test_empty_entity_is_kept_as_node() {
        let wire = AstWireNode::new("expression").with_children(vec![AstWireNode::new("entity")]);
        let ast = Ast::from_wire(&wire);
        let root = ast.node(ast.root()).unwrap();
        assert_eq!(root.tag, None);
        assert_eq!(root.children.len(), 1);
    }

    #[test]
    fn test_add_child() {
        let mut ast = Ast::new(AstNode::new("root"));
        let a = ast.add_child(ast.root(), AstNode::new("a")).unwrap();
        ast.add_child(a, AstNode::new("b").with_tag("x")).unwrap();
        assert!(ast.add_child(AstNodeId(42), AstNode::new("c")).is_none());

        assert_eq!(ast.len(), 3);
        assert_eq!(ast.node(ast.root()).unwrap().children, vec![a]);
    }
}
