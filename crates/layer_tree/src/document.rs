use serde::{Deserialize, Serialize};

use crate::error::{DocumentError, TreeError};
use crate::tree::{Child, LayerTree, NodeId};

const DEFAULT_SCHEMA: &str = "manos-layers";
const DEFAULT_VERSION: u32 = 1;

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

fn default_version() -> u32 {
    DEFAULT_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum DocumentNode {
    Element(ElementNode),
    Text(TextNode),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    pub id: NodeId,
    pub kind: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub children: Vec<DocumentNode>,
}

impl ElementNode {
    pub fn new(id: impl Into<NodeId>, kind: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.to_string(),
            id,
            kind: kind.into(),
            children: Vec::new(),
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn child(mut self, child: ElementNode) -> Self {
        self.children.push(DocumentNode::Element(child));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children
            .push(DocumentNode::Text(TextNode { text: text.into() }));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
}

/// Serialized form of a layer tree, as stored by the page's persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDocument {
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub root: ElementNode,
}

impl LayerDocument {
    pub fn new(root: ElementNode) -> Self {
        Self {
            schema: default_schema(),
            version: default_version(),
            root,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json_str(s: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_tree(&self) -> Result<LayerTree, DocumentError> {
        LayerTree::from_document(self)
    }
}

impl LayerTree {
    pub fn from_document(document: &LayerDocument) -> Result<Self, DocumentError> {
        let root = &document.root;
        let mut tree = LayerTree::new(root.id.clone(), root.kind.clone(), root.label.clone());

        let mut stack: Vec<&ElementNode> = vec![root];
        while let Some(element) = stack.pop() {
            let parent = &element.id;
            let mut pending = Vec::new();
            for child in &element.children {
                match child {
                    DocumentNode::Element(node) => {
                        tree.push_node(
                            parent,
                            node.id.clone(),
                            node.kind.clone(),
                            node.label.clone(),
                        )?;
                        pending.push(node);
                    }
                    DocumentNode::Text(text) => tree.push_leaf(parent, text.text.clone())?,
                }
            }
            stack.extend(pending.into_iter().rev());
        }
        Ok(tree)
    }

    pub fn to_document(&self) -> Result<LayerDocument, TreeError> {
        Ok(LayerDocument::new(self.element_node(self.root_id())?))
    }

    fn element_node(&self, id: &NodeId) -> Result<ElementNode, TreeError> {
        let node = self.node(id)?;
        let mut children = Vec::with_capacity(node.children.len());
        for child in &node.children {
            children.push(match child {
                Child::Node(child_id) => DocumentNode::Element(self.element_node(child_id)?),
                Child::Leaf(leaf) => DocumentNode::Text(TextNode {
                    text: leaf.text.clone(),
                }),
            });
        }
        Ok(ElementNode {
            id: node.id.clone(),
            kind: node.kind.clone(),
            label: node.label.clone(),
            children,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_document_into_arena() {
        let document = LayerDocument::from_json_str(
            r#"{
                "root": {
                    "id": "body",
                    "kind": "body",
                    "children": [
                        { "node": "element", "id": "box1", "kind": "box", "children": [
                            { "node": "text", "text": "hello" }
                        ] },
                        { "node": "element", "id": "heading", "kind": "heading" }
                    ]
                }
            }"#,
        )
        .unwrap();
        assert_eq!(document.schema, "manos-layers");

        let tree = document.to_tree().unwrap();
        assert_eq!(tree.len(), 3);
        let box1 = tree.node(&"box1".into()).unwrap();
        assert_eq!(box1.parent, Some("body".into()));
        assert_eq!(box1.children.len(), 1);
        assert!(!box1.children[0].is_node());

        assert_eq!(tree.to_document().unwrap(), document);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let document = LayerDocument::new(
            ElementNode::new("root", "body")
                .child(ElementNode::new("a", "box"))
                .child(ElementNode::new("a", "box")),
        );
        let err = document.to_tree().unwrap_err();
        assert!(matches!(
            err,
            DocumentError::Tree(TreeError::DuplicateId(id)) if id.as_str() == "a"
        ));
    }
}
