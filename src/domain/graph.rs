//! Content-graph nodes.
//!
//! A graph node is owned by the host store once registered. This crate only
//! builds nodes and asks the store to register and link them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::digest::content_digest;

/// Type name of downloaded-file nodes.
pub const FILE_NODE_TYPE: &str = "File";

/// A node in the external content graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Stable identity (deterministic for nodes built by this crate)
    pub id: String,

    /// Identity of the parent node
    pub parent: Option<String>,

    /// Identities of child nodes, in link order
    #[serde(default)]
    pub children: Vec<String>,

    /// Bookkeeping owned by the store
    pub internal: Internal,

    /// Type-specific fields (url, extra fields)
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Type tag and content addressing of a graph node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Internal {
    #[serde(rename = "type")]
    pub node_type: String,

    pub content_digest: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default)]
    pub owner: String,
}

impl GraphNode {
    /// Create a node with no content; the digest is that of the empty string.
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent: None,
            children: Vec::new(),
            internal: Internal {
                node_type: node_type.into(),
                content_digest: content_digest(""),
                content: None,
                owner: String::new(),
            },
            fields: Map::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Attach semantic content and derive the digest from it.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        let content = content.into();
        self.internal.content_digest = content_digest(&content);
        self.internal.content = Some(content);
        self
    }

    /// Override the digest (e.g. with a digest of downloaded bytes).
    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.internal.content_digest = digest.into();
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_fields(mut self, fields: Map<String, Value>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// The node's type tag.
    pub fn node_type(&self) -> &str {
        &self.internal.node_type
    }

    /// String field accessor.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Record `child` if it is not already present.
    pub fn add_child(&mut self, child: &str) {
        if !self.children.iter().any(|c| c == child) {
            self.children.push(child.to_string());
        }
    }
}

/// The graph node a document is processed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentContext {
    /// Identity of the owning document node
    pub node_id: String,

    /// Type of the owning document node (e.g. "MarkdownRemark")
    pub node_type: String,

    /// Where the document came from, for logging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl DocumentContext {
    pub fn new(node_id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            node_type: node_type.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_node_serialization() {
        let node = GraphNode::new("n1", "MarkdownRemarkThumbnail")
            .with_parent("doc")
            .with_content("https://example.com/a.png")
            .with_field("url", "https://example.com/a.png");

        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["internal"]["type"], "MarkdownRemarkThumbnail");
        assert_eq!(json["url"], "https://example.com/a.png");
        assert_eq!(json["parent"], "doc");

        let parsed: GraphNode = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, node);
    }

    #[test]
    fn test_content_digest_follows_content() {
        let empty = GraphNode::new("a", "T");
        let blank = GraphNode::new("b", "T").with_content("");
        let full = GraphNode::new("c", "T").with_content("x.png");

        assert_eq!(empty.internal.content_digest, blank.internal.content_digest);
        assert_ne!(blank.internal.content_digest, full.internal.content_digest);
    }

    #[test]
    fn test_add_child_is_idempotent() {
        let mut node = GraphNode::new("p", "T");
        node.add_child("c1");
        node.add_child("c1");
        node.add_child("c2");

        assert_eq!(node.children, vec!["c1".to_string(), "c2".to_string()]);
    }
}
