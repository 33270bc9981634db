//! mdast-shaped JSON to document tree, and back.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{DocumentTree, NodeKind, TreeNode, TreeNodeId};

/// A node in mdast JSON form. Attributes without a dedicated field are
/// collected in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MdastNode {
    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MdastNode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u8>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MdastNode {
    pub fn kind(&self) -> NodeKind {
        NodeKind::from_type_name(&self.type_name)
    }

    fn to_tree_node(&self) -> TreeNode {
        TreeNode {
            value: self.value.clone(),
            url: self.url.clone(),
            alt: self.alt.clone(),
            title: self.title.clone(),
            depth: self.depth,
            extra: self.extra.clone(),
            ..TreeNode::unknown(self.type_name.as_str())
        }
    }
}

/// Parse an mdast JSON document
pub fn parse(json: &str) -> Result<DocumentTree> {
    let root: MdastNode = serde_json::from_str(json).context("Failed to parse mdast JSON")?;
    Ok(from_mdast(&root))
}

/// Build a tree from an mdast node. A non-root top node is wrapped in a root.
pub fn from_mdast(top: &MdastNode) -> DocumentTree {
    let mut tree = DocumentTree::new();
    let root = tree.root();

    if top.kind() == NodeKind::Root {
        if let Some(node) = tree.node_mut(root) {
            node.extra = top.extra.clone();
        }
        for child in &top.children {
            append(&mut tree, root, child);
        }
    } else {
        append(&mut tree, root, top);
    }
    tree
}

fn append(tree: &mut DocumentTree, parent: TreeNodeId, node: &MdastNode) {
    let id = tree.push(parent, node.to_tree_node());
    for child in &node.children {
        append(tree, id, child);
    }
}

/// Convert a tree back into mdast form, starting at the root.
/// Detached nodes are not reachable and so are dropped.
pub fn to_mdast(tree: &DocumentTree) -> MdastNode {
    node_to_mdast(tree, tree.root())
}

fn node_to_mdast(tree: &DocumentTree, id: TreeNodeId) -> MdastNode {
    let Some(node) = tree.node(id) else {
        return MdastNode {
            type_name: NodeKind::NEUTRAL.as_str().to_string(),
            children: Vec::new(),
            value: Some(String::new()),
            url: None,
            alt: None,
            title: None,
            depth: None,
            extra: Map::new(),
        };
    };

    MdastNode {
        type_name: node.type_name().to_string(),
        children: node
            .children
            .iter()
            .map(|&child| node_to_mdast(tree, child))
            .collect(),
        value: node.value.clone(),
        url: node.url.clone(),
        alt: node.alt.clone(),
        title: node.title.clone(),
        depth: node.depth,
        extra: node.extra.clone(),
    }
}

/// Render a tree as pretty-printed mdast JSON
pub fn to_string_pretty(tree: &DocumentTree) -> Result<String> {
    serde_json::to_string_pretty(&to_mdast(tree)).context("Failed to serialize document tree")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mutator::neutralize;
    use crate::core::walker::images;

    const DOC: &str = r#"{
        "type": "root",
        "children": [
            {"type": "paragraph", "children": [{"type": "text", "value": "intro"}]},
            {"type": "paragraph", "children": [
                {"type": "image", "url": "https://x/a.png", "alt": "A", "title": "t"}
            ]},
            {"type": "heading", "depth": 2, "children": [{"type": "text", "value": "H"}]},
            {"type": "footnoteDefinition", "children": []}
        ]
    }"#;

    #[test]
    fn test_parse_mdast() {
        let tree = parse(DOC).unwrap();
        assert_eq!(tree.children(tree.root()).len(), 4);

        let found = images(&tree);
        assert_eq!(found.len(), 1);
        let image = tree.node(found[0]).unwrap();
        assert_eq!(image.url.as_deref(), Some("https://x/a.png"));
        assert_eq!(image.alt.as_deref(), Some("A"));

        let unknown = tree.children(tree.root())[3];
        assert_eq!(tree.node(unknown).unwrap().kind, NodeKind::Unknown);
    }

    #[test]
    fn test_roundtrip_keeps_unmodelled_attributes() {
        let doc = serde_json::json!({
            "type": "root",
            "position": {"start": {"line": 1, "column": 1}, "end": {"line": 9, "column": 1}},
            "children": [
                {"type": "code", "lang": "rust", "meta": "linenos", "value": "fn main() {}"},
                {"type": "list", "ordered": true, "start": 3, "spread": false, "children": [
                    {"type": "listItem", "checked": true, "children": [
                        {"type": "paragraph", "children": [{"type": "text", "value": "done"}]}
                    ]}
                ]},
                {"type": "paragraph", "children": [
                    {"type": "text", "value": "see"},
                    {"type": "footnoteReference", "identifier": "1", "label": "1"}
                ]},
                {"type": "footnoteDefinition", "identifier": "1", "label": "1", "children": [
                    {"type": "paragraph", "children": [{"type": "text", "value": "note"}]}
                ]},
                {"type": "table", "align": ["left", null]}
            ]
        });

        let tree = parse(&doc.to_string()).unwrap();
        let footnote = tree.node(tree.children(tree.root())[3]).unwrap();
        assert_eq!(footnote.kind, NodeKind::Unknown);
        assert_eq!(footnote.type_name(), "footnoteDefinition");

        let code = tree.node(tree.children(tree.root())[0]).unwrap();
        assert_eq!(code.extra["lang"], "rust");
        assert!(code.title.is_none());

        let written = serde_json::to_value(to_mdast(&tree)).unwrap();
        assert_eq!(written, doc);
    }

    #[test]
    fn test_non_root_top_is_wrapped() {
        let tree = parse(r#"{"type": "image", "url": "a.png"}"#).unwrap();
        let child = tree.children(tree.root())[0];
        assert_eq!(tree.node(child).unwrap().kind, NodeKind::Image);
        assert_eq!(tree.parent(child), Some(tree.root()));
    }

    #[test]
    fn test_neutralized_image_serializes_as_empty_html() {
        let mut tree = parse(DOC).unwrap();
        let image = images(&tree)[0];
        neutralize(&mut tree, image);

        let json = serde_json::to_value(to_mdast(&tree)).unwrap();
        let neutral = &json["children"][1]["children"][0];
        assert_eq!(neutral["type"], "html");
        assert_eq!(neutral["value"], "");
        assert!(neutral.get("url").is_none());
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(parse("{not json").is_err());
        assert!(parse(r#"{"children": []}"#).is_err());
    }
}
