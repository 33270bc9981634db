//! Document tree held as an arena of indexable nodes.
//!
//! Nodes are addressed by [`TreeNodeId`], an index into the arena that stays
//! valid for the whole lifetime of the tree. Nothing is ever removed from the
//! arena: neutralizing a node rewrites its fields in place, so sibling
//! positions and child counts never shift under an in-flight traversal.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Index of a node within a [`DocumentTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TreeNodeId(pub u32);

impl TreeNodeId {
    /// The root node (always index 0).
    pub const ROOT: TreeNodeId = TreeNodeId(0);

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for TreeNodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Type tag of a tree node.
///
/// Names follow the mdast vocabulary so that trees round-trip through JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Root,
    Paragraph,
    Heading,
    Text,
    Image,
    Link,
    Emphasis,
    Strong,
    Delete,
    InlineCode,
    Code,
    List,
    ListItem,
    Blockquote,
    Break,
    ThematicBreak,
    Table,
    TableRow,
    TableCell,
    /// Raw HTML. Also the inert kind neutralized nodes are rewritten to.
    Html,
    /// Anything the parser produced that has no dedicated kind.
    #[serde(other)]
    Unknown,
}

impl NodeKind {
    /// Kind assigned to nodes removed from rendering.
    pub const NEUTRAL: NodeKind = NodeKind::Html;

    const KNOWN: [NodeKind; 20] = [
        NodeKind::Root,
        NodeKind::Paragraph,
        NodeKind::Heading,
        NodeKind::Text,
        NodeKind::Image,
        NodeKind::Link,
        NodeKind::Emphasis,
        NodeKind::Strong,
        NodeKind::Delete,
        NodeKind::InlineCode,
        NodeKind::Code,
        NodeKind::List,
        NodeKind::ListItem,
        NodeKind::Blockquote,
        NodeKind::Break,
        NodeKind::ThematicBreak,
        NodeKind::Table,
        NodeKind::TableRow,
        NodeKind::TableCell,
        NodeKind::Html,
    ];

    /// mdast type name of this kind
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading => "heading",
            NodeKind::Text => "text",
            NodeKind::Image => "image",
            NodeKind::Link => "link",
            NodeKind::Emphasis => "emphasis",
            NodeKind::Strong => "strong",
            NodeKind::Delete => "delete",
            NodeKind::InlineCode => "inlineCode",
            NodeKind::Code => "code",
            NodeKind::List => "list",
            NodeKind::ListItem => "listItem",
            NodeKind::Blockquote => "blockquote",
            NodeKind::Break => "break",
            NodeKind::ThematicBreak => "thematicBreak",
            NodeKind::Table => "table",
            NodeKind::TableRow => "tableRow",
            NodeKind::TableCell => "tableCell",
            NodeKind::Html => "html",
            NodeKind::Unknown => "unknown",
        }
    }

    /// Kind for an mdast type name; names without a dedicated kind map to
    /// [`NodeKind::Unknown`].
    pub fn from_type_name(name: &str) -> NodeKind {
        Self::KNOWN
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .unwrap_or(NodeKind::Unknown)
    }
}

/// A single node in the arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub kind: NodeKind,
    /// Parent node (None for the root and for detached nodes).
    pub parent: Option<TreeNodeId>,
    pub children: Vec<TreeNodeId>,
    /// Scalar value (text, code, html).
    pub value: Option<String>,
    /// Target of images and links.
    pub url: Option<String>,
    pub alt: Option<String>,
    pub title: Option<String>,
    /// Heading depth (1-6).
    pub depth: Option<u8>,
    /// Source type name of an [`NodeKind::Unknown`] node.
    pub type_name: Option<String>,
    /// Type-specific attributes without a dedicated field (`lang`, `ordered`,
    /// `identifier`, `position`, ...), kept so they serialize back out.
    pub extra: Map<String, Value>,
}

impl TreeNode {
    /// Create an empty node of the given kind.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            value: None,
            url: None,
            alt: None,
            title: None,
            depth: None,
            type_name: None,
            extra: Map::new(),
        }
    }

    /// Create a node of a kind without a dedicated variant.
    pub fn unknown(type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        let kind = NodeKind::from_type_name(&type_name);
        let mut node = Self::new(kind);
        if kind == NodeKind::Unknown {
            node.type_name = Some(type_name);
        }
        node
    }

    /// Create a text node.
    pub fn text(value: impl Into<String>) -> Self {
        Self::new(NodeKind::Text).with_value(value)
    }

    /// Create an image node pointing at `url`.
    pub fn image(url: impl Into<String>) -> Self {
        Self::new(NodeKind::Image).with_url(url)
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = Some(alt.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_depth(mut self, depth: u8) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn with_extra(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// mdast type name, preserving the source name of unknown kinds.
    pub fn type_name(&self) -> &str {
        match (&self.kind, &self.type_name) {
            (NodeKind::Unknown, Some(name)) => name,
            (kind, _) => kind.as_str(),
        }
    }

    /// True for text nodes carrying something other than whitespace.
    pub fn is_meaningful_text(&self) -> bool {
        self.kind == NodeKind::Text
            && self
                .value
                .as_deref()
                .is_some_and(|v| !v.trim().is_empty())
    }
}

/// An ordered, rooted document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTree {
    /// All nodes (index 0 is always the root).
    nodes: Vec<TreeNode>,
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentTree {
    /// Create a tree holding only a root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![TreeNode::new(NodeKind::Root)],
        }
    }

    /// Get the root node ID.
    pub fn root(&self) -> TreeNodeId {
        TreeNodeId::ROOT
    }

    /// Get a node by ID.
    pub fn node(&self, id: TreeNodeId) -> Option<&TreeNode> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID.
    pub fn node_mut(&mut self, id: TreeNodeId) -> Option<&mut TreeNode> {
        self.nodes.get_mut(id.index())
    }

    /// Number of nodes in the arena, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the tree has no content below the root.
    pub fn is_empty(&self) -> bool {
        self.children(self.root()).is_empty()
    }

    /// Allocate a detached node and return its ID.
    pub fn alloc(&mut self, node: TreeNode) -> TreeNodeId {
        let id = TreeNodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: TreeNodeId, child: TreeNodeId) {
        if self.node(parent).is_none() {
            return;
        }
        if let Some(child_node) = self.node_mut(child) {
            child_node.parent = Some(parent);
        } else {
            return;
        }
        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.push(child);
        }
    }

    /// Allocate `node` and append it under `parent`.
    pub fn push(&mut self, parent: TreeNodeId, node: TreeNode) -> TreeNodeId {
        let id = self.alloc(node);
        self.append_child(parent, id);
        id
    }

    /// Children of a node, in document order.
    pub fn children(&self, id: TreeNodeId) -> &[TreeNodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Parent of a node.
    pub fn parent(&self, id: TreeNodeId) -> Option<TreeNodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Position of a node among its parent's children.
    pub fn index_in_parent(&self, id: TreeNodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Concatenated text of a subtree.
    pub fn text_content(&self, id: TreeNodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: TreeNodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        if matches!(node.kind, NodeKind::Text | NodeKind::InlineCode) {
            if let Some(value) = &node.value {
                out.push_str(value);
            }
        }
        for &child in &node.children {
            self.collect_text(child, out);
        }
    }
}
