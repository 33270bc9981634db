//! In-place tree mutation.

use crate::domain::{DocumentTree, NodeKind, TreeNodeId};

/// Blank out a node while keeping its place among its siblings.
///
/// The node becomes inert html with no children and an empty value; media
/// fields are dropped. Detached former children stay in the arena but are no
/// longer reachable. Returns false when `id` is not in the tree.
pub fn neutralize(tree: &mut DocumentTree, id: TreeNodeId) -> bool {
    let Some(node) = tree.node_mut(id) else {
        return false;
    };

    node.kind = NodeKind::NEUTRAL;
    node.value = Some(String::new());
    node.url = None;
    node.alt = None;
    node.title = None;
    node.depth = None;
    node.type_name = None;
    node.extra.clear();
    let orphans = std::mem::take(&mut node.children);

    for child in orphans {
        if let Some(child) = tree.node_mut(child) {
            child.parent = None;
        }
    }
    true
}

/// True when a node has already been neutralized.
pub fn is_neutral(tree: &DocumentTree, id: TreeNodeId) -> bool {
    tree.node(id).is_some_and(|n| {
        n.kind == NodeKind::NEUTRAL
            && n.children.is_empty()
            && n.value.as_deref() == Some("")
            && n.url.is_none()
            && n.extra.is_empty()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TreeNode;

    fn tree_with_image() -> (DocumentTree, TreeNodeId, TreeNodeId) {
        let mut tree = DocumentTree::new();
        let para = tree.push(tree.root(), TreeNode::new(NodeKind::Paragraph));
        tree.push(para, TreeNode::text("before"));
        let image = tree.push(para, TreeNode::image("a.png").with_alt("A"));
        tree.push(para, TreeNode::text("after"));
        (tree, para, image)
    }

    #[test]
    fn test_neutralize_preserves_position() {
        let (mut tree, para, image) = tree_with_image();

        assert!(neutralize(&mut tree, image));

        assert_eq!(tree.children(para).len(), 3);
        assert_eq!(tree.index_in_parent(image), Some(1));
        assert!(is_neutral(&tree, image));
        assert_eq!(tree.node(image).unwrap().alt, None);
    }

    #[test]
    fn test_neutralize_is_idempotent() {
        let (mut tree, _, image) = tree_with_image();

        neutralize(&mut tree, image);
        let once = tree.clone();
        neutralize(&mut tree, image);

        assert_eq!(tree, once);
    }

    #[test]
    fn test_neutralize_clears_children() {
        let (mut tree, para, _) = tree_with_image();
        let first = tree.children(para)[0];

        neutralize(&mut tree, para);

        assert!(tree.children(para).is_empty());
        assert_eq!(tree.parent(first), None);
        assert_eq!(tree.children(tree.root()), &[para]);
    }

    #[test]
    fn test_neutralize_drops_source_attributes() {
        let mut tree = DocumentTree::new();
        let note = tree.push(
            tree.root(),
            TreeNode::unknown("footnoteDefinition").with_extra("identifier", "1"),
        );

        neutralize(&mut tree, note);

        let node = tree.node(note).unwrap();
        assert_eq!(node.type_name(), "html");
        assert!(node.extra.is_empty());
        assert!(is_neutral(&tree, note));
    }

    #[test]
    fn test_neutralize_unknown_node() {
        let (mut tree, _, _) = tree_with_image();
        let before = tree.clone();

        assert!(!neutralize(&mut tree, TreeNodeId(999)));
        assert_eq!(tree, before);
    }
}
