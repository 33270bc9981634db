//! Predicate-driven traversal over a document tree.
//!
//! Both entry points walk depth-first in pre-order (a node before its
//! children, children left to right) and never touch the tree.

use crate::domain::{DocumentTree, NodeKind, TreeNode, TreeNodeId};

/// What a visitor wants after seeing a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Keep walking
    Continue,
    /// Stop; no further nodes are visited
    Exit,
}

/// Lazy pre-order iterator over nodes accepted by a predicate.
///
/// Not restartable: start a new walk with [`walk`] for each pass.
pub struct Walk<'a, P> {
    tree: &'a DocumentTree,
    stack: Vec<TreeNodeId>,
    predicate: P,
}

impl<'a, P> Iterator for Walk<'a, P>
where
    P: FnMut(&TreeNode) -> bool,
{
    type Item = TreeNodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        while let Some(current) = self.stack.pop() {
            let Some(node) = tree.node(current) else {
                continue;
            };

            // Push children in reverse order so they're visited left-to-right
            self.stack.extend(node.children.iter().rev().copied());

            if (self.predicate)(node) {
                return Some(current);
            }
        }
        None
    }
}

/// Walk every node accepted by `predicate`, starting at the root.
pub fn walk<P>(tree: &DocumentTree, predicate: P) -> Walk<'_, P>
where
    P: FnMut(&TreeNode) -> bool,
{
    Walk {
        tree,
        stack: vec![tree.root()],
        predicate,
    }
}

/// Call `visitor` on each node accepted by `predicate` until it returns
/// [`Visit::Exit`]. Returns the number of matches visited.
pub fn visit<P, V>(tree: &DocumentTree, predicate: P, mut visitor: V) -> usize
where
    P: FnMut(&TreeNode) -> bool,
    V: FnMut(TreeNodeId, &TreeNode) -> Visit,
{
    let mut visited = 0;
    for id in walk(tree, predicate) {
        visited += 1;
        let Some(node) = tree.node(id) else {
            continue;
        };
        if visitor(id, node) == Visit::Exit {
            break;
        }
    }
    visited
}

/// Predicate accepting nodes of one kind.
pub fn is_kind(kind: NodeKind) -> impl Fn(&TreeNode) -> bool {
    move |node| node.kind == kind
}

/// All image nodes, in pre-order.
pub fn images(tree: &DocumentTree) -> Vec<TreeNodeId> {
    walk(tree, is_kind(NodeKind::Image)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// root
    /// ├── paragraph
    /// │   ├── text "one"
    /// │   └── image a.png
    /// └── blockquote
    ///     └── paragraph
    ///         └── image b.png
    fn sample_tree() -> (DocumentTree, TreeNodeId, TreeNodeId) {
        let mut tree = DocumentTree::new();
        let root = tree.root();
        let p1 = tree.push(root, TreeNode::new(NodeKind::Paragraph));
        tree.push(p1, TreeNode::text("one"));
        let a = tree.push(p1, TreeNode::image("a.png"));
        let quote = tree.push(root, TreeNode::new(NodeKind::Blockquote));
        let p2 = tree.push(quote, TreeNode::new(NodeKind::Paragraph));
        let b = tree.push(p2, TreeNode::image("b.png"));
        (tree, a, b)
    }

    #[test]
    fn test_walk_pre_order() {
        let (tree, _, _) = sample_tree();
        let kinds: Vec<NodeKind> = walk(&tree, |_| true)
            .map(|id| tree.node(id).unwrap().kind)
            .collect();

        assert_eq!(
            kinds,
            vec![
                NodeKind::Root,
                NodeKind::Paragraph,
                NodeKind::Text,
                NodeKind::Image,
                NodeKind::Blockquote,
                NodeKind::Paragraph,
                NodeKind::Image,
            ]
        );
    }

    #[test]
    fn test_walk_filters_by_kind() {
        let (tree, a, b) = sample_tree();
        assert_eq!(images(&tree), vec![a, b]);
    }

    #[test]
    fn test_empty_tree_yields_nothing() {
        let tree = DocumentTree::new();
        assert_eq!(walk(&tree, is_kind(NodeKind::Image)).count(), 0);
    }

    #[test]
    fn test_visit_early_exit() {
        let (tree, a, _) = sample_tree();
        let mut seen = Vec::new();

        let visited = visit(&tree, is_kind(NodeKind::Image), |id, _| {
            seen.push(id);
            Visit::Exit
        });

        assert_eq!(visited, 1);
        assert_eq!(seen, vec![a]);
    }

    #[test]
    fn test_visit_all() {
        let (tree, _, _) = sample_tree();
        let visited = visit(&tree, is_kind(NodeKind::Paragraph), |_, _| Visit::Continue);
        assert_eq!(visited, 2);
    }
}
