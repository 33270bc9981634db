//! Thumbnail selection.
//!
//! A thumbnail is an image that stands on its own: among its parent's
//! children there is no meaningful text before it and none after it, so the
//! image is the only visual content at that position. Only text siblings
//! count; structural siblings (breaks, html, other images) are allowed.

use serde::{Deserialize, Serialize};

use super::walker::{is_kind, visit, Visit};
use crate::domain::{DocumentTree, NodeKind, TreeNodeId};

/// How candidates are qualified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThumbnailRule {
    /// First image with no meaningful text sibling before or after it
    #[default]
    Positional,

    /// First image in traversal order, whatever surrounds it
    FirstImage,
}

/// Select at most one thumbnail image. Ties go to traversal order.
pub fn select_thumbnail(tree: &DocumentTree, rule: ThumbnailRule) -> Option<TreeNodeId> {
    let mut selected = None;

    visit(tree, is_kind(NodeKind::Image), |id, _| {
        let qualifies = match rule {
            ThumbnailRule::FirstImage => true,
            ThumbnailRule::Positional => stands_alone(tree, id),
        };
        if qualifies {
            selected = Some(id);
            Visit::Exit
        } else {
            Visit::Continue
        }
    });

    selected
}

/// True when no sibling of `id` is meaningful text.
fn stands_alone(tree: &DocumentTree, id: TreeNodeId) -> bool {
    let Some(parent) = tree.parent(id) else {
        return true;
    };

    !tree
        .children(parent)
        .iter()
        .filter(|&&sibling| sibling != id)
        .filter_map(|&sibling| tree.node(sibling))
        .any(|sibling| sibling.is_meaningful_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TreeNode;

    #[test]
    fn test_no_images() {
        let mut tree = DocumentTree::new();
        let para = tree.push(tree.root(), TreeNode::new(NodeKind::Paragraph));
        tree.push(para, TreeNode::text("just words"));

        assert_eq!(select_thumbnail(&tree, ThumbnailRule::Positional), None);
        assert_eq!(select_thumbnail(&tree, ThumbnailRule::FirstImage), None);
    }

    #[test]
    fn test_image_in_own_paragraph_qualifies() {
        let mut tree = DocumentTree::new();
        let root = tree.root();
        let intro = tree.push(root, TreeNode::new(NodeKind::Paragraph));
        tree.push(intro, TreeNode::text("intro"));
        let para = tree.push(root, TreeNode::new(NodeKind::Paragraph));
        let image = tree.push(para, TreeNode::image("a.png"));

        assert_eq!(select_thumbnail(&tree, ThumbnailRule::Positional), Some(image));
    }

    #[test]
    fn test_text_before_disqualifies() {
        let mut tree = DocumentTree::new();
        let para = tree.push(tree.root(), TreeNode::new(NodeKind::Paragraph));
        tree.push(para, TreeNode::text("see "));
        let inline = tree.push(para, TreeNode::image("inline.png"));

        assert_eq!(select_thumbnail(&tree, ThumbnailRule::Positional), None);
        assert_eq!(select_thumbnail(&tree, ThumbnailRule::FirstImage), Some(inline));
    }

    #[test]
    fn test_text_after_disqualifies() {
        let mut tree = DocumentTree::new();
        let root = tree.root();
        let p1 = tree.push(root, TreeNode::new(NodeKind::Paragraph));
        tree.push(p1, TreeNode::image("inline.png"));
        tree.push(p1, TreeNode::text(" caption"));
        let p2 = tree.push(root, TreeNode::new(NodeKind::Paragraph));
        let standalone = tree.push(p2, TreeNode::image("hero.png"));

        assert_eq!(select_thumbnail(&tree, ThumbnailRule::Positional), Some(standalone));
    }

    #[test]
    fn test_whitespace_and_structural_siblings_allowed() {
        let mut tree = DocumentTree::new();
        let para = tree.push(tree.root(), TreeNode::new(NodeKind::Paragraph));
        tree.push(para, TreeNode::text("  \n"));
        let image = tree.push(para, TreeNode::image("a.png"));
        tree.push(para, TreeNode::new(NodeKind::Break));
        tree.push(para, TreeNode::image("b.png"));

        assert_eq!(select_thumbnail(&tree, ThumbnailRule::Positional), Some(image));
    }

    #[test]
    fn test_selection_is_deterministic() {
        let mut tree = DocumentTree::new();
        let root = tree.root();
        for url in ["a.png", "b.png", "c.png"] {
            let para = tree.push(root, TreeNode::new(NodeKind::Paragraph));
            tree.push(para, TreeNode::image(url));
        }

        let first = select_thumbnail(&tree, ThumbnailRule::Positional);
        let second = select_thumbnail(&tree, ThumbnailRule::Positional);
        assert!(first.is_some());
        assert_eq!(first, second);
    }
}
