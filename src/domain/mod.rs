//! Domain types for mediagraph.
//!
//! This module contains the core data structures:
//! - Tree: the document tree, an arena of indexable nodes
//! - Graph: content-graph nodes and the owning document context

pub mod graph;
pub mod tree;

// Re-export commonly used types
pub use graph::{DocumentContext, GraphNode, Internal, FILE_NODE_TYPE};
pub use tree::{DocumentTree, NodeKind, TreeNode, TreeNodeId};
