//! mediagraph - Embedded media extraction into a content graph
//!
//! Walks parsed document trees, picks out image references and turns each
//! one into a content-graph node owned by its document, with the remote
//! file it points at downloaded and linked as a `File` child.
//!
//! # Architecture
//!
//! Every transformer runs in two phases per document:
//! - Collection: a read-only walk that gathers candidate nodes
//! - Materialization: graph nodes are created, files fetched and linked,
//!   and the tree is optionally rewritten to drop extracted media
//!
//! Node identities are derived from stable seeds, so reprocessing a
//! document re-registers the same nodes instead of creating new ones.
//!
//! # Modules
//!
//! - `adapters`: Host interfaces (NodeStore, RemoteFileSource) and their
//!   bundled implementations
//! - `core`: Walker, thumbnail selection, node factory, pipeline
//! - `domain`: Data structures (DocumentTree, GraphNode)
//! - `parse`: Markdown and mdast JSON loading
//! - `transformers`: Built-in image extractor and thumbnail transformers
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Extract media from a set of posts
//! mediagraph process 'content/**/*.md'
//!
//! # Show the declared node types
//! mediagraph schema
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod parse;
pub mod transformers;

// Re-export main types at crate root for convenience
pub use adapters::{HttpFileSource, JsonlNodeStore, MemoryNodeStore, NodeStore, RemoteFileSource};
pub use crate::core::{DocumentReport, Pipeline, SchemaRegistry, Transformer};
pub use domain::{DocumentContext, DocumentTree, GraphNode, NodeKind, TreeNode, TreeNodeId};
pub use transformers::{ImageExtractor, ThumbnailImage, TransformerSpec};
