//! Host interfaces and their bundled implementations.
//!
//! The pipeline reaches the outside world only through these traits:
//! a node store that registers and links graph nodes, and a remote-file
//! source that downloads a URL and registers the resulting file node.

pub mod http;
pub mod jsonl;
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::core::digest;
use crate::domain::GraphNode;

pub use http::HttpFileSource;
pub use jsonl::JsonlNodeStore;
pub use memory::MemoryNodeStore;

/// Host node-lifecycle store
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Deterministic identity for a seed string
    fn create_node_id(&self, seed: &str) -> String {
        digest::node_id(seed)
    }

    /// Register (or re-register) a node; returns its identity
    async fn register_node(&self, node: GraphNode) -> Result<String>;

    /// Record a parent -> child edge
    async fn link_parent_child(&self, parent: &str, child: &str) -> Result<()>;

    /// Look up a registered node
    async fn get_node(&self, id: &str) -> Result<Option<GraphNode>>;
}

/// Remote-file download primitive
#[async_trait]
pub trait RemoteFileSource: Send + Sync {
    /// Human-readable source name
    fn name(&self) -> &str;

    /// Fetch `url` and register a file node under `parent_id`
    async fn materialize_remote_file(
        &self,
        url: &str,
        parent_id: &str,
        store: &dyn NodeStore,
    ) -> Result<GraphNode>;
}
