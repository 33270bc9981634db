//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use mediagraph::adapters::{MemoryNodeStore, NodeStore, RemoteFileSource};
use mediagraph::domain::{DocumentContext, DocumentTree, GraphNode, NodeKind, TreeNode, TreeNodeId};

/// File source that never touches the network
#[derive(Default)]
pub struct StubFiles {
    /// URL that fails to download
    pub fail_on: Option<String>,
    /// (url, parent) pairs in call order
    pub calls: Mutex<Vec<(String, String)>>,
}

impl StubFiles {
    pub fn failing_on(url: &str) -> Self {
        Self {
            fail_on: Some(url.to_string()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteFileSource for StubFiles {
    fn name(&self) -> &str {
        "stub"
    }

    async fn materialize_remote_file(
        &self,
        url: &str,
        parent_id: &str,
        store: &dyn NodeStore,
    ) -> Result<GraphNode> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), parent_id.to_string()));

        if self.fail_on.as_deref() == Some(url) {
            anyhow::bail!("404 Not Found: {}", url);
        }

        let id = store.create_node_id(&format!("File >>> {} >>> {}", parent_id, url));
        let node = GraphNode::new(id, "File")
            .with_parent(parent_id)
            .with_content(url)
            .with_field("url", url);
        let id = store.register_node(node.clone()).await?;
        Ok(GraphNode { id, ..node })
    }
}

/// Memory store whose Nth register or link call fails (1-based)
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryNodeStore,
    pub fail_register_at: Option<usize>,
    pub fail_link_at: Option<usize>,
    registers: AtomicUsize,
    links: AtomicUsize,
}

impl FlakyStore {
    pub fn failing_register(at: usize) -> Self {
        Self {
            fail_register_at: Some(at),
            ..Default::default()
        }
    }

    pub fn failing_link(at: usize) -> Self {
        Self {
            fail_link_at: Some(at),
            ..Default::default()
        }
    }
}

#[async_trait]
impl NodeStore for FlakyStore {
    async fn register_node(&self, node: GraphNode) -> Result<String> {
        let call = self.registers.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_register_at == Some(call) {
            anyhow::bail!("store unavailable (register #{})", call);
        }
        self.inner.register_node(node).await
    }

    async fn link_parent_child(&self, parent: &str, child: &str) -> Result<()> {
        let call = self.links.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_link_at == Some(call) {
            anyhow::bail!("store unavailable (link #{})", call);
        }
        self.inner.link_parent_child(parent, child).await
    }

    async fn get_node(&self, id: &str) -> Result<Option<GraphNode>> {
        self.inner.get_node(id).await
    }
}

/// Register a document node and return its context
pub async fn register_document(store: &dyn NodeStore, node_type: &str, path: &str) -> DocumentContext {
    let id = store.create_node_id(&format!("{} >>> {}", node_type, path));
    store
        .register_node(GraphNode::new(id.clone(), node_type))
        .await
        .unwrap();
    DocumentContext::new(id, node_type).with_source(path)
}

/// Build a tree with each block in its own paragraph.
/// Blocks starting with `!` are images, anything else is text.
pub fn paragraphs(blocks: &[&str]) -> (DocumentTree, Vec<TreeNodeId>) {
    let mut tree = DocumentTree::new();
    let root = tree.root();
    let mut images = Vec::new();

    for block in blocks {
        let para = tree.push(root, TreeNode::new(NodeKind::Paragraph));
        match block.strip_prefix('!') {
            Some(url) => images.push(tree.push(para, TreeNode::image(url))),
            None => {
                tree.push(para, TreeNode::text(*block));
            }
        }
    }

    (tree, images)
}
