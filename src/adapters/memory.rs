//! In-process node store.
//!
//! Registration is an upsert keyed by identity: registering the same
//! identity again replaces the node's content but keeps links already made.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::NodeStore;
use crate::core::error::StoreError;
use crate::domain::GraphNode;

#[derive(Debug, Default)]
struct Inner {
    nodes: HashMap<String, GraphNode>,
    /// Identities in first-registration order
    order: Vec<String>,
    registrations: usize,
}

/// Node store backed by a map in memory
#[derive(Debug, Default)]
pub struct MemoryNodeStore {
    inner: Mutex<Inner>,
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All nodes in first-registration order
    pub async fn nodes(&self) -> Vec<GraphNode> {
        let inner = self.inner.lock().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.nodes.get(id).cloned())
            .collect()
    }

    /// Nodes of one type in first-registration order
    pub async fn nodes_of_type(&self, node_type: &str) -> Vec<GraphNode> {
        self.nodes()
            .await
            .into_iter()
            .filter(|n| n.node_type() == node_type)
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.nodes.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Total register calls, re-registrations included
    pub async fn registrations(&self) -> usize {
        self.inner.lock().await.registrations
    }
}

/// Upsert `node` into `nodes`, preserving existing links.
pub(crate) fn upsert(
    nodes: &mut HashMap<String, GraphNode>,
    order: &mut Vec<String>,
    mut node: GraphNode,
) -> String {
    let id = node.id.clone();
    match nodes.get(&id) {
        Some(existing) => {
            for child in &existing.children {
                node.add_child(child);
            }
            if node.parent.is_none() {
                node.parent = existing.parent.clone();
            }
        }
        None => order.push(id.clone()),
    }
    nodes.insert(id.clone(), node);
    id
}

/// Record `parent -> child` on both ends.
pub(crate) fn link(
    nodes: &mut HashMap<String, GraphNode>,
    parent: &str,
    child: &str,
) -> Result<(), StoreError> {
    if parent == child {
        return Err(StoreError::SelfLink {
            id: parent.to_string(),
        });
    }
    if !nodes.contains_key(child) {
        return Err(StoreError::UnknownNode(child.to_string()));
    }
    let parent_node = nodes
        .get_mut(parent)
        .ok_or_else(|| StoreError::UnknownNode(parent.to_string()))?;
    parent_node.add_child(child);

    if let Some(child_node) = nodes.get_mut(child) {
        child_node.parent = Some(parent.to_string());
    }
    Ok(())
}

#[async_trait]
impl NodeStore for MemoryNodeStore {
    async fn register_node(&self, node: GraphNode) -> Result<String> {
        let mut inner = self.inner.lock().await;
        let Inner {
            nodes,
            order,
            registrations,
        } = &mut *inner;
        *registrations += 1;
        Ok(upsert(nodes, order, node))
    }

    async fn link_parent_child(&self, parent: &str, child: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        link(&mut inner.nodes, parent, child)?;
        Ok(())
    }

    async fn get_node(&self, id: &str) -> Result<Option<GraphNode>> {
        Ok(self.inner.lock().await.nodes.get(id).cloned())
    }
}
