//! Content-graph node construction.
//!
//! Turns a media reference from the document tree into a graph node under a
//! designated parent, then attaches the downloaded file beneath it.

use std::time::Instant;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::adapters::{NodeStore, RemoteFileSource};
use crate::domain::{DocumentTree, GraphNode, TreeNodeId};

/// How a node's identity is scoped under its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityScope {
    /// At most one node of the type per parent
    Single,

    /// One node per collected item, discriminated by its index
    Item(usize),
}

impl IdentityScope {
    /// Seed string identity is derived from. Never includes the URL.
    pub fn seed(&self, node_type: &str, parent_id: &str) -> String {
        match self {
            IdentityScope::Single => format!("{} >>> {}", node_type, parent_id),
            IdentityScope::Item(index) => format!("{} >>> {} >>> {}", node_type, parent_id, index),
        }
    }
}

/// Everything needed to materialize one media reference.
#[derive(Debug, Clone)]
pub struct MediaNodeRequest {
    /// Media reference in the document tree
    pub media: TreeNodeId,

    /// Identity of the graph node to nest under
    pub parent_id: String,

    /// Type name of the new node
    pub node_type: String,

    pub scope: IdentityScope,

    /// Extra fields stored on the new node
    pub extra_fields: Map<String, Value>,
}

impl MediaNodeRequest {
    pub fn new(media: TreeNodeId, parent_id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            media,
            parent_id: parent_id.into(),
            node_type: node_type.into(),
            scope: IdentityScope::Single,
            extra_fields: Map::new(),
        }
    }

    pub fn with_scope(mut self, scope: IdentityScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra_fields.insert(name.into(), value.into());
        self
    }
}

/// Result of one materialization
#[derive(Debug, Clone)]
pub struct MaterializedMedia {
    /// The media node linked under the parent
    pub node: GraphNode,

    /// The downloaded file node linked under the media node
    pub file: GraphNode,
}

/// Builds media nodes against a host store and file source.
#[derive(Clone, Copy)]
pub struct NodeFactory<'a> {
    store: &'a dyn NodeStore,
    files: &'a dyn RemoteFileSource,
}

impl<'a> NodeFactory<'a> {
    pub fn new(store: &'a dyn NodeStore, files: &'a dyn RemoteFileSource) -> Self {
        Self { store, files }
    }

    pub fn store(&self) -> &'a dyn NodeStore {
        self.store
    }

    /// Build the graph node for a request without registering it.
    pub fn build_node(&self, tree: &DocumentTree, request: &MediaNodeRequest) -> Result<GraphNode> {
        let media = tree
            .node(request.media)
            .with_context(|| format!("Media reference {} is not in the document tree", request.media))?;

        let url = media.url.clone();
        let content = url.clone().unwrap_or_default();
        let id = self
            .store
            .create_node_id(&request.scope.seed(&request.node_type, &request.parent_id));

        let mut node = GraphNode::new(id, request.node_type.clone())
            .with_parent(request.parent_id.clone())
            .with_content(content);
        node.fields.insert("url".to_string(), url.map(Value::String).unwrap_or(Value::Null));
        if let Some(alt) = &media.alt {
            node.fields.insert("alt".to_string(), Value::String(alt.clone()));
        }
        if let Some(title) = &media.title {
            node.fields.insert("title".to_string(), Value::String(title.clone()));
        }

        Ok(node.with_fields(request.extra_fields.clone()))
    }

    /// Register the media node, link it under its parent, download the file
    /// and link the file under the media node.
    pub async fn materialize(
        &self,
        tree: &DocumentTree,
        request: &MediaNodeRequest,
    ) -> Result<MaterializedMedia> {
        let start = Instant::now();
        let node = self.build_node(tree, request)?;
        let url = node.internal.content.clone().unwrap_or_default();

        let node_id = self
            .store
            .register_node(node.clone())
            .await
            .with_context(|| format!("Failed to register {} node for '{}'", request.node_type, url))?;
        self.store
            .link_parent_child(&request.parent_id, &node_id)
            .await
            .with_context(|| format!("Failed to link {} under {}", node_id, request.parent_id))?;
        debug!(node_id = %node_id, node_type = %request.node_type, "Registered media node");

        info!(url = %url, source = self.files.name(), "Saving remote file node");
        let file = self
            .files
            .materialize_remote_file(&url, &node_id, self.store)
            .await
            .with_context(|| format!("Failed to materialize remote file '{}'", url))?;
        self.store
            .link_parent_child(&node_id, &file.id)
            .await
            .with_context(|| format!("Failed to link file {} under {}", file.id, node_id))?;

        info!(
            node_id = %node_id,
            file_id = %file.id,
            duration_ms = start.elapsed().as_millis() as u64,
            "Created file node"
        );

        let node = self.store.get_node(&node_id).await?.unwrap_or(node);
        Ok(MaterializedMedia { node, file })
    }
}
