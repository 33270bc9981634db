//! The transformer contract.
//!
//! A transformer runs in two phases per document. Collection gets a shared
//! borrow of the tree and appends to a [`CollectionContext`]; materialization
//! gets the collected items and [`Helpers`], which hold the only mutable
//! borrow of the tree. Collection therefore cannot mutate the tree.

use anyhow::Result;
use async_trait::async_trait;

use super::context::CollectionContext;
use super::factory::{MaterializedMedia, MediaNodeRequest, NodeFactory};
use super::mutator;
use super::schema::SchemaApi;
use crate::domain::{DocumentContext, DocumentTree, TreeNodeId};

/// A pluggable extraction step.
#[async_trait]
pub trait Transformer: Send + Sync {
    /// What the collection phase gathers
    type Item: Send + 'static;

    /// Name used in logs and reports
    fn name(&self) -> &str;

    /// Declare the node types this transformer creates. Runs once per build.
    async fn customize_schema(&self, _schema: &mut dyn SchemaApi) -> Result<()> {
        Ok(())
    }

    /// Collection phase
    fn traverse(&self, tree: &DocumentTree, ctx: &mut CollectionContext<Self::Item>);

    /// Materialization phase. Items must be handled in collection order,
    /// each finishing before the next starts.
    async fn transform(
        &self,
        collected: CollectionContext<Self::Item>,
        helpers: &mut Helpers<'_>,
        doc: &DocumentContext,
    ) -> Result<()>;
}

/// Operations available during materialization.
pub struct Helpers<'a> {
    tree: &'a mut DocumentTree,
    factory: NodeFactory<'a>,
    created: Vec<MaterializedMedia>,
    neutralized: Vec<TreeNodeId>,
}

impl<'a> Helpers<'a> {
    pub fn new(tree: &'a mut DocumentTree, factory: NodeFactory<'a>) -> Self {
        Self {
            tree,
            factory,
            created: Vec::new(),
            neutralized: Vec::new(),
        }
    }

    /// Read access to the tree
    pub fn tree(&self) -> &DocumentTree {
        &*self.tree
    }

    /// Materialize a graph node for a media reference
    pub async fn materialize(&mut self, request: MediaNodeRequest) -> Result<MaterializedMedia> {
        let materialized = self.factory.materialize(self.tree, &request).await?;
        self.created.push(materialized.clone());
        Ok(materialized)
    }

    /// Neutralize a tree node in place
    pub fn neutralize(&mut self, id: TreeNodeId) -> bool {
        let changed = mutator::neutralize(self.tree, id);
        if changed && !self.neutralized.contains(&id) {
            self.neutralized.push(id);
        }
        changed
    }

    /// Nodes materialized so far
    pub fn created(&self) -> &[MaterializedMedia] {
        &self.created
    }

    /// Tree nodes neutralized so far
    pub fn neutralized(&self) -> &[TreeNodeId] {
        &self.neutralized
    }
}
