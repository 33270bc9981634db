//! Extract a single thumbnail image, then neutralize it in the tree.

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

use super::ThumbnailOptions;
use crate::core::context::CollectionContext;
use crate::core::error::ConfigError;
use crate::core::factory::{IdentityScope, MediaNodeRequest};
use crate::core::schema::{SchemaApi, TypeDef};
use crate::core::thumbnail::{select_thumbnail, ThumbnailRule};
use crate::core::transformer::{Helpers, Transformer};
use crate::domain::{DocumentContext, DocumentTree, TreeNodeId, FILE_NODE_TYPE};

/// Materializes at most one image per document as its thumbnail.
#[derive(Debug, Clone)]
pub struct ThumbnailImage {
    parent_type: String,
    node_type: String,
    keep_image_in_tree: bool,
    rule: ThumbnailRule,
}

impl ThumbnailImage {
    pub fn new(options: ThumbnailOptions) -> Result<Self, ConfigError> {
        let parent_type = options.parent_type.node_type()?;
        Ok(Self {
            node_type: format!("{}Thumbnail", parent_type),
            parent_type,
            keep_image_in_tree: options.keep_image_in_tree,
            rule: options.rule,
        })
    }

    /// Type name of the nodes this transformer creates
    pub fn node_type(&self) -> &str {
        &self.node_type
    }
}

#[async_trait]
impl Transformer for ThumbnailImage {
    type Item = TreeNodeId;

    fn name(&self) -> &str {
        "thumbnail-image"
    }

    async fn customize_schema(&self, schema: &mut dyn SchemaApi) -> Result<()> {
        info!(node_type = %self.node_type, "Declaring thumbnail types");
        schema.create_types(vec![
            TypeDef::node(&self.parent_type),
            TypeDef::node(&self.node_type)
                .inferred()
                .child_of(&self.parent_type)
                .field("url", "String"),
            TypeDef::node(FILE_NODE_TYPE)
                .inferred()
                .child_of(&self.node_type),
        ])
    }

    fn traverse(&self, tree: &DocumentTree, ctx: &mut CollectionContext<TreeNodeId>) {
        if let Some(image) = select_thumbnail(tree, self.rule) {
            ctx.collect(image);
        }
    }

    async fn transform(
        &self,
        collected: CollectionContext<TreeNodeId>,
        helpers: &mut Helpers<'_>,
        doc: &DocumentContext,
    ) -> Result<()> {
        let Some(&image) = collected.first() else {
            debug!(document = %doc.node_id, "No thumbnail image found");
            return Ok(());
        };

        let request = MediaNodeRequest::new(image, &doc.node_id, &self.node_type)
            .with_scope(IdentityScope::Single);
        helpers.materialize(request).await?;

        if !self.keep_image_in_tree {
            helpers.neutralize(image);
        }
        Ok(())
    }
}
