//! Extract every image in a document as an embedded-image node.

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

use super::ParentType;
use crate::core::context::CollectionContext;
use crate::core::error::ConfigError;
use crate::core::factory::{IdentityScope, MediaNodeRequest};
use crate::core::schema::{SchemaApi, TypeDef};
use crate::core::transformer::{Helpers, Transformer};
use crate::core::walker::{is_kind, walk};
use crate::domain::{DocumentContext, DocumentTree, NodeKind, TreeNodeId, FILE_NODE_TYPE};

/// Materializes all images, leaving the tree untouched.
#[derive(Debug, Clone)]
pub struct ImageExtractor {
    parent_type: String,
    node_type: String,
}

impl ImageExtractor {
    pub fn new(parent_type: ParentType) -> Result<Self, ConfigError> {
        let parent_type = parent_type.node_type()?;
        Ok(Self {
            node_type: format!("{}EmbeddedImage", parent_type),
            parent_type,
        })
    }

    /// Type name of the nodes this transformer creates
    pub fn node_type(&self) -> &str {
        &self.node_type
    }
}

#[async_trait]
impl Transformer for ImageExtractor {
    type Item = TreeNodeId;

    fn name(&self) -> &str {
        "image-extractor"
    }

    async fn customize_schema(&self, schema: &mut dyn SchemaApi) -> Result<()> {
        info!(node_type = %self.node_type, "Declaring embedded image types");
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
        for image in walk(tree, is_kind(NodeKind::Image)) {
            ctx.collect(image);
        }
    }

    async fn transform(
        &self,
        collected: CollectionContext<TreeNodeId>,
        helpers: &mut Helpers<'_>,
        doc: &DocumentContext,
    ) -> Result<()> {
        if collected.is_empty() {
            debug!(document = %doc.node_id, "No images found");
            return Ok(());
        }

        for (index, image) in collected.into_items().into_iter().enumerate() {
            let request = MediaNodeRequest::new(image, &doc.node_id, &self.node_type)
                .with_scope(IdentityScope::Item(index))
                .with_field("position", index);
            helpers.materialize(request).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::SchemaRegistry;
    use crate::domain::TreeNode;

    #[test]
    fn test_node_type_follows_parent() {
        let remark = ImageExtractor::new(ParentType::remark()).unwrap();
        assert_eq!(remark.node_type(), "MarkdownRemarkEmbeddedImage");

        let custom = ImageExtractor::new(ParentType::custom("Post")).unwrap();
        assert_eq!(custom.node_type(), "PostEmbeddedImage");
    }

    #[test]
    fn test_traverse_collects_all_images_in_order() {
        let mut tree = DocumentTree::new();
        let root = tree.root();
        let para = tree.push(root, TreeNode::new(NodeKind::Paragraph));
        let a = tree.push(para, TreeNode::image("a.png"));
        tree.push(para, TreeNode::text("between"));
        let b = tree.push(para, TreeNode::image("b.png"));

        let extractor = ImageExtractor::new(ParentType::default()).unwrap();
        let mut ctx = CollectionContext::new();
        extractor.traverse(&tree, &mut ctx);

        assert_eq!(ctx.collected(), &[a, b]);
    }

    #[tokio::test]
    async fn test_schema_declaration() {
        let extractor = ImageExtractor::new(ParentType::mdx()).unwrap();
        let mut registry = SchemaRegistry::new();
        extractor.customize_schema(&mut registry).await.unwrap();

        let image = registry.get("MdxEmbeddedImage").unwrap();
        assert_eq!(image.child_of, vec!["Mdx".to_string()]);
        assert!(image.infer);

        let file = registry.get("File").unwrap();
        assert_eq!(file.child_of, vec!["MdxEmbeddedImage".to_string()]);
    }
}
