//! The transformer pipeline.
//!
//! For every document, each registered transformer runs a collection pass
//! followed by a materialization pass, strictly in registration order. A
//! failure in any transformer aborts the document and is returned to the
//! caller unchanged apart from added context.

use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument};

use super::context::CollectionContext;
use super::error::ConfigError;
use super::factory::NodeFactory;
use super::schema::SchemaApi;
use super::transformer::{Helpers, Transformer};
use crate::adapters::{NodeStore, RemoteFileSource};
use crate::domain::{DocumentContext, DocumentTree};
use crate::transformers::{ImageExtractor, ThumbnailImage, TransformerSpec};

/// Object-safe view of a [`Transformer`] with its item type erased.
#[async_trait]
trait DynTransformer: Send + Sync {
    fn name(&self) -> &str;

    async fn customize_schema(&self, schema: &mut dyn SchemaApi) -> Result<()>;

    async fn run(
        &self,
        tree: &mut DocumentTree,
        factory: NodeFactory<'_>,
        doc: &DocumentContext,
    ) -> Result<TransformerReport>;
}

#[async_trait]
impl<T: Transformer> DynTransformer for T {
    fn name(&self) -> &str {
        Transformer::name(self)
    }

    async fn customize_schema(&self, schema: &mut dyn SchemaApi) -> Result<()> {
        Transformer::customize_schema(self, schema).await
    }

    async fn run(
        &self,
        tree: &mut DocumentTree,
        factory: NodeFactory<'_>,
        doc: &DocumentContext,
    ) -> Result<TransformerReport> {
        let start = Instant::now();
        let name = Transformer::name(self).to_string();

        let mut ctx = CollectionContext::new();
        self.traverse(tree, &mut ctx);
        let collected = ctx.len();
        debug!(transformer = %name, collected, "Collection finished");

        let mut helpers = Helpers::new(tree, factory);
        self.transform(ctx, &mut helpers, doc).await?;

        Ok(TransformerReport {
            name,
            collected,
            created: helpers.created().iter().map(|m| m.node.id.clone()).collect(),
            files: helpers.created().iter().map(|m| m.file.id.clone()).collect(),
            neutralized: helpers.neutralized().len(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// What one transformer did to one document
#[derive(Debug, Clone, Serialize)]
pub struct TransformerReport {
    pub name: String,

    /// Items gathered by the collection pass
    pub collected: usize,

    /// Media node identities, in creation order
    pub created: Vec<String>,

    /// File node identities, in creation order
    pub files: Vec<String>,

    /// Tree nodes neutralized
    pub neutralized: usize,

    pub duration_ms: u64,
}

/// What the pipeline did to one document
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub document_id: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub transformers: Vec<TransformerReport>,
}

impl DocumentReport {
    /// Total media nodes created across transformers
    pub fn created_count(&self) -> usize {
        self.transformers.iter().map(|t| t.created.len()).sum()
    }

    /// Total tree nodes neutralized across transformers
    pub fn neutralized_count(&self) -> usize {
        self.transformers.iter().map(|t| t.neutralized).sum()
    }
}

/// An ordered set of transformers
#[derive(Default)]
pub struct Pipeline {
    transformers: Vec<Box<dyn DynTransformer>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("transformers", &self.names())
            .finish()
    }
}

impl Pipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pipeline from configured transformer specs, in order
    pub fn from_specs(specs: &[TransformerSpec]) -> Result<Self, ConfigError> {
        if specs.is_empty() {
            return Err(ConfigError::NoTransformers);
        }

        let mut pipeline = Self::new();
        for spec in specs {
            match spec {
                TransformerSpec::ExtractAll { parent_type } => {
                    pipeline.register(ImageExtractor::new(parent_type.clone())?);
                }
                TransformerSpec::Thumbnail(options) => {
                    pipeline.register(ThumbnailImage::new(options.clone())?);
                }
            }
        }
        Ok(pipeline)
    }

    /// Append a transformer; registration order is execution order
    pub fn register<T: Transformer + 'static>(&mut self, transformer: T) -> &mut Self {
        self.transformers.push(Box::new(transformer));
        self
    }

    /// Builder-style [`Pipeline::register`]
    pub fn with<T: Transformer + 'static>(mut self, transformer: T) -> Self {
        self.register(transformer);
        self
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    /// Transformer names in execution order
    pub fn names(&self) -> Vec<&str> {
        self.transformers.iter().map(|t| t.name()).collect()
    }

    /// Let every transformer declare its node types. Run once per build,
    /// before any document is processed.
    #[instrument(skip_all, fields(transformers = self.transformers.len()))]
    pub async fn customize_schema(&self, schema: &mut dyn SchemaApi) -> Result<()> {
        for transformer in &self.transformers {
            debug!(transformer = transformer.name(), "Declaring types");
            transformer
                .customize_schema(schema)
                .await
                .with_context(|| format!("Transformer '{}' failed to declare types", transformer.name()))?;
        }
        Ok(())
    }

    /// Run every transformer over one document.
    #[instrument(skip_all, fields(document = %doc.node_id))]
    pub async fn process_document(
        &self,
        tree: &mut DocumentTree,
        doc: &DocumentContext,
        store: &dyn NodeStore,
        files: &dyn RemoteFileSource,
    ) -> Result<DocumentReport> {
        let started_at = Utc::now();
        let start = Instant::now();
        info!(source = doc.source.as_deref().unwrap_or("-"), "Processing document");

        let factory = NodeFactory::new(store, files);
        let mut reports = Vec::with_capacity(self.transformers.len());

        for transformer in &self.transformers {
            let report = transformer
                .run(tree, factory, doc)
                .await
                .with_context(|| {
                    format!(
                        "Transformer '{}' failed on document {}",
                        transformer.name(),
                        doc.node_id
                    )
                })?;

            info!(
                transformer = %report.name,
                collected = report.collected,
                created = report.created.len(),
                neutralized = report.neutralized,
                "Transformer finished"
            );
            reports.push(report);
        }

        Ok(DocumentReport {
            document_id: doc.node_id.clone(),
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
            transformers: reports,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transformers::{ParentType, ThumbnailOptions};

    #[test]
    fn test_from_specs_preserves_order() {
        let specs = vec![
            TransformerSpec::Thumbnail(ThumbnailOptions::default()),
            TransformerSpec::ExtractAll {
                parent_type: ParentType::mdx(),
            },
        ];
        let pipeline = Pipeline::from_specs(&specs).unwrap();

        assert_eq!(pipeline.len(), 2);
        assert_eq!(pipeline.names(), vec!["thumbnail-image", "image-extractor"]);
    }

    #[test]
    fn test_empty_specs_rejected() {
        assert!(matches!(
            Pipeline::from_specs(&[]),
            Err(ConfigError::NoTransformers)
        ));
    }

    #[test]
    fn test_invalid_parent_type_rejected_at_registration() {
        let specs = vec![TransformerSpec::ExtractAll {
            parent_type: ParentType::custom(""),
        }];
        assert!(matches!(
            Pipeline::from_specs(&specs),
            Err(ConfigError::EmptyParentType)
        ));
    }
}
