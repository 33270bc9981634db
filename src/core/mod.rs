//! Core extraction logic.
//!
//! This module contains:
//! - Walker: predicate-driven pre-order traversal
//! - Thumbnail: thumbnail candidate selection
//! - Context: per-transformer collection state
//! - Factory: content-graph node construction and linking
//! - Mutator: in-place node neutralization
//! - Transformer / Pipeline: the two-phase transformer contract and its driver

pub mod context;
pub mod digest;
pub mod error;
pub mod factory;
pub mod mutator;
pub mod pipeline;
pub mod schema;
pub mod thumbnail;
pub mod transformer;
pub mod walker;

// Re-export commonly used types
pub use context::CollectionContext;
pub use digest::{content_digest, node_id};
pub use error::{ConfigError, StoreError};
pub use factory::{IdentityScope, MaterializedMedia, MediaNodeRequest, NodeFactory};
pub use mutator::neutralize;
pub use pipeline::{DocumentReport, Pipeline, TransformerReport};
pub use schema::{FieldDef, SchemaApi, SchemaRegistry, TypeDef};
pub use thumbnail::{select_thumbnail, ThumbnailRule};
pub use transformer::{Helpers, Transformer};
pub use walker::{visit, walk, Visit};
