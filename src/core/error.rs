//! Typed errors for the configuration and store layers.
//!
//! Materialization failures travel as `anyhow::Error` with context attached
//! at each layer; these enums cover the cases callers match on.

use thiserror::Error;

/// Invalid pipeline or transformer configuration.
///
/// Raised while building a pipeline, before any document is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Custom parent type must not be empty")]
    EmptyParentType,

    #[error("Invalid type name '{0}': expected letters, digits or '_' and no leading digit")]
    InvalidTypeName(String),

    #[error("Pipeline has no transformers")]
    NoTransformers,

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Errors raised by the bundled node stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Node not found: {0}")]
    UnknownNode(String),

    #[error("Node {id} cannot be its own parent")]
    SelfLink { id: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Check that `name` can be used as a graph type name.
pub fn validate_type_name(name: &str) -> Result<(), ConfigError> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(ConfigError::EmptyParentType);
    };

    let valid_first = first == '_' || first.is_ascii_alphabetic();
    if !valid_first || !chars.all(|c| c == '_' || c.is_ascii_alphanumeric()) {
        return Err(ConfigError::InvalidTypeName(name.to_string()));
    }
    Ok(())
}
