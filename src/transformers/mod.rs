//! Built-in transformers and their configuration.
//!
//! - `extract_all`: every image becomes an embedded-image node
//! - `thumbnail`: one standalone image becomes the document's thumbnail
//!
//! Transformers are configured in YAML:
//! ```yaml
//! transformers:
//!   - kind: extract_all
//!     parent_type: mdx
//!   - kind: thumbnail
//!     keep_image_in_tree: false
//!     parent_type: { custom_type: BlogPost }
//! ```

mod extract_all;
mod thumbnail;

use serde::{Deserialize, Serialize};

use crate::core::error::{validate_type_name, ConfigError};
use crate::core::thumbnail::ThumbnailRule;

pub use extract_all::ImageExtractor;
pub use thumbnail::ThumbnailImage;

/// Known document node type families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentPreset {
    /// Markdown documents (`MarkdownRemark`)
    Remark,

    /// MDX documents (`Mdx`)
    Mdx,
}

/// Which document node type a transformer's output is nested under.
///
/// Accepts either a preset name (`remark`, `mdx`) or
/// `{ custom_type: TypeName }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParentType {
    Preset(ParentPreset),
    Custom { custom_type: String },
}

impl Default for ParentType {
    fn default() -> Self {
        Self::Preset(ParentPreset::Remark)
    }
}

impl ParentType {
    pub fn remark() -> Self {
        Self::Preset(ParentPreset::Remark)
    }

    pub fn mdx() -> Self {
        Self::Preset(ParentPreset::Mdx)
    }

    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom {
            custom_type: name.into(),
        }
    }

    /// Resolve to a validated node type name
    pub fn node_type(&self) -> Result<String, ConfigError> {
        match self {
            ParentType::Preset(ParentPreset::Remark) => Ok("MarkdownRemark".to_string()),
            ParentType::Preset(ParentPreset::Mdx) => Ok("Mdx".to_string()),
            ParentType::Custom { custom_type } => {
                let name = custom_type.trim();
                validate_type_name(name)?;
                Ok(name.to_string())
            }
        }
    }
}

/// Options for the thumbnail transformer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailOptions {
    /// Leave the selected image in the tree instead of neutralizing it
    #[serde(default)]
    pub keep_image_in_tree: bool,

    #[serde(default)]
    pub parent_type: ParentType,

    /// Candidate qualification rule
    #[serde(default)]
    pub rule: ThumbnailRule,
}

/// A configured transformer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformerSpec {
    /// Extract every image
    ExtractAll {
        #[serde(default)]
        parent_type: ParentType,
    },

    /// Extract a single thumbnail image
    Thumbnail(ThumbnailOptions),
}

/// Transformers used when no configuration is given
pub fn default_specs() -> Vec<TransformerSpec> {
    vec![
        TransformerSpec::ExtractAll {
            parent_type: ParentType::default(),
        },
        TransformerSpec::Thumbnail(ThumbnailOptions::default()),
    ]
}
