//! Document loading.
//!
//! Markdown goes through pulldown-cmark; `.json` files are read as mdast.

pub mod json;
pub mod markdown;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;

use crate::domain::DocumentTree;

/// Source format of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Markdown,
    Json,
}

impl DocumentFormat {
    /// Pick the format from a file extension (markdown unless `.json`)
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Markdown,
        }
    }
}

/// Parse document content in the given format
pub fn parse_str(content: &str, format: DocumentFormat) -> Result<DocumentTree> {
    match format {
        DocumentFormat::Markdown => Ok(markdown::parse(content)),
        DocumentFormat::Json => json::parse(content),
    }
}

/// Read and parse a document from disk
pub async fn load_document(path: &Path) -> Result<DocumentTree> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read document: {}", path.display()))?;

    parse_str(&content, DocumentFormat::from_path(path))
        .with_context(|| format!("Failed to parse document: {}", path.display()))
}

/// Where the rewritten tree of `input` is written
pub fn tree_output_path(input: &Path) -> PathBuf {
    let mut name = input
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tree.json");
    input.with_file_name(name)
}

/// Write a tree as mdast JSON
pub async fn write_tree(path: &Path, tree: &DocumentTree) -> Result<()> {
    let json = json::to_string_pretty(tree)?;
    fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write tree: {}", path.display()))
}
