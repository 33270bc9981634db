//! Command-line interface for mediagraph.
//!
//! Provides commands for processing documents, printing the declared
//! schema, dumping parsed trees and listing stored nodes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, error, warn};

use crate::adapters::{HttpFileSource, JsonlNodeStore, NodeStore, RemoteFileSource};
use crate::config;
use crate::core::{DocumentReport, Pipeline, SchemaRegistry};
use crate::domain::{DocumentContext, DocumentTree, GraphNode};
use crate::parse;

/// mediagraph - Extract embedded media from documents into a content graph
#[derive(Parser, Debug)]
#[command(name = "mediagraph")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the configured transformers over documents
    Process {
        /// Documents or glob patterns (.md, .json)
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Continue with the next document after a failure
        #[arg(long)]
        keep_going: bool,

        /// Write the rewritten tree next to each input (<input>.tree.json)
        #[arg(long)]
        write_tree: bool,
    },

    /// Print the types declared by the configured transformers
    Schema,

    /// Dump the parsed tree of a document as mdast JSON
    Tree {
        /// Document to parse
        input: PathBuf,
    },

    /// List nodes in the store
    Nodes {
        /// Only show nodes of this type
        #[arg(short = 't', long = "type")]
        node_type: Option<String>,

        /// Maximum number of nodes to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Process {
                inputs,
                keep_going,
                write_tree,
            } => {
                process(
                    &inputs,
                    BatchOptions {
                        keep_going,
                        write_tree,
                    },
                )
                .await
            }
            Commands::Schema => show_schema().await,
            Commands::Tree { input } => show_tree(&input).await,
            Commands::Nodes { node_type, limit } => list_nodes(node_type.as_deref(), limit).await,
            Commands::Config => show_config(),
        }
    }
}

/// Build the graph node standing for a document
pub fn document_node(
    store: &dyn NodeStore,
    node_type: &str,
    path: &Path,
    content: &str,
) -> GraphNode {
    let source = path.display().to_string();
    let id = store.create_node_id(&format!("{} >>> {}", node_type, source));
    GraphNode::new(id, node_type)
        .with_content(content)
        .with_field("fileAbsolutePath", source)
}

/// Expand glob patterns; plain paths that match nothing are kept as-is so
/// the read error names them
fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        let matches: Vec<PathBuf> = glob::glob(pattern)
            .with_context(|| format!("Invalid glob pattern: {}", pattern))?
            .filter_map(|entry| entry.ok())
            .filter(|p| p.is_file())
            .collect();

        if matches.is_empty() {
            paths.push(PathBuf::from(pattern));
        } else {
            paths.extend(matches);
        }
    }
    Ok(paths)
}

/// Run the pipeline over one document file
pub async fn process_file(
    pipeline: &Pipeline,
    document_type: &str,
    path: &Path,
    store: &dyn NodeStore,
    files: &dyn RemoteFileSource,
) -> Result<(DocumentTree, DocumentReport)> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read document: {}", path.display()))?;
    let mut tree = parse::parse_str(&content, parse::DocumentFormat::from_path(path))
        .with_context(|| format!("Failed to parse document: {}", path.display()))?;

    let node = document_node(store, document_type, path, &content);
    let doc = DocumentContext::new(node.id.clone(), document_type)
        .with_source(path.display().to_string());
    store.register_node(node).await?;

    let report = pipeline.process_document(&mut tree, &doc, store, files).await?;
    Ok((tree, report))
}

/// How a batch of documents is run
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// Continue with the next document after a failure
    pub keep_going: bool,
    /// Write the rewritten tree next to each input
    pub write_tree: bool,
}

/// Run the pipeline over each path in order. A document fails when its
/// processing or its tree write fails; returns the number processed.
pub async fn process_batch(
    pipeline: &Pipeline,
    document_type: &str,
    paths: &[PathBuf],
    store: &dyn NodeStore,
    files: &dyn RemoteFileSource,
    options: BatchOptions,
) -> Result<usize> {
    let mut failed = 0usize;

    for path in paths {
        let result = match process_file(pipeline, document_type, path, store, files).await {
            Ok((tree, report)) if options.write_tree => {
                let out = parse::tree_output_path(path);
                parse::write_tree(&out, &tree).await.map(|_| report)
            }
            other => other.map(|(_, report)| report),
        };

        match result {
            Ok(report) => {
                println!(
                    "{}  {} created, {} neutralized ({}ms)",
                    path.display(),
                    report.created_count(),
                    report.neutralized_count(),
                    report.duration_ms
                );
            }
            Err(e) if options.keep_going => {
                error!(path = %path.display(), error = %format!("{:#}", e), "Document failed");
                failed += 1;
            }
            Err(e) => return Err(e),
        }
    }

    if failed > 0 {
        warn!(failed, total = paths.len(), "Some documents failed");
        anyhow::bail!("{} of {} documents failed", failed, paths.len());
    }

    Ok(paths.len())
}

/// Process documents with the configured pipeline
async fn process(patterns: &[String], options: BatchOptions) -> Result<()> {
    let cfg = config::config()?;
    let pipeline = cfg.build_pipeline()?;

    // Declarations are checked before any document is touched; `schema` prints them
    let mut schema = SchemaRegistry::new();
    pipeline.customize_schema(&mut schema).await?;
    debug!(types = schema.types().len(), "Schema declared");

    let store = JsonlNodeStore::open(cfg.store_path()).await?;
    let files = HttpFileSource::new(cfg.cache_dir.clone(), &cfg.download)?;

    let paths = expand_inputs(patterns)?;
    process_batch(&pipeline, &cfg.document_type, &paths, &store, &files, options).await?;
    Ok(())
}

/// Print the SDL declared by the configured transformers
async fn show_schema() -> Result<()> {
    let pipeline = config::config()?.build_pipeline()?;
    let mut schema = SchemaRegistry::new();
    pipeline.customize_schema(&mut schema).await?;
    println!("{}", schema.to_sdl());
    Ok(())
}

/// Dump the parsed tree of a document
async fn show_tree(input: &Path) -> Result<()> {
    let tree = parse::load_document(input).await?;
    println!("{}", parse::json::to_string_pretty(&tree)?);
    Ok(())
}

/// List nodes in the configured store
async fn list_nodes(node_type: Option<&str>, limit: usize) -> Result<()> {
    let store = JsonlNodeStore::open_default().await?;
    let nodes = match node_type {
        Some(t) => store.nodes_of_type(t).await,
        None => store.nodes().await,
    };

    if nodes.is_empty() {
        println!("No nodes found");
        return Ok(());
    }

    println!("{:<38} {:<32} {:<38}", "ID", "TYPE", "PARENT");
    println!("{}", "-".repeat(110));

    for node in nodes.iter().take(limit) {
        println!(
            "{:<38} {:<32} {:<38}",
            node.id,
            node.node_type(),
            node.parent.as_deref().unwrap_or("-")
        );
    }

    if nodes.len() > limit {
        println!("... {} more", nodes.len() - limit);
    }

    Ok(())
}

/// Show resolved configuration
fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("mediagraph configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home (engine state): {}", cfg.home.display());
    println!("  Node store:          {}", cfg.store_path().display());
    println!("  Download cache:      {}", cfg.cache_dir.display());
    println!();
    println!("Document type: {}", cfg.document_type);
    println!();
    println!("Transformers:");
    for (i, spec) in cfg.transformers.iter().enumerate() {
        println!("  {}. {:?}", i + 1, spec);
    }
    println!();
    println!("Download:");
    println!("  Timeout:    {}s", cfg.download.timeout_seconds);
    println!("  User agent: {}", cfg.download.user_agent);
    println!("  Max size:   {} bytes", cfg.download.max_bytes);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryNodeStore;
    use tempfile::TempDir;

    #[test]
    fn test_cli_parses_process() {
        let cli = Cli::try_parse_from(["mediagraph", "process", "docs/*.md", "--keep-going"]).unwrap();
        match cli.command {
            Commands::Process {
                inputs,
                keep_going,
                write_tree,
            } => {
                assert_eq!(inputs, vec!["docs/*.md".to_string()]);
                assert!(keep_going);
                assert!(!write_tree);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_process_requires_inputs() {
        assert!(Cli::try_parse_from(["mediagraph", "process"]).is_err());
    }

    #[test]
    fn test_document_node_identity_is_stable() {
        let store = MemoryNodeStore::new();
        let a = document_node(&store, "MarkdownRemark", Path::new("a.md"), "one");
        let b = document_node(&store, "MarkdownRemark", Path::new("a.md"), "two");
        let c = document_node(&store, "MarkdownRemark", Path::new("b.md"), "one");

        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_ne!(a.internal.content_digest, b.internal.content_digest);
    }

    #[tokio::test]
    async fn test_keep_going_counts_tree_write_failures() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("a.md");
        let second = temp.path().join("b.md");
        std::fs::write(&first, "# A\n").unwrap();
        std::fs::write(&second, "# B\n").unwrap();
        // A directory where the first tree file would go
        std::fs::create_dir(parse::tree_output_path(&first)).unwrap();

        let store = MemoryNodeStore::new();
        let files = crate::adapters::HttpFileSource::new(temp.path().join("cache"), &Default::default()).unwrap();
        let paths = vec![first.clone(), second.clone()];
        let options = BatchOptions {
            keep_going: true,
            write_tree: true,
        };

        let err = process_batch(&Pipeline::new(), "MarkdownRemark", &paths, &store, &files, options)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "1 of 2 documents failed");
        assert!(parse::tree_output_path(&second).is_file());

        let stop = BatchOptions {
            keep_going: false,
            ..options
        };
        let err = process_batch(&Pipeline::new(), "MarkdownRemark", &paths, &store, &files, stop)
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to write tree"));
    }

    #[test]
    fn test_expand_inputs() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.md"), "a").unwrap();
        std::fs::write(temp.path().join("b.md"), "b").unwrap();
        std::fs::write(temp.path().join("c.txt"), "c").unwrap();

        let pattern = format!("{}/*.md", temp.path().display());
        let mut paths = expand_inputs(&[pattern, "missing.md".to_string()]).unwrap();
        paths.sort();

        assert_eq!(paths.len(), 3);
        assert!(paths.contains(&PathBuf::from("missing.md")));
        assert!(paths.iter().all(|p| p.extension().is_some_and(|e| e == "md")));
    }
}
