//! Configuration for mediagraph.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (MEDIAGRAPH_HOME, MEDIAGRAPH_CACHE)
//! 2. Config file (.mediagraph/config.yaml)
//! 3. Defaults (~/.mediagraph)
//!
//! Config file discovery:
//! - Searches current directory and parents for .mediagraph/config.yaml
//! - Paths in config file are relative to the .mediagraph/ directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::error::ConfigError;
use crate::core::pipeline::Pipeline;
use crate::transformers::{default_specs, TransformerSpec};

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    /// Ordered transformer list; execution follows this order
    #[serde(default)]
    pub transformers: Option<Vec<TransformerSpec>>,
    #[serde(default)]
    pub download: Option<DownloadConfig>,
    #[serde(default)]
    pub document: Option<DocumentConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Engine state directory (relative to .mediagraph/)
    pub home: Option<String>,
    /// Download cache directory (relative to .mediagraph/)
    pub cache: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadConfig {
    pub timeout_seconds: Option<u64>,
    pub user_agent: Option<String>,
    pub max_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentConfig {
    /// Node type registered for processed documents
    pub node_type: Option<String>,
}

/// Settings for the HTTP file source
#[derive(Debug, Clone)]
pub struct DownloadSettings {
    pub timeout_seconds: u64,
    pub user_agent: String,
    pub max_bytes: u64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: format!("mediagraph/{}", env!("CARGO_PKG_VERSION")),
            max_bytes: 50 * 1024 * 1024, // 50MB
        }
    }
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to mediagraph home (engine state)
    pub home: PathBuf,
    /// Absolute path to the download cache
    pub cache_dir: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Ordered transformer specs
    pub transformers: Vec<TransformerSpec>,
    /// HTTP download settings
    pub download: DownloadSettings,
    /// Node type registered for processed documents
    pub document_type: String,
}

impl ResolvedConfig {
    /// Path to the node store log
    pub fn store_path(&self) -> PathBuf {
        self.home.join("nodes.jsonl")
    }

    /// Build the configured pipeline; configuration errors surface here,
    /// before any document is processed
    pub fn build_pipeline(&self) -> Result<Pipeline, ConfigError> {
        crate::core::error::validate_type_name(&self.document_type)?;
        Pipeline::from_specs(&self.transformers)
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".mediagraph").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
pub fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    parse_config(&content, path)
}

fn parse_config(content: &str, path: &Path) -> Result<ConfigFile, ConfigError> {
    serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Resolve a path that may be relative to the config file's directory
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Merge a parsed config file with env overrides and defaults
fn resolve(
    config: Option<(ConfigFile, PathBuf)>,
    default_home: PathBuf,
    env_home: Option<String>,
    env_cache: Option<String>,
) -> ResolvedConfig {
    let Some((config, config_path)) = config else {
        let home = env_home.map(PathBuf::from).unwrap_or(default_home);
        let cache_dir = env_cache
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join("cache"));

        return ResolvedConfig {
            home,
            cache_dir,
            config_file: None,
            transformers: default_specs(),
            download: DownloadSettings::default(),
            document_type: "MarkdownRemark".to_string(),
        };
    };

    let config_dir = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();

    let home = if let Some(env_home) = env_home {
        PathBuf::from(env_home)
    } else if let Some(ref home_path) = config.paths.home {
        resolve_path(&config_dir, home_path)
    } else {
        default_home
    };

    let cache_dir = if let Some(env_cache) = env_cache {
        PathBuf::from(env_cache)
    } else if let Some(ref cache_path) = config.paths.cache {
        resolve_path(&config_dir, cache_path)
    } else {
        home.join("cache")
    };

    let defaults = DownloadSettings::default();
    let download = match config.download {
        Some(d) => DownloadSettings {
            timeout_seconds: d.timeout_seconds.unwrap_or(defaults.timeout_seconds),
            user_agent: d.user_agent.unwrap_or(defaults.user_agent),
            max_bytes: d.max_bytes.unwrap_or(defaults.max_bytes),
        },
        None => defaults,
    };

    ResolvedConfig {
        home,
        cache_dir,
        config_file: Some(config_path),
        transformers: config.transformers.unwrap_or_else(default_specs),
        download,
        document_type: config
            .document
            .and_then(|d| d.node_type)
            .unwrap_or_else(|| "MarkdownRemark".to_string()),
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".mediagraph");

    let config = match find_config_file() {
        Some(path) => Some((load_config_file(&path)?, path)),
        None => None,
    };

    Ok(resolve(
        config,
        default_home,
        std::env::var("MEDIAGRAPH_HOME").ok(),
        std::env::var("MEDIAGRAPH_CACHE").ok(),
    ))
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

/// Get the mediagraph home directory (engine state).
pub fn mediagraph_home() -> Result<PathBuf> {
    Ok(config()?.home.clone())
}

/// Get the node store log path ($MEDIAGRAPH_HOME/nodes.jsonl)
pub fn store_path() -> Result<PathBuf> {
    Ok(config()?.store_path())
}

/// Get the download cache directory
pub fn cache_dir() -> Result<PathBuf> {
    Ok(config()?.cache_dir.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::thumbnail::ThumbnailRule;
    use crate::transformers::{ParentType, ThumbnailOptions};
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let home = PathBuf::from("/tmp/mg-home");
        let config = resolve(None, home.clone(), None, None);

        assert_eq!(config.home, home);
        assert_eq!(config.cache_dir, home.join("cache"));
        assert_eq!(config.store_path(), home.join("nodes.jsonl"));
        assert!(config.config_file.is_none());
        assert_eq!(config.transformers, default_specs());
        assert_eq!(config.document_type, "MarkdownRemark");
    }

    #[test]
    fn test_env_overrides() {
        let config = resolve(
            None,
            PathBuf::from("/default"),
            Some("/env/home".to_string()),
            Some("/env/cache".to_string()),
        );

        assert_eq!(config.home, PathBuf::from("/env/home"));
        assert_eq!(config.cache_dir, PathBuf::from("/env/cache"));
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let config_dir = temp.path().join(".mediagraph");
        std::fs::create_dir_all(&config_dir).unwrap();

        let config_path = config_dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
paths:
  home: ./state
  cache: /var/cache/mediagraph
transformers:
  - kind: thumbnail
    keep_image_in_tree: true
    rule: first_image
    parent_type: mdx
download:
  timeout_seconds: 5
document:
  node_type: Mdx
"#
        )
        .unwrap();

        let parsed = load_config_file(&config_path).unwrap();
        let config = resolve(
            Some((parsed, config_path.clone())),
            PathBuf::from("/default"),
            None,
            None,
        );

        assert_eq!(config.home, config_dir.join("state"));
        assert_eq!(config.cache_dir, PathBuf::from("/var/cache/mediagraph"));
        assert_eq!(config.config_file, Some(config_path));
        assert_eq!(config.download.timeout_seconds, 5);
        assert_eq!(config.download.max_bytes, DownloadSettings::default().max_bytes);
        assert_eq!(config.document_type, "Mdx");
        assert_eq!(
            config.transformers,
            vec![TransformerSpec::Thumbnail(ThumbnailOptions {
                keep_image_in_tree: true,
                parent_type: ParentType::mdx(),
                rule: ThumbnailRule::FirstImage,
            })]
        );
        assert_eq!(config.build_pipeline().unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_config_is_config_error() {
        let path = PathBuf::from("broken.yaml");
        let result = parse_config("version: \"1.0\"\ntransformers:\n  - kind: nope\n", &path);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_invalid_document_type_rejected() {
        let mut config = resolve(None, PathBuf::from("/h"), None, None);
        config.document_type = "Not A Type".to_string();
        assert!(config.build_pipeline().is_err());
    }
}
