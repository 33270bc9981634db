//! Append-only node store with file-based persistence.
//!
//! Registrations and links are stored as newline-delimited JSON (JSONL);
//! current state is derived by replaying the log in order. Appends take an
//! exclusive file lock so concurrent processes never interleave lines.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tokio::fs::{self, File};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::memory::{link, upsert};
use super::NodeStore;
use crate::core::error::StoreError;
use crate::domain::GraphNode;

/// One line of the store log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreRecord {
    /// When the operation was recorded
    pub timestamp: DateTime<Utc>,

    #[serde(flatten)]
    pub op: StoreOp,
}

/// Operations recorded in the log
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StoreOp {
    Register { node: GraphNode },
    Link { parent: String, child: String },
}

#[derive(Debug, Default)]
struct State {
    nodes: HashMap<String, GraphNode>,
    order: Vec<String>,
}

/// File-based node store using JSONL format
pub struct JsonlNodeStore {
    /// Path to the nodes.jsonl file
    path: PathBuf,

    state: Mutex<State>,
}

impl JsonlNodeStore {
    /// Open (or create) a store and replay its log
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create store directory: {}", dir.display()))?;
        }

        let mut state = State::default();
        for record in replay(&path).await? {
            apply(&mut state, record.op);
        }
        debug!(path = %path.display(), nodes = state.nodes.len(), "Opened node store");

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Open the store at the configured location
    pub async fn open_default() -> Result<Self> {
        Self::open(crate::config::store_path()?).await
    }

    /// Get the path to the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All nodes in first-registration order
    pub async fn nodes(&self) -> Vec<GraphNode> {
        let state = self.state.lock().await;
        state
            .order
            .iter()
            .filter_map(|id| state.nodes.get(id).cloned())
            .collect()
    }

    /// Nodes of one type in first-registration order
    pub async fn nodes_of_type(&self, node_type: &str) -> Vec<GraphNode> {
        self.nodes()
            .await
            .into_iter()
            .filter(|n| n.node_type() == node_type)
            .collect()
    }

    /// Append a record to the log
    async fn append(&self, op: StoreOp) -> Result<()> {
        let record = StoreRecord {
            timestamp: Utc::now(),
            op,
        };
        let line = format!(
            "{}\n",
            serde_json::to_string(&record).map_err(StoreError::from)?
        );
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open store file: {}", path.display()))?;

            file.lock_exclusive()
                .context("Failed to acquire file lock on store file")?;
            let written = file
                .write_all(line.as_bytes())
                .and_then(|_| file.flush());
            let _ = fs2::FileExt::unlock(&file);

            written.context("Failed to write store record")?;
            Ok(())
        })
        .await
        .context("Store writer task panicked")?
    }
}

/// Read all records in order
async fn replay(path: &Path) -> Result<Vec<StoreRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)
        .await
        .with_context(|| format!("Failed to open store file: {}", path.display()))?;

    let reader = BufReader::new(file);
    let mut lines = reader.lines();
    let mut records = Vec::new();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let record: StoreRecord = serde_json::from_str(&line)
            .with_context(|| format!("Failed to parse store record: {}", line))?;
        records.push(record);
    }

    Ok(records)
}

fn apply(state: &mut State, op: StoreOp) {
    match op {
        StoreOp::Register { node } => {
            upsert(&mut state.nodes, &mut state.order, node);
        }
        StoreOp::Link { parent, child } => {
            if let Err(e) = link(&mut state.nodes, &parent, &child) {
                warn!(%parent, %child, error = %e, "Skipping invalid link in store log");
            }
        }
    }
}

#[async_trait]
impl NodeStore for JsonlNodeStore {
    async fn register_node(&self, node: GraphNode) -> Result<String> {
        let mut state = self.state.lock().await;
        self.append(StoreOp::Register { node: node.clone() }).await?;
        let State { nodes, order } = &mut *state;
        Ok(upsert(nodes, order, node))
    }

    async fn link_parent_child(&self, parent: &str, child: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        for id in [parent, child] {
            if !state.nodes.contains_key(id) {
                return Err(StoreError::UnknownNode(id.to_string()).into());
            }
        }

        self.append(StoreOp::Link {
            parent: parent.to_string(),
            child: child.to_string(),
        })
        .await?;
        link(&mut state.nodes, parent, child)?;
        Ok(())
    }

    async fn get_node(&self, id: &str) -> Result<Option<GraphNode>> {
        Ok(self.state.lock().await.nodes.get(id).cloned())
    }
}
