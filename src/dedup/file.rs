//! Local JSON file dedup store.
//!
//! Holds the full identifier set in memory and serializes it back to disk
//! on `flush`. Not safe for concurrent writers; exactly one watcher process
//! must own the state file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::dedup::DedupStore;
use crate::error::Result;

/// File-backed dedup store.
pub struct FileStore {
    path: PathBuf,
    known: HashSet<String>,
}

impl FileStore {
    /// Open the store, loading any previously persisted identifiers.
    ///
    /// An absent, empty, or malformed state file is treated as an empty
    /// set and overwritten on the next flush, never as a fatal error.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let known = Self::load(&path).await;
        Self { path, known }
    }

    async fn load(path: &Path) -> HashSet<String> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashSet::new(),
            Err(e) => {
                log::warn!(
                    "Failed to read state file {:?}: {}. Starting with empty set.",
                    path,
                    e
                );
                return HashSet::new();
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return HashSet::new();
        }

        match serde_json::from_slice::<Vec<String>>(&bytes) {
            Ok(ids) => ids.into_iter().collect(),
            Err(e) => {
                log::warn!(
                    "Malformed state file {:?}: {}. Starting with empty set.",
                    path,
                    e
                );
                HashSet::new()
            }
        }
    }

    /// Number of identifiers currently known.
    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

#[async_trait]
impl DedupStore for FileStore {
    async fn is_known(&self, id: &str) -> bool {
        self.known.contains(id)
    }

    async fn claim(&mut self, id: &str) -> bool {
        self.known.insert(id.to_string())
    }

    async fn flush(&mut self) -> Result<()> {
        let mut ids: Vec<&String> = self.known.iter().collect();
        ids.sort();
        let bytes = serde_json::to_vec(&ids)?;

        // Write to temp, then rename, so a crash mid-write cannot corrupt
        // the previous state.
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);
        tokio::fs::rename(&tmp, &self.path).await?;

        Ok(())
    }
}
