//! Dedup store abstractions for the notified-row set.
//!
//! Two interchangeable backends:
//! - `FileStore`: local JSON state file, single-writer, flushed per cycle
//! - `SupabaseStore`: shared table with a uniqueness constraint, safe
//!   across concurrent watcher instances

pub mod file;
pub mod supabase;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Config, DedupBackend};

// Re-export for convenience
pub use file::FileStore;
pub use supabase::SupabaseStore;

/// Trait for dedup store backends.
///
/// A `claim` atomically records an identifier as notified and reports
/// whether this was the first time. A false claim means "do not notify".
#[async_trait]
pub trait DedupStore: Send + Sync {
    /// Check whether an identifier has already been notified.
    async fn is_known(&self, id: &str) -> bool;

    /// Record an identifier; true if it was not previously known.
    async fn claim(&mut self, id: &str) -> bool;

    /// Persist in-memory state. A no-op for backends whose claims are
    /// already durable.
    async fn flush(&mut self) -> Result<()>;
}

/// Open the dedup store selected by the configuration.
pub async fn open_store(config: &Config) -> Result<Box<dyn DedupStore>> {
    match config.dedup.backend {
        DedupBackend::File => {
            let store = FileStore::open(&config.dedup.state_file).await;
            Ok(Box::new(store))
        }
        DedupBackend::Supabase => {
            let store = SupabaseStore::new(config)?;
            Ok(Box::new(store))
        }
    }
}
