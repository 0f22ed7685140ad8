// src/models/mod.rs

//! Domain models for the watcher application.

mod config;
mod row;

// Re-export all public types
pub use config::{
    Config, DedupBackend, DedupConfig, FilterConfig, SheetConfig, SupabaseConfig, TelegramConfig,
    WatcherConfig,
};
pub use row::{MatchedRow, Row, Snapshot};
