//! Output sink traits and error types
//!
//! A sink is the persistence capability handed to the coordinator. It sees
//! each release once it is complete and the whole result once the crawl
//! ends; it never feeds anything back into the crawl.

use crate::model::{CrawlResult, ReleaseId, ReleaseRecord};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for harvested records
pub trait RecordSink {
    /// Human-readable name used in logs
    fn name(&self) -> &str;

    /// Receives one fully aggregated release
    ///
    /// Called once per successful release, newest release first.
    fn save_release(&mut self, release: &ReleaseId, record: &ReleaseRecord) -> OutputResult<()>;

    /// Receives the complete crawl result after the last release
    fn save_result(&mut self, result: &CrawlResult) -> OutputResult<()>;

    /// Called instead of `save_result` when the crawl aborts
    fn abort(&mut self, _reason: &str) -> OutputResult<()> {
        Ok(())
    }
}
