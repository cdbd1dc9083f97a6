//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::model::{FailedRelease, ReleaseId, ReleaseRecord};
use crate::storage::{ReleaseSummary, RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Release not found: {0}")]
    ReleaseNotFound(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines every database operation the harvester and its
/// reporting commands need.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Marks a run as finished with the given status and a finish timestamp
    fn complete_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    // ===== Releases =====

    /// Persists one release, replacing any earlier copy of the same release
    ///
    /// Systems, attributes, skipped entries and rank collisions are written
    /// in a single transaction.
    fn save_release(
        &mut self,
        run_id: i64,
        release: &ReleaseId,
        record: &ReleaseRecord,
    ) -> StorageResult<()>;

    /// Loads a stored release back into memory
    fn load_release(&self, release: &ReleaseId) -> StorageResult<ReleaseRecord>;

    /// Lists stored releases, newest first
    fn list_releases(&self) -> StorageResult<Vec<ReleaseSummary>>;

    /// Records a release that could not be aggregated
    fn record_failed_release(&mut self, run_id: i64, failed: &FailedRelease) -> StorageResult<()>;

    /// Gets the failed releases of a run
    fn get_failed_releases(&self, run_id: i64) -> StorageResult<Vec<FailedRelease>>;

    // ===== Statistics =====

    /// Total number of stored systems across all releases
    fn count_systems(&self) -> StorageResult<u64>;

    /// Distinct values of one attribute with the number of systems carrying each
    ///
    /// Sorted by count descending, then value.
    fn attribute_value_counts(&self, attribute: &str) -> StorageResult<Vec<(String, u64)>>;
}
