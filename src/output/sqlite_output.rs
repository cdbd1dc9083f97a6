//! SQLite-backed record sink
//!
//! Each crawl opens one run row. Releases are written as soon as they are
//! aggregated, so an interrupted crawl keeps everything finished so far.

use crate::model::{CrawlResult, ReleaseId, ReleaseRecord};
use crate::output::traits::{OutputResult, RecordSink};
use crate::storage::{open_storage, RunStatus, Storage};
use std::path::Path;

/// Persists releases into the harvest database
pub struct SqliteSink {
    storage: Box<dyn Storage>,
    run_id: i64,
}

impl SqliteSink {
    /// Creates a sink on top of an existing storage backend
    ///
    /// # Arguments
    ///
    /// * `storage` - The storage backend to write to
    /// * `config_hash` - Hash of the configuration the run was started with
    pub fn new(mut storage: Box<dyn Storage>, config_hash: &str) -> OutputResult<Self> {
        let run_id = storage.create_run(config_hash)?;
        tracing::debug!("Started run {}", run_id);
        Ok(Self { storage, run_id })
    }

    /// Opens (or creates) the database at `path` and starts a run
    pub fn open(path: &Path, config_hash: &str) -> OutputResult<Self> {
        let storage = open_storage(path)?;
        Self::new(Box::new(storage), config_hash)
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }
}

impl RecordSink for SqliteSink {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn save_release(&mut self, release: &ReleaseId, record: &ReleaseRecord) -> OutputResult<()> {
        self.storage.save_release(self.run_id, release, record)?;
        Ok(())
    }

    fn save_result(&mut self, result: &CrawlResult) -> OutputResult<()> {
        for failed in &result.failed_releases {
            self.storage.record_failed_release(self.run_id, failed)?;
        }

        let status = if result.is_complete() {
            RunStatus::Completed
        } else {
            RunStatus::Partial
        };
        self.storage.complete_run(self.run_id, status)?;
        Ok(())
    }

    fn abort(&mut self, reason: &str) -> OutputResult<()> {
        tracing::debug!("Marking run {} as failed: {}", self.run_id, reason);
        self.storage.complete_run(self.run_id, RunStatus::Failed)?;
        Ok(())
    }
}
