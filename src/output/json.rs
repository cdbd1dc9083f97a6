//! JSON export of harvested releases
//!
//! Writes one `top500_{year}_{period}.json` file per release as soon as it
//! is complete, and a `top500.json` holding the whole crawl result at the
//! end. Ranks become object keys.

use crate::model::{CrawlResult, ReleaseId, ReleaseRecord};
use crate::output::traits::{OutputError, OutputResult, RecordSink};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the full crawl result
pub const RESULT_FILE: &str = "top500.json";

/// Writes JSON files into a directory
#[derive(Debug, Clone)]
pub struct JsonDirSink {
    dir: PathBuf,
}

impl JsonDirSink {
    /// Creates the sink, creating `dir` if needed
    pub fn new(dir: impl Into<PathBuf>) -> OutputResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| OutputError::Write {
            path: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// Path of the file a release is written to
    pub fn release_path(&self, release: &ReleaseId) -> PathBuf {
        self.dir.join(format!("top500_{}.json", release.file_key()))
    }

    /// Path of the full crawl result
    pub fn result_path(&self) -> PathBuf {
        self.dir.join(RESULT_FILE)
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> OutputResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|source| OutputError::Write {
        path: path.display().to_string(),
        source,
    })
}

impl RecordSink for JsonDirSink {
    fn name(&self) -> &str {
        "json"
    }

    fn save_release(&mut self, release: &ReleaseId, record: &ReleaseRecord) -> OutputResult<()> {
        write_json(&self.release_path(release), record)
    }

    fn save_result(&mut self, result: &CrawlResult) -> OutputResult<()> {
        write_json(&self.result_path(), result)
    }
}
