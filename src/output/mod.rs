//! Output module: progress reporting and persistence of harvested records
//!
//! This module handles:
//! - Reporting crawl progress through the [`Reporter`] capability
//! - Persisting releases through [`RecordSink`]s (SQLite, JSON, markdown)
//! - Statistics over the harvest database

mod json;
mod markdown;
pub mod reporter;
mod sqlite_output;
pub mod stats;
mod traits;

pub use json::JsonDirSink;
pub use markdown::{format_markdown_summary, generate_markdown_summary, MarkdownSummary};
pub use reporter::{CrawlEvent, Level, RecordingReporter, Reporter, TracingReporter};
pub use sqlite_output::SqliteSink;
pub use stats::{load_statistics, print_statistics, CrawlStatistics, DEFAULT_ATTRIBUTE};
pub use traits::{OutputError, OutputResult, RecordSink};

use crate::config::Config;
use std::path::Path;

/// Builds the sinks described by the `[output]` section
///
/// The database sink always comes first, followed by the JSON directory
/// when `release-dir` is set and finally the markdown summary.
///
/// # Arguments
///
/// * `config` - The loaded configuration
/// * `config_hash` - Hash recorded with the run row
pub fn sinks_from_config(config: &Config, config_hash: &str) -> OutputResult<Vec<Box<dyn RecordSink>>> {
    let mut sinks: Vec<Box<dyn RecordSink>> = Vec::new();

    sinks.push(Box::new(SqliteSink::open(
        Path::new(&config.output.database_path),
        config_hash,
    )?));

    if let Some(dir) = &config.output.release_dir {
        sinks.push(Box::new(JsonDirSink::new(dir)?));
    }

    sinks.push(Box::new(MarkdownSummary::new(&config.output.summary_path)));

    Ok(sinks)
}
