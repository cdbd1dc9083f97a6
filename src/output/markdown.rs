//! Markdown summary generation
//!
//! Produces a human-readable report of a crawl: totals, one table row per
//! release, failed releases, skipped entries and rank collisions.

use crate::model::{CrawlResult, ReleaseId, ReleaseRecord};
use crate::output::traits::{OutputError, OutputResult, RecordSink};
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes the crawl summary once the crawl has finished
#[derive(Debug, Clone)]
pub struct MarkdownSummary {
    path: PathBuf,
    started_at: DateTime<Utc>,
}

impl MarkdownSummary {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            started_at: Utc::now(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for MarkdownSummary {
    fn name(&self) -> &str {
        "markdown"
    }

    fn save_release(&mut self, _release: &ReleaseId, _record: &ReleaseRecord) -> OutputResult<()> {
        Ok(())
    }

    fn save_result(&mut self, result: &CrawlResult) -> OutputResult<()> {
        let markdown = format_markdown_summary(result, self.started_at, Utc::now());
        generate_markdown_summary(&markdown, &self.path)
    }
}

/// Writes a formatted summary to `output_path`
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(markdown: &str, output_path: &Path) -> OutputResult<()> {
    let write = || -> std::io::Result<()> {
        let mut file = File::create(output_path)?;
        file.write_all(markdown.as_bytes())
    };

    write().map_err(|source| OutputError::Write {
        path: output_path.display().to_string(),
        source,
    })
}

/// Formats a crawl result as markdown
pub fn format_markdown_summary(
    result: &CrawlResult,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
) -> String {
    let mut md = String::new();

    md.push_str("# TOP500 Harvest Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", finished_at.to_rfc3339()));
    let duration = (finished_at - started_at).num_seconds().max(0);
    md.push_str(&format!(
        "- **Duration**: {} seconds ({:.2} minutes)\n",
        duration,
        duration as f64 / 60.0
    ));
    let status = if result.is_complete() {
        "completed"
    } else {
        "partial"
    };
    md.push_str(&format!("- **Status**: {}\n\n", status));

    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Releases**: {}\n", result.releases.len()));
    md.push_str(&format!("- **Systems**: {}\n", result.total_systems()));
    md.push_str(&format!(
        "- **Failed Releases**: {}\n",
        result.failed_releases.len()
    ));
    md.push_str(&format!(
        "- **Skipped Entries**: {}\n",
        result.skipped_entries().count()
    ));
    md.push_str(&format!(
        "- **Rank Collisions**: {}\n\n",
        result.rank_collisions().count()
    ));

    if !result.releases.is_empty() {
        md.push_str("## Releases\n\n");
        md.push_str("| Release | Systems | Skipped | Top System |\n");
        md.push_str("|---------|---------|---------|------------|\n");
        for (release, record) in result.newest_first() {
            let top = record
                .get(1)
                .and_then(|system| system.get("Name").or_else(|| system.get("System")))
                .map(String::as_str)
                .unwrap_or("-");
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                release,
                record.len(),
                record.skipped.len(),
                top
            ));
        }
        md.push('\n');
    }

    if !result.failed_releases.is_empty() {
        md.push_str("## Failed Releases\n\n");
        md.push_str("| Release | Stage | URL | Error |\n");
        md.push_str("|---------|-------|-----|-------|\n");
        for failed in &result.failed_releases {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                failed.release, failed.stage, failed.url, failed.message
            ));
        }
        md.push('\n');
    }

    let skipped: Vec<_> = result.skipped_entries().collect();
    if !skipped.is_empty() {
        md.push_str("## Skipped Entries\n\n");
        md.push_str("| Release | URL | Reason |\n");
        md.push_str("|---------|-----|--------|\n");
        for (release, entry) in skipped.iter().take(50) {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                release, entry.url, entry.reason
            ));
        }
        if skipped.len() > 50 {
            md.push_str(&format!("\n... and {} more\n", skipped.len() - 50));
        }
        md.push('\n');
    }

    let collisions: Vec<_> = result.rank_collisions().collect();
    if !collisions.is_empty() {
        md.push_str("## Rank Collisions\n\n");
        md.push_str("| Release | Rank | Kept URL |\n");
        md.push_str("|---------|------|----------|\n");
        for (release, collision) in collisions {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                release, collision.rank, collision.url
            ));
        }
        md.push('\n');
    }

    md
}
