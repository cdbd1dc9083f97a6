//! Progress reporting
//!
//! The crawler never logs on its own: every progress line goes through a
//! [`Reporter`] constructed by the caller and threaded through each stage.
//! [`TracingReporter`] forwards to `tracing`; [`RecordingReporter`] keeps
//! events in memory so tests can assert on them.

use crate::model::{Rank, ReleaseId, Stage};
use std::fmt;
use std::sync::Mutex;

/// Severity of a crawl event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warn,
}

/// Something an operator may want to know about while a crawl runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlEvent {
    DiscoveryStarted {
        index_url: String,
    },
    ReleasesDiscovered {
        count: usize,
    },
    ReleaseStarted {
        release: ReleaseId,
    },
    PageStarted {
        release: ReleaseId,
        page: u32,
        url: String,
    },
    SystemStarted {
        url: String,
    },
    EntrySkipped {
        url: String,
        reason: String,
    },
    RankCollision {
        release: ReleaseId,
        rank: Rank,
        url: String,
    },
    ReleaseCompleted {
        release: ReleaseId,
        systems: usize,
        skipped: usize,
    },
    ReleaseFailed {
        release: ReleaseId,
        stage: Stage,
        url: String,
        message: String,
    },
    CrawlCompleted {
        releases: usize,
        systems: usize,
        failed: usize,
    },
}

impl CrawlEvent {
    pub fn level(&self) -> Level {
        match self {
            Self::EntrySkipped { .. } | Self::RankCollision { .. } | Self::ReleaseFailed { .. } => {
                Level::Warn
            }
            _ => Level::Info,
        }
    }
}

impl fmt::Display for CrawlEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DiscoveryStarted { index_url } => {
                write!(f, "Fetching release index {}", index_url)
            }
            Self::ReleasesDiscovered { count } => write!(f, "Discovered {} releases", count),
            Self::ReleaseStarted { release } => write!(f, "Fetching release {}", release),
            Self::PageStarted { release, page, url } => {
                write!(f, "Release {} page {}: {}", release, page, url)
            }
            Self::SystemStarted { url } => write!(f, "Fetching system {}", url),
            Self::EntrySkipped { url, reason } => write!(f, "Skipped {}: {}", url, reason),
            Self::RankCollision { release, rank, url } => write!(
                f,
                "Release {} rank {} claimed twice, keeping {}",
                release, rank, url
            ),
            Self::ReleaseCompleted {
                release,
                systems,
                skipped,
            } => write!(
                f,
                "Release {} done: {} systems, {} skipped",
                release, systems, skipped
            ),
            Self::ReleaseFailed {
                release,
                stage,
                url,
                message,
            } => write!(
                f,
                "Release {} failed during {} at {}: {}",
                release, stage, url, message
            ),
            Self::CrawlCompleted {
                releases,
                systems,
                failed,
            } => write!(
                f,
                "Crawl finished: {} releases, {} systems, {} failed releases",
                releases, systems, failed
            ),
        }
    }
}

/// Receives crawl events
pub trait Reporter: Send + Sync {
    fn report(&self, event: &CrawlEvent);
}

/// Forwards events to `tracing` at their level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: &CrawlEvent) {
        match event.level() {
            Level::Info => tracing::info!("{}", event),
            Level::Warn => tracing::warn!("{}", event),
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<CrawlEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far
    pub fn events(&self) -> Vec<CrawlEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Releases in the order their aggregation started
    pub fn started_releases(&self) -> Vec<ReleaseId> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                CrawlEvent::ReleaseStarted { release } => Some(release),
                _ => None,
            })
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: &CrawlEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
