//! Data model for harvested TOP500 releases
//!
//! - `ReleaseId`: a published release, canonically `"YYYY/MM"`
//! - `SystemRecord`: the open attribute mapping of one system
//! - `ReleaseRecord`: every system of one release, keyed by rank
//! - `CrawlResult`: every release of one crawl run

mod record;
mod release_id;

pub use record::{
    CrawlResult, FailedRelease, PageExtraction, Rank, RankCollision, ReleaseRecord, SkippedEntry,
    Stage, SystemRecord,
};
pub use release_id::ReleaseId;
