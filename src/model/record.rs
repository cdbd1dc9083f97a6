//! System, release and crawl records

use crate::model::ReleaseId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A system's position within one release, as printed on its detail page
pub type Rank = u32;

/// Attribute label → value, taken verbatim from a detail page
///
/// There is no fixed schema: labels drift across decades of releases, so
/// consumers must treat every key as optional.
pub type SystemRecord = BTreeMap<String, String>;

/// Crawl stage at which a failure occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Fetching or scanning the release index
    Discovery,

    /// Fetching or scanning one paginated listing page
    ListingPage,

    /// Fetching or scanning one system's detail page
    SystemDetail,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::ListingPage => "listing_page",
            Self::SystemDetail => "system_detail",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "discovery" => Some(Self::Discovery),
            "listing_page" => Some(Self::ListingPage),
            "system_detail" => Some(Self::SystemDetail),
            _ => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Discovery => "release discovery",
            Self::ListingPage => "listing page",
            Self::SystemDetail => "system detail",
        })
    }
}

/// A detail page that was skipped because its structure was unusable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    /// The detail page URL
    pub url: String,

    /// The listing page that linked to it
    pub page_url: String,

    /// Why extraction failed
    pub reason: String,
}

/// A rank that was claimed by two different systems within one release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankCollision {
    pub rank: Rank,

    /// Detail page of the record that won (the later one)
    pub url: String,
}

/// Systems extracted from a single listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageExtraction {
    /// Systems in the order their detail pages were visited
    pub systems: Vec<(Rank, SystemRecord, String)>,

    /// Entries whose detail page could not be extracted
    pub skipped: Vec<SkippedEntry>,
}

impl PageExtraction {
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty() && self.skipped.is_empty()
    }
}

/// Every system of one release, keyed by rank
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRecord {
    pub systems: BTreeMap<Rank, SystemRecord>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedEntry>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rank_collisions: Vec<RankCollision>,
}

impl ReleaseRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a system under its rank
    ///
    /// Last write wins. When a *different* record already held the rank the
    /// collision is recorded and returned so the caller can report it.
    pub fn insert(
        &mut self,
        rank: Rank,
        record: SystemRecord,
        source_url: &str,
    ) -> Option<RankCollision> {
        let previous = self.systems.insert(rank, record);

        match previous {
            Some(prev) if self.systems.get(&rank) != Some(&prev) => {
                let collision = RankCollision {
                    rank,
                    url: source_url.to_string(),
                };
                self.rank_collisions.push(collision.clone());
                Some(collision)
            }
            _ => None,
        }
    }

    /// Merges one page's extraction, returning any rank collisions it caused
    pub fn merge(&mut self, page: PageExtraction) -> Vec<RankCollision> {
        let mut collisions = Vec::new();

        for (rank, record, url) in page.systems {
            if let Some(collision) = self.insert(rank, record, &url) {
                collisions.push(collision);
            }
        }

        self.skipped.extend(page.skipped);
        collisions
    }

    pub fn get(&self, rank: Rank) -> Option<&SystemRecord> {
        self.systems.get(&rank)
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Ranks present, ascending
    pub fn ranks(&self) -> impl Iterator<Item = Rank> + '_ {
        self.systems.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Rank, &SystemRecord)> {
        self.systems.iter()
    }
}

/// A release whose aggregation was aborted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedRelease {
    pub release: ReleaseId,
    pub stage: Stage,
    pub url: String,
    pub message: String,
}

/// Every release harvested by one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlResult {
    pub releases: BTreeMap<ReleaseId, ReleaseRecord>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_releases: Vec<FailedRelease>,
}

impl CrawlResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of systems across all releases
    pub fn total_systems(&self) -> usize {
        self.releases.values().map(ReleaseRecord::len).sum()
    }

    /// Every skipped entry across all releases
    pub fn skipped_entries(&self) -> impl Iterator<Item = (&ReleaseId, &SkippedEntry)> {
        self.releases
            .iter()
            .flat_map(|(id, release)| release.skipped.iter().map(move |entry| (id, entry)))
    }

    /// Every rank collision across all releases
    pub fn rank_collisions(&self) -> impl Iterator<Item = (&ReleaseId, &RankCollision)> {
        self.releases
            .iter()
            .flat_map(|(id, release)| release.rank_collisions.iter().map(move |c| (id, c)))
    }

    /// True when nothing was skipped and no release failed
    pub fn is_complete(&self) -> bool {
        self.failed_releases.is_empty() && self.skipped_entries().next().is_none()
    }

    /// Releases newest first
    pub fn newest_first(&self) -> impl Iterator<Item = (&ReleaseId, &ReleaseRecord)> {
        self.releases.iter().rev()
    }
}
