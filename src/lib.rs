//! Top500-Harvest: a polite crawler for the TOP500 supercomputer lists
//!
//! This crate discovers every published TOP500 release, walks the paginated
//! listing of each release and extracts a flat attribute record for every
//! system from its detail page. Records are aggregated per release, keyed by
//! the rank printed on the detail page itself, and handed to pluggable sinks.

pub mod config;
pub mod crawler;
pub mod model;
pub mod output;
pub mod robots;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Top500-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Release discovery failed: {0}")]
    Discovery(Box<StageError>),

    #[error("Release {release} aborted: {source}")]
    Release {
        release: model::ReleaseId,
        source: Box<StageError>,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),
}

/// Transport-level failures while retrieving a document
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Expected HTML from {url}, got {content_type:?}")]
    ContentMismatch { url: String, content_type: String },

    #[error("URL disallowed by robots.txt: {url}")]
    RobotsDenied { url: String },
}

impl FetchError {
    /// The URL whose retrieval failed
    pub fn url(&self) -> &str {
        match self {
            Self::Http { url, .. }
            | Self::Timeout { url }
            | Self::Status { url, .. }
            | Self::ContentMismatch { url, .. }
            | Self::RobotsDenied { url } => url,
        }
    }
}

/// A document did not have the structure the crawler relies on
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("No summary row found on {url}")]
    MissingSummaryRow { url: String },

    #[error("Summary row on {url} has no rank cell")]
    MissingRankCell { url: String },

    #[error("Rank {value:?} on {url} is not a positive integer")]
    InvalidRank { url: String, value: String },

    #[error("Malformed release identifier: {0:?}")]
    InvalidReleaseId(String),
}

/// A failure annotated with the crawl stage and URL it happened at
#[derive(Debug, Error)]
#[error("{stage} failed at {url}: {source}")]
pub struct StageError {
    pub stage: model::Stage,
    pub url: String,
    #[source]
    pub source: HarvestError,
}

impl StageError {
    pub fn new(stage: model::Stage, url: impl Into<String>, source: impl Into<HarvestError>) -> Self {
        Self {
            stage,
            url: url.into(),
            source: source.into(),
        }
    }

    /// Returns true if the underlying cause is a structural extraction failure
    pub fn is_extraction(&self) -> bool {
        matches!(self.source, HarvestError::Extraction(_))
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Result type alias for Top500-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, Crawler, ReleaseSelection};
pub use model::{CrawlResult, Rank, ReleaseId, ReleaseRecord, Stage, SystemRecord};
pub use url::BaseUrl;
