//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester:
//! - Building the HTTP client with a descriptive user agent and timeouts
//! - Consulting robots.txt before each request
//! - GET requests returning parsed HTML documents
//! - Error classification (timeouts, non-success status, non-HTML bodies)
//!
//! There are no retries. Any failure is returned to the caller as a
//! [`FetchError`] carrying the URL.

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::crawler::document::Document;
use crate::robots::{fetch_robots, RobotsPolicy};
use crate::url::BaseUrl;
use crate::FetchError;
use reqwest::{redirect::Policy, Client};

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `crawler` - Timeouts come from here
///
/// # Example
///
/// ```no_run
/// use top500_harvest::config::{CrawlerConfig, UserAgentConfig};
/// use top500_harvest::crawler::build_http_client;
///
/// let user_agent = UserAgentConfig {
///     crawler_name: "Top500Harvest".to_string(),
///     crawler_version: "0.1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&user_agent, &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(crawler.request_timeout())
        .connect_timeout(crawler.connect_timeout())
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Retrieves documents from the harvested site
pub struct Fetcher {
    client: Client,
    robots: RobotsPolicy,
}

impl Fetcher {
    /// Creates a fetcher that ignores robots.txt
    pub fn new(client: Client, agent: &str) -> Self {
        Self {
            client,
            robots: RobotsPolicy::allow_all(agent),
        }
    }

    /// Creates a fetcher honouring the site's robots.txt
    pub async fn with_robots(client: Client, base_url: &BaseUrl, agent: &str) -> Self {
        let robots = fetch_robots(&client, &base_url.robots_url(), agent).await;
        Self { client, robots }
    }

    /// Creates a fetcher with an explicit robots policy
    pub fn with_policy(client: Client, robots: RobotsPolicy) -> Self {
        Self { client, robots }
    }

    /// Fetches `url` and parses the body as HTML
    ///
    /// # Errors
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | Disallowed by robots.txt | `RobotsDenied` |
    /// | Timeout | `Timeout` |
    /// | Connection or body read failure | `Http` |
    /// | Non-2xx status | `Status` |
    /// | Content-Type not `text/html` | `ContentMismatch` |
    pub async fn fetch(&self, url: &str) -> Result<Document, FetchError> {
        if !self.robots.is_allowed(url) {
            return Err(FetchError::RobotsDenied {
                url: url.to_string(),
            });
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !content_type.contains("text/html") {
            return Err(FetchError::ContentMismatch {
                url: url.to_string(),
                content_type,
            });
        }

        let body = response.text().await.map_err(|e| classify(url, e))?;
        Ok(Document::parse(url, &body))
    }
}

/// Maps a transport error onto the fetch error taxonomy
fn classify(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
