//! Robots.txt handling
//!
//! The harvester only ever talks to one site, so robots.txt is fetched once
//! per run and consulted before every request.

use robotstxt::DefaultMatcher;
use reqwest::Client;

/// Robots.txt rules for the harvested site
#[derive(Debug, Clone)]
pub struct RobotsPolicy {
    /// Raw robots.txt content (empty means allow all)
    content: String,
    /// Product token matched against `User-agent` groups
    agent: String,
}

impl RobotsPolicy {
    /// Creates a policy from raw robots.txt content
    pub fn from_content(content: &str, agent: &str) -> Self {
        Self {
            content: content.to_string(),
            agent: agent.to_string(),
        }
    }

    /// Creates a permissive policy that allows everything
    ///
    /// Used when robots.txt is disabled in the configuration or cannot be
    /// retrieved.
    pub fn allow_all(agent: &str) -> Self {
        Self::from_content("", agent)
    }

    /// Checks whether a URL may be fetched
    pub fn is_allowed(&self, url: &str) -> bool {
        if self.content.is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, &self.agent, url)
    }
}

/// Fetches robots.txt from `robots_url`
///
/// Any transport failure or non-success status yields an allow-all policy;
/// the site not publishing rules is not an error.
pub async fn fetch_robots(client: &Client, robots_url: &str, agent: &str) -> RobotsPolicy {
    let response = match client.get(robots_url).send().await {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            tracing::debug!(
                "robots.txt at {} returned HTTP {}, allowing all",
                robots_url,
                response.status().as_u16()
            );
            return RobotsPolicy::allow_all(agent);
        }
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}, allowing all", robots_url, e);
            return RobotsPolicy::allow_all(agent);
        }
    };

    match response.text().await {
        Ok(body) => {
            tracing::debug!("Loaded robots.txt from {} ({} bytes)", robots_url, body.len());
            RobotsPolicy::from_content(&body, agent)
        }
        Err(e) => {
            tracing::warn!("Failed to read {}: {}, allowing all", robots_url, e);
            RobotsPolicy::allow_all(agent)
        }
    }
}
