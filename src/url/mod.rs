//! URL scheme of the TOP500 site
//!
//! The crawler depends on a handful of fixed URL shapes. They are built here
//! from a validated base URL so the rest of the crate never formats paths.
//!
//! - Release index: `{base}/lists/top500`
//! - Release page: `{base}/list/{release}/?page={n}`
//! - System detail: `{base}{href}` where `href` starts with `/system`

use crate::model::ReleaseId;
use crate::UrlError;
use std::fmt;
use url::Url;

/// Number of listing pages per release (100 systems each)
pub const PAGES_PER_RELEASE: u32 = 5;

/// Validated site root without a trailing slash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl(String);

impl BaseUrl {
    /// Parses and validates a base URL
    ///
    /// # Examples
    ///
    /// ```
    /// use top500_harvest::url::BaseUrl;
    ///
    /// let base = BaseUrl::parse("https://www.top500.org/").unwrap();
    /// assert_eq!(base.as_str(), "https://www.top500.org");
    /// assert_eq!(base.index_url(), "https://www.top500.org/lists/top500");
    /// ```
    pub fn parse(url_str: &str) -> Result<Self, UrlError> {
        let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UrlError::InvalidScheme(format!(
                "Only HTTP and HTTPS schemes are supported, got: {}",
                url.scheme()
            )));
        }

        if url.host_str().is_none() {
            return Err(UrlError::MissingHost(url_str.to_string()));
        }

        let mut normalized = url.to_string();
        while normalized.ends_with('/') {
            normalized.pop();
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Page listing every published release
    pub fn index_url(&self) -> String {
        format!("{}/lists/top500", self.0)
    }

    /// One page of a release's paginated listing
    pub fn release_page_url(&self, release: &ReleaseId, page: u32) -> String {
        format!("{}/list/{}/?page={}", self.0, release, page)
    }

    /// Detail page of a system, from the site-relative href on a listing page
    pub fn system_url(&self, href: &str) -> String {
        format!("{}{}", self.0, href)
    }

    pub fn robots_url(&self) -> String {
        format!("{}/robots.txt", self.0)
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
