//! Courtesy pacing between listing pages
//!
//! A fixed pause after each listing page keeps the crawl from hammering the
//! site. It is not adaptive and does not react to errors.

use std::time::Duration;

/// Fixed delay inserted after each listing page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    delay: Duration,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// A pacer that never sleeps
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_enabled(&self) -> bool {
        !self.delay.is_zero()
    }

    /// Sleeps for the configured delay
    pub async fn pause(&self) {
        if self.is_enabled() {
            tracing::trace!("Pacing for {:?}", self.delay);
            tokio::time::sleep(self.delay).await;
        }
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
