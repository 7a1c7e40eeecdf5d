use std::time::Duration;

use common::display::DisplayMetrics;

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageCacheConfig {
    pub capacity_bytes: usize,
    /// `None` lets a download hang for as long as the network does
    pub fetch_timeout: Option<Duration>,
}

impl ImageCacheConfig {
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            capacity_bytes,
            fetch_timeout: Some(Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS)),
        }
    }

    pub fn from_display(display: &DisplayMetrics) -> Self {
        Self::new(display.image_cache_budget())
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Option<Duration>) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }
}
