use std::time::Duration;

use crawler::errors::CrawlerError;
use thiserror::Error;

/// Failure delivered to every waiter of a fetch. Cloneable since one
/// failed download fans out to all rows that asked for the URL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Failed to download image: {0}")]
    Network(String),
    #[error("Image server responded with status {0}")]
    Status(u16),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Image download did not finish within {0:?}")]
    TimedOut(Duration),
    #[error("Image download was abandoned before it finished")]
    Abandoned,
}

impl From<CrawlerError> for FetchError {
    fn from(err: CrawlerError) -> Self {
        match err {
            CrawlerError::UnsuccessfulStatus(status) => Self::Status(status),
            other => Self::Network(other.to_string()),
        }
    }
}

impl From<image::ImageError> for FetchError {
    fn from(err: image::ImageError) -> Self {
        Self::Decode(err.to_string())
    }
}
