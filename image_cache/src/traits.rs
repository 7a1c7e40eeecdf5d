use async_trait::async_trait;
use common::image_cache::DecodedImage;

use crate::errors::FetchError;

/// Downloads and decodes a single image. Called at most once per URL at a
/// time by `ImageRequester`, from the worker runtime.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch_image(&self, url: &str) -> Result<DecodedImage, FetchError>;
}
