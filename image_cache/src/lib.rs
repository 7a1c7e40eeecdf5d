pub mod config;
pub mod errors;
mod handle;
pub(crate) mod memory_cache;
mod network;
mod requester;
pub(crate) mod traits;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::ImageCacheConfig;
pub use errors::FetchError;
pub use handle::{BindingHandle, ImageOutcome};
pub use memory_cache::{CacheStats, MemoryCache};
pub use network::HttpImageFetcher;
pub use requester::ImageRequester;
pub use traits::ImageFetcher;
