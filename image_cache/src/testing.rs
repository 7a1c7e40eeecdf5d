//! In-memory `ImageFetcher` whose downloads can be held open, failed,
//! sized or made to panic per URL, so tests decide exactly when and how a
//! fetch resolves.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use common::image_cache::DecodedImage;
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::{errors::FetchError, traits::ImageFetcher};

const DEFAULT_SIDE: u32 = 4;

#[derive(Default)]
pub struct StubFetcher {
    calls: Mutex<Vec<String>>,
    held: Mutex<HashMap<String, watch::Sender<bool>>>,
    failures: Mutex<HashMap<String, FetchError>>,
    sizes: Mutex<HashMap<String, (u32, u32)>>,
    panics: Mutex<HashSet<String>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Downloads of `url` block until `release` is called for it
    pub fn hold(&self, url: &str) {
        let (gate, _) = watch::channel(false);
        self.held.lock().insert(url.to_string(), gate);
    }

    pub fn release(&self, url: &str) {
        if let Some(gate) = self.held.lock().get(url) {
            gate.send_replace(true);
        }
    }

    pub fn fail(&self, url: &str, error: FetchError) {
        self.failures.lock().insert(url.to_string(), error);
    }

    pub fn panic_on(&self, url: &str) {
        self.panics.lock().insert(url.to_string());
    }

    pub fn set_size(&self, url: &str, width: u32, height: u32) {
        self.sizes.lock().insert(url.to_string(), (width, height));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls.lock().iter().filter(|call| *call == url).count()
    }
}

#[async_trait]
impl ImageFetcher for StubFetcher {
    async fn fetch_image(&self, url: &str) -> Result<DecodedImage, FetchError> {
        self.calls.lock().push(url.to_string());

        let gate = self.held.lock().get(url).map(|gate| gate.subscribe());
        if let Some(mut gate) = gate {
            let _ = gate.wait_for(|released| *released).await;
        }

        if self.panics.lock().contains(url) {
            panic!("fetcher blew up on {url}");
        }

        let failure = self.failures.lock().get(url).cloned();
        if let Some(error) = failure {
            return Err(error);
        }

        let size = self.sizes.lock().get(url).copied();
        let (width, height) = size.unwrap_or((DEFAULT_SIDE, DEFAULT_SIDE));

        Ok(DecodedImage::blank(width, height))
    }
}
