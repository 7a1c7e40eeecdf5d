use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::{
    runtime::Handle,
    sync::{mpsc, oneshot},
    time::timeout,
};
use tracing::{debug, error, warn};

use crate::{
    config::ImageCacheConfig,
    errors::FetchError,
    handle::{BindingHandle, ImageOutcome},
    memory_cache::MemoryCache,
    traits::ImageFetcher,
};

struct PendingFetch {
    waiters: Vec<oneshot::Sender<ImageOutcome>>,
    started: Instant,
}

impl PendingFetch {
    // cancelled handles close their receiver
    fn prune(&mut self) {
        self.waiters.retain(|waiter| !waiter.is_closed());
    }
}

struct FetchCompletion {
    url: String,
    outcome: ImageOutcome,
}

/// Hands out images for URLs, downloading each URL at most once at a time.
///
/// The requester belongs to the UI task: `request` and the completion
/// methods take `&mut self` and are never called from the workers.
/// Downloads run on `runtime`, put their image into the shared cache and
/// queue a completion that is only fanned out to waiters when the UI task
/// calls `run_pending` or `next_completion`.
///
/// A cache hit is resolved into the returned handle straight away. Rows
/// still only observe it on their next dispatch pass, the same as a
/// downloaded image, so a request never changes caller state.
pub struct ImageRequester {
    cache: Arc<MemoryCache>,
    fetcher: Arc<dyn ImageFetcher>,
    runtime: Handle,
    fetch_timeout: Option<Duration>,
    pending: HashMap<String, PendingFetch>,
    completion_sender: mpsc::UnboundedSender<FetchCompletion>,
    completion_receiver: mpsc::UnboundedReceiver<FetchCompletion>,
}

impl ImageRequester {
    pub fn new(
        cache: Arc<MemoryCache>,
        fetcher: Arc<dyn ImageFetcher>,
        config: &ImageCacheConfig,
        runtime: Handle,
    ) -> Self {
        let (completion_sender, completion_receiver) = mpsc::unbounded_channel();

        Self {
            cache,
            fetcher,
            runtime,
            fetch_timeout: config.fetch_timeout,
            pending: HashMap::new(),
            completion_sender,
            completion_receiver,
        }
    }

    pub fn request(&mut self, url: &str) -> BindingHandle {
        let (sender, receiver) = oneshot::channel();
        let handle = BindingHandle::new(url, receiver);

        if let Some(image) = self.cache.get(url) {
            debug!("Memory cache hit for {}", url);
            let _ = sender.send(Ok(image));

            return handle;
        }

        if let Some(pending) = self.pending.get_mut(url) {
            debug!("Download already in flight for {}", url);
            pending.prune();
            pending.waiters.push(sender);

            return handle;
        }

        debug!("Memory cache miss, downloading {}", url);

        self.pending.insert(
            url.to_string(),
            PendingFetch {
                waiters: vec![sender],
                started: Instant::now(),
            },
        );
        self.spawn_fetch(url.to_string());

        handle
    }

    fn spawn_fetch(&self, url: String) {
        let fetcher = self.fetcher.clone();
        let cache = self.cache.clone();
        let completions = self.completion_sender.clone();
        let fetch_timeout = self.fetch_timeout;
        let runtime = self.runtime.clone();

        self.runtime.spawn(async move {
            let fetch_url = url.clone();
            let fetch = runtime.spawn(async move {
                match fetch_timeout {
                    Some(limit) => timeout(limit, fetcher.fetch_image(&fetch_url))
                        .await
                        .unwrap_or_else(|_| Err(FetchError::TimedOut(limit))),
                    None => fetcher.fetch_image(&fetch_url).await,
                }
            });

            // a panicking fetcher must still clear the pending entry
            let result = fetch.await.unwrap_or_else(|err| {
                error!("Download task for {} died: {}", url, err);
                Err(FetchError::Abandoned)
            });

            let outcome = result.map(Arc::new);

            if let Ok(image) = &outcome {
                cache.put(&url, image.clone());
            }

            // fails only once the requester has been dropped
            let _ = completions.send(FetchCompletion { url, outcome });
        });
    }

    fn complete(&mut self, completion: FetchCompletion) {
        let FetchCompletion { url, outcome } = completion;

        let Some(pending) = self.pending.remove(&url) else {
            warn!("Download of {} finished without a pending fetch", url);
            return;
        };

        let elapsed = pending.started.elapsed();

        match &outcome {
            Ok(image) => debug!(
                "Downloaded {} ({}x{}) in {}ms",
                url,
                image.width(),
                image.height(),
                elapsed.as_millis()
            ),
            Err(err) => warn!("Failed to load {}: {}", url, err),
        }

        let mut delivered = 0;

        for waiter in pending.waiters {
            if waiter.send(outcome.clone()).is_ok() {
                delivered += 1;
            }
        }

        debug!("Delivered {} to {} waiter(s)", url, delivered);
    }

    /// Fans out every download that already finished. Never blocks.
    pub fn run_pending(&mut self) -> usize {
        let mut completed = 0;

        while let Ok(completion) = self.completion_receiver.try_recv() {
            self.complete(completion);
            completed += 1;
        }

        completed
    }

    /// Waits for at least one download to finish, then fans out everything
    /// that is ready. Returns straight away when nothing is in flight.
    pub async fn next_completion(&mut self) -> usize {
        if self.pending.is_empty() {
            return self.run_pending();
        }

        let Some(completion) = self.completion_receiver.recv().await else {
            return 0;
        };

        self.complete(completion);

        1 + self.run_pending()
    }

    pub fn pending_fetches(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, url: &str) -> bool {
        self.pending.contains_key(url)
    }

    pub fn waiters(&self, url: &str) -> usize {
        self.pending.get(url).map_or(0, |pending| {
            pending
                .waiters
                .iter()
                .filter(|waiter| !waiter.is_closed())
                .count()
        })
    }

    pub fn cache(&self) -> &Arc<MemoryCache> {
        &self.cache
    }
}
