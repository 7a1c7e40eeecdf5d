use std::collections::BTreeMap;

use common::product::ProductEntry;
use image_cache::ImageRequester;
use tracing::{debug, info};

use crate::{
    errors::AdapterError,
    row::{ProductRow, RowId},
};

/// Binds products to a pool of reusable rows.
///
/// Row slots are created once by the view layer and then bound to
/// whichever position scrolls into them. Rebinding a slot always drops
/// its previous image subscription first, so a slow download for an old
/// position can never overwrite the current one.
#[derive(Debug, Default)]
pub struct ProductAdapter {
    products: Vec<ProductEntry>,
    rows: BTreeMap<RowId, ProductRow>,
    next_row: usize,
    generation: u64,
    refresh_requested: bool,
}

impl ProductAdapter {
    pub fn new(products: Vec<ProductEntry>) -> Self {
        Self {
            products,
            ..Default::default()
        }
    }

    pub fn row_count(&self) -> usize {
        self.products.len()
    }

    /// Replaces the whole listing and asks the view layer for a full refresh
    pub fn set_products(&mut self, products: Vec<ProductEntry>) {
        self.products = products;
        self.generation += 1;
        self.refresh_requested = true;

        info!(
            "Product list replaced ({} products, generation {})",
            self.products.len(),
            self.generation
        );
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn take_refresh(&mut self) -> bool {
        std::mem::take(&mut self.refresh_requested)
    }

    pub fn create_row(&mut self) -> RowId {
        let id = RowId(self.next_row);
        self.next_row += 1;
        self.rows.insert(id, ProductRow::new(id));

        id
    }

    pub fn row(&self, id: RowId) -> Option<&ProductRow> {
        self.rows.get(&id)
    }

    pub fn rows(&self) -> impl Iterator<Item = &ProductRow> {
        self.rows.values()
    }

    pub fn bind(
        &mut self,
        row: RowId,
        position: usize,
        requester: &mut ImageRequester,
    ) -> Result<(), AdapterError> {
        let Some(product) = self.products.get(position) else {
            return Err(AdapterError::PositionOutOfRange {
                position,
                row_count: self.products.len(),
            });
        };

        let slot = self.rows.get_mut(&row).ok_or(AdapterError::UnknownRow(row))?;

        slot.bind(position, product.clone());
        slot.attach(requester.request(&product.url));

        debug!("Bound row {} to position {} ({})", row, position, product.title);

        Ok(())
    }

    pub fn recycle(&mut self, row: RowId) -> Result<(), AdapterError> {
        let slot = self.rows.get_mut(&row).ok_or(AdapterError::UnknownRow(row))?;
        slot.unbind();

        Ok(())
    }

    /// Rebinds every bound row after `set_products`. Rows whose position no
    /// longer exists are recycled.
    pub fn refresh(&mut self, requester: &mut ImageRequester) -> Result<(), AdapterError> {
        let bound: Vec<(RowId, usize)> = self
            .rows
            .values()
            .filter_map(|row| row.position().map(|position| (row.id(), position)))
            .collect();

        for (row, position) in bound {
            if position < self.products.len() {
                self.bind(row, position, requester)?;
            } else {
                self.recycle(row)?;
            }
        }

        Ok(())
    }

    /// Fans out finished downloads and applies every outcome that reached a
    /// row. Returns how many rows changed.
    pub fn dispatch_pending(&mut self, requester: &mut ImageRequester) -> usize {
        requester.run_pending();

        self.rows
            .values_mut()
            .map(ProductRow::poll)
            .filter(|changed| *changed)
            .count()
    }

    pub fn has_pending_images(&self) -> bool {
        self.rows.values().any(ProductRow::is_waiting)
    }

    /// Drives downloads until no bound row is waiting for its image
    pub async fn wait_for_images(&mut self, requester: &mut ImageRequester) -> usize {
        let mut updated = self.dispatch_pending(requester);

        while self.has_pending_images() {
            requester.next_completion().await;
            updated += self.dispatch_pending(requester);
        }

        updated
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use image_cache::{FetchError, ImageCacheConfig, MemoryCache, testing::StubFetcher};
    use tokio::runtime::Handle;

    use super::*;
    use crate::row::{RowImage, RowState};

    fn products() -> Vec<ProductEntry> {
        vec![
            ProductEntry::new("Vagabond sack", "$120", "https://example.com/sack.png"),
            ProductEntry::new("Stella sunglasses", "$58", "https://example.com/glasses.png"),
            ProductEntry::new("Whitney belt", "$35", "https://example.com/belt.png"),
            ProductEntry::new("Garden strand", "$98", "https://example.com/sack.png"),
        ]
    }

    fn requester(fetcher: &Arc<StubFetcher>) -> ImageRequester {
        let config = ImageCacheConfig::new(100_000);

        ImageRequester::new(
            Arc::new(MemoryCache::new(config.capacity_bytes)),
            fetcher.clone(),
            &config,
            Handle::current(),
        )
    }

    #[tokio::test]
    async fn bind_sets_text_and_waits_for_image() {
        let fetcher = Arc::new(StubFetcher::new());
        let mut requester = requester(&fetcher);
        let mut adapter = ProductAdapter::new(products());
        let row = adapter.create_row();

        adapter.bind(row, 1, &mut requester).unwrap();

        let slot = adapter.row(row).unwrap();
        assert_eq!(slot.title(), Some("Stella sunglasses"));
        assert_eq!(slot.price(), Some("$58"));
        assert_eq!(slot.state(), &RowState::Binding);

        adapter.wait_for_images(&mut requester).await;

        assert!(adapter.row(row).unwrap().image().is_some());
        assert!(!adapter.has_pending_images());
    }

    #[tokio::test]
    async fn cache_hit_is_applied_on_dispatch() {
        let fetcher = Arc::new(StubFetcher::new());
        let mut requester = requester(&fetcher);
        let mut adapter = ProductAdapter::new(products());
        let first = adapter.create_row();
        let second = adapter.create_row();

        adapter.bind(first, 0, &mut requester).unwrap();
        adapter.wait_for_images(&mut requester).await;

        // same URL, already cached
        adapter.bind(second, 3, &mut requester).unwrap();
        assert_eq!(adapter.row(second).unwrap().state(), &RowState::Binding);

        assert_eq!(adapter.dispatch_pending(&mut requester), 1);
        assert!(Arc::ptr_eq(
            adapter.row(first).unwrap().image().unwrap(),
            adapter.row(second).unwrap().image().unwrap()
        ));
        assert_eq!(fetcher.call_count("https://example.com/sack.png"), 1);
    }

    #[tokio::test]
    async fn rows_sharing_a_url_share_one_download() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.hold("https://example.com/sack.png");
        let mut requester = requester(&fetcher);
        let mut adapter = ProductAdapter::new(products());
        let first = adapter.create_row();
        let second = adapter.create_row();

        adapter.bind(first, 0, &mut requester).unwrap();
        adapter.bind(second, 3, &mut requester).unwrap();
        assert_eq!(requester.pending_fetches(), 1);

        fetcher.release("https://example.com/sack.png");
        adapter.wait_for_images(&mut requester).await;

        assert!(adapter.row(first).unwrap().image().is_some());
        assert!(adapter.row(second).unwrap().image().is_some());
        assert_eq!(fetcher.calls().len(), 1);
        assert!(requester.cache().contains("https://example.com/sack.png"));
    }

    #[tokio::test]
    async fn stale_download_never_overwrites_rebound_row() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.hold("https://example.com/sack.png");
        fetcher.set_size("https://example.com/glasses.png", 2, 3);
        let mut requester = requester(&fetcher);
        let mut adapter = ProductAdapter::new(products());
        let row = adapter.create_row();

        adapter.bind(row, 0, &mut requester).unwrap();
        adapter.recycle(row).unwrap();
        assert_eq!(adapter.row(row).unwrap().state(), &RowState::Unbound);

        adapter.bind(row, 1, &mut requester).unwrap();
        adapter.wait_for_images(&mut requester).await;

        fetcher.release("https://example.com/sack.png");
        requester.next_completion().await;
        assert_eq!(adapter.dispatch_pending(&mut requester), 0);

        let slot = adapter.row(row).unwrap();
        assert_eq!(slot.title(), Some("Stella sunglasses"));
        assert_eq!(slot.image().unwrap().width(), 2);
        assert_eq!(slot.image().unwrap().height(), 3);
    }

    #[tokio::test]
    async fn rebinding_without_recycle_drops_the_old_subscription() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.hold("https://example.com/sack.png");
        let mut requester = requester(&fetcher);
        let mut adapter = ProductAdapter::new(products());
        let row = adapter.create_row();

        adapter.bind(row, 0, &mut requester).unwrap();
        adapter.bind(row, 2, &mut requester).unwrap();

        assert_eq!(requester.waiters("https://example.com/sack.png"), 0);

        fetcher.release("https://example.com/sack.png");
        adapter.wait_for_images(&mut requester).await;
        requester.next_completion().await;
        adapter.dispatch_pending(&mut requester);

        assert_eq!(adapter.row(row).unwrap().title(), Some("Whitney belt"));
        assert!(adapter.row(row).unwrap().image().is_some());
    }

    #[tokio::test]
    async fn binding_same_position_twice_is_idempotent() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.hold("https://example.com/glasses.png");
        let mut requester = requester(&fetcher);
        let mut adapter = ProductAdapter::new(products());
        let row = adapter.create_row();

        adapter.bind(row, 1, &mut requester).unwrap();
        adapter.bind(row, 1, &mut requester).unwrap();
        assert_eq!(requester.waiters("https://example.com/glasses.png"), 1);

        fetcher.release("https://example.com/glasses.png");
        adapter.wait_for_images(&mut requester).await;
        let first_image = adapter.row(row).unwrap().image().unwrap().clone();

        adapter.bind(row, 1, &mut requester).unwrap();
        adapter.wait_for_images(&mut requester).await;

        assert!(Arc::ptr_eq(
            &first_image,
            adapter.row(row).unwrap().image().unwrap()
        ));
        assert_eq!(adapter.row(row).unwrap().position(), Some(1));
        assert_eq!(fetcher.call_count("https://example.com/glasses.png"), 1);
    }

    #[tokio::test]
    async fn failed_image_shows_placeholder_without_affecting_others() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.fail(
            "https://example.com/belt.png",
            FetchError::Network("connection reset".into()),
        );
        let mut requester = requester(&fetcher);
        let mut adapter = ProductAdapter::new(products());
        let broken = adapter.create_row();
        let healthy = adapter.create_row();

        adapter.bind(broken, 2, &mut requester).unwrap();
        adapter.bind(healthy, 1, &mut requester).unwrap();
        adapter.wait_for_images(&mut requester).await;

        assert_eq!(
            adapter.row(broken).unwrap().state(),
            &RowState::Bound(RowImage::Placeholder)
        );
        assert_eq!(adapter.row(broken).unwrap().title(), Some("Whitney belt"));
        assert!(adapter.row(healthy).unwrap().image().is_some());
    }

    #[tokio::test]
    async fn server_error_status_shows_placeholder() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.fail("https://example.com/glasses.png", FetchError::Status(500));
        let mut requester = requester(&fetcher);
        let mut adapter = ProductAdapter::new(products());
        let row = adapter.create_row();

        adapter.bind(row, 1, &mut requester).unwrap();
        adapter.wait_for_images(&mut requester).await;

        let slot = adapter.row(row).unwrap();
        assert_eq!(slot.state(), &RowState::Bound(RowImage::Placeholder));
        assert_eq!(slot.price(), Some("$58"));
        assert!(!requester.cache().contains("https://example.com/glasses.png"));
    }

    #[tokio::test]
    async fn bind_rejects_unknown_rows_and_positions() {
        let fetcher = Arc::new(StubFetcher::new());
        let mut requester = requester(&fetcher);
        let mut adapter = ProductAdapter::new(products());
        let row = adapter.create_row();

        assert_eq!(
            adapter.bind(row, 4, &mut requester),
            Err(AdapterError::PositionOutOfRange {
                position: 4,
                row_count: 4
            })
        );
        assert_eq!(
            adapter.bind(RowId(99), 0, &mut requester),
            Err(AdapterError::UnknownRow(RowId(99)))
        );
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn set_products_requests_full_refresh() {
        let fetcher = Arc::new(StubFetcher::new());
        let mut requester = requester(&fetcher);
        let mut adapter = ProductAdapter::new(products());
        let first = adapter.create_row();
        let last = adapter.create_row();
        adapter.bind(first, 0, &mut requester).unwrap();
        adapter.bind(last, 3, &mut requester).unwrap();
        assert!(!adapter.take_refresh());

        let mut reversed = products();
        reversed.reverse();
        reversed.truncate(2);
        adapter.set_products(reversed);

        assert_eq!(adapter.row_count(), 2);
        assert_eq!(adapter.generation(), 1);
        assert!(adapter.take_refresh());
        assert!(!adapter.take_refresh());

        adapter.refresh(&mut requester).unwrap();
        adapter.wait_for_images(&mut requester).await;

        assert_eq!(adapter.row(first).unwrap().title(), Some("Garden strand"));
        assert_eq!(adapter.row(last).unwrap().state(), &RowState::Unbound);
    }
}
