use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use common::{
    catalog::{header_product, read_products, shuffle_products},
    display::DisplayMetrics,
};
use image_cache::{BindingHandle, HttpImageFetcher, ImageCacheConfig, ImageRequester, MemoryCache};
use mimalloc::MiMalloc;
use product_list::{ProductAdapter, RowId, RowImage, RowState};
use tokio::runtime::{Builder, Handle};
use tracing::{error, info, warn};
use utils::{errors::ShrineError, logger::configure_logger};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser, Debug)]
#[command(about = "Loads the Shrine catalog and binds product images into list rows")]
struct Args {
    /// JSON array of {title, price, url}
    #[arg(long, default_value = "products.json")]
    catalog: PathBuf,
    #[arg(long, default_value_t = 1080)]
    width: u32,
    #[arg(long, default_value_t = 1920)]
    height: u32,
    /// Row slots visible at once
    #[arg(long, default_value_t = 6)]
    rows: usize,
    /// Pages to fling through, every page rebinds the same row slots
    #[arg(long, default_value_t = 1)]
    pages: usize,
    /// Threads available to image downloads
    #[arg(long, default_value_t = 4)]
    workers: usize,
    /// 0 lets downloads run without a deadline
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
    /// Reshuffle the catalog after the first page is bound
    #[arg(long)]
    shuffle: bool,
}

fn main() {
    configure_logger();

    if let Err(err) = run(Args::parse()) {
        error!("{}", err);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), ShrineError> {
    let runtime = Builder::new_multi_thread()
        .worker_threads(args.workers.max(1))
        .enable_all()
        .build()?;

    runtime.block_on(show_catalog(args))
}

async fn show_catalog(args: Args) -> Result<(), ShrineError> {
    let metrics = DisplayMetrics::new(args.width, args.height);
    let fetch_timeout = (args.timeout_secs > 0).then(|| Duration::from_secs(args.timeout_secs));
    let config = ImageCacheConfig::from_display(&metrics).with_fetch_timeout(fetch_timeout);

    info!(
        "Image cache holds up to {} bytes ({}x{} display)",
        config.capacity_bytes, metrics.width_pixels, metrics.height_pixels
    );

    // the only cache and requester for the lifetime of the process
    let cache = Arc::new(MemoryCache::new(config.capacity_bytes));
    let mut requester = ImageRequester::new(
        cache.clone(),
        Arc::new(HttpImageFetcher::new()),
        &config,
        Handle::current(),
    );

    let products = read_products(&args.catalog);

    let mut header = match header_product(&products) {
        Ok(product) => {
            info!("Header shows {}", product.title);
            Some(requester.request(&product.url))
        }
        Err(err) => {
            warn!("Skipping header image: {}", err);
            None
        }
    };

    let mut adapter = ProductAdapter::new(products);
    let rows: Vec<RowId> = (0..args.rows.min(adapter.row_count()))
        .map(|_| adapter.create_row())
        .collect();

    if rows.is_empty() {
        warn!("Nothing to show, the catalog is empty");
        return Ok(());
    }

    for page in 0..args.pages.max(1) {
        bind_page(&mut adapter, &rows, page, &mut requester)?;

        if page == 0 && args.shuffle {
            let mut shuffled = read_products(&args.catalog);
            shuffle_products(&mut shuffled, &mut rand::rng());
            adapter.set_products(shuffled);
        }

        if adapter.take_refresh() {
            adapter.refresh(&mut requester)?;
        }
    }

    adapter.wait_for_images(&mut requester).await;

    if let Some(handle) = header.as_mut() {
        wait_for_header(handle, &mut requester).await;
    }

    for row in adapter.rows() {
        let image = match row.state() {
            RowState::Bound(RowImage::Image(image)) => {
                format!("{}x{}", image.width(), image.height())
            }
            RowState::Bound(RowImage::Placeholder) => "placeholder".to_string(),
            RowState::Binding => "loading".to_string(),
            RowState::Unbound => "unbound".to_string(),
        };

        info!(
            "Row {} [{}] {} {} ({})",
            row.id(),
            row.position().map_or("-".to_string(), |position| position.to_string()),
            row.title().unwrap_or_default(),
            row.price().unwrap_or_default(),
            image
        );
    }

    let stats = cache.stats();
    info!(
        "Cache: {} images, {}/{} bytes, {} hits, {} misses, {} evictions, {} rejected",
        cache.len(),
        cache.bytes_used(),
        cache.capacity(),
        stats.hits,
        stats.misses,
        stats.evictions,
        stats.rejected
    );

    Ok(())
}

fn bind_page(
    adapter: &mut ProductAdapter,
    rows: &[RowId],
    page: usize,
    requester: &mut ImageRequester,
) -> Result<(), ShrineError> {
    let first = page * rows.len();

    for (offset, row) in rows.iter().enumerate() {
        let position = first + offset;

        if position < adapter.row_count() {
            adapter.bind(*row, position, requester)?;
        } else {
            adapter.recycle(*row)?;
        }
    }

    Ok(())
}

async fn wait_for_header(handle: &mut BindingHandle, requester: &mut ImageRequester) {
    loop {
        if let Some(outcome) = handle.try_take() {
            match outcome {
                Ok(image) => info!("Header image {}x{}", image.width(), image.height()),
                Err(err) => warn!("Header image unavailable: {}", err),
            }
            return;
        }

        requester.next_completion().await;
    }
}
