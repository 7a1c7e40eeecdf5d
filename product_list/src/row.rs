use std::{fmt, sync::Arc};

use common::{image_cache::DecodedImage, product::ProductEntry};
use image_cache::BindingHandle;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(pub(crate) usize);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowImage {
    Image(Arc<DecodedImage>),
    /// Shown when the image could not be downloaded or decoded
    Placeholder,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RowState {
    #[default]
    Unbound,
    Binding,
    Bound(RowImage),
}

#[derive(Debug)]
pub struct ProductRow {
    id: RowId,
    position: Option<usize>,
    product: Option<ProductEntry>,
    state: RowState,
    handle: Option<BindingHandle>,
}

impl ProductRow {
    pub(crate) fn new(id: RowId) -> Self {
        Self {
            id,
            position: None,
            product: None,
            state: RowState::Unbound,
            handle: None,
        }
    }

    pub fn id(&self) -> RowId {
        self.id
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn title(&self) -> Option<&str> {
        self.product.as_ref().map(|product| product.title.as_str())
    }

    pub fn price(&self) -> Option<&str> {
        self.product.as_ref().map(|product| product.price.as_str())
    }

    pub fn state(&self) -> &RowState {
        &self.state
    }

    pub fn image(&self) -> Option<&Arc<DecodedImage>> {
        match &self.state {
            RowState::Bound(RowImage::Image(image)) => Some(image),
            _ => None,
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.handle.as_ref().is_some_and(BindingHandle::is_waiting)
    }

    /// Drops the subscription of the previous binding. Anything it was
    /// waiting for can no longer reach this row.
    pub(crate) fn cancel(&mut self) {
        let Some(mut handle) = self.handle.take() else {
            return;
        };

        handle.cancel();

        // a handle that already delivered stays as it was
        if handle.is_cancelled() {
            debug!("Row {} cancelled image {}", self.id, handle.url());
        }
    }

    pub(crate) fn unbind(&mut self) {
        self.cancel();
        self.position = None;
        self.product = None;
        self.state = RowState::Unbound;
    }

    pub(crate) fn bind(&mut self, position: usize, product: ProductEntry) {
        self.cancel();
        self.position = Some(position);
        self.product = Some(product);
        self.state = RowState::Binding;
    }

    pub(crate) fn attach(&mut self, handle: BindingHandle) {
        self.handle = Some(handle);
    }

    /// Applies the image outcome if it arrived, returns whether the row changed
    pub(crate) fn poll(&mut self) -> bool {
        let Some(handle) = self.handle.as_mut() else {
            return false;
        };

        let Some(outcome) = handle.try_take() else {
            return false;
        };

        self.state = match outcome {
            Ok(image) => RowState::Bound(RowImage::Image(image)),
            Err(err) => {
                debug!("Row {} falls back to placeholder: {}", self.id, err);
                RowState::Bound(RowImage::Placeholder)
            }
        };

        true
    }
}
