use std::sync::Arc;

use common::image_cache::DecodedImage;
use tokio::sync::oneshot::{self, error::TryRecvError};

use crate::errors::FetchError;

pub type ImageOutcome = Result<Arc<DecodedImage>, FetchError>;

enum HandleState {
    Waiting(oneshot::Receiver<ImageOutcome>),
    Taken,
    Cancelled,
}

/// Subscription of one row slot to the image for a URL.
///
/// The handle yields at most one outcome. Once `cancel` has been called it
/// yields nothing, even when the outcome was already sent.
pub struct BindingHandle {
    url: String,
    state: HandleState,
}

impl BindingHandle {
    pub(crate) fn new(url: impl Into<String>, receiver: oneshot::Receiver<ImageOutcome>) -> Self {
        Self {
            url: url.into(),
            state: HandleState::Waiting(receiver),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.state, HandleState::Cancelled)
    }

    pub fn is_waiting(&self) -> bool {
        matches!(self.state, HandleState::Waiting(_))
    }

    /// Closes the subscription. Calling it again, or after the outcome has
    /// been taken, does nothing.
    pub fn cancel(&mut self) {
        if let HandleState::Waiting(receiver) = &mut self.state {
            receiver.close();
            self.state = HandleState::Cancelled;
        }
    }

    pub fn try_take(&mut self) -> Option<ImageOutcome> {
        let HandleState::Waiting(receiver) = &mut self.state else {
            return None;
        };

        let outcome = match receiver.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            // the requester went away with our waiter still registered
            Err(TryRecvError::Closed) => Err(FetchError::Abandoned),
        };

        self.state = HandleState::Taken;

        Some(outcome)
    }
}

impl std::fmt::Debug for BindingHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            HandleState::Waiting(_) => "waiting",
            HandleState::Taken => "taken",
            HandleState::Cancelled => "cancelled",
        };

        f.debug_struct("BindingHandle")
            .field("url", &self.url)
            .field("state", &state)
            .finish()
    }
}
