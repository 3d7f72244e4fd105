//! Search-as-you-type.
//!
//! Each keystroke calls [`DebouncedSearch::trigger`]. The search only runs
//! once input has been quiet for the debounce delay, and a newer trigger
//! cancels the pending or running one, so at most one search is in flight
//! and only the latest term ever produces a result.

use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Result of a completed search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome<T> {
    pub term: String,
    pub result: T,
}

pub struct DebouncedSearch<T> {
    delay: Duration,
    current: Mutex<Option<CancellationToken>>,
    tx: mpsc::UnboundedSender<SearchOutcome<T>>,
}

impl<T: Send + 'static> DebouncedSearch<T> {
    /// Create a debouncer and the receiver its results arrive on.
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<SearchOutcome<T>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let search = Self {
            delay,
            current: Mutex::new(None),
            tx,
        };
        (search, rx)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `search(term)` after the debounce delay, superseding any
    /// earlier trigger.
    pub fn trigger<F, Fut>(&self, term: impl Into<String>, search: F) -> JoinHandle<()>
    where
        F: FnOnce(String) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let term = term.into();
        let token = CancellationToken::new();
        if let Some(previous) = self.current.lock().replace(token.clone()) {
            previous.cancel();
        }

        let delay = self.delay;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    trace!(term = %term, "Search superseded before start");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            debug!(term = %term, "Running search");
            let result = tokio::select! {
                _ = token.cancelled() => {
                    debug!(term = %term, "Search superseded while running");
                    return;
                }
                result = search(term.clone()) => result,
            };
            if token.is_cancelled() {
                return;
            }
            if tx.send(SearchOutcome { term, result }).is_err() {
                trace!("Search receiver dropped");
            }
        })
    }

    /// Cancel the pending or running search, if any.
    pub fn cancel(&self) {
        if let Some(token) = self.current.lock().take() {
            token.cancel();
        }
    }
}

impl<T> Drop for DebouncedSearch<T> {
    fn drop(&mut self) {
        if let Some(token) = self.current.get_mut().take() {
            token.cancel();
        }
    }
}
