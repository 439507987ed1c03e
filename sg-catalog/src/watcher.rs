use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::realtime::{RecvError, Subscription};
use crate::repository::PriceRepository;
use crate::visibility::{Visibility, VisibilityListener};

/// Current price and stock of the active product as seen by a watcher.
///
/// `price` holds the caller's fallback and `stock_quantity` holds zero until
/// the first successful read, and again whenever no product is active;
/// neither is ever absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceState {
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock_quantity: u32,
    pub loading: bool,
    pub error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PriceState {
    pub fn initial(fallback: Decimal) -> Self {
        Self {
            price: fallback,
            stock_quantity: 0,
            loading: true,
            error: None,
            updated_at: None,
        }
    }
}

/// Keeps the active product's price fresh.
///
/// Reads once on spawn, then again whenever a change touches an active
/// product row, when change events were missed, and when the viewer becomes
/// visible. The subscription and visibility listener belong to the watcher
/// and are released when it shuts down or is dropped.
#[derive(Debug)]
pub struct PriceWatcher {
    state: watch::Receiver<PriceState>,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PriceWatcher {
    pub fn spawn(
        repo: Arc<dyn PriceRepository>,
        changes: Subscription,
        visibility: VisibilityListener,
        fallback: Decimal,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(PriceState::initial(fallback));
        let (stop_tx, stop_rx) = oneshot::channel();

        let task = tokio::spawn(run(repo, changes, visibility, state_tx, stop_rx, fallback));

        Self {
            state: state_rx,
            stop: Some(stop_tx),
            task: Some(task),
        }
    }

    /// A receiver that observes every state update.
    pub fn state(&self) -> watch::Receiver<PriceState> {
        self.state.clone()
    }

    pub fn current(&self) -> PriceState {
        self.state.borrow().clone()
    }

    /// Stops the background task and waits until its resources are released.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!("price watcher task failed: {}", e);
                }
            }
        }
    }
}

impl Drop for PriceWatcher {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run(
    repo: Arc<dyn PriceRepository>,
    changes: Subscription,
    visibility: VisibilityListener,
    state: watch::Sender<PriceState>,
    stop: oneshot::Receiver<()>,
    fallback: Decimal,
) {
    // A pending read is abandoned as soon as a stop arrives.
    tokio::select! {
        _ = stop => {}
        _ = watch_prices(repo, changes, visibility, state, fallback) => {}
    }

    debug!("price watcher stopped");
}

async fn watch_prices(
    repo: Arc<dyn PriceRepository>,
    mut changes: Subscription,
    mut visibility: VisibilityListener,
    state: watch::Sender<PriceState>,
    fallback: Decimal,
) {
    refresh(repo.as_ref(), &state, fallback).await;

    let mut changes_open = true;
    let mut visibility_open = true;

    while changes_open || visibility_open {
        tokio::select! {
            change = changes.recv(), if changes_open => match change {
                Ok(change) if change.touches_active() => {
                    debug!("active product changed ({:?}), refreshing price", change.kind);
                    refresh(repo.as_ref(), &state, fallback).await;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(missed)) => {
                    warn!("price watcher missed {} change events, refreshing", missed);
                    refresh(repo.as_ref(), &state, fallback).await;
                }
                Err(RecvError::Closed) => {
                    debug!("change feed closed");
                    changes_open = false;
                }
            },
            seen = visibility.changed(), if visibility_open => match seen {
                Some(Visibility::Visible) => refresh(repo.as_ref(), &state, fallback).await,
                Some(Visibility::Hidden) => {}
                None => visibility_open = false,
            },
        }
    }
}

async fn refresh(repo: &dyn PriceRepository, state: &watch::Sender<PriceState>, fallback: Decimal) {
    let result = repo.latest_active().await;

    state.send_modify(|current| {
        current.loading = false;
        match result {
            Ok(Some(snapshot)) => {
                current.price = snapshot.price;
                current.stock_quantity = snapshot.stock_quantity;
                current.updated_at = Some(snapshot.updated_at);
                current.error = None;
            }
            // Nothing is for sale: drop back to the unloaded price and stock.
            Ok(None) => {
                debug!("no active product, showing fallback price");
                current.price = fallback;
                current.stock_quantity = 0;
                current.updated_at = None;
                current.error = None;
            }
            Err(e) => {
                warn!("failed to read active product price: {}", e);
                current.error = Some(e.to_string());
            }
        }
    });
}
