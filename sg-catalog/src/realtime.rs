use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sg_shared::ProductChange;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::RecvError;

/// Keeps a live count for as long as it exists.
///
/// Owners of a long-lived listener hold one of these; dropping the owner
/// releases the registration, and Drop runs once per value.
#[derive(Debug)]
pub(crate) struct Registration {
    live: Arc<AtomicUsize>,
}

impl Registration {
    pub(crate) fn new(live: &Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self { live: Arc::clone(live) }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-process fan-out of store change notifications.
///
/// Cloning shares the same channel.
#[derive(Debug, Clone)]
pub struct ChangeHub {
    tx: broadcast::Sender<ProductChange>,
    live: Arc<AtomicUsize>,
}

impl ChangeHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns how many subscriptions received the change. Publishing with
    /// nobody listening is not an error.
    pub fn publish(&self, change: ProductChange) -> usize {
        self.tx.send(change).unwrap_or(0)
    }

    /// Subscribe to every change of one table.
    pub fn subscribe(&self, table: impl Into<String>) -> Subscription {
        Subscription {
            table: table.into(),
            rx: self.tx.subscribe(),
            _registration: Registration::new(&self.live),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

/// A live subscription to one table's changes. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    table: String,
    rx: broadcast::Receiver<ProductChange>,
    _registration: Registration,
}

impl Subscription {
    /// Next change for this table.
    ///
    /// `Err(Lagged(n))` means `n` changes were dropped because this
    /// subscriber fell behind; `Err(Closed)` means every hub handle is gone.
    pub async fn recv(&mut self) -> Result<ProductChange, RecvError> {
        loop {
            let change = self.rx.recv().await?;
            if change.table == self.table {
                return Ok(change);
            }
        }
    }
}
