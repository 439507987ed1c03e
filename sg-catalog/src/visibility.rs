use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use crate::realtime::Registration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Tells price watchers that a viewer came back and fresh data is wanted.
#[derive(Debug, Clone)]
pub struct VisibilitySignal {
    tx: Arc<watch::Sender<Visibility>>,
    live: Arc<AtomicUsize>,
}

impl Default for VisibilitySignal {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilitySignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Visibility::Visible);
        Self {
            tx: Arc::new(tx),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Notifies listeners even when already visible.
    pub fn mark_visible(&self) {
        self.tx.send_replace(Visibility::Visible);
    }

    pub fn mark_hidden(&self) {
        self.tx.send_replace(Visibility::Hidden);
    }

    pub fn current(&self) -> Visibility {
        *self.tx.borrow()
    }

    /// Listener that only sees changes made after this call.
    pub fn listen(&self) -> VisibilityListener {
        VisibilityListener {
            rx: self.tx.subscribe(),
            _registration: Registration::new(&self.live),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct VisibilityListener {
    rx: watch::Receiver<Visibility>,
    _registration: Registration,
}

impl VisibilityListener {
    /// Waits for the next visibility change. `None` once the signal is gone.
    pub async fn changed(&mut self) -> Option<Visibility> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_listener_sees_repeated_visible() {
        let signal = VisibilitySignal::new();
        let mut listener = signal.listen();

        signal.mark_visible();
        assert_eq!(listener.changed().await, Some(Visibility::Visible));

        signal.mark_hidden();
        assert_eq!(listener.changed().await, Some(Visibility::Hidden));
        assert_eq!(signal.current(), Visibility::Hidden);
    }

    #[tokio::test]
    async fn test_listener_ignores_history() {
        let signal = VisibilitySignal::new();
        signal.mark_hidden();

        let mut listener = signal.listen();
        let waited = tokio::time::timeout(Duration::from_millis(20), listener.changed()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_listener_ends_with_signal() {
        let signal = VisibilitySignal::new();
        let mut listener = signal.listen();
        assert_eq!(signal.listener_count(), 1);

        drop(signal);
        assert_eq!(listener.changed().await, None);
    }

    #[test]
    fn test_listener_count_follows_drops() {
        let signal = VisibilitySignal::default();
        let listener = signal.listen();
        assert_eq!(signal.listener_count(), 1);

        drop(listener);
        assert_eq!(signal.listener_count(), 0);
    }
}
