use std::sync::Arc;

use sg_catalog::{PriceState, VisibilitySignal};
use sg_core::OrderRepository;
use tokio::sync::watch;

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<dyn OrderRepository>,
    /// Latest state published by the process's price watcher
    pub prices: watch::Receiver<PriceState>,
    pub visibility: VisibilitySignal,
}
