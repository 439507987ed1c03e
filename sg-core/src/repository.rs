use async_trait::async_trait;
use mockall::automock;

use crate::order::Order;

/// Failure reported by the managed store.
///
/// The message is the store's own and is safe to hand back to callers of
/// the order lookup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Query(String),
    #[error("{0}")]
    Decode(String),
}

impl StoreError {
    pub fn message(&self) -> &str {
        match self {
            StoreError::Query(msg) | StoreError::Decode(msg) => msg,
        }
    }
}

/// Privileged read access to orders
#[automock]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Look up one order by its opaque id. `Ok(None)` when nothing matches.
    async fn find_order(&self, order_id: &str) -> Result<Option<Order>, StoreError>;
}
