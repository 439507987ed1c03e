use async_trait::async_trait;
use mockall::automock;
use sg_core::StoreError;

use crate::product::PriceSnapshot;

/// Read access to product prices
#[automock]
#[async_trait]
pub trait PriceRepository: Send + Sync {
    /// Most recently updated active product, if any.
    async fn latest_active(&self) -> Result<Option<PriceSnapshot>, StoreError>;
}
