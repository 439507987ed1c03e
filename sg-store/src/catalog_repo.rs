use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use sg_catalog::{PriceRepository, PriceSnapshot};
use sg_core::StoreError;

use crate::order_repo::store_error;

const SELECT_LATEST_ACTIVE: &str = "SELECT price, stock_quantity, is_active, updated_at \
     FROM products WHERE is_active ORDER BY updated_at DESC LIMIT 1";

pub struct StorePriceRepository {
    pool: PgPool,
}

impl StorePriceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PriceRow {
    price: Decimal,
    stock_quantity: i32,
    is_active: bool,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PriceRow> for PriceSnapshot {
    type Error = StoreError;

    fn try_from(row: PriceRow) -> Result<Self, Self::Error> {
        let stock_quantity = u32::try_from(row.stock_quantity).map_err(|_| {
            StoreError::Decode(format!("negative stock_quantity: {}", row.stock_quantity))
        })?;

        Ok(PriceSnapshot {
            price: row.price,
            stock_quantity,
            is_active: row.is_active,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl PriceRepository for StorePriceRepository {
    async fn latest_active(&self) -> Result<Option<PriceSnapshot>, StoreError> {
        let row = sqlx::query_as::<_, PriceRow>(SELECT_LATEST_ACTIVE)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        row.map(PriceSnapshot::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(stock_quantity: i32) -> PriceRow {
        PriceRow {
            price: Decimal::new(7500, 2),
            stock_quantity,
            is_active: true,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_converts_to_snapshot() {
        let snapshot = PriceSnapshot::try_from(row(3)).unwrap();

        assert_eq!(snapshot.price, Decimal::from(75));
        assert_eq!(snapshot.stock_quantity, 3);
        assert!(snapshot.is_active);
    }

    #[test]
    fn test_negative_stock_is_rejected() {
        let err = PriceSnapshot::try_from(row(-1)).unwrap_err();
        assert_eq!(err, StoreError::Decode("negative stock_quantity: -1".to_string()));
    }

    #[test]
    fn test_query_only_considers_active_rows_newest_first() {
        assert!(SELECT_LATEST_ACTIVE.contains("WHERE is_active"));
        assert!(SELECT_LATEST_ACTIVE.contains("ORDER BY updated_at DESC LIMIT 1"));
    }
}
