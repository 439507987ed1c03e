use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use sg_core::{Order, OrderRepository, StatusParseError, StoreError};

/// Lookup projection; keep in step with `Order::COLUMNS`.
const SELECT_ORDER: &str = "SELECT id, customer_name, customer_phone, customer_email, country, city, \
     address, total_amount, status, payment_status, created_at, updated_at \
     FROM orders WHERE id = $1";

pub struct StoreOrderRepository {
    pool: PgPool,
}

impl StoreOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    customer_name: String,
    customer_phone: String,
    customer_email: Option<String>,
    country: String,
    city: String,
    address: String,
    total_amount: Decimal,
    status: String,
    payment_status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StatusParseError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: row.id,
            customer_name: row.customer_name,
            customer_phone: row.customer_phone.into(),
            customer_email: row.customer_email.map(Into::into),
            country: row.country,
            city: row.city,
            address: row.address.into(),
            total_amount: row.total_amount,
            status: row.status.parse()?,
            payment_status: row.payment_status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Keeps the store's own wording so it can be passed back to callers.
pub(crate) fn store_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db) => StoreError::Query(db.message().to_string()),
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::ColumnNotFound(_) => {
            StoreError::Decode(err.to_string())
        }
        other => StoreError::Query(other.to_string()),
    }
}

#[async_trait]
impl OrderRepository for StoreOrderRepository {
    async fn find_order(&self, order_id: &str) -> Result<Option<Order>, StoreError> {
        // Ids are UUIDs in the store; anything else cannot match a row.
        let Ok(id) = Uuid::parse_str(order_id.trim()) else {
            debug!("order id is not a uuid, nothing to look up");
            return Ok(None);
        };

        let row = sqlx::query_as::<_, OrderRow>(SELECT_ORDER)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        row.map(Order::try_from)
            .transpose()
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}
