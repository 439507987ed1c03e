use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Price and stock of the most recently updated active product row at read
/// time
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSnapshot {
    pub price: Decimal,
    pub stock_quantity: u32,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}
