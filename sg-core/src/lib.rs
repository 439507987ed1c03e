pub mod order;
pub mod repository;

pub use order::{Order, OrderStatus, PaymentStatus, StatusParseError};
pub use repository::{MockOrderRepository, OrderRepository, StoreError};
