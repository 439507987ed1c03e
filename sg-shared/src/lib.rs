pub mod models;
pub mod pii;

pub use models::events::{ChangeKind, ProductChange};
pub use pii::Masked;
