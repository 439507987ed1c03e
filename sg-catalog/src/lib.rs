pub mod product;
pub mod realtime;
pub mod repository;
pub mod visibility;
pub mod watcher;

pub use product::PriceSnapshot;
pub use realtime::{ChangeHub, Subscription};
pub use repository::{MockPriceRepository, PriceRepository};
pub use visibility::{Visibility, VisibilityListener, VisibilitySignal};
pub use watcher::{PriceState, PriceWatcher};

/// Table whose change notifications drive price refreshes
pub const PRODUCTS_TABLE: &str = "products";
