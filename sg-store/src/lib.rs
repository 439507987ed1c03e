pub mod app_config;
pub mod catalog_repo;
pub mod database;
pub mod events;
pub mod order_repo;

pub use catalog_repo::StorePriceRepository;
pub use database::ServiceClient;
pub use events::ChangeListener;
pub use order_repo::StoreOrderRepository;
