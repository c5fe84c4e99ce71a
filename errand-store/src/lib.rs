pub mod app_config;
pub mod database;
pub mod memory;
pub mod order_repo;
pub mod user_repo;

pub use database::DbClient;
pub use memory::{MemoryOrderRepository, MemoryUserRepository};
pub use order_repo::StoreOrderRepository;
pub use user_repo::StoreUserRepository;
