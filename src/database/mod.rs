pub mod manager;
pub mod memory;
pub mod models;
pub mod repository;
pub mod store;

pub use manager::DatabaseManager;
pub use memory::MemoryConnectionStore;
pub use models::{ConnectionRow, NewConnection};
pub use repository::PgConnectionStore;
pub use store::{ConnectionStore, StoreError};
