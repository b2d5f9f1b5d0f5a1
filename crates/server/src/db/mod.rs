mod memory;
mod postgres;
mod repository;
mod store;

pub use memory::MemoryStore;
pub use postgres::{Collection, ConnectionManager, StoreConfig};
pub use repository::ResourceRepository;
pub use store::{DocumentStore, SharedStore, StoreError};
