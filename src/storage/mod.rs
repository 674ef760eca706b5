pub mod config;
pub mod memory;
pub mod store;

pub use config::MemoryStoreConfig;
pub use memory::MemoryStore;
pub use store::{Document, DocumentStore};
