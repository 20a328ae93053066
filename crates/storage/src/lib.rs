#![forbid(unsafe_code)]

pub mod cache;
pub mod repository;
pub mod sqlite;

pub use cache::{CacheKeys, PersistenceCache};
pub use repository::{InMemoryStore, KeyValueStore, Storage, StorageError};
