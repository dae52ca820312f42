//! Client-local persistence for the cart.
//!
//! [`KeyValueStore`] models a browser-style local storage slot. The cart itself
//! is read and written through [`PersistedCartStore`], which owns the storage key
//! and the JSON schema.

mod cart_store;
mod file;
mod memory;

pub use cart_store::{PersistedCartStore, SCHEMA_VERSION};
pub use file::FileKeyValueStore;
pub use memory::MemoryKeyValueStore;

use async_trait::async_trait;

use crate::error::StoreError;

/// String key/value storage with overwrite semantics.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}
