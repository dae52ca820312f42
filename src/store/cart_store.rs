use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::KeyValueStore;
use crate::domain::{Cart, Product};
use crate::error::StoreError;

/// Version written by [`PersistedCartStore::save`].
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct VersionedCartRef<'a> {
    version: u32,
    items: &'a Cart,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredCart {
    Versioned { version: u32, items: Vec<Product> },
    // bare array written before the schema carried a version
    Legacy(Vec<Product>),
}

/// Reads and writes the cart under one fixed storage key.
#[derive(Clone)]
pub struct PersistedCartStore {
    slot: Arc<dyn KeyValueStore>,
    key: String,
}

impl PersistedCartStore {
    pub fn new(slot: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            slot,
            key: key.into(),
        }
    }

    /// Loads the persisted cart. Any problem yields an empty cart.
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn load(&self) -> Cart {
        let raw = match self.slot.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No persisted cart");
                return Cart::new();
            }
            Err(e) => {
                warn!(error = %e, "Could not read persisted cart, starting empty");
                return Cart::new();
            }
        };

        match decode(&raw) {
            Ok(cart) => {
                debug!(items = cart.len(), "Persisted cart loaded");
                cart
            }
            Err(e) => {
                warn!(error = %e, "Persisted cart is unreadable, starting empty");
                Cart::new()
            }
        }
    }

    /// Overwrites the persisted cart with `cart`.
    #[instrument(skip(self, cart), fields(key = %self.key, items = cart.len()))]
    pub async fn save(&self, cart: &Cart) -> Result<(), StoreError> {
        let encoded = encode(cart)?;
        self.slot.set(&self.key, &encoded).await?;
        debug!("Cart persisted");
        Ok(())
    }
}

pub(crate) fn encode(cart: &Cart) -> Result<String, StoreError> {
    let document = VersionedCartRef {
        version: SCHEMA_VERSION,
        items: cart,
    };
    Ok(serde_json::to_string(&document)?)
}

pub(crate) fn decode(raw: &str) -> Result<Cart, StoreError> {
    match serde_json::from_str::<StoredCart>(raw) {
        Ok(StoredCart::Versioned { version, items }) if version == SCHEMA_VERSION => {
            Ok(Cart::from_products(items))
        }
        Ok(StoredCart::Versioned { version, .. }) => Err(StoreError::Corrupt(format!(
            "unsupported cart schema version {version}"
        ))),
        Ok(StoredCart::Legacy(items)) => {
            debug!(items = items.len(), "Migrating unversioned cart");
            Ok(Cart::from_products(items))
        }
        Err(e) => Err(StoreError::Corrupt(e.to_string())),
    }
}
