use std::sync::Arc;

use tracing::{error, info, instrument};

use super::SystemError;
use crate::actors::CartService;
use crate::clients::CartClient;
use crate::config::CartConfig;
use crate::lookup::{CachedStockLookup, CatalogLookup, HttpStorefrontApi, StockLookup};
use crate::store::{FileKeyValueStore, KeyValueStore, PersistedCartStore};

/// Starts the cart service, hands out its client and shuts it down.
pub struct CartSystem {
    pub cart_client: CartClient,
    handle: tokio::task::JoinHandle<()>,
}

impl CartSystem {
    /// Wires the service from explicit collaborators.
    #[instrument(name = "cart_system", skip(stock, catalog, store))]
    pub fn new(
        buffer_size: usize,
        stock: Arc<dyn StockLookup>,
        catalog: Arc<dyn CatalogLookup>,
        store: PersistedCartStore,
    ) -> Self {
        info!("Starting cart system");

        let (service, cart_client) = CartService::new(buffer_size, stock, catalog, store);
        let handle = tokio::spawn(service.run());

        info!("Cart system started");
        Self { cart_client, handle }
    }

    /// Builds HTTP lookups and file-backed storage from `config`.
    pub fn from_config(config: &CartConfig) -> Result<Self, SystemError> {
        let api = Arc::new(HttpStorefrontApi::new(&config.api.base_url, config.api.timeout())?);
        info!(
            api = %api.base_url(),
            storage = %config.storage.path.display(),
            stock_cache_ttl_ms = config.cart.stock_cache_ttl_ms,
            "Wiring cart system from config"
        );
        let stock: Arc<dyn StockLookup> = Arc::new(CachedStockLookup::new(
            api.clone(),
            config.cart.stock_cache_ttl(),
        ));
        let slot: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new(&config.storage.path));
        let store = PersistedCartStore::new(slot, config.storage.key.clone());

        Ok(Self::new(config.cart.buffer_size, stock, api, store))
    }

    #[instrument(skip(self))]
    pub async fn shutdown(self) -> Result<(), SystemError> {
        info!("Shutting down cart system");

        // the service may already be gone; joining below reports what happened
        let _ = self.cart_client.shutdown().await;
        drop(self.cart_client);

        if let Err(e) = self.handle.await {
            error!(error = ?e, "Cart service shutdown error");
            return Err(SystemError::Task(e.to_string()));
        }

        info!("Cart system shutdown complete");
        Ok(())
    }
}
