//! Remote lookups the cart depends on: available stock and catalog metadata.
//!
//! Both are traits so the cart service can be driven by the HTTP implementation
//! in production and by in-memory fakes in tests.

mod cache;
mod http;

pub use cache::CachedStockLookup;
pub use http::HttpStorefrontApi;

use async_trait::async_trait;

use crate::domain::{CatalogEntry, ProductId, StockEntry};
use crate::error::LookupError;

/// Resolves the quantity currently available for a product.
#[async_trait]
pub trait StockLookup: Send + Sync {
    async fn stock(&self, id: ProductId) -> Result<StockEntry, LookupError>;
}

/// Resolves product metadata (title, price, image).
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    async fn product(&self, id: ProductId) -> Result<CatalogEntry, LookupError>;
}

#[async_trait]
impl<T: StockLookup + ?Sized> StockLookup for std::sync::Arc<T> {
    async fn stock(&self, id: ProductId) -> Result<StockEntry, LookupError> {
        (**self).stock(id).await
    }
}

#[async_trait]
impl<T: CatalogLookup + ?Sized> CatalogLookup for std::sync::Arc<T> {
    async fn product(&self, id: ProductId) -> Result<CatalogEntry, LookupError> {
        (**self).product(id).await
    }
}
