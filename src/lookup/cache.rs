use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument};

use super::StockLookup;
use crate::domain::{ProductId, StockEntry};
use crate::error::LookupError;

/// Short-lived cache in front of a [`StockLookup`].
///
/// Only successful lookups are cached. A zero TTL disables caching so every
/// call reaches the wrapped lookup.
pub struct CachedStockLookup<S> {
    inner: S,
    ttl: Duration,
    entries: Mutex<HashMap<ProductId, (Instant, StockEntry)>>,
}

impl<S: StockLookup> CachedStockLookup<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn invalidate(&self, id: ProductId) {
        self.entries.lock().await.remove(&id);
    }
}

#[async_trait]
impl<S: StockLookup> StockLookup for CachedStockLookup<S> {
    #[instrument(skip(self))]
    async fn stock(&self, id: ProductId) -> Result<StockEntry, LookupError> {
        if self.ttl.is_zero() {
            return self.inner.stock(id).await;
        }

        if let Some((fetched_at, entry)) = self.entries.lock().await.get(&id) {
            if fetched_at.elapsed() < self.ttl {
                debug!("Stock cache hit");
                return Ok(*entry);
            }
        }

        let entry = self.inner.stock(id).await?;
        self.entries.lock().await.insert(id, (Instant::now(), entry));
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_framework::FakeStock;

    #[tokio::test]
    async fn zero_ttl_always_reaches_the_service() {
        let fake = FakeStock::with_entries([StockEntry::new(1, 4)]);
        let cached = CachedStockLookup::new(fake.clone(), Duration::ZERO);

        cached.stock(1).await.unwrap();
        cached.stock(1).await.unwrap();

        assert_eq!(fake.calls(), 2);
    }

    #[tokio::test]
    async fn fresh_entries_are_served_from_cache() {
        let fake = FakeStock::with_entries([StockEntry::new(1, 4)]);
        let cached = CachedStockLookup::new(fake.clone(), Duration::from_secs(60));

        assert_eq!(cached.stock(1).await, Ok(StockEntry::new(1, 4)));
        fake.set(StockEntry::new(1, 9));
        assert_eq!(cached.stock(1).await, Ok(StockEntry::new(1, 4)));
        assert_eq!(fake.calls(), 1);

        cached.invalidate(1).await;
        assert_eq!(cached.stock(1).await, Ok(StockEntry::new(1, 9)));
        assert_eq!(fake.calls(), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let fake = FakeStock::default();
        let cached = CachedStockLookup::new(fake.clone(), Duration::from_secs(60));

        assert_eq!(cached.stock(5).await, Err(LookupError::NotFound(5)));
        fake.set(StockEntry::new(5, 2));
        assert_eq!(cached.stock(5).await, Ok(StockEntry::new(5, 2)));
    }
}
