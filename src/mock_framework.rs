//! # Mock Framework
//!
//! Utilities for testing the cart in isolation.
//!
//! Use [`create_mock_client`] to get a [`CartClient`] whose requests land on a
//! receiver you control, then assert on them with [`expect_add`],
//! [`expect_remove`] or [`expect_update`].
//!
//! [`FakeStock`], [`FakeCatalog`] and [`FlakyKeyValueStore`] stand in for the
//! remote services and the local slot when running a real
//! [`CartService`](crate::actors::CartService).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::clients::CartClient;
use crate::domain::{Cart, CatalogEntry, ProductId, StockEntry};
use crate::error::{CartError, LookupError, StoreError};
use crate::lookup::{CatalogLookup, StockLookup};
use crate::messages::{CartRequest, UpdateProductAmount};
use crate::store::{KeyValueStore, MemoryKeyValueStore};

type Responder = oneshot::Sender<Result<Cart, CartError>>;

/// Creates a client wired to a receiver the test inspects directly.
pub fn create_mock_client(buffer_size: usize) -> (CartClient, mpsc::Receiver<CartRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (CartClient::new(sender), receiver)
}

/// Helper to verify that the next message is an AddProduct request
pub async fn expect_add(
    receiver: &mut mpsc::Receiver<CartRequest>,
) -> Option<(ProductId, Responder)> {
    match receiver.recv().await {
        Some(CartRequest::AddProduct { product_id, respond_to }) => Some((product_id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a RemoveProduct request
pub async fn expect_remove(
    receiver: &mut mpsc::Receiver<CartRequest>,
) -> Option<(ProductId, Responder)> {
    match receiver.recv().await {
        Some(CartRequest::RemoveProduct {
            product_id,
            respond_to,
        }) => Some((product_id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an UpdateProductAmount request
pub async fn expect_update(
    receiver: &mut mpsc::Receiver<CartRequest>,
) -> Option<(UpdateProductAmount, Responder)> {
    match receiver.recv().await {
        Some(CartRequest::UpdateProductAmount { update, respond_to }) => Some((update, respond_to)),
        _ => None,
    }
}

// =============================================================================
// FAKE LOOKUPS
// =============================================================================

#[derive(Default)]
struct FakeStockState {
    entries: Mutex<HashMap<ProductId, StockEntry>>,
    failure: Mutex<Option<LookupError>>,
    delay: Mutex<Duration>,
    calls: AtomicUsize,
}

/// In-memory stock service. Clones share state.
#[derive(Clone, Default)]
pub struct FakeStock {
    state: Arc<FakeStockState>,
}

impl FakeStock {
    pub fn with_entries(entries: impl IntoIterator<Item = StockEntry>) -> Self {
        let fake = Self::default();
        for entry in entries {
            fake.set(entry);
        }
        fake
    }

    pub fn set(&self, entry: StockEntry) {
        self.state.entries.lock().unwrap().insert(entry.id, entry);
    }

    /// Every following lookup fails with `error` until cleared with `None`.
    pub fn fail_with(&self, error: Option<LookupError>) {
        *self.state.failure.lock().unwrap() = error;
    }

    pub fn delay(&self, delay: Duration) {
        *self.state.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StockLookup for FakeStock {
    async fn stock(&self, id: ProductId) -> Result<StockEntry, LookupError> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.state.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let failure = self.state.failure.lock().unwrap().clone();
        if let Some(error) = failure {
            return Err(error);
        }
        self.state
            .entries
            .lock()
            .unwrap()
            .get(&id)
            .copied()
            .ok_or(LookupError::NotFound(id))
    }
}

#[derive(Default)]
struct FakeCatalogState {
    entries: Mutex<HashMap<ProductId, CatalogEntry>>,
    failure: Mutex<Option<LookupError>>,
    calls: AtomicUsize,
}

/// In-memory catalog service. Clones share state.
#[derive(Clone, Default)]
pub struct FakeCatalog {
    state: Arc<FakeCatalogState>,
}

impl FakeCatalog {
    pub fn with_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let fake = Self::default();
        for entry in entries {
            fake.state.entries.lock().unwrap().insert(entry.id, entry);
        }
        fake
    }

    pub fn fail_with(&self, error: Option<LookupError>) {
        *self.state.failure.lock().unwrap() = error;
    }

    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogLookup for FakeCatalog {
    async fn product(&self, id: ProductId) -> Result<CatalogEntry, LookupError> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        let failure = self.state.failure.lock().unwrap().clone();
        if let Some(error) = failure {
            return Err(error);
        }
        self.state
            .entries
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(LookupError::NotFound(id))
    }
}

// =============================================================================
// FAILURE-INJECTABLE STORAGE
// =============================================================================

/// Memory-backed slot whose writes can be switched to fail.
#[derive(Default)]
pub struct FlakyKeyValueStore {
    inner: MemoryKeyValueStore,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl FlakyKeyValueStore {
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyValueStore for FlakyKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("quota exceeded")));
        }
        self.inner.set(key, value).await?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_client() {
        let (client, mut receiver) = create_mock_client(10);

        let add_task = tokio::spawn(async move { client.add_product(1).await });

        let (product_id, responder) =
            expect_add(&mut receiver).await.expect("Expected AddProduct request");
        assert_eq!(product_id, 1);
        responder.send(Err(CartError::StockNotFound(1))).unwrap();

        let result = add_task.await.unwrap();
        assert_eq!(result, Err(CartError::StockNotFound(1)));
    }

    #[tokio::test]
    async fn closed_service_is_an_actor_communication_error() {
        let (client, receiver) = create_mock_client(10);
        drop(receiver);

        let result = client.remove_product(1).await;
        assert!(matches!(result, Err(CartError::ActorCommunication(_))));
    }

    #[tokio::test]
    async fn dropped_responder_is_an_actor_communication_error() {
        let (client, mut receiver) = create_mock_client(10);

        let task = tokio::spawn(async move { client.remove_product(9).await });
        let (product_id, responder) =
            expect_remove(&mut receiver).await.expect("Expected RemoveProduct request");
        assert_eq!(product_id, 9);
        drop(responder);

        assert!(matches!(task.await.unwrap(), Err(CartError::ActorCommunication(_))));
    }
}
