use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use crate::clients::CartClient;
use crate::domain::{Cart, CatalogEntry, Product, ProductId, StockEntry};
use crate::error::CartError;
use crate::lookup::{CatalogLookup, StockLookup};
use crate::messages::{CartRequest, ServiceResponse, UpdateProductAmount};
use crate::store::PersistedCartStore;

// =============================================================================
// CART SERVICE
// =============================================================================

/// Owns the cart and applies every mutation, one message at a time.
///
/// Handlers hold `&mut self` across their lookups, so no other request can touch
/// the cart while one is suspended on the network. Each mutation builds the next
/// cart from the current one, persists it, and only then replaces the in-memory
/// value; a failure at any step leaves both untouched.
pub struct CartService {
    receiver: mpsc::Receiver<CartRequest>,
    stock: Arc<dyn StockLookup>,
    catalog: Arc<dyn CatalogLookup>,
    store: PersistedCartStore,
    cart: Cart,
    metadata: HashMap<ProductId, CatalogEntry>,
}

impl CartService {
    /// Creates the service. The persisted cart is read when [`run`](Self::run)
    /// starts, before the first request is handled.
    pub fn new(
        buffer_size: usize,
        stock: Arc<dyn StockLookup>,
        catalog: Arc<dyn CatalogLookup>,
        store: PersistedCartStore,
    ) -> (Self, CartClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let service = Self {
            receiver,
            stock,
            catalog,
            store,
            cart: Cart::new(),
            metadata: HashMap::new(),
        };
        let client = CartClient::new(sender);
        (service, client)
    }

    #[instrument(name = "cart_service", skip(self))]
    pub async fn run(mut self) {
        self.cart = self.store.load().await;
        info!(items = self.cart.len(), "CartService starting");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                CartRequest::GetCart { respond_to } => {
                    self.handle_get_cart(respond_to);
                }
                CartRequest::AddProduct {
                    product_id,
                    respond_to,
                } => {
                    self.handle_add_product(product_id, respond_to).await;
                }
                CartRequest::RemoveProduct {
                    product_id,
                    respond_to,
                } => {
                    self.handle_remove_product(product_id, respond_to).await;
                }
                CartRequest::UpdateProductAmount { update, respond_to } => {
                    self.handle_update_product_amount(update, respond_to).await;
                }
                CartRequest::Shutdown => {
                    info!("CartService shutting down");
                    break;
                }
            }
        }

        info!("CartService stopped");
    }

    #[instrument(skip(self, respond_to))]
    fn handle_get_cart(&self, respond_to: ServiceResponse<Cart, CartError>) {
        debug!(items = self.cart.len(), "Processing get_cart request");
        let _ = respond_to.send(Ok(self.cart.clone()));
    }

    #[instrument(skip(self, respond_to))]
    async fn handle_add_product(
        &mut self,
        product_id: ProductId,
        respond_to: ServiceResponse<Cart, CartError>,
    ) {
        debug!("Processing add_product request");

        let result = self.add_product(product_id).await;
        match &result {
            Ok(cart) => info!(
                amount = cart.get(product_id).map(|p| p.amount),
                "Product added to cart"
            ),
            Err(e) => error!(error = %e, "Adding product failed"),
        }

        let _ = respond_to.send(result);
    }

    #[instrument(skip(self, respond_to))]
    async fn handle_remove_product(
        &mut self,
        product_id: ProductId,
        respond_to: ServiceResponse<Cart, CartError>,
    ) {
        debug!("Processing remove_product request");

        let mut next = self.cart.clone();
        let result = match next.remove(product_id) {
            Some(_) => self.commit(next).await,
            None => Err(CartError::ProductNotFound(product_id)),
        };
        match &result {
            Ok(cart) => info!(items = cart.len(), "Product removed from cart"),
            Err(e) => error!(error = %e, "Removing product failed"),
        }

        let _ = respond_to.send(result);
    }

    #[instrument(
        fields(product_id = %update.product_id, amount = %update.amount),
        skip(self, update, respond_to)
    )]
    async fn handle_update_product_amount(
        &mut self,
        update: UpdateProductAmount,
        respond_to: ServiceResponse<Cart, CartError>,
    ) {
        debug!("Processing update_product_amount request");

        let result = self.update_product_amount(update).await;
        match &result {
            Ok(_) => info!("Product amount updated"),
            Err(e) => error!(error = %e, "Updating product amount failed"),
        }

        let _ = respond_to.send(result);
    }

    async fn add_product(&mut self, product_id: ProductId) -> Result<Cart, CartError> {
        let stock = resolve_stock(self.stock.as_ref(), product_id).await?;

        if let Some(current) = self.cart.get(product_id).map(|p| p.amount) {
            return self
                .apply_amount(product_id, current.saturating_add(1), stock)
                .await;
        }

        if !stock.covers(1) {
            warn!(available = stock.amount, "Product is out of stock");
            return Err(CartError::StockShortage {
                product_id,
                requested: 1,
                available: stock.amount,
            });
        }

        let entry = self.resolve_metadata(product_id).await?;
        let mut next = self.cart.clone();
        if !next.push(Product::from_catalog(entry, 1)) {
            return Err(CartError::ProductNotFound(product_id));
        }
        self.commit(next).await
    }

    async fn update_product_amount(
        &mut self,
        update: UpdateProductAmount,
    ) -> Result<Cart, CartError> {
        let UpdateProductAmount { product_id, amount } = update;
        if amount == 0 {
            return Err(CartError::InvalidAmount { product_id, amount });
        }
        if !self.cart.contains(product_id) {
            return Err(CartError::ProductNotFound(product_id));
        }

        let stock = resolve_stock(self.stock.as_ref(), product_id).await?;
        self.apply_amount(product_id, amount, stock).await
    }

    /// Sets an existing line to `amount` if `stock` covers it.
    async fn apply_amount(
        &mut self,
        product_id: ProductId,
        amount: u32,
        stock: StockEntry,
    ) -> Result<Cart, CartError> {
        if !stock.covers(amount) {
            warn!(requested = amount, available = stock.amount, "Stock exceeded");
            return Err(CartError::StockShortage {
                product_id,
                requested: amount,
                available: stock.amount,
            });
        }

        let mut next = self.cart.clone();
        if !next.set_amount(product_id, amount) {
            return Err(CartError::ProductNotFound(product_id));
        }
        self.commit(next).await
    }

    async fn resolve_metadata(
        &mut self,
        product_id: ProductId,
    ) -> Result<CatalogEntry, CartError> {
        if let Some(entry) = self.metadata.get(&product_id) {
            return Ok(entry.clone());
        }

        let entry = self
            .catalog
            .product(product_id)
            .await
            .map_err(|e| CartError::from_catalog_lookup(product_id, e))?;
        debug!(title = %entry.title, price = %entry.price, "Product metadata fetched");
        self.metadata.insert(product_id, entry.clone());
        Ok(entry)
    }

    /// Persists `next` and makes it the current cart.
    async fn commit(&mut self, next: Cart) -> Result<Cart, CartError> {
        self.store.save(&next).await?;
        self.cart = next;
        Ok(self.cart.clone())
    }
}

async fn resolve_stock(
    stock: &dyn StockLookup,
    product_id: ProductId,
) -> Result<StockEntry, CartError> {
    let entry = stock
        .stock(product_id)
        .await
        .map_err(|e| CartError::from_stock_lookup(product_id, e))?;
    debug!(available = entry.amount, "Stock resolved");
    Ok(entry)
}
