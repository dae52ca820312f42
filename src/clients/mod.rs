mod macros;

use tokio::sync::mpsc;
use tracing::{debug, instrument};

use crate::domain::{Cart, ProductId};
use crate::error::CartError;
use crate::messages::{CartRequest, UpdateProductAmount};
use macros::client_method;

/// Handle to the cart service. Cheap to clone; every clone talks to the same cart.
///
/// This is the whole boundary the presentation layer sees: a cart snapshot plus
/// the three mutations.
#[derive(Clone, Debug)]
pub struct CartClient {
    sender: mpsc::Sender<CartRequest>,
}

impl CartClient {
    pub fn new(sender: mpsc::Sender<CartRequest>) -> Self {
        Self { sender }
    }

    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<(), CartError> {
        debug!("Sending shutdown request");
        self.sender
            .send(CartRequest::Shutdown)
            .await
            .map_err(|_| CartError::ActorCommunication("Actor closed".to_string()))
    }
}

client_method!(CartClient => fn cart() -> Cart as CartRequest::GetCart, Error = CartError);
client_method!(
    CartClient => fn add_product(product_id: ProductId) -> Cart
    as CartRequest::AddProduct, Error = CartError
);
client_method!(
    CartClient => fn remove_product(product_id: ProductId) -> Cart
    as CartRequest::RemoveProduct, Error = CartError
);
client_method!(
    CartClient => fn update_product_amount(update: UpdateProductAmount) -> Cart
    as CartRequest::UpdateProductAmount, Error = CartError
);
