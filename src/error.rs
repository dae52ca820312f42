use thiserror::Error;

use crate::domain::ProductId;

/// Failures of a remote stock or catalog lookup.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LookupError {
    #[error("Entry not found: {0}")]
    NotFound(ProductId),
    #[error("Lookup timed out")]
    Timeout,
    #[error("Lookup network error: {0}")]
    Network(String),
    #[error("Malformed lookup response: {0}")]
    Malformed(String),
}

/// Failures of the local key/value slot backing the persisted cart.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Storage document is corrupt: {0}")]
    Corrupt(String),
}

/// Coarse classification used when turning a failure into a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    StockShortage,
    NotFound,
    InvalidAmount,
    Network,
    Timeout,
    Persistence,
    Internal,
}

/// Errors reported by cart operations. The cart is left unchanged whenever one
/// of these is returned.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CartError {
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    StockShortage {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),
    #[error("Stock entry not found: {0}")]
    StockNotFound(ProductId),
    #[error("Invalid amount {amount} for product {product_id}")]
    InvalidAmount { product_id: ProductId, amount: u32 },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Malformed response: {0}")]
    Malformed(String),
    #[error("Cart persistence error: {0}")]
    Persistence(String),
    #[error("Actor communication error: {0}")]
    ActorCommunication(String),
}

impl CartError {
    /// Maps a stock lookup failure for `product_id`.
    pub fn from_stock_lookup(product_id: ProductId, error: LookupError) -> Self {
        match error {
            LookupError::NotFound(_) => Self::StockNotFound(product_id),
            other => other.into(),
        }
    }

    /// Maps a catalog lookup failure for `product_id`.
    pub fn from_catalog_lookup(product_id: ProductId, error: LookupError) -> Self {
        match error {
            LookupError::NotFound(_) => Self::ProductNotFound(product_id),
            other => other.into(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::StockShortage { .. } => FailureKind::StockShortage,
            Self::ProductNotFound(_) | Self::StockNotFound(_) => FailureKind::NotFound,
            Self::InvalidAmount { .. } => FailureKind::InvalidAmount,
            Self::Network(_) | Self::Malformed(_) => FailureKind::Network,
            Self::Timeout => FailureKind::Timeout,
            Self::Persistence(_) => FailureKind::Persistence,
            Self::ActorCommunication(_) => FailureKind::Internal,
        }
    }

    /// Short text suitable for a transient notification.
    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            FailureKind::StockShortage => "Requested quantity is out of stock",
            FailureKind::NotFound => "Product is not available",
            FailureKind::InvalidAmount => "Quantity must be at least 1",
            FailureKind::Network => "Could not reach the store, please try again",
            FailureKind::Timeout => "The store took too long to answer, please try again",
            FailureKind::Persistence => "Could not save your cart",
            FailureKind::Internal => "Something went wrong with your cart",
        }
    }
}

impl From<LookupError> for CartError {
    fn from(error: LookupError) -> Self {
        match error {
            LookupError::NotFound(id) => Self::ProductNotFound(id),
            LookupError::Timeout => Self::Timeout,
            LookupError::Network(msg) => Self::Network(msg),
            LookupError::Malformed(msg) => Self::Malformed(msg),
        }
    }
}

impl From<StoreError> for CartError {
    fn from(error: StoreError) -> Self {
        Self::Persistence(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_not_found_is_distinct_from_network_failure() {
        let missing = CartError::from_stock_lookup(4, LookupError::NotFound(4));
        let unreachable =
            CartError::from_stock_lookup(4, LookupError::Network("connection refused".into()));

        assert_eq!(missing, CartError::StockNotFound(4));
        assert_eq!(missing.kind(), FailureKind::NotFound);
        assert_eq!(unreachable.kind(), FailureKind::Network);
        assert_ne!(missing.user_message(), unreachable.user_message());
    }

    #[test]
    fn timeout_keeps_its_own_variant() {
        let error = CartError::from_catalog_lookup(2, LookupError::Timeout);
        assert_eq!(error, CartError::Timeout);
        assert_eq!(error.kind(), FailureKind::Timeout);

        let unreachable: CartError = LookupError::Network("connection reset".into()).into();
        assert_ne!(error.kind(), unreachable.kind());
        assert_ne!(error.user_message(), unreachable.user_message());
    }

    #[test]
    fn store_errors_become_persistence_failures() {
        let error: CartError = StoreError::Corrupt("bad header".into()).into();
        assert_eq!(error.kind(), FailureKind::Persistence);
        assert!(error.to_string().contains("bad header"));
    }
}
