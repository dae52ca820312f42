use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Numeric identity shared by catalog, stock and cart entries.
pub type ProductId = u64;

/// Product metadata as served by the catalog, without a cart quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: ProductId,
    pub title: String,
    pub price: Decimal,
    pub image: String,
}

impl CatalogEntry {
    pub fn new(
        id: ProductId,
        title: impl Into<String>,
        price: Decimal,
        image: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            price,
            image: image.into(),
        }
    }
}

/// A product held in the cart.
///
/// `amount` is the quantity the shopper selected. Inside a [`Cart`](super::Cart)
/// it is always at least 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image: String,
    pub amount: u32,
}

impl Product {
    /// Builds a cart line from catalog metadata.
    pub fn from_catalog(entry: CatalogEntry, amount: u32) -> Self {
        Self {
            id: entry.id,
            title: entry.title,
            price: entry.price,
            image: entry.image,
            amount,
        }
    }

    /// Price multiplied by the selected amount.
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.amount)
    }
}
