//! Presentation helpers: cart rows with formatted prices, totals, a plain-text
//! table, and the increment/decrement/remove intents the rows expose.

mod format;

pub use format::format_price;

use rust_decimal::Decimal;

use crate::clients::CartClient;
use crate::domain::{Cart, Product, ProductId};
use crate::error::CartError;
use crate::messages::UpdateProductAmount;

/// One rendered cart line.
#[derive(Debug, Clone, PartialEq)]
pub struct CartRow {
    pub product: Product,
    pub price_formatted: String,
    pub subtotal: Decimal,
    pub subtotal_formatted: String,
}

impl CartRow {
    /// The decrement control is disabled at amount 1; removal is explicit.
    pub fn can_decrement(&self) -> bool {
        self.product.amount > 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartView {
    pub rows: Vec<CartRow>,
    pub total: Decimal,
    pub total_formatted: String,
}

impl CartView {
    pub fn from_cart(cart: &Cart) -> Self {
        let rows: Vec<CartRow> = cart
            .items()
            .iter()
            .map(|product| {
                let subtotal = product.subtotal();
                CartRow {
                    product: product.clone(),
                    price_formatted: format_price(product.price),
                    subtotal,
                    subtotal_formatted: format_price(subtotal),
                }
            })
            .collect();
        let total = rows.iter().map(|row| row.subtotal).sum();

        Self {
            rows,
            total,
            total_formatted: format_price(total),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Renders the view as a fixed-width text table.
pub fn render_table(view: &CartView) -> String {
    if view.is_empty() {
        return format!("Your cart is empty.\nTOTAL {}\n", view.total_formatted);
    }

    let title_width = view
        .rows
        .iter()
        .map(|row| row.product.title.chars().count())
        .max()
        .unwrap_or(0)
        .max("PRODUCT".len());

    let mut out = format!(
        "{:>6}  {:<title_width$}  {:>5}  {:>14}  {:>14}\n",
        "ID", "PRODUCT", "QTY", "PRICE", "SUBTOTAL"
    );
    for row in &view.rows {
        out.push_str(&format!(
            "{:>6}  {:<title_width$}  {:>5}  {:>14}  {:>14}\n",
            row.product.id,
            row.product.title,
            row.product.amount,
            row.price_formatted,
            row.subtotal_formatted
        ));
    }
    out.push_str(&format!("TOTAL {}\n", view.total_formatted));
    out
}

/// Asks for one more unit of `product`.
pub async fn increment(client: &CartClient, product: &Product) -> Result<Cart, CartError> {
    let amount = product.amount.saturating_add(1);
    client
        .update_product_amount(UpdateProductAmount::new(product.id, amount))
        .await
}

/// Asks for one unit less. Returns `Ok(None)` without contacting the service
/// when the line is already at 1.
pub async fn decrement(client: &CartClient, product: &Product) -> Result<Option<Cart>, CartError> {
    if product.amount <= 1 {
        return Ok(None);
    }
    client
        .update_product_amount(UpdateProductAmount::new(product.id, product.amount - 1))
        .await
        .map(Some)
}

pub async fn remove(client: &CartClient, product_id: ProductId) -> Result<Cart, CartError> {
    client.remove_product(product_id).await
}
