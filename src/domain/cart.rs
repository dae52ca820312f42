use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Product, ProductId};

/// The shopper's selection, in the order products were added.
///
/// Ids are unique and every line has `amount >= 1`. Lines that would drop to
/// zero are removed instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<Product>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cart from arbitrary lines, dropping zero amounts and keeping the
    /// first occurrence of a repeated id.
    pub fn from_products(products: impl IntoIterator<Item = Product>) -> Self {
        let mut seen = HashSet::new();
        let items = products
            .into_iter()
            .filter(|product| product.amount >= 1)
            .filter(|product| seen.insert(product.id))
            .collect();
        Self { items }
    }

    pub fn items(&self) -> &[Product] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.items.iter().find(|product| product.id == id)
    }

    pub fn contains(&self, id: ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Appends a new line. Returns `false` and leaves the cart untouched if the
    /// id is already present or the amount is zero.
    pub fn push(&mut self, product: Product) -> bool {
        if product.amount == 0 || self.contains(product.id) {
            return false;
        }
        self.items.push(product);
        true
    }

    /// Sets the amount of an existing line in place.
    pub fn set_amount(&mut self, id: ProductId, amount: u32) -> bool {
        if amount == 0 {
            return false;
        }
        match self.items.iter_mut().find(|product| product.id == id) {
            Some(product) => {
                product.amount = amount;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: ProductId) -> Option<Product> {
        let index = self.items.iter().position(|product| product.id == id)?;
        Some(self.items.remove(index))
    }

    /// Sum of every line's subtotal.
    pub fn total(&self) -> Decimal {
        self.items.iter().map(Product::subtotal).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: ProductId, amount: u32) -> Product {
        Product {
            id,
            title: format!("Sneaker {id}"),
            price: Decimal::new(17990, 2),
            image: format!("https://cdn.example.com/{id}.jpg"),
            amount,
        }
    }

    #[test]
    fn from_products_drops_zero_amounts_and_duplicates() {
        let cart =
            Cart::from_products(vec![product(1, 2), product(2, 0), product(1, 5), product(3, 1)]);

        let ids: Vec<_> = cart.items().iter().map(|p| (p.id, p.amount)).collect();
        assert_eq!(ids, vec![(1, 2), (3, 1)]);
    }

    #[test]
    fn push_rejects_existing_id() {
        let mut cart = Cart::new();
        assert!(cart.push(product(1, 1)));
        assert!(!cart.push(product(1, 4)));
        assert_eq!(cart.get(1).map(|p| p.amount), Some(1));
    }

    #[test]
    fn set_amount_keeps_order_and_other_lines() {
        let mut cart = Cart::from_products(vec![product(1, 1), product(2, 1), product(3, 1)]);

        assert!(cart.set_amount(2, 4));
        assert!(!cart.set_amount(2, 0));
        assert!(!cart.set_amount(9, 1));

        let lines: Vec<_> = cart.items().iter().map(|p| (p.id, p.amount)).collect();
        assert_eq!(lines, vec![(1, 1), (2, 4), (3, 1)]);
    }

    #[test]
    fn total_sums_subtotals() {
        let cart = Cart::from_products(vec![product(1, 2), product(2, 1)]);
        assert_eq!(cart.total(), Decimal::new(53970, 2));
    }

    #[test]
    fn serializes_as_plain_array() {
        let cart = Cart::from_products(vec![product(7, 1)]);
        let json = serde_json::to_value(&cart).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["id"], 7);
    }
}
