use serde::{Deserialize, Serialize};

use super::ProductId;

/// Available quantity reported by the stock service. Never mutated locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntry {
    pub id: ProductId,
    pub amount: u32,
}

impl StockEntry {
    pub fn new(id: ProductId, amount: u32) -> Self {
        Self { id, amount }
    }

    pub fn covers(&self, requested: u32) -> bool {
        self.amount >= requested
    }
}
