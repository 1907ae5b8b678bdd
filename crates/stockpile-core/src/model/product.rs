// ── Product domain type ──

use serde::{Deserialize, Serialize};

/// Stock level below which a product counts as running low.
pub const LOW_STOCK_THRESHOLD: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    /// Foreign key into the `suppliers` collection.
    pub supplier_id: String,
    /// On-hand units. Mutated only through `record_sale`.
    pub stock: u32,
    pub price: f64,
    pub cost: f64,
}

impl Product {
    pub fn is_low_stock(&self) -> bool {
        self.stock < LOW_STOCK_THRESHOLD
    }
}

/// A product as submitted for creation -- the backend assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub category: String,
    pub supplier_id: String,
    pub stock: u32,
    pub price: f64,
    pub cost: f64,
}
