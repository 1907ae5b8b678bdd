// ── Business analytics over the local replicas ──
//
// Pure functions: headline numbers for the dashboard and the JSON
// snapshot handed to the assist provider for free-text analysis.

use std::sync::Arc;

use serde::Serialize;

use crate::model::{Product, Sale, Supplier};

/// How many recent sales the dashboard shows.
pub const RECENT_SALES: usize = 5;

/// The business data handed to analysis, exactly as the replicas hold
/// it. Serializes to `{products, sales, suppliers}`.
#[derive(Debug, Clone, Serialize)]
pub struct BusinessSnapshot {
    pub products: Arc<Vec<Arc<Product>>>,
    pub sales: Arc<Vec<Arc<Sale>>>,
    pub suppliers: Arc<Vec<Arc<Supplier>>>,
}

/// Headline numbers over a [`BusinessSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessSummary {
    /// Σ sale.total_price over all recorded sales.
    pub total_revenue: f64,
    /// Σ stock × cost over all products.
    pub inventory_value: f64,
    pub product_count: usize,
    pub supplier_count: usize,
}

/// Compute the headline numbers.
pub fn summarize(snapshot: &BusinessSnapshot) -> BusinessSummary {
    let total_revenue = snapshot.sales.iter().map(|s| s.total_price).sum();
    let inventory_value = snapshot
        .products
        .iter()
        .map(|p| f64::from(p.stock) * p.cost)
        .sum();

    BusinessSummary {
        total_revenue,
        inventory_value,
        product_count: snapshot.products.len(),
        supplier_count: snapshot.suppliers.len(),
    }
}

/// The most recent sales, relying on the sales replica's date-descending
/// order.
pub fn recent_sales(snapshot: &BusinessSnapshot) -> Vec<Arc<Sale>> {
    snapshot.sales.iter().take(RECENT_SALES).cloned().collect()
}
