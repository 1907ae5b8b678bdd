// ── Central reactive replica set ──
//
// Thread-safe storage for the four synchronized collections. Each
// refresh replaces one replica wholesale and notifies subscribers via
// `watch` channels. Only the session facade's own refresh paths write
// here; mutation operations never touch local state directly.

mod replica;

use std::sync::Arc;

use crate::model::{Product, Sale, Supplier, UserProfile};
use crate::stream::CollectionStream;

use replica::Replica;

/// Names of the synchronized collections, as the backend spells them.
pub mod collections {
    pub const PRODUCTS: &str = "products";
    pub const SUPPLIERS: &str = "suppliers";
    pub const SALES: &str = "sales";
    pub const USERS: &str = "users";
}

/// Reactive store for the four synchronized collections.
pub struct ReplicaSet {
    pub(crate) products: Replica<Product>,
    pub(crate) suppliers: Replica<Supplier>,
    pub(crate) sales: Replica<Sale>,
    pub(crate) users: Replica<UserProfile>,
}

impl ReplicaSet {
    pub fn new() -> Self {
        Self {
            products: Replica::new(),
            suppliers: Replica::new(),
            sales: Replica::new(),
            users: Replica::new(),
        }
    }

    // ── Refresh application ──────────────────────────────────────────

    pub(crate) fn apply_products(&self, items: Vec<Product>) {
        self.products
            .replace_all(items.into_iter().map(|p| (p.id.clone(), p)).collect());
    }

    pub(crate) fn apply_suppliers(&self, items: Vec<Supplier>) {
        self.suppliers
            .replace_all(items.into_iter().map(|s| (s.id.clone(), s)).collect());
    }

    /// Sales are re-sorted by date descending on every refresh; ties
    /// break on id so the order is stable for equal timestamps.
    pub(crate) fn apply_sales(&self, mut items: Vec<Sale>) {
        items.sort_by(|a, b| {
            b.recorded_at()
                .cmp(&a.recorded_at())
                .then_with(|| b.id.cmp(&a.id))
        });
        self.sales
            .replace_all(items.into_iter().map(|s| (s.id.clone(), s)).collect());
    }

    pub(crate) fn apply_users(&self, items: Vec<UserProfile>) {
        self.users
            .replace_all(items.into_iter().map(|u| (u.id.clone(), u)).collect());
    }

    /// Drop everything -- sign-out teardown.
    pub(crate) fn clear_all(&self) {
        self.products.clear();
        self.suppliers.clear();
        self.sales.clear();
        self.users.clear();
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn products_snapshot(&self) -> Arc<Vec<Arc<Product>>> {
        self.products.snapshot()
    }

    pub fn suppliers_snapshot(&self) -> Arc<Vec<Arc<Supplier>>> {
        self.suppliers.snapshot()
    }

    pub fn sales_snapshot(&self) -> Arc<Vec<Arc<Sale>>> {
        self.sales.snapshot()
    }

    pub fn users_snapshot(&self) -> Arc<Vec<Arc<UserProfile>>> {
        self.users.snapshot()
    }

    // ── Single-entity lookups ────────────────────────────────────────

    pub fn product_by_id(&self, id: &str) -> Option<Arc<Product>> {
        self.products.get(id)
    }

    pub fn user_by_id(&self, id: &str) -> Option<Arc<UserProfile>> {
        self.users.get(id)
    }

    // ── Count accessors ──────────────────────────────────────────────

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    pub fn sale_count(&self) -> usize {
        self.sales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
            && self.suppliers.is_empty()
            && self.sales.is_empty()
            && self.users.is_empty()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_products(&self) -> CollectionStream<Product> {
        CollectionStream::new(self.products.subscribe())
    }

    pub fn subscribe_suppliers(&self) -> CollectionStream<Supplier> {
        CollectionStream::new(self.suppliers.subscribe())
    }

    pub fn subscribe_sales(&self) -> CollectionStream<Sale> {
        CollectionStream::new(self.sales.subscribe())
    }

    pub fn subscribe_users(&self) -> CollectionStream<UserProfile> {
        CollectionStream::new(self.users.subscribe())
    }
}

impl Default for ReplicaSet {
    fn default() -> Self {
        Self::new()
    }
}
