// ── Supplier domain type ──

use serde::{Deserialize, Serialize};

/// Read-only in this layer; creation and edits happen elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
}
