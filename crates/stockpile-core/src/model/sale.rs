// ── Sale domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An immutable sale record.
///
/// `product_name` and `total_price` are denormalized snapshots taken at
/// recording time; later product edits do not rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    #[serde(default)]
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub total_price: f64,
    /// RFC 3339 timestamp string, as the backend stores it.
    pub date: String,
    pub employee_id: String,
}

impl Sale {
    /// Parse the stored timestamp. Unparsable dates sort as the epoch so
    /// a single bad record cannot panic a refresh.
    pub fn recorded_at(&self) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(&self.date)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_default()
    }
}

/// Input for recording a sale. Everything else on [`Sale`] is derived
/// by the session facade at recording time.
#[derive(Debug, Clone)]
pub struct SaleDraft {
    pub product_id: String,
    pub quantity: u32,
}
