// Batch write operations.
//
// A batch is submitted to `POST /v1/batch` as `{"writes": [...]}` and
// committed all-or-nothing by the backend.

use serde::Serialize;
use serde_json::Value;

/// A single write inside an atomic batch.
///
/// `Increment` is applied by the backend against the currently persisted
/// field value; the whole batch fails with code `conflict` if the result
/// would drop below `floor`. This is the only way stock is decremented --
/// clients never send an absolute stock value.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Write {
    /// Insert a new document; the backend assigns the id.
    Create { collection: String, fields: Value },

    /// Upsert a document at a caller-chosen id.
    Set {
        collection: String,
        id: String,
        fields: Value,
    },

    /// Overwrite the listed fields of an existing document.
    Update {
        collection: String,
        id: String,
        fields: Value,
    },

    /// Server-side conditional increment of a numeric field.
    Increment {
        collection: String,
        id: String,
        field: String,
        by: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        floor: Option<i64>,
    },
}
