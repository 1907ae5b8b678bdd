// ── Document ↔ domain conversion ──
//
// The store speaks `Document { id, fields }`; the domain speaks typed
// structs with an inline `id`. Conversion splices the id into the field
// map before deserializing, and strips it before writes (the id never
// travels inside `fields`).

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use stockpile_api::Document;

use crate::error::SessionError;

/// Deserialize a document into a domain type, injecting the document id.
pub(crate) fn entity_from_document<T: DeserializeOwned>(doc: Document) -> Result<T, SessionError> {
    let mut fields = doc.fields;
    if let Some(map) = fields.as_object_mut() {
        map.insert("id".into(), Value::String(doc.id));
    }
    serde_json::from_value(fields).map_err(|e| SessionError::Internal(format!(
        "malformed document: {e}"
    )))
}

/// Deserialize a whole collection listing, skipping documents that fail
/// to decode (logged, not fatal -- one bad write elsewhere must not
/// blank the replica).
pub(crate) fn entities_from_documents<T: DeserializeOwned>(docs: Vec<Document>) -> Vec<T> {
    docs.into_iter()
        .filter_map(|doc| {
            let id = doc.id.clone();
            match entity_from_document(doc) {
                Ok(entity) => Some(entity),
                Err(e) => {
                    tracing::warn!(%id, error = %e, "skipping undecodable document");
                    None
                }
            }
        })
        .collect()
}

/// Serialize a domain value to its wire field map, with `id` removed.
pub(crate) fn fields_without_id<T: Serialize>(entity: &T) -> Result<Value, SessionError> {
    let mut value = serde_json::to_value(entity)
        .map_err(|e| SessionError::Internal(format!("serialize failed: {e}")))?;
    if let Some(map) = value.as_object_mut() {
        map.remove("id");
    }
    Ok(value)
}
