//! Canned wire envelopes.

use serde_json::{json, Value};

/// Wraps an object in a successful item envelope.
pub fn item_envelope(object: Value) -> Value {
    json!({ "wasSuccessful": true, "object": object })
}

/// A failed item envelope with a message.
pub fn failed_item_envelope(message: &str) -> Value {
    json!({ "wasSuccessful": false, "message": message })
}

/// Wraps items in a successful list envelope with paging fields.
pub fn list_envelope(
    items: Vec<Value>,
    page: u32,
    page_size: u32,
    page_count: u32,
    total_count: i64,
) -> Value {
    json!({
        "wasSuccessful": true,
        "list": items,
        "page": page,
        "pageSize": page_size,
        "pageCount": page_count,
        "totalCount": total_count,
    })
}

/// A successful count envelope.
pub fn count_envelope(count: i64) -> Value {
    json!({ "wasSuccessful": true, "object": count })
}

/// A minimal case object payload.
pub fn case_json(id: i64, title: &str) -> Value {
    json!({ "caseId": id, "title": title })
}
