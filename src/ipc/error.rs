use crate::store::StoreError;
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub fn store_err(id: &str, e: &StoreError) -> serde_json::Value {
    let details = match e {
        StoreError::DuplicateKey { entity, detail } => {
            Some(json!({ "entity": entity, "value": detail }))
        }
        StoreError::NotFound { entity, id } => Some(json!({ "entity": entity, "id": id })),
        StoreError::ResourceNotFound(path) => Some(json!({ "path": path.to_string_lossy() })),
        StoreError::Invalid { field, .. } => Some(json!({ "field": field })),
        _ => None,
    };
    err(id, e.code(), e.to_string(), details)
}
