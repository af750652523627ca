use crate::ipc::error::err;
use crate::ipc::types::Request;
use rust_decimal::Decimal;
use serde_json::json;
use std::str::FromStr;

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn optional_str(req: &Request, key: &str) -> Option<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn required_i64(req: &Request, key: &str) -> Result<i64, serde_json::Value> {
    match req.params.get(key) {
        Some(v) => v
            .as_i64()
            .or_else(|| v.as_str().and_then(|s| s.trim().parse::<i64>().ok()))
            .ok_or_else(|| {
                err(
                    &req.id,
                    "bad_params",
                    format!("{} must be an integer", key),
                    Some(json!({ "field": key, "value": v })),
                )
            }),
        None => Err(err(&req.id, "bad_params", format!("missing {}", key), None)),
    }
}

/// Accepts a JSON number or a numeric string; parsed as an exact decimal.
pub fn required_decimal(req: &Request, key: &str) -> Result<Decimal, serde_json::Value> {
    let Some(v) = req.params.get(key) else {
        return Err(err(&req.id, "bad_params", format!("missing {}", key), None));
    };
    let text = match v {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.trim().replace(',', "."),
        _ => String::new(),
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| {
            err(
                &req.id,
                "bad_params",
                format!("{} must be a decimal number", key),
                Some(json!({ "field": key, "value": v })),
            )
        })
}
