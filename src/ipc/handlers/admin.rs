use crate::db;
use crate::ipc::error::{err, ok, store_err};
use crate::ipc::helpers::optional_str;
use crate::ipc::types::{AppState, Request};
use crate::store::admin;
use serde_json::json;
use std::path::PathBuf;

fn handle_admin_run_init_script(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = optional_str(req, "path")
        .map(PathBuf::from)
        .unwrap_or_else(|| state.config.init_script.clone());

    match admin::run_init_script(&state.db, &path) {
        Ok(bytes) => {
            tracing::info!(path = %path.display(), bytes, "init script executed");
            ok(
                &req.id,
                json!({ "path": path.to_string_lossy(), "bytes": bytes }),
            )
        }
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_admin_schema(state: &mut AppState, req: &Request) -> serde_json::Value {
    match db::inspect_schema(&state.db) {
        Ok(tables) => ok(&req.id, json!({ "tables": tables })),
        Err(e) => err(&req.id, "db_error", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "admin.runInitScript" => Some(handle_admin_run_init_script(state, req)),
        "admin.schema" => Some(handle_admin_schema(state, req)),
        _ => None,
    }
}
