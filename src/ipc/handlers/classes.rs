use crate::ipc::error::{ok, store_err};
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use crate::store::classes;
use serde_json::json;

fn handle_classes_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    match classes::list(&state.db) {
        Ok(rows) => ok(&req.id, json!({ "classes": rows })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_classes_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match classes::create(&state.db, &name) {
        Ok(class) => {
            tracing::info!(class_id = %class.id, name = %class.name, "class created");
            ok(&req.id, json!({ "classId": class.id, "name": class.name }))
        }
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_classes_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match classes::delete(&state.db, &class_id) {
        Ok(()) => {
            tracing::info!(class_id = %class_id, "class deleted with its students and subjects");
            ok(&req.id, json!({ "ok": true }))
        }
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classes.list" => Some(handle_classes_list(state, req)),
        "classes.create" => Some(handle_classes_create(state, req)),
        "classes.delete" => Some(handle_classes_delete(state, req)),
        _ => None,
    }
}
