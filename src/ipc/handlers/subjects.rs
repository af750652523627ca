use crate::ipc::error::{ok, store_err};
use crate::ipc::helpers::{optional_str, required_i64, required_str};
use crate::ipc::types::{AppState, Request};
use crate::store::subjects;
use serde_json::json;

fn handle_subjects_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let class_id = optional_str(req, "classId");
    match subjects::list(&state.db, class_id.as_deref()) {
        Ok(rows) => ok(&req.id, json!({ "subjects": rows })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_subjects_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let coefficient = if req.params.get("coefficient").is_some() {
        match required_i64(req, "coefficient") {
            Ok(v) => v,
            Err(e) => return e,
        }
    } else {
        1
    };

    match subjects::create(&state.db, &name, coefficient, &class_id) {
        Ok(subject) => {
            tracing::info!(subject_id = %subject.id, coefficient = subject.coefficient, "subject created");
            ok(&req.id, json!({ "subjectId": subject.id, "subject": subject }))
        }
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_subjects_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let subject_id = match required_str(req, "subjectId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match subjects::delete(&state.db, &subject_id) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "subjects.list" => Some(handle_subjects_list(state, req)),
        "subjects.create" => Some(handle_subjects_create(state, req)),
        "subjects.delete" => Some(handle_subjects_delete(state, req)),
        _ => None,
    }
}
