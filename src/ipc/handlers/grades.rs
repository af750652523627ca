use crate::ipc::error::{ok, store_err};
use crate::ipc::helpers::{required_decimal, required_str};
use crate::ipc::types::{AppState, Request};
use crate::store::{classes, grades};
use serde_json::json;

fn handle_grades_upsert(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let subject_id = match required_str(req, "subjectId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let value = match required_decimal(req, "value") {
        Ok(v) => v,
        Err(e) => return e,
    };

    match grades::upsert(&state.db, &student_id, &subject_id, value) {
        Ok(grade) => {
            tracing::debug!(grade_id = %grade.id, value = %grade.value, "grade recorded");
            ok(&req.id, json!({ "grade": grade }))
        }
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_grades_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    match grades::list(&state.db) {
        Ok(rows) => ok(&req.id, json!({ "grades": rows })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_grades_list_by_class(state: &mut AppState, req: &Request) -> serde_json::Value {
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    if let Err(e) = classes::ensure_exists(&state.db, &class_id) {
        return store_err(&req.id, &e);
    }
    match grades::for_class(&state.db, &class_id) {
        Ok(rows) => ok(&req.id, json!({ "grades": rows })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_grades_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let subject_id = match required_str(req, "subjectId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match grades::delete(&state.db, &student_id, &subject_id) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.upsert" => Some(handle_grades_upsert(state, req)),
        "grades.list" => Some(handle_grades_list(state, req)),
        "grades.listByClass" => Some(handle_grades_list_by_class(state, req)),
        "grades.delete" => Some(handle_grades_delete(state, req)),
        _ => None,
    }
}
