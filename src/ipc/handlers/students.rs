use crate::ipc::error::{ok, store_err};
use crate::ipc::helpers::{optional_str, required_str};
use crate::ipc::types::{AppState, Request};
use crate::store::students::{self, NewStudent};
use serde_json::json;

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let class_id = optional_str(req, "classId");
    match students::list(&state.db, class_id.as_deref()) {
        Ok(rows) => ok(&req.id, json!({ "students": rows })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let last_name = match required_str(req, "lastName") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let first_name = match required_str(req, "firstName") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let matricule = match required_str(req, "matricule") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(e) => return e,
    };

    match students::create(
        &state.db,
        NewStudent {
            last_name: &last_name,
            first_name: &first_name,
            matricule: &matricule,
            class_id: &class_id,
        },
    ) {
        Ok(student) => {
            tracing::info!(student_id = %student.id, matricule = %student.matricule, "student created");
            ok(&req.id, json!({ "studentId": student.id, "student": student }))
        }
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match students::delete(&state.db, &student_id) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        _ => None,
    }
}
