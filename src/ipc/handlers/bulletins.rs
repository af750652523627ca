use crate::bulletin::{self, BulletinModel};
use crate::calc;
use crate::ipc::error::{err, ok, store_err};
use crate::ipc::helpers::{optional_str, required_str};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn load_model(state: &AppState, req: &Request) -> Result<BulletinModel, serde_json::Value> {
    let student_id = required_str(req, "studentId")?;
    BulletinModel::load(&state.db, &student_id).map_err(|e| store_err(&req.id, &e))
}

fn handle_bulletins_preview(state: &mut AppState, req: &Request) -> serde_json::Value {
    let model = match load_model(state, req) {
        Ok(m) => m,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({
            "student": {
                "id": model.student_id,
                "lastName": model.last_name,
                "firstName": model.first_name,
                "matricule": model.matricule,
            },
            "rows": model.rows,
            "average": model.average.map(|a| calc::round_2_decimals(a).to_string()),
            "averageDisplay": calc::format_average(model.average),
        }),
    )
}

fn handle_bulletins_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let model = match load_model(state, req) {
        Ok(m) => m,
        Err(e) => return e,
    };
    let out_dir = optional_str(req, "outDir")
        .map(PathBuf::from)
        .unwrap_or_else(|| state.config.bulletin_dir.clone());

    match bulletin::export(&model, &out_dir) {
        Ok(summary) => {
            tracing::info!(
                student_id = %model.student_id,
                path = %summary.path.display(),
                bytes = summary.bytes,
                "bulletin exported"
            );
            ok(
                &req.id,
                json!({
                    "path": summary.path.to_string_lossy(),
                    "fileName": summary.file_name,
                    "contentType": bulletin::CONTENT_TYPE,
                    "bytes": summary.bytes,
                    "pages": summary.pages,
                }),
            )
        }
        Err(e) => err(&req.id, "bulletin_export_failed", format!("{e:#}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "bulletins.preview" => Some(handle_bulletins_preview(state, req)),
        "bulletins.export" => Some(handle_bulletins_export(state, req)),
        _ => None,
    }
}
