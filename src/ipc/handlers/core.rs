use crate::ipc::error::{ok, store_err};
use crate::ipc::types::{AppState, Request};
use crate::store::{self, grades};
use serde_json::json;

const RECENT_GRADES: usize = 10;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "database": state.config.database.describe(),
        }),
    )
}

fn handle_stats_overview(state: &mut AppState, req: &Request) -> serde_json::Value {
    let counts = match store::entity_counts(&state.db) {
        Ok(v) => v,
        Err(e) => return store_err(&req.id, &e),
    };
    let recent = match grades::latest(&state.db, RECENT_GRADES) {
        Ok(v) => v,
        Err(e) => return store_err(&req.id, &e),
    };
    ok(
        &req.id,
        json!({
            "counts": counts,
            "recentGrades": recent,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "stats.overview" => Some(handle_stats_overview(state, req)),
        _ => None,
    }
}
