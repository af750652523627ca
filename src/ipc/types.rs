use crate::config::AppConfig;
use rusqlite::Connection;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Everything a handler may touch. Built once in `main`, dropped at shutdown.
pub struct AppState {
    pub config: AppConfig,
    pub db: Connection,
}
