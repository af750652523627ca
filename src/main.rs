mod bulletin;
mod calc;
mod config;
mod db;
mod ipc;
mod store;

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let config = match crate::config::AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            // Logging is not up yet; this must reach the user regardless.
            eprintln!("gradebookd: {e}");
            return ExitCode::from(2);
        }
    };

    // stdout carries IPC responses, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_level))
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();

    let conn = match db::open_db(&config.database) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("failed to open database: {e:#}");
            eprintln!("gradebookd: failed to open database: {e:#}");
            return ExitCode::from(2);
        }
    };
    tracing::info!(
        database = %config.database.describe(),
        version = env!("CARGO_PKG_VERSION"),
        "gradebookd ready"
    );

    let mut state = ipc::AppState { config, db: conn };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                tracing::warn!("bad request line: {e}");
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    tracing::info!("stdin closed, shutting down");
    ExitCode::SUCCESS
}
