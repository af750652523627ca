use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

#[test]
fn missing_database_url_fails_fast() {
    let workspace = temp_dir("gradebook-startup-missing");
    let out = Command::new(env!("CARGO_BIN_EXE_gradebookd"))
        .current_dir(&workspace)
        .env_remove("DATABASE_URL")
        .stdin(Stdio::null())
        .output()
        .expect("run gradebookd");

    assert_eq!(out.status.code(), Some(2));
    assert!(out.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("DATABASE_URL"), "stderr: {}", stderr);

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn database_url_from_dotenv_is_used() {
    let workspace = temp_dir("gradebook-startup-dotenv");
    std::fs::write(workspace.join(".env"), "DATABASE_URL=sqlite://data/from-dotenv.sqlite3\n")
        .expect("write .env");

    let out = Command::new(env!("CARGO_BIN_EXE_gradebookd"))
        .current_dir(&workspace)
        .env_remove("DATABASE_URL")
        .stdin(Stdio::null())
        .output()
        .expect("run gradebookd");

    assert_eq!(out.status.code(), Some(0));
    assert!(workspace.join("data").join("from-dotenv.sqlite3").is_file());

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn non_sqlite_database_url_is_a_configuration_error() {
    let workspace = temp_dir("gradebook-startup-scheme");
    let out = Command::new(env!("CARGO_BIN_EXE_gradebookd"))
        .current_dir(&workspace)
        .env("DATABASE_URL", "postgresql://postgres@localhost/moyennes")
        .stdin(Stdio::null())
        .output()
        .expect("run gradebookd");

    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("unsupported database url"), "stderr: {}", stderr);

    let _ = std::fs::remove_dir_all(workspace);
}
