pub mod admin;
pub mod classes;
pub mod grades;
pub mod students;
pub mod subjects;

use rusqlite::{Connection, ErrorCode};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} already exists: {detail}")]
    DuplicateKey {
        entity: &'static str,
        detail: String,
    },

    #[error("{0}")]
    MissingPrerequisite(&'static str),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("file not found: {}", .0.to_string_lossy())]
    ResourceNotFound(PathBuf),

    #[error("invalid {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Stable error code used in IPC responses.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::DuplicateKey { .. } => "duplicate_key",
            StoreError::MissingPrerequisite(_) => "missing_prerequisite",
            StoreError::NotFound { .. } => "not_found",
            StoreError::ResourceNotFound(_) => "resource_not_found",
            StoreError::Invalid { .. } => "bad_params",
            StoreError::Db(_) => "db_error",
            StoreError::Io(_) => "io_error",
        }
    }

    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        StoreError::Invalid {
            field,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Maps a uniqueness violation to `DuplicateKey`; everything else passes through.
fn map_insert_err(e: rusqlite::Error, entity: &'static str, detail: &str) -> StoreError {
    if let rusqlite::Error::SqliteFailure(f, _) = &e {
        if f.code == ErrorCode::ConstraintViolation
            && (f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
        {
            return StoreError::DuplicateKey {
                entity,
                detail: detail.to_string(),
            };
        }
    }
    StoreError::Db(e)
}

fn required_text(field: &'static str, value: &str) -> Result<String> {
    let v = value.trim();
    if v.is_empty() {
        return Err(StoreError::invalid(field, "must not be empty"));
    }
    Ok(v.to_string())
}

fn exists(conn: &Connection, table: &str, id: &str) -> Result<bool> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)", table);
    let found: bool = conn.query_row(&sql, [id], |r| r.get(0))?;
    Ok(found)
}

fn count(conn: &Connection, table: &str) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", table);
    Ok(conn.query_row(&sql, [], |r| r.get(0))?)
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct EntityCounts {
    pub classes: i64,
    pub students: i64,
    pub subjects: i64,
    pub grades: i64,
}

pub fn entity_counts(conn: &Connection) -> Result<EntityCounts> {
    let [classes, students, subjects, grades] = crate::db::TABLES;
    Ok(EntityCounts {
        classes: count(conn, classes)?,
        students: count(conn, students)?,
        subjects: count(conn, subjects)?,
        grades: count(conn, grades)?,
    })
}
