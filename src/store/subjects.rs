use super::{classes, map_insert_err, required_text, Result, StoreError};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub coefficient: i64,
    pub class_id: String,
}

impl Subject {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            coefficient: row.get(2)?,
            class_id: row.get(3)?,
        })
    }
}

const COLUMNS: &str = "id, name, coefficient, class_id";

pub const MAX_COEFFICIENT: i64 = 100;

/// Subjects ordered by class, then name.
pub fn list(conn: &Connection, class_id: Option<&str>) -> Result<Vec<Subject>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM subjects
         WHERE ?1 IS NULL OR class_id = ?1
         ORDER BY class_id, name"
    ))?;
    let rows = stmt
        .query_map([class_id], Subject::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn get(conn: &Connection, subject_id: &str) -> Result<Subject> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM subjects WHERE id = ?"),
        [subject_id],
        Subject::from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::NotFound {
        entity: "subject",
        id: subject_id.to_string(),
    })
}

pub fn create(conn: &Connection, name: &str, coefficient: i64, class_id: &str) -> Result<Subject> {
    if !classes::any_exists(conn)? {
        return Err(StoreError::MissingPrerequisite(
            "add a class before adding subjects",
        ));
    }
    let name = required_text("name", name)?;
    if !(1..=MAX_COEFFICIENT).contains(&coefficient) {
        return Err(StoreError::Invalid {
            field: "coefficient",
            message: format!("must be between 1 and {MAX_COEFFICIENT}, got {coefficient}"),
        });
    }
    classes::ensure_exists(conn, class_id)?;

    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO subjects(id, name, coefficient, class_id) VALUES(?, ?, ?, ?)",
        (&id, &name, coefficient, class_id),
    )
    .map_err(|e| map_insert_err(e, "subject", &name))?;

    Ok(Subject {
        id,
        name,
        coefficient,
        class_id: class_id.to_string(),
    })
}

/// Removes the subject and, by cascade, every grade recorded for it.
pub fn delete(conn: &Connection, subject_id: &str) -> Result<()> {
    let n = conn.execute("DELETE FROM subjects WHERE id = ?", [subject_id])?;
    if n == 0 {
        return Err(StoreError::NotFound {
            entity: "subject",
            id: subject_id.to_string(),
        });
    }
    Ok(())
}
