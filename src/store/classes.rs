use super::{exists, map_insert_err, required_text, Result, StoreError};
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    pub id: String,
    pub name: String,
    pub student_count: i64,
    pub subject_count: i64,
}

pub fn list(conn: &Connection) -> Result<Vec<ClassSummary>> {
    // Correlated subqueries avoid double-counting from joins.
    let mut stmt = conn.prepare(
        "SELECT
           c.id,
           c.name,
           (SELECT COUNT(*) FROM students s WHERE s.class_id = c.id) AS student_count,
           (SELECT COUNT(*) FROM subjects m WHERE m.class_id = c.id) AS subject_count
         FROM classes c
         ORDER BY c.name",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ClassSummary {
                id: row.get(0)?,
                name: row.get(1)?,
                student_count: row.get(2)?,
                subject_count: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn any_exists(conn: &Connection) -> Result<bool> {
    Ok(conn.query_row("SELECT EXISTS(SELECT 1 FROM classes)", [], |r| r.get(0))?)
}

pub fn ensure_exists(conn: &Connection, class_id: &str) -> Result<()> {
    if !exists(conn, "classes", class_id)? {
        return Err(StoreError::NotFound {
            entity: "class",
            id: class_id.to_string(),
        });
    }
    Ok(())
}

pub fn create(conn: &Connection, name: &str) -> Result<Class> {
    let name = required_text("name", name)?;
    let id = Uuid::new_v4().to_string();
    conn.execute("INSERT INTO classes(id, name) VALUES(?, ?)", (&id, &name))
        .map_err(|e| map_insert_err(e, "class", &name))?;
    Ok(Class { id, name })
}

/// Removes the class; students, subjects and their grades follow through
/// `ON DELETE CASCADE`.
pub fn delete(conn: &Connection, class_id: &str) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    let n = tx.execute("DELETE FROM classes WHERE id = ?", [class_id])?;
    if n == 0 {
        return Err(StoreError::NotFound {
            entity: "class",
            id: class_id.to_string(),
        });
    }
    tx.commit()?;
    Ok(())
}
