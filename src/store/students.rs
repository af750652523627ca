use super::{classes, map_insert_err, required_text, Result, StoreError};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub last_name: String,
    pub first_name: String,
    pub matricule: String,
    pub class_id: String,
}

impl Student {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            last_name: row.get(1)?,
            first_name: row.get(2)?,
            matricule: row.get(3)?,
            class_id: row.get(4)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewStudent<'a> {
    pub last_name: &'a str,
    pub first_name: &'a str,
    pub matricule: &'a str,
    pub class_id: &'a str,
}

const COLUMNS: &str = "id, last_name, first_name, matricule, class_id";

pub fn list(conn: &Connection, class_id: Option<&str>) -> Result<Vec<Student>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM students
         WHERE ?1 IS NULL OR class_id = ?1
         ORDER BY last_name, first_name"
    ))?;
    let rows = stmt
        .query_map([class_id], Student::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn get(conn: &Connection, student_id: &str) -> Result<Student> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM students WHERE id = ?"),
        [student_id],
        Student::from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::NotFound {
        entity: "student",
        id: student_id.to_string(),
    })
}

pub fn create(conn: &Connection, new: NewStudent<'_>) -> Result<Student> {
    if !classes::any_exists(conn)? {
        return Err(StoreError::MissingPrerequisite(
            "add a class before adding students",
        ));
    }
    let last_name = required_text("lastName", new.last_name)?;
    let first_name = required_text("firstName", new.first_name)?;
    let matricule = required_text("matricule", new.matricule)?;
    classes::ensure_exists(conn, new.class_id)?;

    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO students(id, last_name, first_name, matricule, class_id)
         VALUES(?, ?, ?, ?, ?)",
        (&id, &last_name, &first_name, &matricule, new.class_id),
    )
    .map_err(|e| map_insert_err(e, "student", &matricule))?;

    Ok(Student {
        id,
        last_name,
        first_name,
        matricule,
        class_id: new.class_id.to_string(),
    })
}

/// Removes the student and, by cascade, their grades.
pub fn delete(conn: &Connection, student_id: &str) -> Result<()> {
    let n = conn.execute("DELETE FROM students WHERE id = ?", [student_id])?;
    if n == 0 {
        return Err(StoreError::NotFound {
            entity: "student",
            id: student_id.to_string(),
        });
    }
    Ok(())
}
