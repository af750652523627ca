use super::{students, subjects, Result, StoreError};
use chrono::{SecondsFormat, Utc};
use rusqlite::Connection;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use uuid::Uuid;

pub const MIN_VALUE: Decimal = Decimal::ZERO;
pub const MAX_VALUE: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub id: String,
    pub student_id: String,
    pub subject_id: String,
    pub value: Decimal,
    pub updated_at: String,
}

/// One line of a student's bulletin.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectGradeRow {
    pub subject: String,
    pub coefficient: i64,
    pub value: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassGradeRow {
    pub grade_id: String,
    pub matricule: String,
    pub last_name: String,
    pub first_name: String,
    pub subject: String,
    pub coefficient: i64,
    pub value: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentGradeRow {
    pub grade_id: String,
    pub student_id: String,
    pub matricule: String,
    pub subject_id: String,
    pub subject: String,
    pub value: Decimal,
    pub updated_at: String,
}

fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Validates a grade against the 0..=20 range and converts it to hundredths.
/// Extra decimals are rounded half away from zero, as a NUMERIC(4,2) column would.
pub fn to_cents(value: Decimal) -> Result<i64> {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded < MIN_VALUE || rounded > MAX_VALUE {
        return Err(StoreError::Invalid {
            field: "value",
            message: format!("grade must be between {MIN_VALUE} and {MAX_VALUE}, got {value}"),
        });
    }
    (rounded * Decimal::new(100, 0))
        .to_i64()
        .ok_or_else(|| StoreError::Invalid {
            field: "value",
            message: format!("grade out of range: {value}"),
        })
}

/// Records a grade for (student, subject), replacing any previous value in a
/// single statement.
pub fn upsert(conn: &Connection, student_id: &str, subject_id: &str, value: Decimal) -> Result<Grade> {
    let cents = to_cents(value)?;
    let student = students::get(conn, student_id)?;
    let subject = subjects::get(conn, subject_id)?;
    if student.class_id != subject.class_id {
        return Err(StoreError::Invalid {
            field: "subjectId",
            message: "subject does not belong to the student's class".to_string(),
        });
    }

    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    conn.execute(
        "INSERT INTO grades(id, student_id, subject_id, value_cents, updated_at)
         VALUES(?, ?, ?, ?, ?)
         ON CONFLICT(student_id, subject_id) DO UPDATE SET
           value_cents = excluded.value_cents,
           updated_at = excluded.updated_at",
        (Uuid::new_v4().to_string(), student_id, subject_id, cents, &now),
    )?;

    let (id, stored_cents, updated_at): (String, i64, String) = conn.query_row(
        "SELECT id, value_cents, updated_at FROM grades WHERE student_id = ? AND subject_id = ?",
        [student_id, subject_id],
        |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
    )?;

    Ok(Grade {
        id,
        student_id: student_id.to_string(),
        subject_id: subject_id.to_string(),
        value: from_cents(stored_cents),
        updated_at,
    })
}

pub fn delete(conn: &Connection, student_id: &str, subject_id: &str) -> Result<()> {
    let n = conn.execute(
        "DELETE FROM grades WHERE student_id = ? AND subject_id = ?",
        [student_id, subject_id],
    )?;
    if n == 0 {
        return Err(StoreError::NotFound {
            entity: "grade",
            id: format!("{student_id}/{subject_id}"),
        });
    }
    Ok(())
}

pub fn list(conn: &Connection) -> Result<Vec<Grade>> {
    let mut stmt = conn.prepare(
        "SELECT id, student_id, subject_id, value_cents, updated_at
         FROM grades
         ORDER BY updated_at, rowid",
    )?;
    let rows = stmt
        .query_map([], |r| {
            Ok(Grade {
                id: r.get(0)?,
                student_id: r.get(1)?,
                subject_id: r.get(2)?,
                value: from_cents(r.get(3)?),
                updated_at: r.get(4)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Grade lines of one student joined to their subject, sorted by subject name.
/// An unknown student simply has no rows.
pub fn for_student(conn: &Connection, student_id: &str) -> Result<Vec<SubjectGradeRow>> {
    let mut stmt = conn.prepare(
        "SELECT m.name, m.coefficient, g.value_cents
         FROM grades g
         JOIN subjects m ON m.id = g.subject_id
         WHERE g.student_id = ?
         ORDER BY m.name, m.id",
    )?;
    let rows = stmt
        .query_map([student_id], |r| {
            Ok(SubjectGradeRow {
                subject: r.get(0)?,
                coefficient: r.get(1)?,
                value: from_cents(r.get(2)?),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn for_class(conn: &Connection, class_id: &str) -> Result<Vec<ClassGradeRow>> {
    let mut stmt = conn.prepare(
        "SELECT g.id, s.matricule, s.last_name, s.first_name, m.name, m.coefficient, g.value_cents
         FROM grades g
         JOIN students s ON s.id = g.student_id
         JOIN subjects m ON m.id = g.subject_id
         WHERE s.class_id = ?
         ORDER BY s.last_name, s.first_name, m.name",
    )?;
    let rows = stmt
        .query_map([class_id], |r| {
            Ok(ClassGradeRow {
                grade_id: r.get(0)?,
                matricule: r.get(1)?,
                last_name: r.get(2)?,
                first_name: r.get(3)?,
                subject: r.get(4)?,
                coefficient: r.get(5)?,
                value: from_cents(r.get(6)?),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Most recently written grades first.
pub fn latest(conn: &Connection, limit: usize) -> Result<Vec<RecentGradeRow>> {
    let mut stmt = conn.prepare(
        "SELECT g.id, g.student_id, s.matricule, g.subject_id, m.name, g.value_cents, g.updated_at
         FROM grades g
         JOIN students s ON s.id = g.student_id
         JOIN subjects m ON m.id = g.subject_id
         ORDER BY g.updated_at DESC, g.rowid DESC
         LIMIT ?",
    )?;
    let rows = stmt
        .query_map([limit as i64], |r| {
            Ok(RecentGradeRow {
                grade_id: r.get(0)?,
                student_id: r.get(1)?,
                matricule: r.get(2)?,
                subject_id: r.get(3)?,
                subject: r.get(4)?,
                value: from_cents(r.get(5)?),
                updated_at: r.get(6)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}
