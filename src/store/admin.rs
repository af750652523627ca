use super::{Result, StoreError};
use rusqlite::Connection;
use std::path::Path;

/// Runs an SQL seed script in one transaction. A missing file leaves the
/// database untouched.
pub fn run_init_script(conn: &Connection, path: &Path) -> Result<usize> {
    if !path.is_file() {
        return Err(StoreError::ResourceNotFound(path.to_path_buf()));
    }
    let sql = std::fs::read_to_string(path)?;

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(&sql)?;
    tx.commit()?;

    // The script may have recreated tables; make sure the expected ones exist.
    crate::db::ensure_schema(conn)?;

    Ok(sql.len())
}
