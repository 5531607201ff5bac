//! Target repository.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::types::Target;

fn from_row(row: &Row<'_>) -> rusqlite::Result<Target> {
    Ok(Target {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        description: row.get(3)?,
    })
}

/// Return the id of the target called `name`, creating it if needed.
///
/// Category and description are only written on creation.
pub fn get_or_create(
    conn: &Connection,
    name: &str,
    category: &str,
    description: &str,
    now: DateTime<Utc>,
) -> rusqlite::Result<i64> {
    if let Some(target) = find_by_name(conn, name)? {
        return Ok(target.id);
    }

    conn.execute(
        "INSERT INTO targets (name, category, description, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![name, category, description, now],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_by_name(conn: &Connection, name: &str) -> rusqlite::Result<Option<Target>> {
    conn.query_row(
        "SELECT id, name, category, description FROM targets WHERE name = ?1",
        [name],
        from_row,
    )
    .optional()
}

/// Targets ordered by id.
pub fn list(conn: &Connection, skip: i64, limit: i64) -> rusqlite::Result<Vec<Target>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, category, description FROM targets ORDER BY id ASC LIMIT ?1 OFFSET ?2",
    )?;
    let rows = stmt.query_map(params![limit, skip], from_row)?;
    rows.collect()
}

pub fn count(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM targets", [], |r| r.get(0))
}
