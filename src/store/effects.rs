//! Effect repository.

use ahash::AHashMap;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::types::EffectValue;

/// Insert an effect value or overwrite the existing one for the pair.
pub fn upsert(
    conn: &Connection,
    variant_id: i64,
    target_id: i64,
    value: f64,
    now: DateTime<Utc>,
) -> rusqlite::Result<()> {
    conn.prepare_cached(
        "INSERT INTO effects (variant_id, target_id, effect_value, created_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (variant_id, target_id)
         DO UPDATE SET effect_value = excluded.effect_value",
    )?
    .execute(params![variant_id, target_id, value, now])?;
    Ok(())
}

/// All effect values of a variant, ordered by target id.
pub fn for_variant(conn: &Connection, variant_id: i64) -> rusqlite::Result<Vec<EffectValue>> {
    let mut stmt = conn.prepare(
        "SELECT t.name, e.effect_value
         FROM effects e JOIN targets t ON t.id = e.target_id
         WHERE e.variant_id = ?1
         ORDER BY t.id ASC",
    )?;
    let rows = stmt.query_map([variant_id], |row| {
        Ok(EffectValue {
            target_name: row.get(0)?,
            effect_value: row.get(1)?,
        })
    })?;
    rows.collect()
}

/// Ids of the `n` targets with the most effect records, most popular first.
pub fn popular_targets(conn: &Connection, n: i64) -> rusqlite::Result<Vec<i64>> {
    if n <= 0 {
        return Ok(Vec::new());
    }
    let mut stmt = conn.prepare(
        "SELECT target_id FROM effects
         GROUP BY target_id
         ORDER BY COUNT(*) DESC, target_id ASC
         LIMIT ?1",
    )?;
    let rows = stmt.query_map([n], |row| row.get(0))?;
    rows.collect()
}

/// Effect values of a variant restricted to `target_ids`, in the given order.
///
/// Targets the variant has no value for are left out.
pub fn for_targets(
    conn: &Connection,
    variant_id: i64,
    target_ids: &[i64],
) -> rusqlite::Result<Vec<EffectValue>> {
    if target_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare_cached(
        "SELECT e.target_id, t.name, e.effect_value
         FROM effects e JOIN targets t ON t.id = e.target_id
         WHERE e.variant_id = ?1",
    )?;
    let mut found: AHashMap<i64, EffectValue> = stmt
        .query_map([variant_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                EffectValue {
                    target_name: row.get(1)?,
                    effect_value: row.get(2)?,
                },
            ))
        })?
        .collect::<rusqlite::Result<_>>()?;

    Ok(target_ids.iter().filter_map(|id| found.remove(id)).collect())
}

pub fn count(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM effects", [], |r| r.get(0))
}
