//! Variant repository.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::fmt;
use std::str::FromStr;

use crate::parser::tsv::VariantRow;
use crate::types::Variant;

const COLUMNS: &str =
    "id, chrom, pos, rs_id, ref_allele, alt_allele, max_abs_sad, created_at, updated_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Variant> {
    Ok(Variant {
        id: row.get(0)?,
        chrom: row.get(1)?,
        pos: row.get(2)?,
        rs_id: row.get(3)?,
        ref_allele: row.get(4)?,
        alt_allele: row.get(5)?,
        max_abs_sad: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Columns a variant listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Id,
    Chrom,
    Pos,
    RsId,
    RefAllele,
    AltAllele,
    MaxAbsSad,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    /// Look a field up by its public name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "id" => Some(SortField::Id),
            "chrom" => Some(SortField::Chrom),
            "pos" => Some(SortField::Pos),
            "rs_id" => Some(SortField::RsId),
            "ref_allele" => Some(SortField::RefAllele),
            "alt_allele" => Some(SortField::AltAllele),
            "max_abs_sad" => Some(SortField::MaxAbsSad),
            "created_at" => Some(SortField::CreatedAt),
            "updated_at" => Some(SortField::UpdatedAt),
            _ => None,
        }
    }

    /// Resolve a caller-supplied name, falling back to `id`.
    pub fn parse_or_default(name: &str) -> Self {
        Self::parse(name).unwrap_or_default()
    }

    fn column(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Chrom => "chrom",
            SortField::Pos => "pos",
            SortField::RsId => "rs_id",
            SortField::RefAllele => "ref_allele",
            SortField::AltAllele => "alt_allele",
            SortField::MaxAbsSad => "max_abs_sad",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Error type for parsing sort order from string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSortOrderError;

impl fmt::Display for ParseSortOrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid sort order: expected 'asc' or 'desc'")
    }
}

impl std::error::Error for ParseSortOrderError {}

impl FromStr for SortOrder {
    type Err = ParseSortOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(ParseSortOrderError),
        }
    }
}

impl SortOrder {
    fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Search criteria for `/snps/search`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantFilter {
    /// Exact chromosome and position.
    Locus { chrom: String, pos: i64 },
    /// Case-insensitive substring of the rs-id.
    RsId(String),
}

impl VariantFilter {
    fn clause(&self) -> &'static str {
        match self {
            VariantFilter::Locus { .. } => "chrom = ?1 AND pos = ?2",
            VariantFilter::RsId(_) => "rs_id LIKE ?1 ESCAPE '\\'",
        }
    }

    fn bind(&self) -> Vec<Box<dyn rusqlite::ToSql>> {
        match self {
            VariantFilter::Locus { chrom, pos } => vec![Box::new(chrom.clone()), Box::new(*pos)],
            VariantFilter::RsId(fragment) => {
                vec![Box::new(format!("%{}%", escape_like(fragment)))]
            }
        }
    }
}

/// Escape LIKE wildcards so the fragment matches literally.
fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Insert a variant or update the mutable fields of an existing one.
///
/// Returns the variant id.
pub fn upsert(conn: &Connection, row: &VariantRow, now: DateTime<Utc>) -> rusqlite::Result<i64> {
    conn.prepare_cached(
        "INSERT INTO variants
             (chrom, pos, rs_id, ref_allele, alt_allele, max_abs_sad, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
         ON CONFLICT (chrom, pos, ref_allele, alt_allele)
         DO UPDATE SET rs_id = excluded.rs_id,
                       max_abs_sad = excluded.max_abs_sad,
                       updated_at = excluded.updated_at
         RETURNING id",
    )?
    .query_row(
        params![
            row.chrom,
            row.pos,
            row.rs_id,
            row.ref_allele,
            row.alt_allele,
            row.max_abs_sad,
            now
        ],
        |r| r.get(0),
    )
}

/// Get a variant by id.
pub fn find(conn: &Connection, id: i64) -> rusqlite::Result<Option<Variant>> {
    conn.query_row(
        &format!("SELECT {} FROM variants WHERE id = ?1", COLUMNS),
        [id],
        from_row,
    )
    .optional()
}

pub fn count(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM variants", [], |r| r.get(0))
}

/// One page of variants in the requested order.
pub fn list(
    conn: &Connection,
    sort: SortField,
    order: SortOrder,
    offset: i64,
    limit: i64,
) -> rusqlite::Result<Vec<Variant>> {
    let order_by = if sort == SortField::Id {
        format!("id {}", order.keyword())
    } else {
        format!("{} {}, id ASC", sort.column(), order.keyword())
    };
    let sql = format!(
        "SELECT {} FROM variants ORDER BY {} LIMIT ?1 OFFSET ?2",
        COLUMNS, order_by
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![limit, offset], from_row)?;
    rows.collect()
}

/// Number of variants matching a filter.
pub fn count_matching(conn: &Connection, filter: &VariantFilter) -> rusqlite::Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM variants WHERE {}", filter.clause());
    let values = filter.bind();
    conn.query_row(
        &sql,
        rusqlite::params_from_iter(values.iter().map(|v| v.as_ref())),
        |r| r.get(0),
    )
}

/// One page of variants matching a filter, ordered by id.
pub fn search(
    conn: &Connection,
    filter: &VariantFilter,
    offset: i64,
    limit: i64,
) -> rusqlite::Result<Vec<Variant>> {
    let mut values = filter.bind();
    let n = values.len();
    let sql = format!(
        "SELECT {} FROM variants WHERE {} ORDER BY id ASC LIMIT ?{} OFFSET ?{}",
        COLUMNS,
        filter.clause(),
        n + 1,
        n + 2
    );
    values.push(Box::new(limit));
    values.push(Box::new(offset));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        rusqlite::params_from_iter(values.iter().map(|v| v.as_ref())),
        from_row,
    )?;
    rows.collect()
}

/// Variants on `chrom` with `start <= pos <= end`, ordered by position.
pub fn in_range(conn: &Connection, chrom: &str, start: i64, end: i64) -> rusqlite::Result<Vec<Variant>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM variants
         WHERE chrom = ?1 AND pos >= ?2 AND pos <= ?3
         ORDER BY pos ASC, id ASC",
        COLUMNS
    ))?;
    let rows = stmt.query_map(params![chrom, start, end], from_row)?;
    rows.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Database;

    fn row(chrom: &str, pos: i64, rs_id: Option<&str>, max_abs_sad: f64) -> VariantRow {
        VariantRow {
            chrom: chrom.to_string(),
            pos,
            rs_id: rs_id.map(str::to_string),
            ref_allele: "A".to_string(),
            alt_allele: "G".to_string(),
            max_abs_sad,
            effects: vec![],
        }
    }

    #[test]
    fn test_sort_field_allow_list() {
        assert_eq!(SortField::parse("max_abs_sad"), Some(SortField::MaxAbsSad));
        assert_eq!(SortField::parse("pos"), Some(SortField::Pos));
        assert_eq!(SortField::parse("id; DROP TABLE variants"), None);
        assert_eq!(SortField::parse_or_default("__class__"), SortField::Id);
    }

    #[test]
    fn test_sort_order_parsing() {
        assert_eq!("asc".parse::<SortOrder>(), Ok(SortOrder::Asc));
        assert_eq!("desc".parse::<SortOrder>(), Ok(SortOrder::Desc));
        assert!("DESC".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("rs_1%"), "rs\\_1\\%");
        assert_eq!(escape_like("rs12"), "rs12");
    }

    #[test]
    fn test_upsert_is_last_write_wins() {
        let db = Database::in_memory().unwrap();
        let conn = db.connection();
        let t0 = Utc::now();

        let id = upsert(&conn, &row("1", 100, Some("rs1"), 0.5), t0).unwrap();
        let again = upsert(&conn, &row("1", 100, Some("rs9"), 0.7), t0 + chrono::Duration::seconds(5)).unwrap();
        assert_eq!(id, again);
        assert_eq!(count(&conn).unwrap(), 1);

        let variant = find(&conn, id).unwrap().unwrap();
        assert_eq!(variant.rs_id.as_deref(), Some("rs9"));
        assert_eq!(variant.max_abs_sad, 0.7);
        assert!(variant.updated_at.unwrap() > variant.created_at);
    }

    #[test]
    fn test_list_sorted_and_paged() {
        let db = Database::in_memory().unwrap();
        let conn = db.connection();
        let now = Utc::now();
        for (pos, sad) in [(10, 0.3), (20, 0.9), (30, 0.1)] {
            upsert(&conn, &row("1", pos, None, sad), now).unwrap();
        }

        let page = list(&conn, SortField::MaxAbsSad, SortOrder::Desc, 0, 2).unwrap();
        let positions: Vec<i64> = page.iter().map(|v| v.pos).collect();
        assert_eq!(positions, vec![20, 10]);

        let page = list(&conn, SortField::Id, SortOrder::Asc, 2, 2).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].pos, 30);
    }

    #[test]
    fn test_search_filters() {
        let db = Database::in_memory().unwrap();
        let conn = db.connection();
        let now = Utc::now();
        upsert(&conn, &row("1", 15449431, Some("rs1115118696"), 0.1), now).unwrap();
        upsert(&conn, &row("1", 200, Some("RS_other"), 0.1), now).unwrap();
        upsert(&conn, &row("2", 200, None, 0.1), now).unwrap();

        let locus = VariantFilter::Locus {
            chrom: "1".to_string(),
            pos: 15449431,
        };
        assert_eq!(count_matching(&conn, &locus).unwrap(), 1);

        let rs = VariantFilter::RsId("RS111".to_string());
        let hits = search(&conn, &rs, 0, 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].pos, 15449431);

        // Underscore is literal, not a single-character wildcard
        assert_eq!(count_matching(&conn, &VariantFilter::RsId("s_o".to_string())).unwrap(), 1);
        assert_eq!(count_matching(&conn, &VariantFilter::RsId("s_1".to_string())).unwrap(), 0);
    }

    #[test]
    fn test_in_range() {
        let db = Database::in_memory().unwrap();
        let conn = db.connection();
        let now = Utc::now();
        for pos in [5, 10, 15, 20] {
            upsert(&conn, &row("1", pos, None, 0.0), now).unwrap();
        }
        upsert(&conn, &row("2", 10, None, 0.0), now).unwrap();

        let hits = in_range(&conn, "1", 10, 15).unwrap();
        let positions: Vec<i64> = hits.iter().map(|v| v.pos).collect();
        assert_eq!(positions, vec![10, 15]);
    }
}
