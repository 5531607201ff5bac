//! Gene repository and the interval queries behind the nearest-gene lookup.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::types::{Gene, Strand};

const COLUMNS: &str = "gene_id, gene_name, chrom, start_pos, end_pos, strand, gene_biotype";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Gene> {
    let strand: Option<String> = row.get(5)?;
    Ok(Gene {
        gene_id: row.get(0)?,
        name: row.get(1)?,
        chrom: row.get(2)?,
        start: row.get(3)?,
        end: row.get(4)?,
        strand: strand.and_then(|s| s.parse::<Strand>().ok()),
        biotype: row.get(6)?,
    })
}

/// Insert a gene. Returns false when the gene id already exists.
pub fn insert(conn: &Connection, gene: &Gene, now: DateTime<Utc>) -> rusqlite::Result<bool> {
    let inserted = conn
        .prepare_cached(
            "INSERT INTO genes
                 (gene_id, gene_name, chrom, start_pos, end_pos, strand, gene_biotype, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT (gene_id) DO NOTHING",
        )?
        .execute(params![
            gene.gene_id,
            gene.name,
            gene.chrom,
            gene.start,
            gene.end,
            gene.strand.map(|s| s.as_str()),
            gene.biotype,
            now
        ])?;
    Ok(inserted > 0)
}

pub fn count(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM genes", [], |r| r.get(0))
}

/// Delete every gene. Returns the number of rows removed.
pub fn clear(conn: &Connection) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM genes", [])
}

/// Gene whose interval contains `pos`; the lowest gene id wins on overlap.
pub fn containing(conn: &Connection, chrom: &str, pos: i64) -> rusqlite::Result<Option<Gene>> {
    conn.prepare_cached(&format!(
        "SELECT {} FROM genes
         WHERE chrom = ?1 AND start_pos <= ?2 AND end_pos >= ?2
         ORDER BY gene_id ASC LIMIT 1",
        COLUMNS
    ))?
    .query_row(params![chrom, pos], from_row)
    .optional()
}

/// Gene ending closest before `pos`.
pub fn preceding(conn: &Connection, chrom: &str, pos: i64) -> rusqlite::Result<Option<Gene>> {
    conn.prepare_cached(&format!(
        "SELECT {} FROM genes
         WHERE chrom = ?1 AND end_pos < ?2
         ORDER BY end_pos DESC, gene_id ASC LIMIT 1",
        COLUMNS
    ))?
    .query_row(params![chrom, pos], from_row)
    .optional()
}

/// Gene starting closest after `pos`.
pub fn following(conn: &Connection, chrom: &str, pos: i64) -> rusqlite::Result<Option<Gene>> {
    conn.prepare_cached(&format!(
        "SELECT {} FROM genes
         WHERE chrom = ?1 AND start_pos > ?2
         ORDER BY start_pos ASC, gene_id ASC LIMIT 1",
        COLUMNS
    ))?
    .query_row(params![chrom, pos], from_row)
    .optional()
}

/// Genes overlapping `[start, end]`, ordered by start then gene id.
pub fn overlapping(conn: &Connection, chrom: &str, start: i64, end: i64) -> rusqlite::Result<Vec<Gene>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM genes
         WHERE chrom = ?1 AND start_pos <= ?3 AND end_pos >= ?2
         ORDER BY start_pos ASC, gene_id ASC",
        COLUMNS
    ))?;
    let rows = stmt.query_map(params![chrom, start, end], from_row)?;
    rows.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Database;

    fn gene(id: &str, start: i64, end: i64) -> Gene {
        let mut gene = Gene::new(id.to_string(), "1".to_string(), Some(Strand::Positive));
        gene.set_length(start, end);
        gene
    }

    fn seeded() -> Database {
        let db = Database::in_memory().unwrap();
        {
            let conn = db.connection();
            let now = Utc::now();
            for g in [gene("G2", 1000, 2000), gene("G1", 1500, 2500), gene("G3", 5000, 6000)] {
                assert!(insert(&conn, &g, now).unwrap());
            }
        }
        db
    }

    #[test]
    fn test_insert_duplicate_is_ignored() {
        let db = seeded();
        let conn = db.connection();
        assert!(!insert(&conn, &gene("G1", 1, 2), Utc::now()).unwrap());
        assert_eq!(count(&conn).unwrap(), 3);
        assert_eq!(clear(&conn).unwrap(), 3);
        assert_eq!(count(&conn).unwrap(), 0);
    }

    #[test]
    fn test_containing_prefers_lowest_gene_id() {
        let db = seeded();
        let conn = db.connection();
        assert_eq!(containing(&conn, "1", 1800).unwrap().unwrap().gene_id, "G1");
        assert_eq!(containing(&conn, "1", 1000).unwrap().unwrap().gene_id, "G2");
        assert!(containing(&conn, "1", 3000).unwrap().is_none());
        assert!(containing(&conn, "2", 1800).unwrap().is_none());
    }

    #[test]
    fn test_flanking_genes() {
        let db = seeded();
        let conn = db.connection();
        assert_eq!(preceding(&conn, "1", 3000).unwrap().unwrap().gene_id, "G1");
        assert_eq!(following(&conn, "1", 3000).unwrap().unwrap().gene_id, "G3");
        assert!(preceding(&conn, "1", 500).unwrap().is_none());
        assert!(following(&conn, "1", 7000).unwrap().is_none());
    }

    #[test]
    fn test_overlapping_and_strand_round_trip() {
        let db = seeded();
        let conn = db.connection();
        let genes = overlapping(&conn, "1", 1900, 5000).unwrap();
        let ids: Vec<&str> = genes.iter().map(|g| g.gene_id.as_str()).collect();
        assert_eq!(ids, vec!["G2", "G1", "G3"]);
        assert_eq!(genes[0].strand, Some(Strand::Positive));
    }
}
