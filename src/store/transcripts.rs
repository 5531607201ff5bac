//! Transcript and exon repository.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::types::{Exon, Strand, Transcript};

/// Insert a transcript unless its id already exists. Returns whether a row was added.
pub fn insert(conn: &Connection, transcript: &Transcript, now: DateTime<Utc>) -> rusqlite::Result<bool> {
    let inserted = conn
        .prepare_cached(
            "INSERT OR IGNORE INTO transcripts
                 (transcript_id, gene_id, chrom, start_pos, end_pos, strand, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?
        .execute(params![
            transcript.transcript_id,
            transcript.gene_id,
            transcript.chrom,
            transcript.start,
            transcript.end,
            transcript.strand.map(|s| s.as_str()),
            now
        ])?;
    Ok(inserted > 0)
}

/// Insert an exon unless `(transcript_id, exon_number)` already exists.
pub fn insert_exon(
    conn: &Connection,
    transcript_id: &str,
    chrom: &str,
    exon: &Exon,
    now: DateTime<Utc>,
) -> rusqlite::Result<bool> {
    let inserted = conn
        .prepare_cached(
            "INSERT OR IGNORE INTO exons
                 (transcript_id, chrom, start_pos, end_pos, exon_number, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?
        .execute(params![transcript_id, chrom, exon.start, exon.end, exon.exon_number, now])?;
    Ok(inserted > 0)
}

pub fn count(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM transcripts", [], |r| r.get(0))
}

pub fn count_exons(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM exons", [], |r| r.get(0))
}

/// Transcripts of a gene on `chrom`, ordered by transcript id. Exons are not loaded.
pub fn for_gene(conn: &Connection, gene_id: &str, chrom: &str) -> rusqlite::Result<Vec<Transcript>> {
    let mut stmt = conn.prepare_cached(
        "SELECT transcript_id, gene_id, chrom, start_pos, end_pos, strand
         FROM transcripts
         WHERE gene_id = ?1 AND chrom = ?2
         ORDER BY transcript_id ASC",
    )?;
    let rows = stmt.query_map(params![gene_id, chrom], |row| {
        let strand: Option<String> = row.get(5)?;
        let mut transcript = Transcript::new(
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            strand.and_then(|s| s.parse::<Strand>().ok()),
        );
        transcript.set_length(row.get(3)?, row.get(4)?);
        Ok(transcript)
    })?;
    rows.collect()
}

/// Number of the exon of a transcript containing `pos`; the lowest number wins on overlap.
pub fn exon_number_at(conn: &Connection, transcript_id: &str, pos: i64) -> rusqlite::Result<Option<u32>> {
    conn.prepare_cached(
        "SELECT exon_number FROM exons
         WHERE transcript_id = ?1 AND start_pos <= ?2 AND end_pos >= ?2
         ORDER BY exon_number ASC LIMIT 1",
    )?
    .query_row(params![transcript_id, pos], |row| row.get(0))
    .optional()
}
