//! Transcript and exon import from GTF.

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;
use tracing::info;

use crate::import::audit_outcome;
use crate::parser::parse_gtf;
use crate::store::{transcripts, Database};

const IMPORT_TYPE: &str = "GTF_TRANSCRIPTS";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptImportStats {
    pub transcripts_imported: usize,
    pub exons_imported: usize,
    /// Transcripts or exons already present.
    pub duplicates: usize,
    pub lines_skipped: usize,
    /// Reasons for the skipped lines, stored with the audit row.
    pub errors: Vec<String>,
}

/// Load transcripts and their exons, keeping rows that already exist.
pub fn import_transcripts(db: &Database, path: &Path) -> Result<TranscriptImportStats> {
    let outcome = run(db, path);
    audit_outcome(db, IMPORT_TYPE, path, &outcome, |stats| {
        (stats.transcripts_imported as i64, stats.errors.clone())
    });
    outcome
}

fn run(db: &Database, path: &Path) -> Result<TranscriptImportStats> {
    info!("Parsing GTF file: {}", path.display());
    let mut gtf = parse_gtf(path)?;
    info!(
        "Found {} transcripts with {} exons ({} lines skipped)",
        gtf.transcripts.len(),
        gtf.exon_count(),
        gtf.skipped()
    );

    let mut stats = TranscriptImportStats {
        lines_skipped: gtf.skipped(),
        errors: std::mem::take(&mut gtf.errors),
        ..Default::default()
    };

    let mut conn = db.connection();
    let tx = conn
        .transaction()
        .context("Failed to begin transcript transaction")?;
    let now = Utc::now();

    for transcript in &gtf.transcripts {
        if transcripts::insert(&tx, transcript, now)? {
            stats.transcripts_imported += 1;
        } else {
            stats.duplicates += 1;
        }

        for exon in &transcript.exons {
            if transcripts::insert_exon(&tx, &transcript.transcript_id, &transcript.chrom, exon, now)? {
                stats.exons_imported += 1;
            } else {
                stats.duplicates += 1;
            }
        }
    }

    tx.commit().context("Failed to commit transcripts")?;

    info!(
        "Imported {} transcripts and {} exons ({} already present)",
        stats.transcripts_imported, stats.exons_imported, stats.duplicates
    );
    Ok(stats)
}
