//! Variant-effect TSV import.
//!
//! A reader thread pulls `batch_size` records at a time and parses them on a
//! rayon pool; the calling thread receives the parsed batches over a bounded
//! channel and writes each one in its own transaction. Rows are written
//! under a savepoint so one bad row never takes its batch down with it.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, Sender};
use rayon::prelude::*;
use rusqlite::Connection;
use std::path::Path;
use std::thread;
use tracing::{debug, error, info, warn};

use crate::config::ImportConfig;
use crate::import::audit_outcome;
use crate::parser::tsv::{ParsedRow, VariantHeader, VariantReader, VariantRow};
use crate::store::{effects, targets, variants, Database};

const IMPORT_TYPE: &str = "TSV_IMPORT";

/// Parsed batches in flight between the reader and the writer.
const CHANNEL_BOUND: usize = 4;

/// Counters reported at the end of a variant import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantImportStats {
    /// Data rows read from the file.
    pub rows_read: usize,
    pub variants_imported: usize,
    /// Rows lacking a required field.
    pub variants_skipped: usize,
    pub effects_imported: usize,
    /// Effect cells that were not numbers.
    pub effects_skipped: usize,
    pub targets_created: usize,
    /// One entry per row that could not be written.
    pub errors: Vec<String>,
}

/// A parsed batch with data row numbers.
struct ParsedBatch {
    rows: Vec<(usize, ParsedRow)>,
}

/// Import a variant-effect TSV (plain or gzipped) into the database.
pub fn import_variants(db: &Database, path: &Path, config: &ImportConfig) -> Result<VariantImportStats> {
    let outcome = run(db, path, config);
    audit_outcome(db, IMPORT_TYPE, path, &outcome, |stats| {
        (stats.variants_imported as i64, stats.errors.clone())
    });
    outcome
}

fn run(db: &Database, path: &Path, config: &ImportConfig) -> Result<VariantImportStats> {
    info!("Reading TSV file: {}", path.display());
    let reader = VariantReader::new(path)?;
    let header = reader.header().clone();
    info!("Found {} effect columns", header.effect_columns.len());

    let mut stats = VariantImportStats::default();
    let target_ids = resolve_targets(db, &header.effect_columns, config, &mut stats)?;

    let num_threads = config.worker_threads();
    info!(
        "Importing variants and effects (batch_size={}, threads={})",
        config.batch_size, num_threads
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .context("Failed to create thread pool")?;

    let (batch_tx, batch_rx): (Sender<ParsedBatch>, Receiver<ParsedBatch>) = bounded(CHANNEL_BOUND);

    let batch_size = config.batch_size;
    let reader_handle = thread::spawn(move || -> Result<()> {
        read_batches(reader, header, batch_size, &pool, batch_tx)
    });

    let written = batch_rx.iter().try_for_each(|batch| {
        write_batch(db, batch, &target_ids, &mut stats)?;
        info!("Processed {} rows...", stats.rows_read);
        Ok::<_, anyhow::Error>(())
    });

    // Unblock the reader if the writer stopped early
    drop(batch_rx);
    let read = reader_handle
        .join()
        .map_err(|_| anyhow!("Reader thread panicked"))?;

    written?;
    read?;

    info!(
        "Import finished: {} variants imported, {} skipped, {} effects imported, {} effects skipped, {} errors",
        stats.variants_imported,
        stats.variants_skipped,
        stats.effects_imported,
        stats.effects_skipped,
        stats.errors.len()
    );
    Ok(stats)
}

/// Producer: read chunks, parse them in parallel and hand them to the writer.
fn read_batches(
    mut reader: VariantReader,
    header: VariantHeader,
    batch_size: usize,
    pool: &rayon::ThreadPool,
    batch_tx: Sender<ParsedBatch>,
) -> Result<()> {
    while let Some(chunk) = reader.read_chunk(batch_size)? {
        let rows = pool.install(|| {
            chunk
                .records
                .into_par_iter()
                .map(|(row, record)| match record {
                    Ok(record) => (row, header.parse_record(&record)),
                    Err(e) => (row, ParsedRow::Invalid(e)),
                })
                .collect()
        });

        if batch_tx.send(ParsedBatch { rows }).is_err() {
            break;
        }
    }
    Ok(())
}

/// Map effect columns to target ids, creating targets unless told to reuse them.
///
/// Columns without a target (only possible with `skip_targets`) map to `None`.
fn resolve_targets(
    db: &Database,
    columns: &[String],
    config: &ImportConfig,
    stats: &mut VariantImportStats,
) -> Result<Vec<Option<i64>>> {
    let mut conn = db.connection();
    let tx = conn.transaction().context("Failed to begin target transaction")?;
    let now = Utc::now();
    let before = targets::count(&tx)?;

    let mut ids = Vec::with_capacity(columns.len());
    for (idx, column) in columns.iter().enumerate() {
        let name = config.target_name(column);
        let id = if config.skip_targets {
            let found = targets::find_by_name(&tx, &name)?.map(|t| t.id);
            if found.is_none() {
                warn!("No existing target '{}' for column '{}', ignoring", name, column);
            }
            found
        } else {
            let description = format!("Imported from TSV column {}", idx + 1);
            Some(targets::get_or_create(&tx, &name, &config.target_category, &description, now)?)
        };
        ids.push(id);
    }

    let after = targets::count(&tx)?;
    tx.commit().context("Failed to commit targets")?;

    stats.targets_created = (after - before) as usize;
    info!(
        "Imported {} new targets, total targets: {}",
        stats.targets_created, after
    );
    Ok(ids)
}

/// Consumer: write one parsed batch in a single transaction.
fn write_batch(
    db: &Database,
    batch: ParsedBatch,
    target_ids: &[Option<i64>],
    stats: &mut VariantImportStats,
) -> Result<()> {
    let mut conn = db.connection();
    let mut tx = conn.transaction().context("Failed to begin batch transaction")?;
    let now = Utc::now();

    for (row_num, parsed) in batch.rows {
        stats.rows_read += 1;
        match parsed {
            ParsedRow::Skipped(reason) => {
                warn!("Row {}: {}, skipping", row_num, reason);
                stats.variants_skipped += 1;
            }
            ParsedRow::Invalid(reason) => {
                error!("Error processing row {}: {}", row_num, reason);
                stats.errors.push(format!("Row {}: {}", row_num, reason));
            }
            ParsedRow::Variant(row) => {
                let sp = tx.savepoint()?;
                match write_row(&sp, &row, target_ids, now) {
                    Ok((imported, skipped)) => {
                        sp.commit()?;
                        stats.variants_imported += 1;
                        stats.effects_imported += imported;
                        stats.effects_skipped += skipped;
                    }
                    Err(e) => {
                        // Dropping the savepoint rolls the row back
                        drop(sp);
                        error!("Error processing row {}: {}", row_num, e);
                        stats.errors.push(format!("Row {}: {}", row_num, e));
                    }
                }
            }
        }
    }

    tx.commit().context("Failed to commit batch")?;
    Ok(())
}

/// Upsert a variant and its effect values. Returns (imported, skipped) effects.
fn write_row(
    conn: &Connection,
    row: &VariantRow,
    target_ids: &[Option<i64>],
    now: DateTime<Utc>,
) -> rusqlite::Result<(usize, usize)> {
    let variant_id = variants::upsert(conn, row, now)?;

    let mut imported = 0;
    let mut skipped = 0;
    for (value, target_id) in row.effects.iter().zip(target_ids) {
        let Some(target_id) = target_id else {
            continue;
        };
        match value {
            Some(value) => {
                effects::upsert(conn, variant_id, *target_id, *value, now)?;
                imported += 1;
            }
            None => {
                debug!("Invalid effect value for variant {}, target {}", variant_id, target_id);
                skipped += 1;
            }
        }
    }
    Ok((imported, skipped))
}
