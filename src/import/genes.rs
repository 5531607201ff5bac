//! Gene import from GTF.

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;
use tracing::{info, warn};

use crate::import::audit_outcome;
use crate::parser::parse_gtf;
use crate::store::{genes, Database};

const IMPORT_TYPE: &str = "GTF_GENES";

/// Genes written between progress messages.
const PROGRESS_INTERVAL: usize = 1000;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneImportStats {
    pub genes_imported: usize,
    /// Rows removed before reloading.
    pub genes_cleared: usize,
    /// GTF lines that could not be used.
    pub lines_skipped: usize,
    /// Reasons for the skipped lines, stored with the audit row.
    pub errors: Vec<String>,
}

/// Load genes from a GTF file.
///
/// When the table already holds genes, `confirm` is asked (with the current
/// count) whether to replace them. Clearing and reloading happen in one
/// transaction. Returns `Ok(None)` when the replacement is declined.
pub fn import_genes<F>(db: &Database, path: &Path, confirm: F) -> Result<Option<GeneImportStats>>
where
    F: FnOnce(i64) -> bool,
{
    let outcome = run(db, path, confirm);
    if !matches!(outcome, Ok(None)) {
        audit_outcome(db, IMPORT_TYPE, path, &outcome, |stats| {
            match stats {
                Some(s) => (s.genes_imported as i64, s.errors.clone()),
                None => (0, Vec::new()),
            }
        });
    }
    outcome
}

fn run<F>(db: &Database, path: &Path, confirm: F) -> Result<Option<GeneImportStats>>
where
    F: FnOnce(i64) -> bool,
{
    let existing = genes::count(&db.connection())?;
    if existing > 0 {
        warn!("Database already contains {} genes", existing);
        if !confirm(existing) {
            info!("Import cancelled");
            return Ok(None);
        }
    }

    info!("Parsing GTF file: {}", path.display());
    let mut gtf = parse_gtf(path)?;
    info!(
        "Finished parsing GTF file. Total genes: {}, Skipped: {}",
        gtf.genes.len(),
        gtf.skipped()
    );

    let mut stats = GeneImportStats {
        lines_skipped: gtf.skipped(),
        errors: std::mem::take(&mut gtf.errors),
        ..Default::default()
    };

    let mut conn = db.connection();
    let tx = conn.transaction().context("Failed to begin gene transaction")?;

    if existing > 0 {
        info!("Clearing existing genes...");
        stats.genes_cleared = genes::clear(&tx)?;
    }

    let now = Utc::now();
    for gene in &gtf.genes {
        if genes::insert(&tx, gene, now)? {
            stats.genes_imported += 1;
            if stats.genes_imported % PROGRESS_INTERVAL == 0 {
                info!("Imported {} genes so far...", stats.genes_imported);
            }
        }
    }

    tx.commit().context("Failed to commit genes")?;

    let total = genes::count(&conn)?;
    info!(
        "Gene import completed successfully! Total genes imported: {}",
        stats.genes_imported
    );
    info!("Verification: Database now contains {} genes", total);

    Ok(Some(stats))
}
