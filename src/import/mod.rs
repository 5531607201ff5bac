//! Batch importers for variant-effect tables and GTF annotations.
//!
//! Every run appends one row to the import audit log, including runs that
//! fail part way.

pub mod genes;
pub mod transcripts;
pub mod variants;

use std::path::Path;
use tracing::warn;

use crate::store::{import_log, Database, ImportRecord};

pub use genes::{import_genes, GeneImportStats};
pub use transcripts::{import_transcripts, TranscriptImportStats};
pub use variants::{import_variants, VariantImportStats};

/// Append the audit row of a run. Failing to write it only warns.
fn audit(db: &Database, entry: &ImportRecord) {
    if let Err(e) = import_log::record(&db.connection(), entry) {
        warn!("Failed to create import log: {}", e);
    }
}

/// Audit a finished run, recording a failed entry when it errored.
fn audit_outcome<T>(
    db: &Database,
    import_type: &str,
    path: &Path,
    outcome: &anyhow::Result<T>,
    summarize: impl FnOnce(&T) -> (i64, Vec<String>),
) {
    let source = path.display().to_string();
    let entry = match outcome {
        Ok(stats) => {
            let (records, errors) = summarize(stats);
            ImportRecord::new(import_type, &source, records, &errors)
        }
        Err(e) => ImportRecord::failed(import_type, &source, 0, &format!("{:#}", e)),
    };
    audit(db, &entry);
}
