//! Utility functions for file parsing.

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Creates a buffered reader that automatically handles gzip-compressed files.
///
/// This function checks if the file path ends with ".gz" and wraps the file
/// in a GzDecoder if so. Otherwise, it returns a plain buffered reader.
pub fn create_buffered_reader(file: File, path: &Path) -> Box<dyn BufRead + Send> {
    if path.to_string_lossy().ends_with(".gz") {
        Box::new(BufReader::new(GzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    }
}

/// Normalize a chromosome name by stripping a leading `chr` (any case).
pub fn normalize_chrom(chrom: &str) -> String {
    let chrom = chrom.trim();
    match chrom.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("chr") && chrom.len() > 3 => {
            chrom[3..].to_string()
        }
        _ => chrom.to_string(),
    }
}
