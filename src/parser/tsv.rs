//! Variant-effect TSV reader with gzip support.
//!
//! The first six columns describe the variant (`chrom`, `pos`, `id`, `ref`,
//! `alt`, `max_abs_sad`, looked up by name); every column after them holds
//! the effect values of one target.

use anyhow::{bail, Context, Result};
use csv::StringRecord;
use std::fs::File;
use std::io::BufRead;
use std::path::Path;

use crate::parser::util::{create_buffered_reader, normalize_chrom};

/// Number of leading variant columns before the effect columns.
pub const VARIANT_COLUMNS: usize = 6;

const REQUIRED_COLUMNS: [&str; VARIANT_COLUMNS] = ["chrom", "pos", "id", "ref", "alt", "max_abs_sad"];

/// Column layout of a variant TSV file.
#[derive(Debug, Clone)]
pub struct VariantHeader {
    chrom: usize,
    pos: usize,
    id: usize,
    ref_allele: usize,
    alt_allele: usize,
    max_abs_sad: usize,
    /// Effect column names, in file order.
    pub effect_columns: Vec<String>,
}

impl VariantHeader {
    /// Build the layout from the header record.
    pub fn from_record(record: &StringRecord) -> Result<Self> {
        let find = |name: &str| -> Result<usize> {
            record
                .iter()
                .position(|column| column.trim() == name)
                .with_context(|| format!("TSV header is missing the '{}' column", name))
        };

        if record.len() < VARIANT_COLUMNS {
            bail!(
                "TSV header has {} columns, expected at least {}",
                record.len(),
                VARIANT_COLUMNS
            );
        }

        Ok(VariantHeader {
            chrom: find(REQUIRED_COLUMNS[0])?,
            pos: find(REQUIRED_COLUMNS[1])?,
            id: find(REQUIRED_COLUMNS[2])?,
            ref_allele: find(REQUIRED_COLUMNS[3])?,
            alt_allele: find(REQUIRED_COLUMNS[4])?,
            max_abs_sad: find(REQUIRED_COLUMNS[5])?,
            effect_columns: record
                .iter()
                .skip(VARIANT_COLUMNS)
                .map(|s| s.trim().to_string())
                .collect(),
        })
    }

    /// Parse one data record.
    pub fn parse_record(&self, record: &StringRecord) -> ParsedRow {
        let field = |idx: usize| record.get(idx).map(str::trim).unwrap_or("");

        let chrom = field(self.chrom);
        let pos = field(self.pos);
        let ref_allele = field(self.ref_allele);
        let alt_allele = field(self.alt_allele);

        // Non-numeric and zero positions count as missing
        let pos: i64 = match pos.parse::<i64>() {
            Ok(p) if p > 0 && pos.bytes().all(|b| b.is_ascii_digit()) => p,
            _ => 0,
        };

        if chrom.is_empty() || pos == 0 || ref_allele.is_empty() || alt_allele.is_empty() {
            return ParsedRow::Skipped("missing required variant fields".to_string());
        }

        let max_abs_sad = match field(self.max_abs_sad).parse::<f64>() {
            Ok(v) => v,
            Err(_) => {
                return ParsedRow::Invalid(format!(
                    "could not convert max_abs_sad '{}' to float",
                    field(self.max_abs_sad)
                ))
            }
        };

        let rs_id = match field(self.id) {
            "" => None,
            id => Some(id.to_string()),
        };

        let effects = (0..self.effect_columns.len())
            .map(|i| {
                let value = field(VARIANT_COLUMNS + i);
                if value.is_empty() {
                    Some(0.0)
                } else {
                    value.parse::<f64>().ok()
                }
            })
            .collect();

        ParsedRow::Variant(VariantRow {
            chrom: normalize_chrom(chrom),
            pos,
            rs_id,
            ref_allele: ref_allele.to_string(),
            alt_allele: alt_allele.to_string(),
            max_abs_sad,
            effects,
        })
    }
}

/// A parsed variant row ready for upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantRow {
    pub chrom: String,
    pub pos: i64,
    pub rs_id: Option<String>,
    pub ref_allele: String,
    pub alt_allele: String,
    pub max_abs_sad: f64,
    /// One value per effect column; `None` when the cell is not a number.
    pub effects: Vec<Option<f64>>,
}

/// Outcome of parsing a single data row.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedRow {
    Variant(VariantRow),
    /// Row lacks required fields; counted as skipped.
    Skipped(String),
    /// Row is malformed; recorded as an import error.
    Invalid(String),
}

/// A block of raw records read from the file.
#[derive(Debug)]
pub struct RecordChunk {
    /// Records paired with their 1-based data row number.
    pub records: Vec<(usize, Result<StringRecord, String>)>,
}

/// Streaming TSV reader for chunked processing.
pub struct VariantReader {
    reader: csv::Reader<Box<dyn BufRead + Send>>,
    header: VariantHeader,
    rows_read: usize,
}

impl VariantReader {
    /// Create a new VariantReader from a file path (supports .gz).
    pub fn new(path: &Path) -> Result<Self> {
        let file = File::open(path).context("Failed to open TSV file")?;
        Self::from_reader(create_buffered_reader(file, path))
    }

    /// Create a reader over any buffered source.
    pub fn from_reader(source: Box<dyn BufRead + Send>) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .quoting(false)
            .from_reader(source);

        let header_record = reader
            .headers()
            .context("Failed to read TSV header")?
            .clone();
        let header = VariantHeader::from_record(&header_record)?;

        Ok(VariantReader {
            reader,
            header,
            rows_read: 0,
        })
    }

    pub fn header(&self) -> &VariantHeader {
        &self.header
    }

    /// Data row number of a record; the header is line 1.
    fn row_number(&self, position: Option<&csv::Position>) -> usize {
        match position {
            Some(p) if p.line() > 1 => p.line() as usize - 1,
            _ => self.rows_read + 1,
        }
    }

    /// Read the next chunk of raw records.
    ///
    /// Returns `None` when EOF is reached. Records that cannot be decoded are
    /// kept as errors. Row numbers follow file lines, so blank lines still
    /// advance them.
    pub fn read_chunk(&mut self, size: usize) -> Result<Option<RecordChunk>> {
        let mut records = Vec::with_capacity(size);

        while records.len() < size {
            let mut record = StringRecord::new();
            match self.reader.read_record(&mut record) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) if e.is_io_error() => {
                    return Err(e).context("Failed to read TSV row");
                }
                Err(e) => {
                    self.rows_read = self.row_number(e.position());
                    records.push((self.rows_read, Err(e.to_string())));
                    continue;
                }
            }

            self.rows_read = self.row_number(record.position());

            // Skip whitespace-only lines
            if record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }

            records.push((self.rows_read, Ok(record)));
        }

        if records.is_empty() {
            Ok(None)
        } else {
            Ok(Some(RecordChunk { records }))
        }
    }
}
