//! GTF file parser with gzip support.
//!
//! Parses GTF (Gene Transfer Format) annotation files into flat lists of
//! genes and transcripts (each transcript carrying its exons), ready to be
//! written to the store.

use ahash::{AHashMap, AHashSet};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use std::fs::File;
use std::io::BufRead;
use std::path::Path;
use tracing::{debug, warn};

use crate::parser::util::{create_buffered_reader, normalize_chrom};
use crate::types::{Exon, Gene, Strand, Transcript};

/// Result of parsing a GTF file.
#[derive(Debug, Clone, Default)]
pub struct GtfData {
    /// Genes in the order they first appear.
    pub genes: Vec<Gene>,
    /// Transcripts with their exons, in the order they first appear.
    pub transcripts: Vec<Transcript>,
    /// One `Line N: reason` entry per gene, transcript or exon line that
    /// could not be used.
    pub errors: Vec<String>,
}

impl GtfData {
    /// Number of rejected lines.
    pub fn skipped(&self) -> usize {
        self.errors.len()
    }

    /// Total number of exons across all transcripts.
    pub fn exon_count(&self) -> usize {
        self.transcripts.iter().map(|t| t.exons.len()).sum()
    }
}

/// Parse a GTF file.
///
/// Supports both plain text and gzip-compressed GTF files.
pub fn parse_gtf(path: &Path) -> Result<GtfData> {
    let file = File::open(path).context("Failed to open GTF file")?;
    let reader = create_buffered_reader(file, path);

    parse_gtf_reader(reader)
}

/// Parse GTF data from a reader.
pub fn parse_gtf_reader<R: BufRead>(reader: R) -> Result<GtfData> {
    let mut genes: IndexMap<String, Gene> = IndexMap::new();
    let mut transcripts: IndexMap<String, Transcript> = IndexMap::new();

    // Ids that had their own gene/transcript line; the rest get bounds from children
    let mut explicit_genes: AHashSet<String> = AHashSet::new();
    let mut explicit_transcripts: AHashSet<String> = AHashSet::new();

    let mut errors: Vec<String> = Vec::new();

    for (line_idx, line_result) in reader.lines().enumerate() {
        let line = line_result.context("Failed to read GTF line")?;
        let line_num = line_idx + 1;

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.trim_end().split('\t').collect();
        if fields.len() < 9 {
            continue;
        }

        let feature_type = fields[2];
        if !matches!(feature_type, "gene" | "transcript" | "exon") {
            continue;
        }

        let (start, end) = match (fields[3].parse::<i64>(), fields[4].parse::<i64>()) {
            (Ok(start), Ok(end)) if start <= end => (start, end),
            _ => {
                let reason = format!("Line {}: invalid coordinates {}-{}", line_num, fields[3], fields[4]);
                warn!("{}, skipping", reason);
                errors.push(reason);
                continue;
            }
        };
        let chrom = normalize_chrom(fields[0]);
        let strand = fields[6].parse::<Strand>().ok();
        let attributes = parse_attributes(fields[8]);

        let Some(gene_id) = attributes.get("gene_id").map(|s| s.to_string()) else {
            let reason = format!("Line {}: missing gene_id", line_num);
            warn!("{}, skipping", reason);
            errors.push(reason);
            continue;
        };

        // Create or get gene
        let gene = genes
            .entry(gene_id.clone())
            .or_insert_with(|| Gene::new(gene_id.clone(), chrom.clone(), strand));

        if feature_type == "gene" {
            gene.set_length(start, end);
            gene.chrom = chrom;
            gene.strand = strand;
            gene.name = attributes
                .get("gene_name")
                .or_else(|| attributes.get("Name"))
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string());
            gene.biotype = attributes
                .get("gene_type")
                .or_else(|| attributes.get("gene_biotype"))
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string());
            explicit_genes.insert(gene_id);
            continue;
        }

        let Some(transcript_id) = attributes.get("transcript_id").map(|s| s.to_string()) else {
            let reason = format!("Line {}: {} without transcript_id", line_num, feature_type);
            warn!("{}, skipping", reason);
            errors.push(reason);
            continue;
        };

        // Create or get transcript
        let transcript = transcripts.entry(transcript_id.clone()).or_insert_with(|| {
            Transcript::new(transcript_id.clone(), gene_id.clone(), chrom.clone(), strand)
        });

        if feature_type == "transcript" {
            transcript.set_length(start, end);
            explicit_transcripts.insert(transcript_id);
        } else {
            let exon = match attributes.get("exon_number").and_then(|n| n.parse::<u32>().ok()) {
                Some(number) => Exon::with_number(start, end, number),
                None => Exon::new(start, end),
            };
            transcript.add_exon(exon);
        }
    }

    // Post-processing: number exons and calculate missing sizes
    for transcript in transcripts.values_mut() {
        if !explicit_transcripts.contains(&transcript.transcript_id) {
            transcript.calculate_size();
        }

        if transcript.exons_numbered() {
            transcript.exons.sort_by_key(|e| e.exon_number);
        } else {
            debug!("Renumbering exons of {}", transcript.transcript_id);
            transcript.renumber_exons();
        }
    }

    let mut transcripts_by_gene: AHashMap<&str, Vec<&Transcript>> = AHashMap::new();
    for transcript in transcripts.values() {
        transcripts_by_gene
            .entry(transcript.gene_id.as_str())
            .or_default()
            .push(transcript);
    }

    for gene in genes.values_mut() {
        if !explicit_genes.contains(&gene.gene_id) {
            if let Some(children) = transcripts_by_gene.get(gene.gene_id.as_str()) {
                gene.calculate_size(children.iter().copied());
            }
        }
    }

    let genes: Vec<Gene> = genes.into_values().filter(Gene::has_bounds).collect();
    let transcripts: Vec<Transcript> = transcripts
        .into_values()
        .filter(Transcript::has_bounds)
        .collect();

    Ok(GtfData {
        genes,
        transcripts,
        errors,
    })
}

/// Parse the GTF attribute column into a key/value map.
///
/// Accepts both `key "value";` and `key value;` pairs. When a key repeats,
/// the first value is kept.
pub fn parse_attributes(attributes: &str) -> AHashMap<&str, &str> {
    let mut map = AHashMap::new();

    for attr in attributes.split(';') {
        let attr = attr.trim();
        if attr.is_empty() {
            continue;
        }
        if let Some((key, value)) = attr.split_once(char::is_whitespace) {
            let value = value.trim().trim_matches('"');
            map.entry(key.trim()).or_insert(value);
        }
    }

    map
}
