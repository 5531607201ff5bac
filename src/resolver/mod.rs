//! Nearest-gene lookup, region classification and browser windows.
//!
//! The algorithms only need a handful of interval queries, captured by
//! [`FeatureIndex`]. The SQLite connection is the production index.

pub mod nearest;
pub mod region;
pub mod window;

use rusqlite::Connection;

use crate::store::{genes, transcripts, variants};
use crate::types::{Gene, Transcript, Variant};

pub use nearest::{find_nearest_gene, pick_nearest};
pub use region::classify_region;
pub use window::{extract_window, RegionWindow, Window};

/// Interval queries over genes, transcripts, exons and variants.
///
/// Coordinates are 1-based and closed.
pub trait FeatureIndex {
    type Error;

    /// Gene containing `pos`; the lowest gene id when several overlap.
    fn gene_containing(&self, chrom: &str, pos: i64) -> Result<Option<Gene>, Self::Error>;

    /// Gene with the largest end strictly before `pos`.
    fn gene_before(&self, chrom: &str, pos: i64) -> Result<Option<Gene>, Self::Error>;

    /// Gene with the smallest start strictly after `pos`.
    fn gene_after(&self, chrom: &str, pos: i64) -> Result<Option<Gene>, Self::Error>;

    /// Genes overlapping `[start, end]`, ordered by start then gene id.
    fn genes_overlapping(&self, chrom: &str, start: i64, end: i64) -> Result<Vec<Gene>, Self::Error>;

    /// Transcripts of `gene` on its chromosome, ordered by transcript id.
    fn transcripts_of(&self, gene: &Gene) -> Result<Vec<Transcript>, Self::Error>;

    /// Number of the exon of a transcript containing `pos`; the lowest on overlap.
    fn exon_number_at(&self, transcript_id: &str, pos: i64) -> Result<Option<u32>, Self::Error>;

    /// Variants with `start <= pos <= end`, ordered by position then id.
    fn variants_between(&self, chrom: &str, start: i64, end: i64) -> Result<Vec<Variant>, Self::Error>;
}

impl FeatureIndex for Connection {
    type Error = rusqlite::Error;

    fn gene_containing(&self, chrom: &str, pos: i64) -> rusqlite::Result<Option<Gene>> {
        genes::containing(self, chrom, pos)
    }

    fn gene_before(&self, chrom: &str, pos: i64) -> rusqlite::Result<Option<Gene>> {
        genes::preceding(self, chrom, pos)
    }

    fn gene_after(&self, chrom: &str, pos: i64) -> rusqlite::Result<Option<Gene>> {
        genes::following(self, chrom, pos)
    }

    fn genes_overlapping(&self, chrom: &str, start: i64, end: i64) -> rusqlite::Result<Vec<Gene>> {
        genes::overlapping(self, chrom, start, end)
    }

    fn transcripts_of(&self, gene: &Gene) -> rusqlite::Result<Vec<Transcript>> {
        transcripts::for_gene(self, &gene.gene_id, &gene.chrom)
    }

    fn exon_number_at(&self, transcript_id: &str, pos: i64) -> rusqlite::Result<Option<u32>> {
        transcripts::exon_number_at(self, transcript_id, pos)
    }

    fn variants_between(&self, chrom: &str, start: i64, end: i64) -> rusqlite::Result<Vec<Variant>> {
        variants::in_range(self, chrom, start, end)
    }
}

/// In-memory index used by the resolver unit tests.
#[cfg(test)]
pub(crate) mod memory {
    use super::FeatureIndex;
    use crate::types::{Exon, Gene, Strand, Transcript, Variant};
    use std::convert::Infallible;

    #[derive(Default)]
    pub struct MemoryIndex {
        pub genes: Vec<Gene>,
        pub transcripts: Vec<Transcript>,
        pub variants: Vec<Variant>,
    }

    impl MemoryIndex {
        pub fn add_gene(&mut self, gene_id: &str, start: i64, end: i64) {
            let mut gene = Gene::new(gene_id.to_string(), "1".to_string(), Some(Strand::Positive));
            gene.set_length(start, end);
            self.genes.push(gene);
        }

        pub fn add_transcript(&mut self, transcript_id: &str, gene_id: &str, exons: &[(i64, i64)]) {
            let mut transcript = Transcript::new(
                transcript_id.to_string(),
                gene_id.to_string(),
                "1".to_string(),
                Some(Strand::Positive),
            );
            for &(start, end) in exons {
                transcript.add_exon(Exon::new(start, end));
            }
            transcript.calculate_size();
            transcript.renumber_exons();
            self.transcripts.push(transcript);
        }
    }

    impl FeatureIndex for MemoryIndex {
        type Error = Infallible;

        fn gene_containing(&self, chrom: &str, pos: i64) -> Result<Option<Gene>, Infallible> {
            Ok(self
                .genes
                .iter()
                .filter(|g| g.chrom == chrom && g.contains(pos))
                .min_by(|a, b| a.gene_id.cmp(&b.gene_id))
                .cloned())
        }

        fn gene_before(&self, chrom: &str, pos: i64) -> Result<Option<Gene>, Infallible> {
            Ok(self
                .genes
                .iter()
                .filter(|g| g.chrom == chrom && g.end < pos)
                .min_by(|a, b| b.end.cmp(&a.end).then_with(|| a.gene_id.cmp(&b.gene_id)))
                .cloned())
        }

        fn gene_after(&self, chrom: &str, pos: i64) -> Result<Option<Gene>, Infallible> {
            Ok(self
                .genes
                .iter()
                .filter(|g| g.chrom == chrom && g.start > pos)
                .min_by(|a, b| a.start.cmp(&b.start).then_with(|| a.gene_id.cmp(&b.gene_id)))
                .cloned())
        }

        fn genes_overlapping(&self, chrom: &str, start: i64, end: i64) -> Result<Vec<Gene>, Infallible> {
            let mut genes: Vec<Gene> = self
                .genes
                .iter()
                .filter(|g| g.chrom == chrom && g.start <= end && g.end >= start)
                .cloned()
                .collect();
            genes.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.gene_id.cmp(&b.gene_id)));
            Ok(genes)
        }

        fn transcripts_of(&self, gene: &Gene) -> Result<Vec<Transcript>, Infallible> {
            let mut transcripts: Vec<Transcript> = self
                .transcripts
                .iter()
                .filter(|t| t.gene_id == gene.gene_id && t.chrom == gene.chrom)
                .cloned()
                .collect();
            transcripts.sort_by(|a, b| a.transcript_id.cmp(&b.transcript_id));
            Ok(transcripts)
        }

        fn exon_number_at(&self, transcript_id: &str, pos: i64) -> Result<Option<u32>, Infallible> {
            Ok(self
                .transcripts
                .iter()
                .filter(|t| t.transcript_id == transcript_id)
                .flat_map(|t| t.exons.iter())
                .filter(|e| e.contains(pos))
                .filter_map(|e| e.exon_number)
                .min())
        }

        fn variants_between(&self, chrom: &str, start: i64, end: i64) -> Result<Vec<Variant>, Infallible> {
            let mut variants: Vec<Variant> = self
                .variants
                .iter()
                .filter(|v| v.chrom == chrom && start <= v.pos && v.pos <= end)
                .cloned()
                .collect();
            variants.sort_by_key(|v| (v.pos, v.id));
            Ok(variants)
        }
    }
}
