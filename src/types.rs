//! Core data structures for snpdb.
//!
//! Plain records for the six stored entities plus the result types produced
//! by the nearest-gene resolver.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Strand orientation for genomic features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Positive,
    Negative,
}

/// Error type for parsing strand from string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStrandError;

impl fmt::Display for ParseStrandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid strand: expected '+' or '-'")
    }
}

impl std::error::Error for ParseStrandError {}

impl FromStr for Strand {
    type Err = ParseStrandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Positive),
            "-" => Ok(Strand::Negative),
            _ => Err(ParseStrandError),
        }
    }
}

impl Strand {
    /// Convert strand to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strand::Positive => "+",
            Strand::Negative => "-",
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Strand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A variant (SNP) row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variant {
    pub id: i64,
    pub chrom: String,
    pub pos: i64,
    pub rs_id: Option<String>,
    pub ref_allele: String,
    pub alt_allele: String,
    pub max_abs_sad: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A tissue or cell-type assay column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
}

/// An effect value joined with the name of its target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectValue {
    pub target_name: String,
    pub effect_value: f64,
}

/// An exon within a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exon {
    pub start: i64,
    pub end: i64,
    /// Exon number within the transcript (filled by `renumber_exons` when the
    /// annotation does not carry one).
    pub exon_number: Option<u32>,
}

impl Exon {
    /// Create a new exon with start and end coordinates.
    pub fn new(start: i64, end: i64) -> Self {
        Exon {
            start,
            end,
            exon_number: None,
        }
    }

    pub fn with_number(start: i64, end: i64, exon_number: u32) -> Self {
        Exon {
            start,
            end,
            exon_number: Some(exon_number),
        }
    }

    pub fn contains(&self, pos: i64) -> bool {
        self.start <= pos && pos <= self.end
    }
}

/// A transcript of a gene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub transcript_id: String,
    pub gene_id: String,
    pub chrom: String,
    pub strand: Option<Strand>,
    pub exons: Vec<Exon>,
    /// Minimum start coordinate (initialized to i64::MAX).
    pub start: i64,
    /// Maximum end coordinate (initialized to 0).
    pub end: i64,
}

impl Transcript {
    /// Create a new transcript without bounds.
    pub fn new(transcript_id: String, gene_id: String, chrom: String, strand: Option<Strand>) -> Self {
        Transcript {
            transcript_id,
            gene_id,
            chrom,
            strand,
            exons: Vec::new(),
            start: i64::MAX,
            end: 0,
        }
    }

    /// Add an exon to this transcript.
    pub fn add_exon(&mut self, exon: Exon) {
        self.exons.push(exon);
    }

    /// Set transcript boundaries explicitly.
    pub fn set_length(&mut self, start: i64, end: i64) {
        self.start = start;
        self.end = end;
    }

    /// Whether bounds were set, either explicitly or from exons.
    pub fn has_bounds(&self) -> bool {
        self.start <= self.end
    }

    pub fn contains(&self, pos: i64) -> bool {
        self.start <= pos && pos <= self.end
    }

    /// Calculate transcript boundaries from exon coordinates.
    pub fn calculate_size(&mut self) {
        for exon in &self.exons {
            if exon.start < self.start {
                self.start = exon.start;
            }
            if exon.end > self.end {
                self.end = exon.end;
            }
        }
    }

    /// Renumber exons based on strand orientation.
    ///
    /// Sorts exons by position and assigns exon numbers.
    /// For positive strand: ascending order (1, 2, 3...).
    /// For negative strand: descending order (N, N-1, ...).
    pub fn renumber_exons(&mut self) {
        self.exons.sort_by_key(|e| e.start);

        let n_exons = self.exons.len() as u32;

        match self.strand.unwrap_or(Strand::Positive) {
            Strand::Positive => {
                for (i, exon) in self.exons.iter_mut().enumerate() {
                    exon.exon_number = Some(i as u32 + 1);
                }
            }
            Strand::Negative => {
                for (i, exon) in self.exons.iter_mut().enumerate() {
                    exon.exon_number = Some(n_exons - i as u32);
                }
            }
        }
    }

    /// Whether every exon already carries a number from the annotation.
    pub fn exons_numbered(&self) -> bool {
        self.exons.iter().all(|e| e.exon_number.is_some())
    }
}

/// A gene annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gene {
    pub gene_id: String,
    #[serde(rename = "gene_name")]
    pub name: Option<String>,
    pub chrom: String,
    #[serde(rename = "start_pos")]
    pub start: i64,
    #[serde(rename = "end_pos")]
    pub end: i64,
    pub strand: Option<Strand>,
    #[serde(rename = "gene_biotype")]
    pub biotype: Option<String>,
}

impl Gene {
    /// Create a new gene without bounds.
    pub fn new(gene_id: String, chrom: String, strand: Option<Strand>) -> Self {
        Gene {
            gene_id,
            name: None,
            chrom,
            start: i64::MAX,
            end: 0,
            strand,
            biotype: None,
        }
    }

    /// Set gene boundaries explicitly.
    pub fn set_length(&mut self, start: i64, end: i64) {
        self.start = start;
        self.end = end;
    }

    pub fn has_bounds(&self) -> bool {
        self.start <= self.end
    }

    pub fn contains(&self, pos: i64) -> bool {
        self.start <= pos && pos <= self.end
    }

    /// Calculate gene boundaries from transcript coordinates.
    pub fn calculate_size<'a>(&mut self, transcripts: impl IntoIterator<Item = &'a Transcript>) {
        for transcript in transcripts {
            if !transcript.has_bounds() {
                continue;
            }
            if transcript.start < self.start {
                self.start = transcript.start;
            }
            if transcript.end > self.end {
                self.end = transcript.end;
            }
        }
    }
}

/// Where a position sits relative to the reported gene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Within,
    Nearby,
}

/// Sub-feature classification of a position inside a gene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneRegion {
    Exon(u32),
    Intron,
    Intergenic,
}

impl fmt::Display for GeneRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneRegion::Exon(n) => write!(f, "exon {}", n),
            GeneRegion::Intron => write!(f, "intron"),
            GeneRegion::Intergenic => write!(f, "intergenic"),
        }
    }
}

impl Serialize for GeneRegion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The gene reported for a position, with its distance and region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestGene {
    #[serde(flatten)]
    pub gene: Gene,
    pub distance: i64,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<GeneRegion>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strand_parsing() {
        assert_eq!("+".parse::<Strand>(), Ok(Strand::Positive));
        assert_eq!("-".parse::<Strand>(), Ok(Strand::Negative));
        assert!(".".parse::<Strand>().is_err());
    }

    #[test]
    fn test_exon_contains() {
        let exon = Exon::new(100, 200);
        assert!(exon.contains(100));
        assert!(exon.contains(200));
        assert!(!exon.contains(201));
    }

    fn transcript(strand: Strand) -> Transcript {
        Transcript::new("T1".to_string(), "G1".to_string(), "1".to_string(), Some(strand))
    }

    #[test]
    fn test_transcript_renumber_positive() {
        let mut transcript = transcript(Strand::Positive);
        transcript.add_exon(Exon::new(500, 600));
        transcript.add_exon(Exon::new(100, 200));
        transcript.add_exon(Exon::new(300, 400));

        transcript.renumber_exons();

        assert_eq!(transcript.exons[0].start, 100);
        assert_eq!(transcript.exons[0].exon_number, Some(1));
        assert_eq!(transcript.exons[1].start, 300);
        assert_eq!(transcript.exons[1].exon_number, Some(2));
        assert_eq!(transcript.exons[2].start, 500);
        assert_eq!(transcript.exons[2].exon_number, Some(3));
    }

    #[test]
    fn test_transcript_renumber_negative() {
        let mut transcript = transcript(Strand::Negative);
        transcript.add_exon(Exon::new(100, 200));
        transcript.add_exon(Exon::new(300, 400));

        transcript.renumber_exons();

        // Lowest exon is the last one transcribed on the minus strand
        assert_eq!(transcript.exons[0].exon_number, Some(2));
        assert_eq!(transcript.exons[1].exon_number, Some(1));
    }

    #[test]
    fn test_transcript_calculate_size() {
        let mut transcript = transcript(Strand::Positive);
        assert!(!transcript.has_bounds());
        transcript.add_exon(Exon::new(300, 400));
        transcript.add_exon(Exon::new(100, 200));
        transcript.calculate_size();
        assert_eq!((transcript.start, transcript.end), (100, 400));
    }

    #[test]
    fn test_gene_calculate_size_ignores_unbounded_transcripts() {
        let mut gene = Gene::new("G1".to_string(), "1".to_string(), None);
        let mut t1 = transcript(Strand::Positive);
        t1.set_length(50, 90);
        let t2 = transcript(Strand::Positive);
        gene.calculate_size([&t1, &t2]);
        assert_eq!((gene.start, gene.end), (50, 90));
    }

    #[test]
    fn test_region_display() {
        assert_eq!(GeneRegion::Exon(3).to_string(), "exon 3");
        assert_eq!(GeneRegion::Intron.to_string(), "intron");
        assert_eq!(GeneRegion::Intergenic.to_string(), "intergenic");
    }

    #[test]
    fn test_nearest_gene_serialization() {
        let gene = Gene {
            gene_id: "ENSBTAG1".to_string(),
            name: Some("ABC1".to_string()),
            chrom: "1".to_string(),
            start: 100,
            end: 200,
            strand: Some(Strand::Negative),
            biotype: None,
        };
        let nearest = NearestGene {
            gene,
            distance: 0,
            location: Location::Within,
            region: Some(GeneRegion::Exon(2)),
        };
        let json = serde_json::to_value(&nearest).unwrap();
        assert_eq!(json["gene_name"], "ABC1");
        assert_eq!(json["start_pos"], 100);
        assert_eq!(json["strand"], "-");
        assert_eq!(json["location"], "within");
        assert_eq!(json["region"], "exon 2");
    }
}
