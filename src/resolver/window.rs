//! Genome-browser window around a variant.
//!
//! Features are exported in 0-based half-open coordinates.

use serde::Serialize;

use crate::resolver::FeatureIndex;
use crate::types::{Gene, Strand, Variant};

/// A closed 1-based interval centred on a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: i64,
    pub end: i64,
}

impl Window {
    /// Window of `size` bases around `pos`, clamped to start at 1.
    pub fn centered(pos: i64, size: i64) -> Self {
        let half = size / 2;
        Window {
            start: (pos - half).max(1),
            end: pos + half,
        }
    }
}

/// Gene track entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneFeature {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
    pub name: String,
    pub gene_id: String,
    pub strand: Strand,
    pub gene_biotype: Option<String>,
}

impl From<Gene> for GeneFeature {
    fn from(gene: Gene) -> Self {
        GeneFeature {
            start: gene.start - 1,
            end: gene.end,
            name: gene.name.unwrap_or_else(|| gene.gene_id.clone()),
            strand: gene.strand.unwrap_or(Strand::Positive),
            chrom: gene.chrom,
            gene_id: gene.gene_id,
            gene_biotype: gene.biotype,
        }
    }
}

/// Variant track entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnpFeature {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
    pub name: Option<String>,
    pub snp_id: Option<String>,
    #[serde(rename = "ref")]
    pub ref_allele: String,
    #[serde(rename = "alt")]
    pub alt_allele: String,
    pub pos: i64,
}

impl From<Variant> for SnpFeature {
    fn from(variant: Variant) -> Self {
        SnpFeature {
            chrom: variant.chrom,
            start: variant.pos - 1,
            end: variant.pos,
            name: variant.rs_id.clone(),
            snp_id: variant.rs_id,
            ref_allele: variant.ref_allele,
            alt_allele: variant.alt_allele,
            pos: variant.pos,
        }
    }
}

/// The variant the window is centred on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CenterSnp {
    pub id: i64,
    pub snp_id: Option<String>,
    pub pos: i64,
    #[serde(rename = "ref")]
    pub ref_allele: String,
    #[serde(rename = "alt")]
    pub alt_allele: String,
}

/// Everything a browser needs to draw the neighbourhood of a variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionWindow {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
    pub center_snp: CenterSnp,
    pub genes: Vec<GeneFeature>,
    pub snps: Vec<SnpFeature>,
    pub total_genes: usize,
    pub total_snps: usize,
}

/// Collect the genes and variants within `size` bases around `center`.
pub fn extract_window<I>(index: &I, center: &Variant, size: i64) -> Result<RegionWindow, I::Error>
where
    I: FeatureIndex + ?Sized,
{
    let window = Window::centered(center.pos, size);

    let genes: Vec<GeneFeature> = index
        .genes_overlapping(&center.chrom, window.start, window.end)?
        .into_iter()
        .map(GeneFeature::from)
        .collect();
    let snps: Vec<SnpFeature> = index
        .variants_between(&center.chrom, window.start, window.end)?
        .into_iter()
        .map(SnpFeature::from)
        .collect();

    Ok(RegionWindow {
        chrom: center.chrom.clone(),
        start: window.start,
        end: window.end,
        center_snp: CenterSnp {
            id: center.id,
            snp_id: center.rs_id.clone(),
            pos: center.pos,
            ref_allele: center.ref_allele.clone(),
            alt_allele: center.alt_allele.clone(),
        },
        total_genes: genes.len(),
        total_snps: snps.len(),
        genes,
        snps,
    })
}
