//! Nearest-gene resolution.

use crate::resolver::region::classify_region;
use crate::resolver::FeatureIndex;
use crate::types::{Gene, Location, NearestGene};

/// Pick the closer of two flanking genes.
///
/// `before` must end before `pos` and `after` must start after it. Equal
/// distances go to the upstream gene.
pub fn pick_nearest(pos: i64, before: Option<Gene>, after: Option<Gene>) -> Option<NearestGene> {
    let nearby = |gene: Gene, distance: i64| NearestGene {
        gene,
        distance,
        location: Location::Nearby,
        region: None,
    };

    match (before, after) {
        (Some(b), Some(a)) => {
            let up = pos - b.end;
            let down = a.start - pos;
            if up <= down {
                Some(nearby(b, up))
            } else {
                Some(nearby(a, down))
            }
        }
        (Some(b), None) => {
            let distance = pos - b.end;
            Some(nearby(b, distance))
        }
        (None, Some(a)) => {
            let distance = a.start - pos;
            Some(nearby(a, distance))
        }
        (None, None) => None,
    }
}

/// Find the gene containing `pos`, or the nearest one on the chromosome.
///
/// A containing gene is reported with distance 0 and its region
/// classification. `Ok(None)` means the chromosome has no genes at all.
pub fn find_nearest_gene<I>(index: &I, chrom: &str, pos: i64) -> Result<Option<NearestGene>, I::Error>
where
    I: FeatureIndex + ?Sized,
{
    if let Some(gene) = index.gene_containing(chrom, pos)? {
        let region = classify_region(index, &gene, pos)?;
        return Ok(Some(NearestGene {
            gene,
            distance: 0,
            location: Location::Within,
            region: Some(region),
        }));
    }

    let before = index.gene_before(chrom, pos)?;
    let after = index.gene_after(chrom, pos)?;
    Ok(pick_nearest(pos, before, after))
}
